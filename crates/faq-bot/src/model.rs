use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// Body of `POST /get_answer`. Only `question` takes part in matching; the
/// identity fields are passed through to the audit log.
///
/// Every field is lenient: a missing, null or non-string value reads as `None`,
/// so a sloppy client still gets an answer (or the fallback) instead of a 422.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AskRequest {
    #[serde(deserialize_with = "lenient_string")]
    pub question: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub contact: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}
