/// Loader for the FAQ corpus file.
///
/// The file is a JSON array of `{"question": .., "answer": ..}` records. It is
/// read once at startup; any problem with it is fatal, so the server never
/// starts answering from a broken or empty corpus.
use std::collections::HashSet;
use std::path::Path;

use tracing::warn;

use crate::error::AppError;
use crate::model::FaqEntry;
use crate::resolver::normalize;

pub fn load_corpus(path: &Path) -> Result<Vec<FaqEntry>, AppError> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_corpus(&content)
}

pub fn parse_corpus(content: &str) -> Result<Vec<FaqEntry>, AppError> {
    let entries: Vec<FaqEntry> =
        serde_json::from_str(content).map_err(|e| AppError::Corpus(e.to_string()))?;

    if entries.is_empty() {
        return Err(AppError::Corpus("corpus contains no entries".to_string()));
    }

    let mut seen = HashSet::new();
    for (idx, entry) in entries.iter().enumerate() {
        let key = normalize(&entry.question);
        if key.is_empty() {
            return Err(AppError::Corpus(format!("entry {idx} has an empty question")));
        }
        if entry.answer.trim().is_empty() {
            return Err(AppError::Corpus(format!(
                "entry {idx} ({:?}) has an empty answer",
                entry.question
            )));
        }
        if !seen.insert(key) {
            warn!(
                index = idx,
                question = %entry.question,
                "duplicate question in corpus, earlier entry wins"
            );
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_corpus_keeps_order() {
        let content = r#"[
            {"question": "What are your hours?", "answer": "9am-5pm"},
            {"question": "Where are you located?", "answer": "Main Street"}
        ]"#;
        let entries = parse_corpus(content).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].question, "What are your hours?");
        assert_eq!(entries[1].answer, "Main Street");
    }

    #[test]
    fn test_parse_corpus_ignores_extra_fields() {
        let content = r#"[{"question": "q?", "answer": "a", "tags": ["x"]}]"#;
        assert_eq!(parse_corpus(content).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_corpus_allows_duplicates() {
        let content = r#"[
            {"question": "Hours?", "answer": "first"},
            {"question": "  hours? ", "answer": "second"}
        ]"#;
        assert_eq!(parse_corpus(content).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_corpus_rejects_invalid_input() {
        for content in [
            "",
            "not json",
            "{}",
            "[]",
            r#"[{"question": "q"}]"#,
            r#"[{"question": "   ", "answer": "a"}]"#,
            r#"[{"question": "q", "answer": ""}]"#,
        ] {
            let err = parse_corpus(content).unwrap_err();
            assert!(matches!(err, AppError::Corpus(_)), "accepted {content:?}");
        }
    }

    #[test]
    fn test_load_corpus_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faq.json");
        std::fs::write(&path, r#"[{"question": "Hi?", "answer": "Hello"}]"#).unwrap();

        let entries = load_corpus(&path).unwrap();
        assert_eq!(
            entries,
            vec![FaqEntry {
                question: "Hi?".to_string(),
                answer: "Hello".to_string(),
            }]
        );
    }

    #[test]
    fn test_load_corpus_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_corpus(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, AppError::Io { .. }));
    }
}
