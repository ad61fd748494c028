/// Answer resolution against the static FAQ corpus.
///
/// Normalizes the query the same way as every corpus question (trim + lowercase),
/// picks the highest scoring question at or above the cutoff, and falls back to a
/// rephrasing prompt that lists the first few corpus questions.
use crate::matcher;
use crate::model::FaqEntry;

pub const DEFAULT_CUTOFF: f64 = 0.5;
const SUGGESTION_COUNT: usize = 3;
const FALLBACK_PROMPT: &str = "🤖 I'm not sure how to answer that. Could you try rephrasing?";
const SUGGESTION_HEADER: &str = "Here are some things you can ask:";

/// Matching key for a question.
pub fn normalize(question: &str) -> String {
    question.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    Matched { entry: &'a FaqEntry, score: f64 },
    Fallback { message: String },
}

impl Resolution<'_> {
    pub fn answer(&self) -> &str {
        match self {
            Resolution::Matched { entry, .. } => &entry.answer,
            Resolution::Fallback { message } => message,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Resolution::Matched { .. })
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            Resolution::Matched { score, .. } => Some(*score),
            Resolution::Fallback { .. } => None,
        }
    }
}

pub struct AnswerResolver {
    entries: Vec<FaqEntry>,
    keys: Vec<String>,
    cutoff: f64,
    fallback: String,
}

impl AnswerResolver {
    pub fn new(entries: Vec<FaqEntry>, cutoff: f64) -> Self {
        let keys = entries.iter().map(|e| normalize(&e.question)).collect();
        let fallback = fallback_message(&entries);
        Self {
            entries,
            keys,
            cutoff,
            fallback,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn resolve(&self, query: &str) -> Resolution<'_> {
        let query = normalize(query);
        if query.is_empty() {
            return self.fallback();
        }

        let best = matcher::close_matches(
            &query,
            self.keys.iter().map(String::as_str),
            1,
            self.cutoff,
        );
        match best.first() {
            Some(&(idx, score)) => Resolution::Matched {
                entry: &self.entries[idx],
                score,
            },
            None => self.fallback(),
        }
    }

    #[cfg(test)]
    fn answer(&self, query: &str) -> String {
        self.resolve(query).answer().to_string()
    }

    fn fallback(&self) -> Resolution<'_> {
        Resolution::Fallback {
            message: self.fallback.clone(),
        }
    }
}

fn fallback_message(entries: &[FaqEntry]) -> String {
    if entries.is_empty() {
        return FALLBACK_PROMPT.to_string();
    }
    let suggestions: Vec<String> = entries
        .iter()
        .take(SUGGESTION_COUNT)
        .map(|e| format!("- {}", e.question))
        .collect();
    format!(
        "{FALLBACK_PROMPT}\n{SUGGESTION_HEADER}\n{}",
        suggestions.join("\n")
    )
}
