//! Trading journal entries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// Trader mood attached to a journal entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Mood {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" | "+" => Ok(Self::Positive),
            "neutral" | "0" => Ok(Self::Neutral),
            "negative" | "-" => Ok(Self::Negative),
            other => Err(format!("unknown mood '{other}' (positive|neutral|negative)")),
        }
    }
}

/// Entry as returned by `/fetch/journals`.
///
/// Mood is kept as text: older entries carry free-form values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub mood: Option<String>,
    /// Comma-separated tags.
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub tags: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JournalEntry {
    /// Tags split on commas, trimmed, blanks dropped.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// `POST /log/journal` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewJournalEntry {
    pub title: String,
    pub content: String,
    pub mood: Mood,
    pub tags: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_decodes_tags_as_list_or_string() {
        let a: JournalEntry = serde_json::from_value(json!({
            "title": "Expiry day",
            "content": "Held the fly through 3pm",
            "mood": "Positive",
            "tags": "expiry, nifty ,",
            "timestamp": "2025-08-28T15:31:00"
        }))
        .unwrap();
        assert_eq!(a.tag_list(), vec!["expiry", "nifty"]);

        let b: JournalEntry =
            serde_json::from_value(json!({"title": "x", "tags": ["a", "b"]})).unwrap();
        assert_eq!(b.tag_list(), vec!["a", "b"]);
        assert!(b.mood.is_none());
    }

    #[test]
    fn test_new_entry_serializes_mood_label() {
        let entry = NewJournalEntry {
            title: "t".into(),
            content: "c".into(),
            mood: Mood::Negative,
            tags: "gap-down".into(),
        };
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["mood"], json!("Negative"));
    }

    #[test]
    fn test_mood_parse() {
        assert_eq!("POSITIVE".parse::<Mood>().unwrap(), Mood::Positive);
        assert!("angry".parse::<Mood>().is_err());
    }
}
