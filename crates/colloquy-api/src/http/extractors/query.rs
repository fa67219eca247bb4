//! Query parameter extractors for list and lookup endpoints.

use serde::Deserialize;

/// `?title=` for chat search and title existence checks.
#[derive(Debug, Deserialize, Default)]
pub struct TitleQuery {
    /// Case-insensitive substring for search, exact title for existence checks.
    pub title: Option<String>,
}

/// `?participants=<id>,<id>` for participant-set lookup.
#[derive(Debug, Deserialize, Default)]
pub struct ParticipantsQuery {
    #[serde(default)]
    pub participants: String,
}

impl ParticipantsQuery {
    /// Non-empty, trimmed entries of the comma-separated list.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.participants
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_entries_skip_blanks() {
        let query = ParticipantsQuery {
            participants: " a, ,b,".to_string(),
        };
        assert_eq!(query.entries().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
