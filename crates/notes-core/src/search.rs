//! Substring search over a caller's own notes.
//!
//! A raw query is split on whitespace and commas into terms. A note matches
//! when every term occurs in its title or its content. No ranking: matches
//! keep the order of the scoped list.

use crate::model::Note;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<String>,
    case_sensitive: bool,
}

impl SearchQuery {
    pub fn parse(raw: &str, case_sensitive: bool) -> Self {
        let terms = raw
            .replace('\0', "")
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|term| !term.is_empty())
            .map(|term| {
                if case_sensitive {
                    term.to_string()
                } else {
                    term.to_lowercase()
                }
            })
            .collect();

        Self {
            terms,
            case_sensitive,
        }
    }

    /// A query with no terms matches everything.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn matches(&self, note: &Note) -> bool {
        if self.case_sensitive {
            self.terms
                .iter()
                .all(|term| note.title.contains(term.as_str()) || note.content.contains(term.as_str()))
        } else {
            let title = note.title.to_lowercase();
            let content = note.content.to_lowercase();
            self.terms
                .iter()
                .all(|term| title.contains(term.as_str()) || content.contains(term.as_str()))
        }
    }

    /// Keep the notes that match, preserving order.
    pub fn filter(&self, notes: Vec<Note>) -> Vec<Note> {
        if self.is_empty() {
            return notes;
        }
        notes.into_iter().filter(|note| self.matches(note)).collect()
    }
}
