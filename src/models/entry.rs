use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EntryRef — One catalog listing discovered during enumeration
// ---------------------------------------------------------------------------

/// A catalog entry whose price history is sought.
///
/// `name` is the decoded display name and the dedup key; `url` is the
/// absolute listing page the history is fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRef {
    pub name: String,
    pub url: String,
}

impl EntryRef {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}
