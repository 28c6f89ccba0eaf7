use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Binary,
}

/// Outcome of fetching and storing one path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedPage {
    pub path: String,
    pub url: String,
    pub status_code: u16,
    pub stored_name: String,
    pub save_path: String,
    pub kind: ContentKind,
    pub size: usize,
    pub links_found: Vec<String>,
}

impl FetchedPage {
    pub fn is_text(&self) -> bool {
        self.kind == ContentKind::Text
    }
}
