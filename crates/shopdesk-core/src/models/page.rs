use serde::{Deserialize, Serialize};

/// One page of a paginated list, as returned by the list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_pages: u32,
    /// Zero-based index of this page.
    pub number: u32,
    #[serde(default)]
    pub total_elements: Option<u64>,
    #[serde(default)]
    pub size: Option<u32>,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages
    }

    /// "Page 2 of 5" style label. Pages are shown one-based.
    pub fn label(&self) -> String {
        format!("Page {} of {}", self.number + 1, self.total_pages.max(1))
    }
}
