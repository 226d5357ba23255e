use serde::{Deserialize, Serialize};

/// Body of a successful list response: one page plus the total match count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(rename = "totalRowCount", default)]
    pub total_row_count: usize,
}

impl<T> Default for ListResponse<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            total_row_count: 0,
        }
    }
}
