use serde::{Deserialize, Serialize};

/// Parameters for list/query operations.
#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    /// Maximum number of results to return.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Offset for pagination.
    #[serde(default)]
    pub offset: usize,

    /// Sort column; a leading `-` sorts descending (`-id`).
    #[serde(default)]
    pub sort: Option<String>,
}

fn default_limit() -> usize {
    50
}

/// Upper bound applied to client-supplied limits.
pub const MAX_LIMIT: usize = 500;

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
            sort: None,
        }
    }
}

impl ListParams {
    /// The requested limit, clamped to `1..=MAX_LIMIT`.
    pub fn effective_limit(&self) -> usize {
        self.limit.clamp(1, MAX_LIMIT)
    }

    /// Split `sort` into a column name and a descending flag.
    pub fn sort_column(&self) -> Option<(&str, bool)> {
        let sort = self.sort.as_deref()?.trim();
        if sort.is_empty() {
            return None;
        }
        match sort.strip_prefix('-') {
            Some(column) => Some((column, true)),
            None => Some((sort, false)),
        }
    }
}

/// Result wrapper for list operations.
#[derive(Debug, Clone, Serialize)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total: usize,
}
