use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started: String,
    pub finished: String,
    pub pages_visited: usize,
    pub pdfs_saved: Vec<PathBuf>,
    /// `None` when conversion was not requested.
    pub html_written: Option<Vec<PathBuf>>,
}
