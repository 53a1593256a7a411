use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// IDs of the built-in filter lists, assigned from zero downward. Kept in
/// sync with the admin UI's constants.
pub const CUSTOM_LIST_ID: i64 = 0;
pub const SYS_HOSTS_LIST_ID: i64 = -1;
pub const BLOCKED_SVCS_LIST_ID: i64 = -2;
pub const PARENTAL_LIST_ID: i64 = -3;
pub const SAFE_BROWSING_LIST_ID: i64 = -4;
pub const SAFE_SEARCH_LIST_ID: i64 = -5;

/// One source of filtering rules: inline rule text, a rules file, or both
/// empty (in which case the source is skipped at build time).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterListSource {
    pub id: i64,

    /// Rule lines separated by `\n`. Takes precedence over `file_path`.
    #[serde(skip)]
    pub data: String,

    /// Path to a rules file.
    #[serde(skip)]
    pub file_path: Option<PathBuf>,
}

impl FilterListSource {
    pub fn from_data(id: i64, data: impl Into<String>) -> Self {
        Self {
            id,
            data: data.into(),
            file_path: None,
        }
    }

    pub fn from_file(id: i64, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            data: String::new(),
            file_path: Some(path.into()),
        }
    }
}
