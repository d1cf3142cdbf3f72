use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct LoggingConfig {
    /// Directory of `eventrouter.log`; logs go to stdout when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Emit JSON formatted log lines
    #[serde(default)]
    pub json: bool,
}
