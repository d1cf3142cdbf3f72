use std::fs::create_dir_all;
use std::path::Path;

use tracing::debug;
use tracing::error;

use crate::Result;

/// Creates `dir` and its parents unless it already exists
pub fn create_dir_if_not_exist(dir: &Path) -> Result<()> {
    if dir.exists() {
        return Ok(());
    }
    if let Err(e) = create_dir_all(dir) {
        error!("Failed to create directory {:?}: {:?}", dir, e);
        return Err(e.into());
    }
    debug!("created directory {:?}", dir);
    Ok(())
}
