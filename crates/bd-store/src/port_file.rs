//! Port hand-off file.
//!
//! Some backend builds write the port they bound to `<tmp>/port.txt`. The UI
//! can read it as a fallback when the store has no endpoint yet.

use crate::{StoreError, StoreResult};

use std::path::Path;

pub const PORT_FILENAME: &str = "port.txt";

/// Read `port.txt` from the system temp directory.
pub fn read_temp_port_file() -> StoreResult<String> {
    read_port_file(&std::env::temp_dir())
}

/// Read `port.txt` from `dir`, trimmed of surrounding whitespace.
pub fn read_port_file(dir: &Path) -> StoreResult<String> {
    let path = dir.join(PORT_FILENAME);
    let content = std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
    Ok(content.trim().to_owned())
}
