//! Ordering sidecar
//!
//! Every folder with at least one child carries `.index.json`, a JSON array
//! of its children's encoded names in display order. Directory enumeration
//! order is not stable across filesystems, so this file is what makes the
//! display order survive a reload.

use crate::error::TreeError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Base name reserved for the sidecar. No tree member may use it.
pub const SIDECAR_STEM: &str = ".index";

/// File name of the sidecar inside a folder.
pub const SIDECAR_FILE: &str = ".index.json";

const SIDECAR_TMP: &str = ".index.tmp";

/// Result of reading a folder's sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidecarState {
    Missing,
    Malformed(String),
    Order(Vec<String>),
}

pub fn sidecar_path(dir: &Path) -> PathBuf {
    dir.join(SIDECAR_FILE)
}

/// True for entries that belong to the sidecar rather than the tree.
pub fn is_reserved_entry(path: &Path) -> bool {
    path.file_stem()
        .map(|stem| stem == SIDECAR_STEM)
        .unwrap_or(false)
}

pub fn read_order(dir: &Path) -> SidecarState {
    let path = sidecar_path(dir);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return SidecarState::Missing,
        Err(e) => return SidecarState::Malformed(e.to_string()),
    };
    match serde_json::from_str::<Vec<String>>(&content) {
        Ok(order) => SidecarState::Order(order),
        Err(e) => SidecarState::Malformed(e.to_string()),
    }
}

/// Replace the sidecar of `dir` with `order`, via a temporary file.
pub fn write_order(dir: &Path, order: &[String]) -> Result<(), TreeError> {
    let tmp = dir.join(SIDECAR_TMP);
    let target = sidecar_path(dir);
    let content = serde_json::to_vec(order)
        .map_err(|e| TreeError::Payload(format!("Failed to serialize sidecar: {}", e)))?;
    fs::write(&tmp, content).map_err(|e| TreeError::io(&tmp, e))?;
    fs::rename(&tmp, &target).map_err(|e| TreeError::io(&target, e))
}

/// Drop the sidecar of a folder that no longer has children.
pub fn remove(dir: &Path) -> Result<(), TreeError> {
    let path = sidecar_path(dir);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TreeError::io(path, e)),
    }
}

/// Stable sort of `items` by the position of their key in `order`.
/// Keys missing from `order` keep their relative order at the end.
pub fn sort_by_order<T>(items: &mut [T], order: &[String], key: impl Fn(&T) -> String) {
    items.sort_by_key(|item| {
        let k = key(item);
        order.iter().position(|name| *name == k).unwrap_or(usize::MAX)
    });
}
