//! Containment checks for every path the service reads or writes.
//!
//! Relative paths only get the character checks. Absolute paths are resolved
//! (following symlinks on the part that already exists) and must lie under the
//! resolved base directory.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Characters that never appear in a path handled by the service.
pub const BLOCKED_CHARACTERS: &[char] = &[
    '|', '&', ';', '`', '$', '(', ')', '{', '}', '[', ']', '*', '?', '\\',
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecurityError {
    #[error("path is empty")]
    EmptyPath,

    #[error("path traversal attempt in {0}")]
    Traversal(String),

    #[error("path {path} contains blocked character {character:?}")]
    BlockedCharacter { character: char, path: String },

    #[error("path {path} is outside of {base}")]
    OutsideBase { path: String, base: String },

    #[error("cannot resolve {path}: {reason}")]
    Unresolvable { path: String, reason: String },

    #[error("invalid file name {0:?}")]
    InvalidFileName(String),
}

/// Rejects empty input, `..` anywhere and any blocked character.
pub fn check_characters(path: &str) -> Result<(), SecurityError> {
    if path.is_empty() {
        return Err(SecurityError::EmptyPath);
    }

    if path.contains("..") {
        return Err(SecurityError::Traversal(path.to_string()));
    }

    if let Some(character) = path.chars().find(|c| BLOCKED_CHARACTERS.contains(c)) {
        return Err(SecurityError::BlockedCharacter {
            character,
            path: path.to_string(),
        });
    }

    Ok(())
}

/// Validates `path` against `base`.
///
/// # Examples
///
/// ```rust
/// use gooji::storage::path_guard::{validate, SecurityError};
/// use std::path::Path;
///
/// let base = std::env::temp_dir();
/// assert!(validate(Path::new("uploads/clip.mp4"), &base).is_ok());
/// assert!(matches!(
///     validate(Path::new("../etc/passwd"), &base),
///     Err(SecurityError::Traversal(_))
/// ));
/// ```
pub fn validate(path: &Path, base: &Path) -> Result<(), SecurityError> {
    check_characters(&path.to_string_lossy())?;

    if path.is_absolute() {
        let resolved = resolve(path)?;
        let resolved_base = resolve(base)?;

        if !resolved.starts_with(&resolved_base) {
            return Err(SecurityError::OutsideBase {
                path: resolved.display().to_string(),
                base: resolved_base.display().to_string(),
            });
        }
    }

    Ok(())
}

/// A record id or file name must be exactly one normal path component.
pub fn validate_file_name(name: &str) -> Result<(), SecurityError> {
    check_characters(name)?;

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(()),
        _ => Err(SecurityError::InvalidFileName(name.to_string())),
    }
}

/// Makes `path` absolute and canonicalizes its deepest existing ancestor,
/// re-appending the components that do not exist yet.
pub fn resolve(path: &Path) -> Result<PathBuf, SecurityError> {
    let absolute = std::path::absolute(path).map_err(|e| SecurityError::Unresolvable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut missing: Vec<OsString> = Vec::new();
    let mut cursor = absolute.as_path();

    loop {
        if let Ok(canonical) = cursor.canonicalize() {
            let mut resolved = canonical;
            for part in missing.iter().rev() {
                resolved.push(part);
            }
            return Ok(resolved);
        }

        match (cursor.file_name(), cursor.parent()) {
            (Some(name), Some(parent)) => {
                missing.push(name.to_os_string());
                cursor = parent;
            }
            _ => return Ok(absolute),
        }
    }
}
