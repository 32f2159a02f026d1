//! Status palette editing
//!
//! CRUD over the status name → color pair mapping. Rooms are never
//! rewritten: a renamed or deleted status leaves rooms pointing at the old
//! name, and those render with the fallback colors.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{StatusColors, StatusMap};

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("valid color pattern"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaletteError {
    #[error("Status name cannot be empty")]
    EmptyName,

    #[error("Invalid color '{0}', expected #RRGGBB or #AARRGGBB")]
    InvalidColor(String),

    #[error("Unknown status: {0}")]
    UnknownStatus(String),
}

pub fn is_valid_color(color: &str) -> bool {
    HEX_COLOR.is_match(color)
}

fn validate(name: &str, colors: &StatusColors) -> Result<(), PaletteError> {
    if name.trim().is_empty() {
        return Err(PaletteError::EmptyName);
    }
    for color in [&colors.bg, &colors.text] {
        if !is_valid_color(color) {
            return Err(PaletteError::InvalidColor(color.clone()));
        }
    }
    Ok(())
}

/// Add a status; an existing name gets its colors replaced
pub fn add_status(statuses: &mut StatusMap, name: &str, colors: StatusColors) -> Result<(), PaletteError> {
    validate(name, &colors)?;
    statuses.insert(name.trim(), colors);
    Ok(())
}

/// Replace `old` with `new` and new colors
///
/// The new key is appended at the end, like a fresh insert.
pub fn rename_status(
    statuses: &mut StatusMap,
    old: &str,
    new: &str,
    colors: StatusColors,
) -> Result<(), PaletteError> {
    validate(new, &colors)?;
    if !statuses.contains(old) {
        return Err(PaletteError::UnknownStatus(old.to_string()));
    }
    statuses.remove(old);
    statuses.insert(new.trim(), colors);
    Ok(())
}

/// Remove a status key; rooms referencing it are left alone
pub fn remove_status(statuses: &mut StatusMap, name: &str) -> Result<StatusColors, PaletteError> {
    statuses
        .remove(name)
        .ok_or_else(|| PaletteError::UnknownStatus(name.to_string()))
}
