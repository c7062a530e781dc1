use std::path::{Component, Path};

use crate::TransferError;

/// Validates that a requested stored-file name is a single plain path
/// component inside the storage directory.
///
/// Rejects:
/// - Empty names
/// - Any separator (`/` or `\`), so no nested or absolute paths
/// - `.` and `..`
/// - Windows prefix components (`C:`)
pub fn validate_stored_name(name: &str) -> Result<(), TransferError> {
    if name.is_empty() {
        return Err(TransferError::InvalidName("empty name".into()));
    }

    if name.contains(['/', '\\']) {
        return Err(TransferError::InvalidName(format!(
            "path separators not allowed: {name}"
        )));
    }

    if name.contains('\0') {
        return Err(TransferError::InvalidName("NUL byte not allowed".into()));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        (Some(Component::CurDir | Component::ParentDir), None) => Err(
            TransferError::InvalidName(format!("directory reference not allowed: {name}")),
        ),
        (Some(Component::Prefix(_)), _) => Err(TransferError::InvalidName(format!(
            "path prefix not allowed: {name}"
        ))),
        _ => Err(TransferError::InvalidName(format!("not a plain file name: {name}"))),
    }
}
