use thiserror::Error;

/// Error raised when an identifier cannot be embedded safely in a file name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid identifier '{value}'")]
pub struct IdentifierError {
    /// Offending value.
    pub value: String,
}

/// Returns `true` when `value` is non-empty, consists solely of ASCII
/// alphanumerics, `-`, `_` and `.`, and is not `.` or `..`.
#[must_use]
pub fn is_safe_identifier(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && value
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.'))
}

/// Validates `value` with [`is_safe_identifier`].
///
/// # Errors
///
/// Returns [`IdentifierError`] carrying the value when it is not file-name
/// safe.
pub fn validate_identifier(value: &str) -> Result<(), IdentifierError> {
    if is_safe_identifier(value) {
        Ok(())
    } else {
        Err(IdentifierError {
            value: value.to_owned(),
        })
    }
}
