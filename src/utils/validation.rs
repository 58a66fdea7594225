use crate::utils::error::{LibraryError, Result};

/// Field delimiter of the flat-file record format.
pub const FIELD_DELIMITER: char = '|';

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LibraryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(LibraryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LibraryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 檢查欄位能否寫成單行記錄
pub fn validate_record_field(field_name: &str, value: &str) -> Result<()> {
    if value.contains(FIELD_DELIMITER) {
        return Err(LibraryError::InvalidField {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("must not contain '{}'", FIELD_DELIMITER),
        });
    }

    if value.contains(['\n', '\r']) {
        return Err(LibraryError::InvalidField {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "must not contain line breaks".to_string(),
        });
    }

    Ok(())
}

/// Same as [`validate_record_field`], and the value must also be non-empty
/// since it is used as a key.
pub fn validate_record_key(field_name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(LibraryError::InvalidField {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "cannot be empty".to_string(),
        });
    }
    validate_record_field(field_name, value)
}
