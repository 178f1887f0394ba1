use super::ApiError;
use crate::constants::limits;
use crate::storage::path_guard;

/// Checks an id taken from a path segment or query string.
///
/// Missing or oversized ids are a validation failure; ids that could escape a
/// storage directory are reported as forbidden.
pub fn validate_video_id(id: Option<&str>) -> Result<&str, ApiError> {
    let id = id.map(str::trim).unwrap_or_default();

    if id.is_empty() {
        return Err(ApiError::validation("Video ID is required"));
    }

    if id.chars().count() > limits::MAX_ID_CHARS {
        return Err(ApiError::validation(format!(
            "Video ID must be {} characters or less",
            limits::MAX_ID_CHARS
        )));
    }

    path_guard::validate_file_name(id).map_err(|e| ApiError::Forbidden(e.to_string()))?;

    Ok(id)
}
