use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Fallback message when the server rejects a request without saying why
pub const GENERIC_REJECTION: &str = "O servidor recusou a solicitação";

impl ApiError {
    /// Truncate a response body to avoid logging excessive data.
    /// Cuts on a char boundary; the body is UTF-8 with accented text.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..end],
            body.len()
        )
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            400..=403 => ApiError::Rejected(Self::rejection_message(&truncated)),
            404 => ApiError::NotFound(truncated),
            500..=599 => ApiError::ServerError(Self::rejection_message(&truncated)),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Pull the server's own message out of an error body when present,
    /// so it can be surfaced to the user verbatim.
    fn rejection_message(body: &str) -> String {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            #[serde(default)]
            message: Option<String>,
            #[serde(default)]
            error: Option<String>,
        }

        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
            if let Some(msg) = parsed.message.or(parsed.error) {
                if !msg.is_empty() {
                    return msg;
                }
            }
        }
        if body.is_empty() {
            GENERIC_REJECTION.to_string()
        } else {
            body.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_server_message() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        let err = ApiError::from_status(status, r#"{"error": "device_id required"}"#);
        assert_eq!(err.to_string(), "device_id required");
    }

    #[test]
    fn test_from_status_server_error() {
        let status = reqwest::StatusCode::INTERNAL_SERVER_ERROR;
        let err = ApiError::from_status(status, r#"{"status": "error", "message": "disk full"}"#);
        assert!(matches!(err, ApiError::ServerError(ref m) if m == "disk full"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        // A multibyte character straddling the truncation index must not
        // split mid-character
        let body = format!("{}ção de erro muito longa", "a".repeat(MAX_ERROR_BODY_LENGTH - 1));
        let err = ApiError::from_status(reqwest::StatusCode::BAD_REQUEST, &body);
        let message = err.to_string();
        assert!(message.contains("truncated"));
        assert!(message.contains(&format!("{} total bytes", body.len())));
    }

    #[test]
    fn test_empty_body_gets_generic_message() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        let err = ApiError::from_status(status, "");
        assert_eq!(err.to_string(), GENERIC_REJECTION);
    }
}
