use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("API Error: {status}{}", .detail.as_deref().map(|d| format!(" ({d})")).unwrap_or_default())]
    Status { status: u16, detail: Option<String> },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The backend's own message when it sent one, else the generic line.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            ApiError::Status { status, .. } => format!("API Error: {status}"),
            other => other.to_string(),
        }
    }
}

/// Pulls FastAPI's `{"detail": ...}` out of an error body.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body.trim()).ok()?;
    match value.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => {
            let msgs: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .map(str::to_string)
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_from_string_and_validation_list() {
        assert_eq!(
            extract_detail(r#"{"detail":"job not found"}"#).as_deref(),
            Some("job not found")
        );
        assert_eq!(
            extract_detail(r#"{"detail":[{"msg":"field required"},{"msg":"bad int"}]}"#)
                .as_deref(),
            Some("field required; bad int")
        );
        assert_eq!(extract_detail("<html>502</html>"), None);
        assert_eq!(extract_detail(r#"{"detail":""}"#), None);
    }

    #[test]
    fn display_and_user_message() {
        let plain = ApiError::Status {
            status: 503,
            detail: None,
        };
        assert_eq!(plain.to_string(), "API Error: 503");
        assert_eq!(plain.user_message(), "API Error: 503");

        let detailed = ApiError::Status {
            status: 400,
            detail: Some("unsupported file".to_string()),
        };
        assert_eq!(detailed.to_string(), "API Error: 400 (unsupported file)");
        assert_eq!(detailed.user_message(), "unsupported file");
        assert_eq!(detailed.status(), Some(400));
    }
}
