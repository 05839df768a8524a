use reqwest::StatusCode;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum TimecardError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("base64 decoding failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Settings incomplete, missing: {}", .0.join(", "))]
    IncompleteSettings(Vec<String>),

    #[error("Credentials are PIN protected; a PIN is required to unlock them")]
    CredentialsLocked,

    #[error("Credential cipher error: {0}")]
    Crypto(String),

    #[error("Upstream rejected the entry with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

impl From<figment::Error> for TimecardError {
    fn from(e: figment::Error) -> Self {
        TimecardError::Config(Box::new(e))
    }
}

impl TimecardError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        TimecardError::InvalidInput(msg.into())
    }

    /// Short message suitable for a notification line or the session log.
    pub fn user_message(&self) -> String {
        match self {
            TimecardError::InvalidInput(msg) => msg.clone(),
            TimecardError::IncompleteSettings(fields) => format!(
                "Settings incomplete, run `configure` to set: {}",
                fields.join(", ")
            ),
            TimecardError::CredentialsLocked => {
                "Credentials are locked, provide the PIN with --pin or CWM_PIN".to_string()
            }
            TimecardError::Crypto(_) => {
                "Could not unlock credentials (wrong PIN or corrupted settings)".to_string()
            }
            TimecardError::Rejected { status, message } => format!("Error {status}: {message}"),
            TimecardError::Reqwest(e) if e.is_timeout() => {
                "Error: request timed out before ConnectWise answered".to_string()
            }
            TimecardError::Reqwest(e) if e.is_connect() => {
                "Error: could not connect to ConnectWise".to_string()
            }
            TimecardError::Reqwest(e) => format!("Error: {e}"),
            TimecardError::UrlParse(e) => format!("Error: invalid site URL ({e})"),
            TimecardError::Json(e) => format!("Error: malformed JSON ({e})"),
            TimecardError::Io(e) => format!("Error: {e}"),
            TimecardError::Config(e) => format!("Error: configuration ({e})"),
            TimecardError::Base64(_) => {
                "Could not unlock credentials (corrupted settings)".to_string()
            }
        }
    }
}

/// Pick the most useful message out of a failed response body: the JSON
/// `message` field, the raw text, or the status reason.
pub fn upstream_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(msg) = value.get("message").and_then(|m| m.as_str())
        && !msg.is_empty()
    {
        return msg.to_string();
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_field_wins_over_raw_body() {
        let body = r#"{"code":"InvalidObject","message":"chargeToId is not valid"}"#;
        assert_eq!(
            upstream_message(StatusCode::BAD_REQUEST, body),
            "chargeToId is not valid"
        );
    }

    #[test]
    fn raw_text_used_when_body_is_not_json() {
        assert_eq!(
            upstream_message(StatusCode::BAD_GATEWAY, "  upstream down \n"),
            "upstream down"
        );
    }

    #[test]
    fn json_without_message_falls_back_to_raw_text() {
        let body = r#"{"code":"Unauthorized"}"#;
        assert_eq!(upstream_message(StatusCode::UNAUTHORIZED, body), body);
    }

    #[test]
    fn empty_body_uses_status_reason() {
        assert_eq!(upstream_message(StatusCode::FORBIDDEN, ""), "Forbidden");
    }

    #[test]
    fn rejected_user_message_carries_status() {
        let err = TimecardError::Rejected {
            status: 400,
            message: "bad ticket".to_string(),
        };
        assert_eq!(err.user_message(), "Error 400: bad ticket");
    }

    #[test]
    fn incomplete_settings_lists_fields() {
        let err = TimecardError::IncompleteSettings(vec![
            "member_id".to_string(),
            "private_key".to_string(),
        ]);
        assert!(err.user_message().contains("member_id, private_key"));
    }
}
