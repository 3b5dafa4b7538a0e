use thiserror::Error;

/// Error raised by a thread or inbox operation.
///
/// Every variant carries owned strings only so the error can be stored in UI
/// state (the thread's error banner) and cloned into views.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThreadError {
    // ── Validation errors ────────────────────────────────────────────────────
    #[error("An edited message cannot be empty")]
    EmptyEdit,

    #[error("Attachments cannot be changed while editing a message")]
    AttachmentWhileEditing,

    #[error("Message {id} is not part of this conversation")]
    MessageNotFound { id: String },

    #[error("Only your own messages can be edited or deleted")]
    NotMessageOwner,

    // ── Identity errors ──────────────────────────────────────────────────────
    #[error("You cannot start a conversation with yourself")]
    SelfConversation,

    #[error("Message {id} has no resolvable sender")]
    UnresolvedSender { id: String },

    // ── Network / API errors ─────────────────────────────────────────────────
    #[error("Could not reach the messaging service: {message}")]
    Network { message: String },

    #[error("Your session has expired, please sign in again")]
    Unauthorized,

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Request rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Messaging service error ({status})")]
    Server { status: u16 },

    #[error("Unexpected response from the messaging service: {message}")]
    Decode { message: String },

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ThreadError {
    pub fn network(message: impl Into<String>) -> Self {
        ThreadError::Network { message: message.into() }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        ThreadError::Decode { message: message.into() }
    }

    /// Maps a non-success HTTP status (and the response body, if any) to an error.
    pub fn from_status(status: u16, resource: &str, body: &str) -> Self {
        match status {
            401 | 403 => ThreadError::Unauthorized,
            404 => ThreadError::NotFound { resource: resource.to_string() },
            400..=499 => ThreadError::Rejected { status, detail: server_detail(body) },
            _ => ThreadError::Server { status },
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ThreadError::EmptyEdit
                | ThreadError::AttachmentWhileEditing
                | ThreadError::MessageNotFound { .. }
                | ThreadError::NotMessageOwner
        )
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, ThreadError::SelfConversation | ThreadError::UnresolvedSender { .. })
    }

    /// Whether repeating the same request later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ThreadError::Network { .. } | ThreadError::Server { .. })
    }
}

/// Extracts the human readable part of a REST error body.
///
/// Django REST framework answers with `{"detail": "..."}` or with field errors
/// such as `{"content": ["This field may not be blank."]}`.
fn server_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        let trimmed = body.trim();
        return if trimmed.is_empty() { "no details".to_string() } else { trimmed.to_string() };
    };

    if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
        return detail.to_string();
    }

    match value.as_object() {
        Some(fields) if !fields.is_empty() => fields
            .iter()
            .map(|(field, errors)| match errors {
                serde_json::Value::Array(items) => {
                    let joined: Vec<&str> = items.iter().filter_map(|i| i.as_str()).collect();
                    format!("{field}: {}", joined.join(" "))
                }
                serde_json::Value::String(s) => format!("{field}: {s}"),
                other => format!("{field}: {other}"),
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => value.to_string(),
    }
}
