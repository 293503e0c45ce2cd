use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// The platform answered but reported failure (non-zero code or non-2xx status).
    #[error("Remote error: code={code}, msg={message}, request_id={}", .request_id.as_deref().unwrap_or("-"))]
    Remote {
        code: i64,
        message: String,
        request_id: Option<String>,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),
}

impl BridgeError {
    /// Platform response code, when the failure came from the platform itself.
    pub fn code(&self) -> Option<i64> {
        match self {
            BridgeError::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            BridgeError::Remote { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }
}

/// Problems with a single inbound event. Never escalated past the router; they degrade to a skip or a fallback.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Malformed event: missing {0}")]
    MissingField(&'static str),
}

/// Broadcast failures. Only `Listing` aborts a broadcast; `Send` is recorded per conversation.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to list joined conversations: {0}")]
    Listing(#[source] BridgeError),

    #[error("Failed to send to conversation {conversation_id}: {source}")]
    Send {
        conversation_id: String,
        #[source]
        source: BridgeError,
    },
}

pub type Result<T> = std::result::Result<T, BridgeError>;
