use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Bind error on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Connection error to {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error during {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Peer unavailable during {context}.")]
    Unavailable { context: &'static str },
    #[error("Wire message exceeded max size ({max_bytes} bytes).")]
    WireMessageTooLarge { max_bytes: usize },
    #[error("Wire message was not valid UTF-8: {source}")]
    WireMessageInvalidUtf8 {
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("Serialization error during {context}: {source}")]
    Serialize {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Deserialization error during {context}: {source}")]
    Deserialize {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unexpected response to {request}: got {actual}.")]
    UnexpectedResponse {
        request: &'static str,
        actual: &'static str,
    },
    #[error("Remote error: {message}")]
    Remote { message: String },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}

impl RpcError {
    /// Maps an I/O error, folding the "peer went away" kinds into `Unavailable`.
    #[must_use]
    pub fn from_io(context: &'static str, source: std::io::Error) -> Self {
        if is_peer_gone(source.kind()) {
            RpcError::Unavailable { context }
        } else {
            RpcError::Io { context, source }
        }
    }

    /// Maps a failed connect; a refused or reset dial means the peer is gone.
    #[must_use]
    pub fn from_connect(addr: String, source: std::io::Error) -> Self {
        if is_peer_gone(source.kind()) {
            RpcError::Unavailable {
                context: "connect to worker",
            }
        } else {
            RpcError::Connection { addr, source }
        }
    }
}

const fn is_peer_gone(kind: std::io::ErrorKind) -> bool {
    matches!(
        kind,
        std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
    )
}
