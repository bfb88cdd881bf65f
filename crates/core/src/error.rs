use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcClientError {
    #[error("failed to encode rpc argument: {0}")]
    Serialization(String),

    #[error("{code}: {message}")]
    Protocol { code: i64, message: String },

    #[error("failed to decode rpc response body")]
    Decode(#[from] serde_json::Error),

    #[error("all {attempts} transport attempts failed")]
    RetryExhausted { attempts: u32 },

    #[error("cannot call an unbound root handle; bind a method name first")]
    MethodMissing,

    #[error("invalid service url: {0}")]
    InvalidUrl(String),

    #[error("service url has no rpc credentials")]
    MissingCredentials,

    #[error("failed to build http client")]
    HttpClient(#[from] reqwest::Error),
}

impl RpcClientError {
    /// True for errors reported by the remote service inside a well-formed
    /// response envelope, as opposed to local or transport-level failures.
    pub fn is_protocol(&self) -> bool {
        matches!(self, RpcClientError::Protocol { .. })
    }
}
