pub mod admission;
pub mod client;
pub mod error;
pub mod jsonrpc;
pub mod transport;

pub use admission::AdmissionGate;
pub use client::{RetryPolicy, RpcClient};
pub use error::RpcClientError;
pub use jsonrpc::RpcArg;

pub type Result<T> = std::result::Result<T, error::RpcClientError>;
