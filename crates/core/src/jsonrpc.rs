use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::RpcClientError;

/// JSON-RPC protocol version spoken by the remote node.
pub const JSONRPC_VERSION: &str = "1.1";

/// Identifying string sent in the `User-Agent` header of every request.
pub const USER_AGENT: &str = "AuthServiceProxy/0.1";

/// Sentinel error code raised when a response envelope has a null `error`
/// but no `result` key at all.
pub const MISSING_RESULT_CODE: i64 = -343;

/// Decimal arguments are encoded as fixed-point numbers with this many
/// fractional digits.
pub const DECIMAL_PLACES: u32 = 8;

/// One outgoing JSON-RPC 1.1 request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub version: &'static str,
    pub method: String,
    pub params: Vec<Value>,
    pub id: u64,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Vec<Value>, id: u64) -> Self {
        Self {
            version: JSONRPC_VERSION,
            method: method.into(),
            params,
            id,
        }
    }
}

/// Error object reported by the remote service inside a response envelope.
///
/// Fields are defaulted rather than required; some nodes omit `code` or
/// `message` on internal errors.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// One incoming JSON-RPC response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
    // `result: null` must stay distinguishable from a missing `result` key:
    // null is a legitimate result, absence is a protocol violation.
    #[serde(default, deserialize_with = "present_value")]
    pub result: Option<Value>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl RpcResponse {
    /// Extracts the `result` value, mapping remote errors and a missing
    /// `result` key to [`RpcClientError::Protocol`].
    pub fn into_result(self) -> Result<Value, RpcClientError> {
        if let Some(err) = self.error {
            return Err(RpcClientError::Protocol {
                code: err.code,
                message: err.message,
            });
        }
        self.result.ok_or(RpcClientError::Protocol {
            code: MISSING_RESULT_CODE,
            message: "missing JSON-RPC result".to_owned(),
        })
    }
}

/// A positional argument for a remote call.
///
/// Most values pass through as plain JSON. Decimals are special-cased: they
/// encode as fixed-point numbers rounded to [`DECIMAL_PLACES`] fractional
/// digits, never as strings.
#[derive(Debug, Clone)]
pub enum RpcArg {
    Value(Value),
    Float(f64),
    Decimal(Decimal),
}

impl RpcArg {
    pub fn encode(&self) -> Result<Value, RpcClientError> {
        match self {
            RpcArg::Value(v) => Ok(v.clone()),
            RpcArg::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .ok_or_else(|| {
                    RpcClientError::Serialization(format!("{f} is not JSON serializable"))
                }),
            RpcArg::Decimal(d) => {
                let f = d.round_dp(DECIMAL_PLACES).to_f64().ok_or_else(|| {
                    RpcClientError::Serialization(format!("{d} is not JSON serializable"))
                })?;
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| {
                        RpcClientError::Serialization(format!("{d} is not JSON serializable"))
                    })
            }
        }
    }
}

impl From<Value> for RpcArg {
    fn from(v: Value) -> Self {
        RpcArg::Value(v)
    }
}

impl From<Decimal> for RpcArg {
    fn from(d: Decimal) -> Self {
        RpcArg::Decimal(d)
    }
}

impl From<f64> for RpcArg {
    fn from(f: f64) -> Self {
        RpcArg::Float(f)
    }
}

impl From<bool> for RpcArg {
    fn from(b: bool) -> Self {
        RpcArg::Value(Value::Bool(b))
    }
}

impl From<i64> for RpcArg {
    fn from(n: i64) -> Self {
        RpcArg::Value(Value::from(n))
    }
}

impl From<u64> for RpcArg {
    fn from(n: u64) -> Self {
        RpcArg::Value(Value::from(n))
    }
}

impl From<&str> for RpcArg {
    fn from(s: &str) -> Self {
        RpcArg::Value(Value::String(s.to_owned()))
    }
}

impl From<String> for RpcArg {
    fn from(s: String) -> Self {
        RpcArg::Value(Value::String(s))
    }
}

impl From<Vec<Value>> for RpcArg {
    fn from(vs: Vec<Value>) -> Self {
        RpcArg::Value(Value::Array(vs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn request_envelope_shape() {
        let req = RpcRequest::new("masternode.top", vec![json!(5)], 1);
        let encoded = serde_json::to_value(&req).unwrap();
        assert_eq!(
            encoded,
            json!({"version": "1.1", "method": "masternode.top", "params": [5], "id": 1})
        );
    }

    #[test]
    fn decimal_rounds_to_eight_places() {
        let arg = RpcArg::from(Decimal::from_str("1.123456789").unwrap());
        let encoded = arg.encode().unwrap();
        assert_eq!(serde_json::to_string(&encoded).unwrap(), "1.12345679");
    }

    #[test]
    fn decimal_encodes_as_number_not_string() {
        let arg = RpcArg::from(Decimal::from_str("0.1").unwrap());
        assert!(matches!(arg.encode().unwrap(), Value::Number(_)));
    }

    #[test]
    fn non_finite_float_is_a_serialization_error() {
        let err = RpcArg::from(f64::NAN).encode().unwrap_err();
        assert!(matches!(err, RpcClientError::Serialization(_)));
    }

    #[test]
    fn remote_error_takes_priority_over_result() {
        let response: RpcResponse = serde_json::from_str(
            r#"{"error": {"code": -32601, "message": "method not found"}, "result": null}"#,
        )
        .unwrap();
        let err = response.into_result().unwrap_err();
        match err {
            RpcClientError::Protocol { code, message } => {
                assert_eq!(code, -32601);
                assert_eq!(message, "method not found");
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn missing_result_key_raises_sentinel() {
        let response: RpcResponse = serde_json::from_str(r#"{"error": null}"#).unwrap();
        let err = response.into_result().unwrap_err();
        assert!(
            matches!(err, RpcClientError::Protocol { code, .. } if code == MISSING_RESULT_CODE)
        );
    }

    #[test]
    fn null_result_is_a_valid_result() {
        let response: RpcResponse =
            serde_json::from_str(r#"{"error": null, "result": null}"#).unwrap();
        assert_eq!(response.into_result().unwrap(), Value::Null);
    }

    #[test]
    fn result_passes_through_unmodified() {
        let response: RpcResponse =
            serde_json::from_str(r#"{"error": null, "result": {"height": 12345}}"#).unwrap();
        assert_eq!(response.into_result().unwrap(), json!({"height": 12345}));
    }

    #[test]
    fn tolerates_partial_error_objects() {
        let response: RpcResponse =
            serde_json::from_str(r#"{"error": {"message": "boom"}, "result": null}"#).unwrap();
        let err = response.into_result().unwrap_err();
        assert!(matches!(err, RpcClientError::Protocol { code: 0, .. }));
    }
}
