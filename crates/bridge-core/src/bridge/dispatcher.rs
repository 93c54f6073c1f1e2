//! Command dispatcher
//!
//! Single entry point for the host side of the bridge: named commands with
//! JSON arguments, routed to the session and connection operations. The
//! recognized command set mirrors the host-facing plugin surface:
//! `deviceSetup`, `connect`, `disconnectAll`, `acceptConnection`,
//! `disconnectConnection`.
//!
//! Outcomes are immediate: either a validation error, an [`Ack`] for
//! operations that complete locally, or a [`Pending`] acknowledgment for
//! operations whose real outcome arrives later as an outward event.
//! Unknown command names are rejected with the non-fatal
//! `UnsupportedCommand` — the caller decides how to surface it.
//!
//! [`Ack`]: DispatchOutcome::Ack
//! [`Pending`]: DispatchOutcome::Pending

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{BridgeError, BridgeResult};

use super::TelephonyBridge;

/// Immediate result of a dispatched command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchOutcome {
    /// The operation completed locally
    Ack,
    /// The operation was handed to the backend; the terminal outcome
    /// arrives as an outward event
    Pending,
}

impl DispatchOutcome {
    /// Whether the real outcome is still to come on the event channel
    pub fn is_pending(&self) -> bool {
        matches!(self, DispatchOutcome::Pending)
    }
}

impl TelephonyBridge {
    /// Route a named command with JSON arguments
    ///
    /// Argument shapes follow the host convention: `deviceSetup` takes the
    /// token as a bare string, a one-element array, or `{"token": ...}`;
    /// `connect` takes an object of string parameters (or that object
    /// wrapped in a one-element array); the remaining commands take no
    /// arguments.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use callbridge_core::TelephonyBridge;
    /// # async fn example(bridge: &TelephonyBridge) -> callbridge_core::BridgeResult<()> {
    /// use serde_json::json;
    ///
    /// bridge.dispatch("deviceSetup", json!("tok123")).await?;
    /// bridge.dispatch("connect", json!({ "To": "+15551234567" })).await?;
    /// bridge.dispatch("disconnectConnection", json!(null)).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn dispatch(&self, command: &str, args: Value) -> BridgeResult<DispatchOutcome> {
        debug!(command, "dispatching command");
        match command {
            "deviceSetup" => {
                let token = token_from_args(&args)?;
                self.device_setup(&token).await?;
                Ok(DispatchOutcome::Pending)
            }
            "connect" => {
                let parameters = parameters_from_args(&args)?;
                self.connect(parameters).await?;
                Ok(DispatchOutcome::Pending)
            }
            "disconnectAll" => {
                match self.disconnect_all().await {
                    Ok(()) => {}
                    // Nothing active is success at this surface.
                    Err(BridgeError::NoActiveConnection) => {
                        info!("disconnectAll with no active connection");
                    }
                    Err(e) => return Err(e),
                }
                Ok(DispatchOutcome::Ack)
            }
            "acceptConnection" => {
                self.accept_connection().await?;
                Ok(DispatchOutcome::Ack)
            }
            "disconnectConnection" => {
                match self.disconnect_connection().await {
                    Ok(()) => {}
                    Err(BridgeError::NoActiveConnection) => {
                        info!("disconnectConnection with no active connection");
                    }
                    Err(e) => return Err(e),
                }
                Ok(DispatchOutcome::Ack)
            }
            other => Err(BridgeError::UnsupportedCommand {
                command: other.to_string(),
            }),
        }
    }
}

/// Pull the capability token out of the supported argument shapes
///
/// A missing or null token is an `InvalidToken` failure, matching the
/// empty-string case; shapes that cannot carry a token at all (numbers,
/// booleans) are `InvalidArguments`.
fn token_from_args(args: &Value) -> BridgeResult<String> {
    let candidate = match args {
        Value::String(s) => Some(s),
        Value::Null => None,
        Value::Array(items) => match items.first() {
            Some(Value::String(s)) => Some(s),
            Some(Value::Null) | None => None,
            Some(_) => {
                return Err(BridgeError::invalid_arguments(
                    "deviceSetup token must be a string",
                ))
            }
        },
        Value::Object(map) => match map.get("token") {
            Some(Value::String(s)) => Some(s),
            Some(Value::Null) | None => None,
            Some(_) => {
                return Err(BridgeError::invalid_arguments(
                    "deviceSetup token must be a string",
                ))
            }
        },
        _ => {
            return Err(BridgeError::invalid_arguments(
                "deviceSetup requires a token string",
            ))
        }
    };
    match candidate {
        Some(token) => Ok(token.clone()),
        None => Err(BridgeError::invalid_token("capability token is missing")),
    }
}

/// Pull connect parameters out of the supported argument shapes,
/// preserving the mapping's iteration order
fn parameters_from_args(args: &Value) -> BridgeResult<Vec<(String, String)>> {
    let object = match args {
        Value::Object(map) => Some(map),
        Value::Array(items) => items.first().and_then(|v| v.as_object()),
        Value::Null => None,
        _ => {
            return Err(BridgeError::invalid_arguments(
                "connect requires an object of string parameters",
            ))
        }
    };

    let Some(object) = object else {
        return Ok(Vec::new());
    };

    let mut parameters = Vec::with_capacity(object.len());
    for (key, value) in object {
        let Some(value) = value.as_str() else {
            return Err(BridgeError::invalid_arguments(format!(
                "connect parameter {:?} is not a string",
                key
            )));
        };
        parameters.push((key.clone(), value.to_string()));
    }
    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_accepts_host_argument_shapes() {
        assert_eq!(token_from_args(&json!("tok")).unwrap(), "tok");
        assert_eq!(token_from_args(&json!(["tok"])).unwrap(), "tok");
        assert_eq!(token_from_args(&json!({ "token": "tok" })).unwrap(), "tok");
    }

    #[test]
    fn missing_or_null_token_is_invalid_token() {
        for args in [json!(null), json!([null]), json!([]), json!({}), json!({ "token": null })] {
            assert!(
                matches!(token_from_args(&args), Err(BridgeError::InvalidToken { .. })),
                "args {:?} should be InvalidToken",
                args
            );
        }
    }

    #[test]
    fn malformed_token_shapes_are_invalid_arguments() {
        for args in [json!(42), json!(true), json!([7]), json!({ "token": 7 })] {
            assert!(
                matches!(
                    token_from_args(&args),
                    Err(BridgeError::InvalidArguments { .. })
                ),
                "args {:?} should be InvalidArguments",
                args
            );
        }
    }

    #[test]
    fn connect_parameters_keep_string_pairs() {
        let params = parameters_from_args(&json!({ "To": "+15551234567" })).unwrap();
        assert_eq!(
            params,
            vec![("To".to_string(), "+15551234567".to_string())]
        );

        let wrapped = parameters_from_args(&json!([{ "To": "x" }])).unwrap();
        assert_eq!(wrapped, vec![("To".to_string(), "x".to_string())]);

        assert!(parameters_from_args(&json!({ "To": 7 })).is_err());
        assert!(parameters_from_args(&json!("nope")).is_err());
        assert!(parameters_from_args(&json!(null)).unwrap().is_empty());
    }
}
