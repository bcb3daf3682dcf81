//! Registration payloads and their conversion into anomalies.
//!
//! This is the single seam between the wire format and the execution model:
//! the transport deserializes a [`RegisterAnomalyRequest`], calls
//! [`RegisterAnomalyRequest::to_anomaly`], and hands the result to the
//! registry.

use crate::anomaly::Anomaly;
use faultline_env::{AnomalyError, LogLevel, ALL_ROUTES_KEYWORD};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_route() -> String {
    ALL_ROUTES_KEYWORD.to_string()
}

/// A request to register one anomaly, tagged by `kind`.
///
/// ```json
/// { "kind": "DELAY", "route": "/orders", "delayMs": 50 }
/// { "kind": "LOG", "logLevel": "Warning", "message": "slow downstream" }
/// { "kind": "EXCEPTION", "route": "/orders" }
/// ```
///
/// `route` defaults to the wildcard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegisterAnomalyRequest {
    #[serde(rename_all = "camelCase")]
    Delay {
        #[serde(default = "default_route")]
        route: String,
        delay_ms: u64,
    },

    #[serde(rename_all = "camelCase")]
    Log {
        #[serde(default = "default_route")]
        route: String,
        #[serde(default)]
        log_level: LogLevel,
        #[serde(default)]
        message: String,
    },

    #[serde(rename_all = "camelCase")]
    Exception {
        #[serde(default = "default_route")]
        route: String,
    },
}

impl RegisterAnomalyRequest {
    /// Parses a JSON payload.
    ///
    /// Unknown or missing discriminators and malformed fields all surface as
    /// [`AnomalyError::Registration`].
    pub fn from_json(body: &str) -> Result<Self, AnomalyError> {
        serde_json::from_str(body).map_err(AnomalyError::registration)
    }

    /// The target route key.
    pub fn route(&self) -> &str {
        match self {
            Self::Delay { route, .. } | Self::Log { route, .. } | Self::Exception { route } => route,
        }
    }

    /// Converts into the matching anomaly variant.
    pub fn to_anomaly(&self) -> Result<Anomaly, AnomalyError> {
        let route = self.route();
        if route.trim().is_empty() {
            return Err(AnomalyError::registration("route must not be empty"));
        }

        let anomaly = match self {
            Self::Delay { delay_ms, .. } => Anomaly::delay(route, Duration::from_millis(*delay_ms)),
            Self::Log { log_level, message, .. } => Anomaly::log(route, *log_level, message.clone()),
            Self::Exception { .. } => Anomaly::exception(route),
        };

        Ok(anomaly)
    }
}

/// Body of a clear request. `route` defaults to the wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearAnomaliesRequest {
    #[serde(default = "default_route")]
    pub route: String,
}

impl Default for ClearAnomaliesRequest {
    fn default() -> Self {
        Self { route: default_route() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::AnomalyKind;

    #[test]
    fn test_delay_request() {
        let req = RegisterAnomalyRequest::from_json(r#"{"kind":"DELAY","route":"*","delayMs":50}"#).unwrap();
        let anomaly = req.to_anomaly().unwrap();

        assert_eq!(anomaly.route(), "*");
        assert_eq!(
            anomaly.kind(),
            &AnomalyKind::Delay {
                duration: Duration::from_millis(50)
            }
        );
    }

    #[test]
    fn test_route_defaults_to_wildcard() {
        let req = RegisterAnomalyRequest::from_json(r#"{"kind":"EXCEPTION"}"#).unwrap();
        assert_eq!(req.route(), ALL_ROUTES_KEYWORD);
        assert_eq!(req.to_anomaly().unwrap().kind(), &AnomalyKind::Exception);
    }

    #[test]
    fn test_log_request() {
        let req = RegisterAnomalyRequest::from_json(
            r#"{"kind":"LOG","route":"/orders","logLevel":"Warning","message":"slow downstream"}"#,
        )
        .unwrap();

        match req.to_anomaly().unwrap().kind() {
            AnomalyKind::Log { level, message } => {
                assert_eq!(*level, LogLevel::Warning);
                assert_eq!(message, "slow downstream");
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_unknown_discriminator_is_registration_fault() {
        let err = RegisterAnomalyRequest::from_json(r#"{"kind":"MELTDOWN","route":"*"}"#).unwrap_err();
        assert!(matches!(err, AnomalyError::Registration(_)));
    }

    #[test]
    fn test_missing_discriminator_is_registration_fault() {
        let err = RegisterAnomalyRequest::from_json(r#"{"route":"*"}"#).unwrap_err();
        assert!(matches!(err, AnomalyError::Registration(_)));
    }

    #[test]
    fn test_delay_without_duration_is_registration_fault() {
        let err = RegisterAnomalyRequest::from_json(r#"{"kind":"DELAY"}"#).unwrap_err();
        assert!(matches!(err, AnomalyError::Registration(_)));
    }

    #[test]
    fn test_empty_route_rejected() {
        let req = RegisterAnomalyRequest::Exception { route: "  ".to_string() };
        assert!(matches!(req.to_anomaly(), Err(AnomalyError::Registration(_))));
    }

    #[test]
    fn test_clear_request_default() {
        let req: ClearAnomaliesRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.route, "*");
    }
}
