//! Error types for injected and registration faults.

use thiserror::Error;

/// Errors surfaced by anomaly registration and execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnomalyError {
    /// The deliberately injected failure. Never indicates a real defect.
    #[error("Anomalous fault injected on route {route}")]
    Anomalous { route: String },

    /// A registration request could not be converted into an anomaly.
    #[error("Registration error: {0}")]
    Registration(String),

    /// Trigger options outside their valid range.
    #[error("Invalid anomaly options: {0}")]
    InvalidOptions(String),

    /// Every fault collected during one sequential run.
    #[error("{} anomalies failed", .0.len())]
    Aggregate(Vec<AnomalyError>),
}

impl AnomalyError {
    /// Creates an injected fault for a route.
    pub fn anomalous(route: impl Into<String>) -> Self {
        Self::Anomalous { route: route.into() }
    }

    /// Creates a registration error.
    pub fn registration(msg: impl std::fmt::Display) -> Self {
        Self::Registration(msg.to_string())
    }

    /// True for injected faults, including aggregates made only of them.
    pub fn is_anomalous(&self) -> bool {
        match self {
            Self::Anomalous { .. } => true,
            Self::Aggregate(errors) => !errors.is_empty() && errors.iter().all(|e| e.is_anomalous()),
            _ => false,
        }
    }

    /// Folds the fault list of a sequential run into a single result.
    ///
    /// An empty list is success; a single fault is returned as-is.
    pub fn aggregate(mut errors: Vec<AnomalyError>) -> Result<(), AnomalyError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Self::Aggregate(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_empty_is_ok() {
        assert!(AnomalyError::aggregate(Vec::new()).is_ok());
    }

    #[test]
    fn test_aggregate_single_unwraps() {
        let err = AnomalyError::aggregate(vec![AnomalyError::anomalous("/orders")]).unwrap_err();
        assert_eq!(err, AnomalyError::anomalous("/orders"));
    }

    #[test]
    fn test_aggregate_many() {
        let err = AnomalyError::aggregate(vec![
            AnomalyError::anomalous("*"),
            AnomalyError::anomalous("/orders"),
        ])
        .unwrap_err();

        assert!(err.is_anomalous());
        assert_eq!(err.to_string(), "2 anomalies failed");
    }

    #[test]
    fn test_registration_is_not_anomalous() {
        assert!(!AnomalyError::registration("unknown kind").is_anomalous());
    }
}
