//! Fault-injection drills.

use thiserror::Error;

/// Returned when a scenario name does not match any drill.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown scenario: {0}")]
pub struct UnknownScenario(pub String);

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    /// DRL-001: Wildcard anomalies fire on every route, ahead of route-specific ones
    WildcardFanIn,

    /// DRL-002: Sequential runs record faults and keep going
    SequentialIsolation,

    /// DRL-003: Parallel runs propagate a fault after every anomaly finished
    ParallelPropagation,

    /// DRL-004: Clearing touches exactly one bucket
    ClearIsolation,

    /// DRL-005: Box-Muller samples match the requested mean and deviation
    DelayCalibration,

    /// DRL-006: Trigger policy fault and delay rates under steady load
    TriggerCalibration,

    /// DRL-007: Randomized execution order is a uniform permutation
    ShuffleFairness,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::WildcardFanIn,
            ScenarioId::SequentialIsolation,
            ScenarioId::ParallelPropagation,
            ScenarioId::ClearIsolation,
            ScenarioId::DelayCalibration,
            ScenarioId::TriggerCalibration,
            ScenarioId::ShuffleFairness,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::WildcardFanIn => "wildcard_fan_in",
            ScenarioId::SequentialIsolation => "sequential_isolation",
            ScenarioId::ParallelPropagation => "parallel_propagation",
            ScenarioId::ClearIsolation => "clear_isolation",
            ScenarioId::DelayCalibration => "delay_calibration",
            ScenarioId::TriggerCalibration => "trigger_calibration",
            ScenarioId::ShuffleFairness => "shuffle_fairness",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::WildcardFanIn => "Wildcard log + route delay, random routes, check fan-in order",
            ScenarioId::SequentialIsolation => "Exception, log, exception, delay on one route; log and delay still run",
            ScenarioId::ParallelPropagation => "Delay + exception + log launched together; call fails, side effects remain",
            ScenarioId::ClearIsolation => "Clear one route, an unknown route, then the wildcard",
            ScenarioId::DelayCalibration => "N(300, 120) samples, compare sample moments",
            ScenarioId::TriggerCalibration => "10% exceptions, 50% Gaussian delays, compare observed rates",
            ScenarioId::ShuffleFairness => "Three logs in random order, each leads a third of the time",
        }
    }

    /// Returns true if the drill asserts on sampled statistics.
    pub fn is_statistical(&self) -> bool {
        matches!(
            self,
            ScenarioId::DelayCalibration | ScenarioId::TriggerCalibration | ScenarioId::ShuffleFairness
        )
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = UnknownScenario;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wildcard_fan_in" | "wildcard" | "drl-001" => Ok(ScenarioId::WildcardFanIn),
            "sequential_isolation" | "sequential" | "drl-002" => Ok(ScenarioId::SequentialIsolation),
            "parallel_propagation" | "parallel" | "drl-003" => Ok(ScenarioId::ParallelPropagation),
            "clear_isolation" | "clear" | "drl-004" => Ok(ScenarioId::ClearIsolation),
            "delay_calibration" | "gaussian" | "drl-005" => Ok(ScenarioId::DelayCalibration),
            "trigger_calibration" | "trigger" | "drl-006" => Ok(ScenarioId::TriggerCalibration),
            "shuffle_fairness" | "shuffle" | "drl-007" => Ok(ScenarioId::ShuffleFairness),
            _ => Err(UnknownScenario(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>().unwrap(), scenario);
            assert_eq!(scenario.to_string(), scenario.name());
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("DRL-003".parse::<ScenarioId>().unwrap(), ScenarioId::ParallelPropagation);
        assert_eq!("Shuffle".parse::<ScenarioId>().unwrap(), ScenarioId::ShuffleFairness);
    }

    #[test]
    fn test_unknown_scenario() {
        let err = "split_brain".parse::<ScenarioId>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown scenario: split_brain");
    }

    #[test]
    fn test_statistical_subset() {
        let statistical: Vec<_> = ScenarioId::all().into_iter().filter(|s| s.is_statistical()).collect();
        assert_eq!(
            statistical,
            vec![
                ScenarioId::DelayCalibration,
                ScenarioId::TriggerCalibration,
                ScenarioId::ShuffleFairness
            ]
        );
    }
}
