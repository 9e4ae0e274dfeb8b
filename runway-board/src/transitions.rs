use serde::{Deserialize, Serialize};

use runway_core::{CoreError, CoreResult, FlightStatus};

/// Which status changes the board accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Any status may follow any other
    #[default]
    Permissive,
    /// REGISTRATION → BOARDING → DEPARTED, and any non-terminal status → CANCELLED
    Strict,
}

impl TransitionPolicy {
    pub fn allows(&self, from: FlightStatus, to: FlightStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => matches!(
                (from, to),
                (FlightStatus::Registration, FlightStatus::Boarding)
                    | (FlightStatus::Boarding, FlightStatus::Departed)
                    | (FlightStatus::Registration | FlightStatus::Boarding, FlightStatus::Cancelled)
            ),
        }
    }

    pub fn check(&self, from: FlightStatus, to: FlightStatus) -> CoreResult<()> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(CoreError::validation(format!("Cannot move flight from {from} to {to}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FlightStatus::*;

    #[test]
    fn test_permissive_allows_everything() {
        for from in FlightStatus::ALL {
            for to in FlightStatus::ALL {
                assert!(TransitionPolicy::Permissive.allows(from, to));
            }
        }
    }

    #[test]
    fn test_strict_follows_lifecycle() {
        let strict = TransitionPolicy::Strict;
        assert!(strict.allows(Registration, Boarding));
        assert!(strict.allows(Boarding, Departed));
        assert!(strict.allows(Registration, Cancelled));
        assert!(strict.allows(Boarding, Cancelled));

        assert!(!strict.allows(Registration, Departed));
        assert!(!strict.allows(Departed, Cancelled));
        assert!(!strict.allows(Cancelled, Registration));
        assert!(!strict.allows(Boarding, Boarding));
    }

    #[test]
    fn test_strict_violation_is_validation_error() {
        let err = TransitionPolicy::Strict.check(Departed, Boarding).unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }
}
