use crate::scheduling::ScheduleStatus;

/// Service for managing schedule status transitions
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Booked → InUse, Locked, Maintenance, Cancelled
    /// - InUse → Finished, Cancelled
    /// - Locked → Booked, InUse, Maintenance, Cancelled
    /// - Maintenance → Booked, Locked
    /// - Finished → (terminal, no transitions)
    /// - Cancelled → (terminal, no transitions)
    /// - Any status → Same status (idempotent)
    pub fn is_valid_transition(from: ScheduleStatus, to: ScheduleStatus) -> bool {
        // Same status is always valid (idempotent)
        if from == to {
            return true;
        }

        match (from, to) {
            // From Booked
            (ScheduleStatus::Booked, ScheduleStatus::InUse) => true,
            (ScheduleStatus::Booked, ScheduleStatus::Locked) => true,
            (ScheduleStatus::Booked, ScheduleStatus::Maintenance) => true,
            (ScheduleStatus::Booked, ScheduleStatus::Cancelled) => true,

            // From InUse
            (ScheduleStatus::InUse, ScheduleStatus::Finished) => true,
            (ScheduleStatus::InUse, ScheduleStatus::Cancelled) => true,

            // From Locked
            (ScheduleStatus::Locked, ScheduleStatus::Booked) => true,
            (ScheduleStatus::Locked, ScheduleStatus::InUse) => true,
            (ScheduleStatus::Locked, ScheduleStatus::Maintenance) => true,
            (ScheduleStatus::Locked, ScheduleStatus::Cancelled) => true,

            // From Maintenance
            (ScheduleStatus::Maintenance, ScheduleStatus::Booked) => true,
            (ScheduleStatus::Maintenance, ScheduleStatus::Locked) => true,

            // Terminal statuses never transition (except to themselves, handled above)
            (ScheduleStatus::Finished, _) => false,
            (ScheduleStatus::Cancelled, _) => false,

            // All other transitions are invalid
            _ => false,
        }
    }

    /// Attempt to transition from one status to another
    ///
    /// # Returns
    /// `Ok(to)` if the transition is valid, `Err(message)` otherwise
    pub fn transition(from: ScheduleStatus, to: ScheduleStatus) -> Result<ScheduleStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(format!(
                "Invalid status transition from {} to {}",
                from, to
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booked_transitions() {
        assert!(StatusMachine::is_valid_transition(
            ScheduleStatus::Booked,
            ScheduleStatus::InUse
        ));
        assert!(StatusMachine::is_valid_transition(
            ScheduleStatus::Booked,
            ScheduleStatus::Cancelled
        ));
        assert!(!StatusMachine::is_valid_transition(
            ScheduleStatus::Booked,
            ScheduleStatus::Finished
        ));
    }

    #[test]
    fn test_in_use_transitions() {
        assert!(StatusMachine::is_valid_transition(
            ScheduleStatus::InUse,
            ScheduleStatus::Finished
        ));
        assert!(StatusMachine::is_valid_transition(
            ScheduleStatus::InUse,
            ScheduleStatus::Cancelled
        ));
        assert!(!StatusMachine::is_valid_transition(
            ScheduleStatus::InUse,
            ScheduleStatus::Booked
        ));
    }

    #[test]
    fn test_terminal_statuses_are_frozen() {
        for to in [
            ScheduleStatus::Booked,
            ScheduleStatus::InUse,
            ScheduleStatus::Locked,
            ScheduleStatus::Maintenance,
        ] {
            assert!(!StatusMachine::is_valid_transition(
                ScheduleStatus::Finished,
                to
            ));
            assert!(!StatusMachine::is_valid_transition(
                ScheduleStatus::Cancelled,
                to
            ));
        }
    }

    #[test]
    fn test_idempotent_transitions() {
        for s in [
            ScheduleStatus::Booked,
            ScheduleStatus::Finished,
            ScheduleStatus::Cancelled,
        ] {
            assert!(StatusMachine::is_valid_transition(s, s));
        }
    }

    #[test]
    fn test_transition_error_message() {
        let err = StatusMachine::transition(ScheduleStatus::Finished, ScheduleStatus::InUse)
            .unwrap_err();
        assert!(err.contains("finished"));
        assert!(err.contains("in-use"));
    }
}
