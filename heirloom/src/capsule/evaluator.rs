//! Unlock Rule Evaluator
//!
//! Pure decision function for capsule release. Given an externally supplied
//! current time, the owner's last liveness timestamp, the rule set and the
//! number of accumulated approvals, it decides whether any trigger condition
//! holds and reports which one fired. It owns no state and performs no side
//! effects, so the state-transition code can treat it as a black box and
//! tests can exercise it in isolation.

use crate::types::capsule_types::{Timestamp, UnlockRules, UnlockTrigger};

/// Evaluate the three unlock triggers against a snapshot
///
/// The triggers are combined by disjunction and checked in a fixed order
/// (time-lock, inactivity, quorum); the order only affects which trigger is
/// reported, never whether the capsule unlocks.
///
/// - Time-lock fires once `now` reaches the configured timestamp.
/// - Inactivity fires once `now` is strictly past `last_activity_ts` plus
///   the configured timeout.
/// - Quorum fires once `approved_count` reaches a non-zero threshold; a
///   threshold of zero disables the trigger entirely.
pub fn evaluate(
    now: Timestamp,
    last_activity_ts: Timestamp,
    rules: &UnlockRules,
    approved_count: u32,
) -> Option<UnlockTrigger> {
    if let Some(time_lock_at) = rules.time_lock_at {
        if now >= time_lock_at {
            return Some(UnlockTrigger::TimeLock);
        }
    }

    if let Some(timeout) = rules.inactivity_timeout {
        if now > last_activity_ts.saturating_add(timeout) {
            return Some(UnlockTrigger::Inactivity);
        }
    }

    if rules.approval_threshold > 0 && approved_count >= rules.approval_threshold {
        return Some(UnlockTrigger::Quorum);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(
        time_lock_at: Option<Timestamp>,
        inactivity_timeout: Option<u64>,
        approval_threshold: u32,
    ) -> UnlockRules {
        UnlockRules {
            time_lock_at,
            inactivity_timeout,
            approval_threshold,
        }
    }

    #[test]
    fn all_triggers_disabled_never_fires() {
        let r = UnlockRules::disabled();
        for now in [0, 1, 1_000, u64::MAX] {
            assert_eq!(evaluate(now, 0, &r, 0), None);
            assert_eq!(evaluate(now, 0, &r, 100), None);
        }
    }

    #[test]
    fn time_lock_boundary_is_inclusive() {
        let r = rules(Some(1000), None, 0);
        assert_eq!(evaluate(999, 0, &r, 0), None);
        assert_eq!(evaluate(1000, 0, &r, 0), Some(UnlockTrigger::TimeLock));
        assert_eq!(evaluate(1001, 0, &r, 0), Some(UnlockTrigger::TimeLock));
    }

    #[test]
    fn inactivity_boundary_is_strict() {
        let r = rules(None, Some(1000), 0);
        assert_eq!(evaluate(1000, 0, &r, 0), None);
        assert_eq!(evaluate(1001, 0, &r, 0), Some(UnlockTrigger::Inactivity));
    }

    #[test]
    fn inactivity_tracks_last_activity() {
        let r = rules(None, Some(100), 0);
        assert_eq!(evaluate(150, 100, &r, 0), None);
        assert_eq!(evaluate(201, 100, &r, 0), Some(UnlockTrigger::Inactivity));
    }

    #[test]
    fn inactivity_deadline_saturates() {
        let r = rules(None, Some(u64::MAX), 0);
        assert_eq!(evaluate(u64::MAX, 1, &r, 0), None);
    }

    #[test]
    fn quorum_fires_at_threshold() {
        let r = rules(None, None, 2);
        assert_eq!(evaluate(0, 0, &r, 0), None);
        assert_eq!(evaluate(0, 0, &r, 1), None);
        assert_eq!(evaluate(0, 0, &r, 2), Some(UnlockTrigger::Quorum));
        assert_eq!(evaluate(0, 0, &r, 3), Some(UnlockTrigger::Quorum));
    }

    #[test]
    fn zero_threshold_never_fires_on_approvals() {
        let r = rules(None, None, 0);
        assert_eq!(evaluate(u64::MAX, 0, &r, u32::MAX), None);
    }

    #[test]
    fn first_satisfied_trigger_is_reported() {
        // Both time lock and quorum hold; the time lock is reported.
        let r = rules(Some(10), None, 1);
        assert_eq!(evaluate(10, 0, &r, 1), Some(UnlockTrigger::TimeLock));

        // Only quorum holds.
        assert_eq!(evaluate(5, 0, &r, 1), Some(UnlockTrigger::Quorum));
    }
}
