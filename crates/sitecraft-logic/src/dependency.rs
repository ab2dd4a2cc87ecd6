//! Dependency evaluation — how an activity's prerequisites affect it.
//!
//! | Kind | Unmet partners | Effect |
//! |------|----------------|--------|
//! | `NONE` | — | nothing |
//! | `FS` | any listed id not completed | warning, +1 week, +1 BP |
//! | `SS` | any listed id not completed | informational warning only |
//!
//! The SS overlap bonus is separate from the warning: it depends on the
//! player's productivity, not on which partners are done.

use std::collections::HashSet;

use crate::catalog::{Activity, Dependency};
use crate::modifiers::Delta;

/// Penalty for starting an activity before its FS prerequisites finish.
pub const PREREQ_PENALTY: Delta = Delta { time: 1, cost: 1 };

/// Time change for an SS activity when the player is productive.
pub const OVERLAP_BONUS: i32 = -1;

/// Productivity needed for the overlap bonus.
pub const OVERLAP_MIN_PRODUCTIVITY: i32 = 1;

/// Result of checking one activity against the completed set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyCheck {
    pub penalty: Delta,
    pub warning: Option<String>,
}

impl DependencyCheck {
    /// True when the check carries the FS penalty.
    pub fn is_penalized(&self) -> bool {
        self.penalty != Delta::ZERO
    }
}

/// Evaluate `activity` against the ids the player has already completed.
pub fn evaluate(activity: &Activity, completed: &HashSet<&str>) -> DependencyCheck {
    match &activity.dep {
        Dependency::None => DependencyCheck::default(),
        Dependency::FinishToStart { on } => {
            let missing = unmet(on, completed);
            if missing.is_empty() {
                DependencyCheck::default()
            } else {
                DependencyCheck {
                    penalty: PREREQ_PENALTY,
                    warning: Some(format!("Prereq missing: {}", missing.join(", "))),
                }
            }
        }
        Dependency::StartToStart { with } => {
            let pending = unmet(with, completed);
            DependencyCheck {
                penalty: Delta::ZERO,
                warning: (!pending.is_empty())
                    .then(|| format!("Overlaps with {} (not yet completed)", pending.join(", "))),
            }
        }
    }
}

/// Time bonus for an SS activity, independent of partner completion.
pub fn overlap_bonus(activity: &Activity, productivity: i32) -> i32 {
    match activity.dep {
        Dependency::StartToStart { .. } if productivity >= OVERLAP_MIN_PRODUCTIVITY => {
            OVERLAP_BONUS
        }
        _ => 0,
    }
}

fn unmet<'a>(ids: &'a [String], completed: &HashSet<&str>) -> Vec<&'a str> {
    ids.iter()
        .map(String::as_str)
        .filter(|id| !completed.contains(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(dep: Dependency) -> Activity {
        Activity {
            id: "A10".to_string(),
            name: "Test".to_string(),
            base_time: 2,
            base_cost: 3,
            req_workers: 1,
            req_machines: 0,
            dep,
        }
    }

    fn fs(on: &[&str]) -> Dependency {
        Dependency::FinishToStart {
            on: on.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn ss(with: &[&str]) -> Dependency {
        Dependency::StartToStart {
            with: with.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_none_is_free() {
        let check = evaluate(&activity(Dependency::None), &HashSet::new());
        assert_eq!(check, DependencyCheck::default());
        assert!(!check.is_penalized());
    }

    #[test]
    fn test_fs_met() {
        let done: HashSet<&str> = ["A01", "A02"].into_iter().collect();
        let check = evaluate(&activity(fs(&["A01", "A02"])), &done);
        assert!(!check.is_penalized());
        assert!(check.warning.is_none());
    }

    #[test]
    fn test_fs_missing_lists_unmet_ids() {
        let done: HashSet<&str> = ["A01"].into_iter().collect();
        let check = evaluate(&activity(fs(&["A01", "A02", "A03"])), &done);
        assert_eq!(check.penalty, Delta { time: 1, cost: 1 });
        assert_eq!(check.warning.as_deref(), Some("Prereq missing: A02, A03"));
    }

    #[test]
    fn test_ss_never_penalizes() {
        let check = evaluate(&activity(ss(&["A11"])), &HashSet::new());
        assert!(!check.is_penalized());
        assert!(check.warning.unwrap().contains("A11"));

        let done: HashSet<&str> = ["A11"].into_iter().collect();
        assert!(evaluate(&activity(ss(&["A11"])), &done).warning.is_none());
    }

    #[test]
    fn test_overlap_bonus_needs_productivity() {
        let a = activity(ss(&["A11"]));
        assert_eq!(overlap_bonus(&a, 0), 0);
        assert_eq!(overlap_bonus(&a, -2), 0);
        assert_eq!(overlap_bonus(&a, 1), -1);
        assert_eq!(overlap_bonus(&a, 4), -1);
        assert_eq!(overlap_bonus(&activity(fs(&["A01"])), 5), 0);
    }
}
