//! Order keys for ordered children (course topics, topic lessons).
//!
//! Siblings carry a zero-based, contiguous `sort_order`. New children are
//! appended at `max + 1`; a bulk reorder is a caller-supplied permutation of
//! the parent's child ids whose array index becomes the new order key.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::types::DbId;

/// Order key for a child appended after the current maximum.
///
/// `None` means the parent has no children yet.
pub fn next_order(current_max: Option<i32>) -> i32 {
    current_max.map_or(0, |max| max + 1)
}

/// Check that `requested` is a permutation of `existing`.
///
/// Rejects duplicates, ids that do not belong to the parent, and ids that
/// are missing from the request. All problems are reported together.
pub fn validate_permutation(existing: &[DbId], requested: &[DbId]) -> Result<(), CoreError> {
    let existing_set: HashSet<DbId> = existing.iter().copied().collect();

    let mut seen = HashSet::with_capacity(requested.len());
    let mut duplicates = Vec::new();
    let mut foreign = Vec::new();
    for id in requested {
        if !seen.insert(*id) {
            duplicates.push(*id);
        } else if !existing_set.contains(id) {
            foreign.push(*id);
        }
    }

    let mut missing: Vec<DbId> = existing
        .iter()
        .copied()
        .filter(|id| !seen.contains(id))
        .collect();
    missing.sort_unstable();

    let mut problems = Vec::new();
    if !duplicates.is_empty() {
        problems.push(format!("duplicate ids {duplicates:?}"));
    }
    if !foreign.is_empty() {
        problems.push(format!("ids not belonging to this parent {foreign:?}"));
    }
    if !missing.is_empty() {
        problems.push(format!("missing ids {missing:?}"));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Reorder list must contain every child exactly once: {}",
            problems.join("; ")
        )))
    }
}

/// Pair each id with its new order key (its index in `requested`).
pub fn order_assignments(requested: &[DbId]) -> Vec<(DbId, i32)> {
    requested
        .iter()
        .enumerate()
        .map(|(index, id)| (*id, index as i32))
        .collect()
}

/// Whether a list of sibling order keys is `0..n` once sorted.
pub fn is_contiguous(orders: &[i32]) -> bool {
    let mut sorted = orders.to_vec();
    sorted.sort_unstable();
    sorted.iter().enumerate().all(|(i, o)| *o == i as i32)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn first_child_gets_zero() {
        assert_eq!(next_order(None), 0);
        assert_eq!(next_order(Some(0)), 1);
        assert_eq!(next_order(Some(6)), 7);
    }

    #[test]
    fn accepts_any_permutation() {
        assert!(validate_permutation(&[1, 2, 3], &[3, 1, 2]).is_ok());
        assert!(validate_permutation(&[1, 2, 3], &[1, 2, 3]).is_ok());
        assert!(validate_permutation(&[], &[]).is_ok());
    }

    #[test]
    fn rejects_duplicates() {
        let err = validate_permutation(&[1, 2, 3], &[1, 1, 2, 3]).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("duplicate ids [1]"));
    }

    #[test]
    fn rejects_foreign_ids() {
        let err = validate_permutation(&[1, 2], &[1, 2, 9]).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("[9]"));
    }

    #[test]
    fn rejects_missing_ids() {
        let err = validate_permutation(&[1, 2, 3], &[3, 1]).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("missing ids [2]"));
    }

    #[test]
    fn rejects_empty_list_for_non_empty_parent() {
        assert!(validate_permutation(&[4, 5], &[]).is_err());
    }

    #[test]
    fn assignments_follow_array_index() {
        assert_eq!(order_assignments(&[30, 10, 20]), vec![(30, 0), (10, 1), (20, 2)]);
    }

    #[test]
    fn contiguity() {
        assert!(is_contiguous(&[]));
        assert!(is_contiguous(&[2, 0, 1]));
        assert!(!is_contiguous(&[0, 2]));
        assert!(!is_contiguous(&[1, 2]));
        assert!(!is_contiguous(&[0, 0, 1]));
    }
}
