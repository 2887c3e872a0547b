//! Timeslice validation and timestamp resolution
//!
//! Only a single "snapshot" update per timeslice is supported. A timeslice
//! whose timestamp cannot be resolved is incomplete, not an error.

use crate::error::{TimesliceError, TimesliceResult};
use crate::types::{StateUpdate, TimesliceMessage};
use crate::{MAX_UPDATES_PER_TIMESLICE, SNAPSHOT_UPDATE_TYPE};

/// Outcome of resolving a timeslice
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    Ready {
        timestamp: f64,
        updates: &'a [StateUpdate],
    },
    Incomplete,
}

/// Validate the message contract and resolve its timestamp
pub fn resolve(message: &TimesliceMessage) -> TimesliceResult<Resolution<'_>> {
    if message.update_type != SNAPSHOT_UPDATE_TYPE {
        return Err(TimesliceError::UnsupportedUpdateType(
            message.update_type.clone(),
        ));
    }

    if message.updates.len() > MAX_UPDATES_PER_TIMESLICE {
        return Err(TimesliceError::UnsupportedUpdateCount(message.updates.len()));
    }

    let timestamp = match message.timestamp.filter(|t| is_truthy(*t)) {
        Some(t) => t,
        None => latest_update_timestamp(&message.updates),
    };

    if !is_truthy(timestamp) {
        log::debug!(
            "timeslice incomplete: no timestamp among {} updates",
            message.updates.len()
        );
        return Ok(Resolution::Incomplete);
    }

    Ok(Resolution::Ready {
        timestamp,
        updates: &message.updates,
    })
}

/// Maximum update timestamp, seeded at 0. Updates without one contribute nothing.
fn latest_update_timestamp(updates: &[StateUpdate]) -> f64 {
    updates
        .iter()
        .filter_map(|update| update.timestamp)
        .fold(0.0, f64::max)
}

/// Zero and NaN do not count as a timestamp
fn is_truthy(timestamp: f64) -> bool {
    timestamp != 0.0 && !timestamp.is_nan()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(update_type: &str, updates: Vec<StateUpdate>) -> TimesliceMessage {
        TimesliceMessage {
            update_type: update_type.to_string(),
            updates,
            timestamp: None,
        }
    }

    #[test]
    fn test_rejects_other_update_types() {
        for update_type in ["incremental", "complete_state", "persistent", ""] {
            let err = resolve(&message(update_type, vec![])).unwrap_err();
            match err {
                TimesliceError::UnsupportedUpdateType(t) => assert_eq!(t, update_type),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_rejects_multiple_updates() {
        let msg = message("snapshot", vec![StateUpdate::at(1.0), StateUpdate::at(2.0)]);
        let err = resolve(&msg).unwrap_err();
        assert!(matches!(err, TimesliceError::UnsupportedUpdateCount(2)));
    }

    #[test]
    fn test_update_type_checked_before_count() {
        let msg = message("incremental", vec![StateUpdate::at(1.0), StateUpdate::at(2.0)]);
        assert!(matches!(
            resolve(&msg).unwrap_err(),
            TimesliceError::UnsupportedUpdateType(_)
        ));
    }

    #[test]
    fn test_empty_is_incomplete() {
        let msg = message("snapshot", vec![]);
        assert_eq!(resolve(&msg).unwrap(), Resolution::Incomplete);
    }

    #[test]
    fn test_top_level_timestamp_wins() {
        let msg = message("snapshot", vec![StateUpdate::at(500.0)]).with_timestamp(1000.0);
        match resolve(&msg).unwrap() {
            Resolution::Ready { timestamp, updates } => {
                assert_eq!(timestamp, 1000.0);
                assert_eq!(updates.len(), 1);
            }
            Resolution::Incomplete => panic!("expected ready"),
        }
    }

    #[test]
    fn test_zero_top_level_falls_back_to_updates() {
        let msg = message("snapshot", vec![StateUpdate::at(500.0)]).with_timestamp(0.0);
        assert!(matches!(
            resolve(&msg).unwrap(),
            Resolution::Ready { timestamp, .. } if timestamp == 500.0
        ));
    }

    #[test]
    fn test_update_without_timestamp_is_incomplete() {
        let msg = message("snapshot", vec![StateUpdate::default()]);
        assert_eq!(resolve(&msg).unwrap(), Resolution::Incomplete);
    }

    #[test]
    fn test_negative_update_timestamp_is_incomplete() {
        let msg = message("snapshot", vec![StateUpdate::at(-5.0)]);
        assert_eq!(resolve(&msg).unwrap(), Resolution::Incomplete);
    }

    #[test]
    fn test_latest_update_timestamp() {
        let updates = vec![StateUpdate::at(3.0), StateUpdate::default(), StateUpdate::at(7.0)];
        assert_eq!(latest_update_timestamp(&updates), 7.0);
        assert_eq!(latest_update_timestamp(&[]), 0.0);
    }
}
