//! Transition rules: which notices a snapshot fires, given the bookkeeping
//! as it stood before the snapshot.
//!
//! Pure: no I/O. The watcher persists the returned record and sends the
//! returned notices.

use crate::model::{KM_MARKERS, Notice, RaceRecord, Snapshot, is_running_status};

/// Outcome of evaluating one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Notices to send, in firing order.
    pub notices: Vec<Notice>,
    /// Bookkeeping after this snapshot.
    pub record: RaceRecord,
}

/// Evaluate `snapshot` against `previous`.
///
/// Rules run in a fixed order: start, distance markers (100, 50, 10), finish.
/// Each rule reads the record as it stood before this snapshot.
pub fn evaluate(snapshot: &Snapshot, previous: &RaceRecord) -> Transition {
    let mut record = previous.clone();
    let mut notices = Vec::new();

    // Start fires only on a genuine transition; a race first seen already
    // running never gets a start notice.
    let from_idle = previous
        .last_status
        .as_deref()
        .is_some_and(|status| !is_running_status(status));
    if snapshot.is_started() && !previous.notified_start && from_idle {
        notices.push(Notice::Started);
        record.notified_start = true;
    }
    record.last_status = Some(snapshot.status.clone());

    // Crossing from strictly above a marker to at-or-below it.
    if let (Some(prev), Some(cur)) = (previous.prev_distance_to_go, snapshot.distance_to_go) {
        for marker in KM_MARKERS {
            if !previous.has_marker(marker) && prev > marker && marker >= cur {
                notices.push(Notice::KmToGo(marker));
                record.add_marker(marker);
            }
        }
    }
    record.prev_distance_to_go = snapshot.distance_to_go;

    if snapshot.finished && !previous.notified_finish {
        notices.push(Notice::Finished);
        record.notified_finish = true;
    }

    Transition { notices, record }
}
