//! Visit records and the notifier seam

use crate::Year;
use chrono::{DateTime, SecondsFormat, Utc};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// A committed year change, as reported to the visit collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Visit {
    pub year: u16,
    /// ISO-8601 UTC timestamp with millisecond precision
    pub timestamp: String,
}

impl Visit {
    /// Creates a visit stamped with the current time
    pub fn now(year: Year) -> Self {
        Self::at(year, Utc::now())
    }

    /// Creates a visit stamped with the given time
    pub fn at(year: Year, at: DateTime<Utc>) -> Self {
        Self {
            year: year.get(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Fire-and-forget sink for visits.
///
/// Delivery failures belong to the implementation; the sequencer never
/// waits on or retries a notification.
pub trait VisitNotifier {
    fn notify(&self, visit: Visit);
}

impl<T: VisitNotifier + ?Sized> VisitNotifier for &T {
    fn notify(&self, visit: Visit) {
        (**self).notify(visit)
    }
}

impl<T: VisitNotifier + ?Sized> VisitNotifier for Box<T> {
    fn notify(&self, visit: Visit) {
        (**self).notify(visit)
    }
}

impl<T: VisitNotifier + ?Sized> VisitNotifier for Rc<T> {
    fn notify(&self, visit: Visit) {
        (**self).notify(visit)
    }
}

impl<T: VisitNotifier + ?Sized> VisitNotifier for Arc<T> {
    fn notify(&self, visit: Visit) {
        (**self).notify(visit)
    }
}

/// Keeps every visit in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    visits: RefCell<Vec<Visit>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded visits in order
    pub fn visits(&self) -> Vec<Visit> {
        self.visits.borrow().clone()
    }

    /// Recorded years in order
    pub fn years(&self) -> Vec<u16> {
        self.visits.borrow().iter().map(|v| v.year).collect()
    }

    pub fn len(&self) -> usize {
        self.visits.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.borrow().is_empty()
    }
}

impl VisitNotifier for RecordingNotifier {
    fn notify(&self, visit: Visit) {
        self.visits.borrow_mut().push(visit);
    }
}
