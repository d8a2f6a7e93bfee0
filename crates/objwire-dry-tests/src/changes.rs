// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Change sink that records what it was told.

use objwire_core::{AdapterRef, ChangeSink};

/// [`ChangeSink`] that keeps every notification in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingChangeSink {
    changed: Vec<AdapterRef>,
}

impl RecordingChangeSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received, in order.
    pub fn changed(&self) -> &[AdapterRef] {
        &self.changed
    }

    /// Number of notifications for `adapter`.
    pub fn count_for(&self, adapter: AdapterRef) -> usize {
        self.changed.iter().filter(|a| **a == adapter).count()
    }
}

impl ChangeSink for RecordingChangeSink {
    fn object_changed(&mut self, adapter: AdapterRef) {
        self.changed.push(adapter);
    }
}
