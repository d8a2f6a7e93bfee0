// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Decoder-side resolve-state lifecycle.
//!
//! ```text
//! GHOST ─┬─ complete ──▶ RESOLVING ──────▶ RESOLVED ─ partial ─▶ UPDATING ─▶ RESOLVED
//!        └─ partial ───▶ RESOLVING_PART ─▶ PART_RESOLVED (then as GHOST)
//! TRANSIENT ─▶ SERIALIZING_TRANSIENT ─▶ TRANSIENT
//! ```
//!
//! [`ResolveState::next`] picks the transitional state for incoming data and
//! [`begin`]/[`end`] bracket field application so that it always happens
//! while the adapter is in that transitional state. A bracket whose data is
//! rejected is closed with [`abort`] instead of [`end`].

use serde::{Deserialize, Serialize};

use crate::{AdapterRef, ObjectSpace};

/// Lifecycle stage of an adapter's loaded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolveState {
    /// Known by identity only; no field data loaded.
    Ghost,
    /// Loading partial data.
    ResolvingPart,
    /// Some field data loaded.
    PartResolved,
    /// Loading complete data.
    Resolving,
    /// Complete data loaded.
    Resolved,
    /// Applying an update to resolved data.
    Updating,
    /// Not yet persisted.
    Transient,
    /// Applying data to a transient object.
    SerializingTransient,
}

/// Outcome of the state-transition function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    /// Apply data while the adapter is in this transitional state.
    Transition(ResolveState),
    /// Leave the adapter and its data untouched.
    Skipped,
}

impl ResolveState {
    /// Transitional state for incoming data, given whether the data is
    /// complete.
    pub const fn next(self, complete: bool) -> Reconcile {
        match (self, complete) {
            (ResolveState::Resolved, false) => Reconcile::Transition(ResolveState::Updating),
            (ResolveState::Ghost | ResolveState::PartResolved, true) => {
                Reconcile::Transition(ResolveState::Resolving)
            }
            (ResolveState::Ghost | ResolveState::PartResolved, false) => {
                Reconcile::Transition(ResolveState::ResolvingPart)
            }
            (ResolveState::Transient, _) => {
                Reconcile::Transition(ResolveState::SerializingTransient)
            }
            _ => Reconcile::Skipped,
        }
    }

    /// State a transitional state settles into once data is applied.
    /// Non-transitional states settle into themselves.
    pub const fn settled(self) -> ResolveState {
        match self {
            ResolveState::Resolving | ResolveState::Updating => ResolveState::Resolved,
            ResolveState::ResolvingPart => ResolveState::PartResolved,
            ResolveState::SerializingTransient => ResolveState::Transient,
            other => other,
        }
    }

    /// Returns `true` while data is being applied.
    pub const fn is_transitional(self) -> bool {
        matches!(
            self,
            ResolveState::Resolving
                | ResolveState::ResolvingPart
                | ResolveState::Updating
                | ResolveState::SerializingTransient
        )
    }

    /// Returns `true` for the not-yet-persisted track.
    pub const fn is_transient(self) -> bool {
        matches!(
            self,
            ResolveState::Transient | ResolveState::SerializingTransient
        )
    }
}

/// Enter the transitional state `state`.
pub fn begin(space: &mut dyn ObjectSpace, adapter: AdapterRef, state: ResolveState) {
    space.set_resolve_state(adapter, state);
}

/// Leave whatever transitional state the adapter is in.
pub fn end(space: &mut dyn ObjectSpace, adapter: AdapterRef) {
    if let Some(state) = space.resolve_state(adapter) {
        space.set_resolve_state(adapter, state.settled());
    }
}

/// Abandon a transition, returning the adapter to the state it held before
/// [`begin`].
pub fn abort(space: &mut dyn ObjectSpace, adapter: AdapterRef, previous: ResolveState) {
    space.set_resolve_state(adapter, previous);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ResolveState::*;

    #[test]
    fn transition_table() {
        let table = [
            (Ghost, true, Reconcile::Transition(Resolving)),
            (Ghost, false, Reconcile::Transition(ResolvingPart)),
            (PartResolved, true, Reconcile::Transition(Resolving)),
            (PartResolved, false, Reconcile::Transition(ResolvingPart)),
            (Resolved, false, Reconcile::Transition(Updating)),
            (Transient, true, Reconcile::Transition(SerializingTransient)),
            (Transient, false, Reconcile::Transition(SerializingTransient)),
            (Resolved, true, Reconcile::Skipped),
            (ResolvingPart, true, Reconcile::Skipped),
            (ResolvingPart, false, Reconcile::Skipped),
            (Resolving, true, Reconcile::Skipped),
            (Updating, false, Reconcile::Skipped),
            (SerializingTransient, true, Reconcile::Skipped),
        ];
        for (state, complete, expected) in table {
            assert_eq!(state.next(complete), expected, "{state:?} complete={complete}");
        }
    }

    #[test]
    fn every_transition_settles_out_of_transit() {
        for state in [Ghost, PartResolved, Resolved, Transient] {
            for complete in [true, false] {
                if let Reconcile::Transition(t) = state.next(complete) {
                    assert!(t.is_transitional());
                    assert!(!t.settled().is_transitional());
                }
            }
        }
        assert_eq!(Updating.settled(), Resolved);
        assert_eq!(ResolvingPart.settled(), PartResolved);
        assert_eq!(Ghost.settled(), Ghost);
    }
}
