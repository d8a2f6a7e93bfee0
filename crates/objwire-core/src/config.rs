// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Encoding depth policy and the store it is loaded from.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Config key the encoding policy is stored under.
pub const POLICY_KEY: &str = "objwire.encoding";

/// Depth limits for each encoder entry point.
///
/// A depth counts the objects fully encoded along any path, the root
/// included: depth 0 is identity-only, depth 1 is the root's own fields with
/// every referenced object as a reference node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingPolicy {
    /// Client adding an object to a collection.
    pub client_add_depth: u32,
    /// Client sending changed fields of an object.
    pub client_update_depth: u32,
    /// Persistent target of an action.
    pub action_target_depth: u32,
    /// Persistent action parameters.
    pub action_parameter_depth: u32,
    /// Transient objects (targets, parameters, make-persistent graphs).
    pub transient_graph_depth: u32,
    /// Server answering a retrieve.
    pub server_retrieve_depth: u32,
    /// Server notifying clients of changed objects.
    pub changed_object_depth: u32,
    /// Objects embedded in query criteria.
    pub query_criteria_depth: u32,
    /// Object returned from an action.
    pub action_result_depth: u32,
}

impl Default for EncodingPolicy {
    fn default() -> Self {
        Self {
            client_add_depth: 1,
            client_update_depth: 1,
            action_target_depth: 0,
            action_parameter_depth: 0,
            transient_graph_depth: 100,
            server_retrieve_depth: 100,
            changed_object_depth: 1,
            query_criteria_depth: 1,
            action_result_depth: 1,
        }
    }
}

/// Storage port the encoding policy document is kept behind.
pub trait PolicyStore {
    /// Document stored under `key`, or `None` when nothing is stored.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, PolicyError>;
    /// Replace the document stored under `key`.
    fn write(&self, key: &str, document: &[u8]) -> Result<(), PolicyError>;
}

/// Errors loading or saving an [`EncodingPolicy`].
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The store could not be read or written.
    #[error("policy store unavailable: {0}")]
    Store(String),
    /// The stored document is not a policy.
    #[error("malformed encoding policy: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl EncodingPolicy {
    /// Policy stored under [`POLICY_KEY`]; defaults when nothing (or an
    /// empty document) is stored. Fields missing from the document take
    /// their default.
    pub fn load(store: &impl PolicyStore) -> Result<Self, PolicyError> {
        match store.read(POLICY_KEY)? {
            Some(document) if !document.is_empty() => {
                let policy = serde_json::from_slice(&document)?;
                debug!(?policy, "encoding policy loaded");
                Ok(policy)
            }
            _ => {
                debug!("no stored encoding policy; using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Persist this policy under [`POLICY_KEY`] as JSON.
    pub fn save(&self, store: &impl PolicyStore) -> Result<(), PolicyError> {
        let document = serde_json::to_vec_pretty(self)?;
        store.write(POLICY_KEY, &document)
    }
}
