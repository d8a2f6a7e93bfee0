// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Object-graph encoder and decoder for objwire.
//!
//! [`ObjectEncoder`] walks live objects into [`WireNode`](objwire_model::WireNode)s,
//! bounded by depth and by a per-call [`KnownObjects`] registry.
//! [`ObjectDecoder`] reconciles nodes back into an [`ObjectSpace`], driving
//! each adapter's [`ResolveState`] and checking versions.
//!
//! The hosting system supplies the collaborators: a [`Metamodel`] for type
//! descriptors, an [`ObjectSpace`] for live objects and a [`ChangeSink`] for
//! update notifications. Depth limits come from [`EncodingPolicy`].
#![forbid(unsafe_code)]

pub mod config;
mod decoder;
mod encoder;
mod error;
mod field_order;
mod known;
mod metamodel;
pub mod query;
pub mod resolve;
mod space;
mod value;

pub use config::{EncodingPolicy, PolicyError, PolicyStore, POLICY_KEY};
pub use decoder::{DecodeContext, DecodeKnown, Decoded, ObjectDecoder, StaleObject};
pub use encoder::{ActionArgument, EncodeKnown, ObjectEncoder};
pub use error::WireError;
pub use field_order::FieldOrderCache;
pub use known::KnownObjects;
pub use metamodel::{MemberKind, MemberSpec, Metamodel, TypeSpec};
pub use query::{
    FindAllInstances, FindByPattern, FindByTitle, FindUsingService, QueryCriteria,
    QueryEncoderRegistry,
};
pub use resolve::{Reconcile, ResolveState};
pub use space::{AdapterRef, ChangeSink, NoChanges, ObjectSpace};
pub use value::{BooleanCodec, DateCodec, IntegerCodec, MoneyCodec, Scalar, TextCodec, ValueCodec};
