// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for objwire crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory policy store for testing without filesystem I/O
//! - [`changes`] - Change sink that records notifications
//! - [`metamodel`] - Sample shop metamodel with value, reference and collection members
//! - [`space`] - In-memory object space

pub mod changes;
pub mod config;
pub mod metamodel;
pub mod space;

pub use changes::RecordingChangeSink;
pub use config::InMemoryPolicyStore;
pub use metamodel::{SampleMetamodel, ADDRESS, CUSTOMER, ORDER, PRODUCT, QUOTE};
pub use space::MemoryObjectSpace;
