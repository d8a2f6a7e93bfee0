// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Optimistic-concurrency version stamps.

use std::fmt;

use objwire_codec::{CodecError, Decodable, Encodable, FieldReader, FieldWriter};
use serde::{Deserialize, Serialize};

/// Version stamp attached to persistent object data.
///
/// Versions are only ever compared for equality: a receiver that sees a
/// version different from the one it holds treats its copy as stale.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    /// Monotonic per-object counter.
    pub sequence: u64,
    /// User that made the change.
    pub user: String,
    /// Wall-clock time of the change, milliseconds since the Unix epoch.
    pub timestamp_millis: i64,
}

impl Version {
    /// Construct a version stamp.
    pub fn new(sequence: u64, user: impl Into<String>, timestamp_millis: i64) -> Self {
        Self {
            sequence,
            user: user.into(),
            timestamp_millis,
        }
    }

    /// Staleness check. Two stamps are either equal or different; there is
    /// no ordering.
    pub fn is_different(&self, other: &Version) -> bool {
        self != other
    }
}

/// Staleness check over optional versions. Absent on both sides counts as equal.
pub fn versions_differ(a: Option<&Version>, b: Option<&Version>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.is_different(b),
        (None, None) => false,
        _ => true,
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}@{}", self.sequence, self.user, self.timestamp_millis)
    }
}

impl Encodable for Version {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn encode(&self, out: &mut FieldWriter<'_>) -> Result<(), CodecError> {
        out.write_long(self.sequence.cast_signed())?;
        out.write_string(Some(self.user.as_str()))?;
        out.write_long(self.timestamp_millis)
    }
}

impl Decodable for Version {
    const TYPE_NAME: &'static str = "objwire.Version";

    fn decode(input: &mut FieldReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            sequence: input.read_long()?.cast_unsigned(),
            user: input.read_required_string()?,
            timestamp_millis: input.read_long()?,
        })
    }
}
