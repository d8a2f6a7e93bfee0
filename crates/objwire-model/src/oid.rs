// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Object identities.

use std::fmt;

use objwire_codec::{CodecError, Decodable, Encodable, FieldReader, FieldWriter};
use serde::{Deserialize, Serialize};

/// Identity of a standalone object: a serial number plus a transience flag.
///
/// Transient identities have no durable key yet; the serial is only unique
/// within the process that allocated it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RootOid {
    /// Serial number allocated by the persistence layer (or the client, while transient).
    pub serial: u64,
    /// `true` until the object has been durably saved.
    pub transient: bool,
}

/// Identity of an object owned by another object (a collection, or a value
/// holder) and addressed through its parent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AggregatedOid {
    /// Owning identity; must be resolvable on its own.
    pub parent: Box<Oid>,
    /// Identifier local to the parent (for collections, the member name).
    pub local_id: String,
}

/// Identity of a domain object across the wire.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Oid {
    /// Standalone identity.
    Root(RootOid),
    /// Identity owned by a parent identity.
    Aggregated(AggregatedOid),
}

impl Oid {
    /// Durable identity with the given serial.
    pub fn persistent(serial: u64) -> Self {
        Oid::Root(RootOid {
            serial,
            transient: false,
        })
    }

    /// Not-yet-saved identity with the given serial.
    pub fn transient(serial: u64) -> Self {
        Oid::Root(RootOid {
            serial,
            transient: true,
        })
    }

    /// Identity owned by `parent` under `local_id`.
    pub fn aggregated(parent: Oid, local_id: impl Into<String>) -> Self {
        Oid::Aggregated(AggregatedOid {
            parent: Box::new(parent),
            local_id: local_id.into(),
        })
    }

    /// Identity of the collection held in member `field` of `parent`.
    pub fn for_field(parent: &Oid, field: &str) -> Self {
        Oid::aggregated(parent.clone(), field)
    }

    /// Transience of the identity; aggregated identities inherit it from
    /// their root.
    pub fn is_transient(&self) -> bool {
        match self {
            Oid::Root(root) => root.transient,
            Oid::Aggregated(agg) => agg.parent.is_transient(),
        }
    }

    /// Owning identity, for aggregated identities.
    pub fn parent(&self) -> Option<&Oid> {
        match self {
            Oid::Root(_) => None,
            Oid::Aggregated(agg) => Some(&agg.parent),
        }
    }

    /// Outermost standalone identity.
    pub fn root(&self) -> &RootOid {
        match self {
            Oid::Root(root) => root,
            Oid::Aggregated(agg) => agg.parent.root(),
        }
    }

    /// Returns `true` for aggregated identities.
    pub fn is_aggregated(&self) -> bool {
        matches!(self, Oid::Aggregated(_))
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Oid::Root(root) => {
                let prefix = if root.transient { 'T' } else { 'P' };
                write!(f, "{prefix}:{}", root.serial)
            }
            Oid::Aggregated(agg) => write!(f, "{}~{}", agg.parent, agg.local_id),
        }
    }
}

const ROOT: i8 = 0;
const AGGREGATED: i8 = 1;

impl Encodable for Oid {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn encode(&self, out: &mut FieldWriter<'_>) -> Result<(), CodecError> {
        match self {
            Oid::Root(root) => {
                out.write_byte(ROOT)?;
                out.write_long(root.serial.cast_signed())?;
                out.write_bool(root.transient)
            }
            Oid::Aggregated(agg) => {
                let parent: &Oid = &agg.parent;
                out.write_byte(AGGREGATED)?;
                out.write_encodable(Some(parent))?;
                out.write_string(Some(agg.local_id.as_str()))
            }
        }
    }
}

impl Decodable for Oid {
    const TYPE_NAME: &'static str = "objwire.Oid";

    fn decode(input: &mut FieldReader<'_>) -> Result<Self, CodecError> {
        match input.read_byte()? {
            ROOT => Ok(Oid::Root(RootOid {
                serial: input.read_long()?.cast_unsigned(),
                transient: input.read_bool()?,
            })),
            AGGREGATED => Ok(Oid::Aggregated(AggregatedOid {
                parent: Box::new(input.read_required_encodable::<Oid>()?),
                local_id: input.read_required_string()?,
            })),
            variant => Err(CodecError::UnknownVariant {
                type_name: Self::TYPE_NAME,
                variant,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregated_identity_inherits_transience_from_root() {
        let parent = Oid::transient(7);
        let lines = Oid::for_field(&parent, "lines");
        assert!(lines.is_transient());
        assert_eq!(lines.parent(), Some(&parent));
        assert_eq!(lines.root().serial, 7);
        assert!(!Oid::for_field(&Oid::persistent(7), "lines").is_transient());
    }

    #[test]
    fn display_marks_transience_and_nesting() {
        let oid = Oid::aggregated(Oid::persistent(12), "lines");
        assert_eq!(oid.to_string(), "P:12~lines");
        assert_eq!(Oid::transient(3).to_string(), "T:3");
    }

    #[test]
    fn transient_and_persistent_with_same_serial_differ() {
        assert_ne!(Oid::transient(1), Oid::persistent(1));
    }
}
