// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Self-encoding nested values and the name → factory registry.
//!
//! An encodable writes its wire type name first, then its own payload. The
//! reader resolves that name through an [`EncodableRegistry`] populated at
//! start-up; an unknown name is a hard error, never a default value.

use std::any::Any;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::reader::FieldReader;
use crate::writer::FieldWriter;
use crate::CodecError;

/// Conversion to `Box<dyn Any>` for downcasting decoded encodables.
pub trait AsAny: Any {
    /// Erase the concrete type.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A value that writes its own payload after its wire type name.
pub trait Encodable: AsAny + Send + Sync + fmt::Debug {
    /// Wire type name; must match a name registered on the decoding side.
    fn type_name(&self) -> &'static str;

    /// Write the payload (the type name has already been written).
    fn encode(&self, out: &mut FieldWriter<'_>) -> Result<(), CodecError>;
}

/// Reconstruction entry point for an [`Encodable`] with a single wire name.
pub trait Decodable: Sized {
    /// Wire type name this type registers under.
    const TYPE_NAME: &'static str;

    /// Read the payload written by [`Encodable::encode`].
    fn decode(input: &mut FieldReader<'_>) -> Result<Self, CodecError>;
}

/// Builds a boxed encodable from a reader positioned after the type name.
pub type EncodableFactory = fn(&mut FieldReader<'_>) -> Result<Box<dyn Encodable>, CodecError>;

fn decode_boxed<T>(input: &mut FieldReader<'_>) -> Result<Box<dyn Encodable>, CodecError>
where
    T: Decodable + Encodable,
{
    Ok(Box::new(T::decode(input)?))
}

/// Maps wire type names to reconstruction factories.
#[derive(Clone, Default)]
pub struct EncodableRegistry {
    factories: FxHashMap<&'static str, EncodableFactory>,
}

impl EncodableRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under [`Decodable::TYPE_NAME`].
    pub fn register<T>(&mut self) -> Result<(), CodecError>
    where
        T: Decodable + Encodable,
    {
        self.register_factory(T::TYPE_NAME, decode_boxed::<T>)
    }

    /// Register an explicit factory. Used by types (such as enums) that
    /// travel under several wire names.
    pub fn register_factory(
        &mut self,
        name: &'static str,
        factory: EncodableFactory,
    ) -> Result<(), CodecError> {
        if self.factories.contains_key(name) {
            return Err(CodecError::DuplicateEncodable(name.to_string()));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Factory for `name`, if registered.
    pub fn factory(&self, name: &str) -> Option<EncodableFactory> {
        self.factories.get(name).copied()
    }

    /// Returns `true` if `name` has a factory.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for EncodableRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        f.debug_struct("EncodableRegistry")
            .field("names", &names)
            .finish()
    }
}
