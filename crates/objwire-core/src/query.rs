// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persistence-query criteria and the per-kind strategies that carry them.
//!
//! A [`QueryEncoderRegistry`] is built once and shared by reference. Each
//! [`QueryEncoder`] handles its own criteria fields and hands embedded
//! objects back to the graph encoder or decoder through [`ObjectEmbedder`]
//! and [`ObjectResolver`].

use std::any::Any;
use std::fmt;

use objwire_model::{QueryNode, QueryParam, WireNode};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::{
    AdapterRef, DecodeContext, EncodeKnown, ObjectDecoder, ObjectEncoder, ObjectSpace, WireError,
};

/// Source-side query criteria.
pub trait QueryCriteria: fmt::Debug + Send + Sync {
    /// Criteria kind; selects the strategy.
    fn kind(&self) -> &'static str;
    /// Type whose instances are queried.
    fn type_name(&self) -> &str;
    /// Downcast support for strategies.
    fn as_any(&self) -> &dyn Any;
}

/// Every instance of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindAllInstances {
    /// Queried type.
    pub type_name: String,
}

/// Instances whose title matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindByTitle {
    /// Queried type.
    pub type_name: String,
    /// Title to match.
    pub title: String,
}

/// Instances matching the non-empty fields of an example object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindByPattern {
    /// Queried type.
    pub type_name: String,
    /// Example object.
    pub pattern: AdapterRef,
}

/// Named query provided by a repository service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindUsingService {
    /// Queried type.
    pub type_name: String,
    /// Query name.
    pub query_name: String,
    /// Query arguments.
    pub arguments: Vec<String>,
    /// `true` when at most one result is wanted.
    pub single_result: bool,
}

macro_rules! criteria {
    ($ty:ty, $kind:literal) => {
        impl $ty {
            /// Wire kind of this criteria.
            pub const KIND: &'static str = $kind;
        }

        impl QueryCriteria for $ty {
            fn kind(&self) -> &'static str {
                Self::KIND
            }

            fn type_name(&self) -> &str {
                &self.type_name
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

criteria!(FindAllInstances, "find-all-instances");
criteria!(FindByTitle, "find-by-title");
criteria!(FindByPattern, "find-by-pattern");
criteria!(FindUsingService, "find-using-service");

/// Narrow "encode one object" hook for strategies.
pub trait ObjectEmbedder {
    /// Wire form of `adapter`.
    fn embed(&mut self, adapter: AdapterRef) -> Result<WireNode, WireError>;
}

/// Narrow "decode one object" hook for strategies.
pub trait ObjectResolver {
    /// Live object for `node`, `None` for a null node.
    fn resolve(&mut self, node: &WireNode) -> Result<Option<AdapterRef>, WireError>;
}

/// [`ObjectEmbedder`] over the graph encoder at the query-criteria depth.
pub struct EncodeSession<'a, 'm> {
    encoder: &'a ObjectEncoder<'m>,
    space: &'a dyn ObjectSpace,
    known: EncodeKnown,
}

impl<'a, 'm> EncodeSession<'a, 'm> {
    /// Session with a fresh known-objects registry.
    pub fn new(encoder: &'a ObjectEncoder<'m>, space: &'a dyn ObjectSpace) -> Self {
        Self {
            encoder,
            space,
            known: EncodeKnown::new(),
        }
    }
}

impl ObjectEmbedder for EncodeSession<'_, '_> {
    fn embed(&mut self, adapter: AdapterRef) -> Result<WireNode, WireError> {
        self.encoder
            .encode_for_query_criteria(self.space, adapter, &mut self.known)
    }
}

/// [`ObjectResolver`] over the graph decoder and a decode context.
pub struct DecodeSession<'a, 'c, 'm> {
    decoder: &'a ObjectDecoder<'m>,
    ctx: &'a mut DecodeContext<'c>,
}

impl<'a, 'c, 'm> DecodeSession<'a, 'c, 'm> {
    /// Session decoding into `ctx`.
    pub fn new(decoder: &'a ObjectDecoder<'m>, ctx: &'a mut DecodeContext<'c>) -> Self {
        Self { decoder, ctx }
    }
}

impl ObjectResolver for DecodeSession<'_, '_, '_> {
    fn resolve(&mut self, node: &WireNode) -> Result<Option<AdapterRef>, WireError> {
        Ok(self.decoder.decode(self.ctx, node)?.as_object())
    }
}

/// Strategy for one criteria kind.
pub trait QueryEncoder: Send + Sync {
    /// Kind handled.
    fn kind(&self) -> &'static str;

    /// Wire form of `criteria`.
    fn encode(
        &self,
        criteria: &dyn QueryCriteria,
        objects: &mut dyn ObjectEmbedder,
    ) -> Result<QueryNode, WireError>;

    /// Criteria from its wire form.
    fn decode(
        &self,
        node: &QueryNode,
        objects: &mut dyn ObjectResolver,
    ) -> Result<Box<dyn QueryCriteria>, WireError>;
}

fn downcast<'c, T: 'static>(
    criteria: &'c dyn QueryCriteria,
    kind: &'static str,
) -> Result<&'c T, WireError> {
    criteria
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| WireError::MalformedQuery {
            kind: kind.to_owned(),
            reason: format!("strategy cannot handle {criteria:?}"),
        })
}

fn malformed(node: &QueryNode, reason: impl Into<String>) -> WireError {
    WireError::MalformedQuery {
        kind: node.kind.clone(),
        reason: reason.into(),
    }
}

fn text_param(node: &QueryNode, idx: usize) -> Result<Option<String>, WireError> {
    match node.param(idx) {
        Some(QueryParam::Text(text)) => Ok(text.clone()),
        other => Err(malformed(node, format!("param {idx} is not text: {other:?}"))),
    }
}

fn required_text(node: &QueryNode, idx: usize) -> Result<String, WireError> {
    text_param(node, idx)?.ok_or_else(|| malformed(node, format!("param {idx} is null")))
}

fn query_node(criteria: &dyn QueryCriteria, params: Vec<QueryParam>) -> QueryNode {
    QueryNode {
        kind: criteria.kind().to_owned(),
        type_name: criteria.type_name().to_owned(),
        params,
    }
}

/// Strategy for [`FindAllInstances`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FindAllInstancesEncoder;

impl QueryEncoder for FindAllInstancesEncoder {
    fn kind(&self) -> &'static str {
        FindAllInstances::KIND
    }

    fn encode(
        &self,
        criteria: &dyn QueryCriteria,
        _objects: &mut dyn ObjectEmbedder,
    ) -> Result<QueryNode, WireError> {
        downcast::<FindAllInstances>(criteria, self.kind())?;
        Ok(query_node(criteria, Vec::new()))
    }

    fn decode(
        &self,
        node: &QueryNode,
        _objects: &mut dyn ObjectResolver,
    ) -> Result<Box<dyn QueryCriteria>, WireError> {
        Ok(Box::new(FindAllInstances {
            type_name: node.type_name.clone(),
        }))
    }
}

/// Strategy for [`FindByTitle`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FindByTitleEncoder;

impl QueryEncoder for FindByTitleEncoder {
    fn kind(&self) -> &'static str {
        FindByTitle::KIND
    }

    fn encode(
        &self,
        criteria: &dyn QueryCriteria,
        _objects: &mut dyn ObjectEmbedder,
    ) -> Result<QueryNode, WireError> {
        let by_title = downcast::<FindByTitle>(criteria, self.kind())?;
        Ok(query_node(
            criteria,
            vec![QueryParam::Text(Some(by_title.title.clone()))],
        ))
    }

    fn decode(
        &self,
        node: &QueryNode,
        _objects: &mut dyn ObjectResolver,
    ) -> Result<Box<dyn QueryCriteria>, WireError> {
        Ok(Box::new(FindByTitle {
            type_name: node.type_name.clone(),
            title: required_text(node, 0)?,
        }))
    }
}

/// Strategy for [`FindByPattern`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FindByPatternEncoder;

impl QueryEncoder for FindByPatternEncoder {
    fn kind(&self) -> &'static str {
        FindByPattern::KIND
    }

    fn encode(
        &self,
        criteria: &dyn QueryCriteria,
        objects: &mut dyn ObjectEmbedder,
    ) -> Result<QueryNode, WireError> {
        let by_pattern = downcast::<FindByPattern>(criteria, self.kind())?;
        let pattern = objects.embed(by_pattern.pattern)?;
        Ok(query_node(criteria, vec![QueryParam::Object(pattern)]))
    }

    fn decode(
        &self,
        node: &QueryNode,
        objects: &mut dyn ObjectResolver,
    ) -> Result<Box<dyn QueryCriteria>, WireError> {
        let Some(QueryParam::Object(pattern)) = node.param(0) else {
            return Err(malformed(node, "missing pattern object"));
        };
        let pattern = objects
            .resolve(pattern)?
            .ok_or_else(|| malformed(node, "pattern object is null"))?;
        Ok(Box::new(FindByPattern {
            type_name: node.type_name.clone(),
            pattern,
        }))
    }
}

/// Strategy for [`FindUsingService`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FindUsingServiceEncoder;

impl QueryEncoder for FindUsingServiceEncoder {
    fn kind(&self) -> &'static str {
        FindUsingService::KIND
    }

    fn encode(
        &self,
        criteria: &dyn QueryCriteria,
        _objects: &mut dyn ObjectEmbedder,
    ) -> Result<QueryNode, WireError> {
        let using = downcast::<FindUsingService>(criteria, self.kind())?;
        Ok(query_node(
            criteria,
            vec![
                QueryParam::Text(Some(using.query_name.clone())),
                QueryParam::Texts(using.arguments.clone()),
                QueryParam::Flag(using.single_result),
            ],
        ))
    }

    fn decode(
        &self,
        node: &QueryNode,
        _objects: &mut dyn ObjectResolver,
    ) -> Result<Box<dyn QueryCriteria>, WireError> {
        let query_name = required_text(node, 0)?;
        let Some(QueryParam::Texts(arguments)) = node.param(1) else {
            return Err(malformed(node, "missing argument list"));
        };
        let Some(QueryParam::Flag(single_result)) = node.param(2) else {
            return Err(malformed(node, "missing single-result flag"));
        };
        Ok(Box::new(FindUsingService {
            type_name: node.type_name.clone(),
            query_name,
            arguments: arguments.clone(),
            single_result: *single_result,
        }))
    }
}

/// Strategies keyed by criteria kind.
#[derive(Default)]
pub struct QueryEncoderRegistry {
    strategies: FxHashMap<&'static str, Box<dyn QueryEncoder>>,
}

impl QueryEncoderRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the four built-in strategies.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(FindAllInstancesEncoder));
        registry.register(Box::new(FindByTitleEncoder));
        registry.register(Box::new(FindByPatternEncoder));
        registry.register(Box::new(FindUsingServiceEncoder));
        registry
    }

    /// Add or replace the strategy for its kind.
    pub fn register(&mut self, strategy: Box<dyn QueryEncoder>) -> Option<Box<dyn QueryEncoder>> {
        self.strategies.insert(strategy.kind(), strategy)
    }

    /// Returns `true` if `kind` has a strategy.
    pub fn contains(&self, kind: &str) -> bool {
        self.strategies.contains_key(kind)
    }

    fn strategy(&self, kind: &str) -> Result<&dyn QueryEncoder, WireError> {
        self.strategies
            .get(kind)
            .map(AsRef::as_ref)
            .ok_or_else(|| WireError::MissingQueryStrategy(kind.to_owned()))
    }

    /// Wire form of `criteria`.
    pub fn encode(
        &self,
        criteria: &dyn QueryCriteria,
        objects: &mut dyn ObjectEmbedder,
    ) -> Result<QueryNode, WireError> {
        trace!(kind = criteria.kind(), "encode criteria");
        self.strategy(criteria.kind())?.encode(criteria, objects)
    }

    /// Criteria from its wire form; fails when the kind has no strategy.
    pub fn decode(
        &self,
        node: &QueryNode,
        objects: &mut dyn ObjectResolver,
    ) -> Result<Box<dyn QueryCriteria>, WireError> {
        trace!(kind = %node.kind, "decode criteria");
        self.strategy(&node.kind)?.decode(node, objects)
    }
}

impl fmt::Debug for QueryEncoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.strategies.keys().collect();
        kinds.sort_unstable();
        f.debug_struct("QueryEncoderRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}
