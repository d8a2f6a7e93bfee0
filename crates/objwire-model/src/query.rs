// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire form of persistence-query criteria.

use objwire_codec::{CodecError, Decodable, Encodable, FieldReader, FieldWriter};
use serde::{Deserialize, Serialize};

use crate::WireNode;

/// One criteria parameter. Which parameters a query kind carries, and in
/// what order, is decided by that kind's strategy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryParam {
    /// Nullable text (a title, a query name).
    Text(Option<String>),
    /// Boolean switch.
    Flag(bool),
    /// List of text arguments.
    Texts(Vec<String>),
    /// Embedded object (an example/pattern object).
    Object(WireNode),
}

/// Query criteria in transit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryNode {
    /// Criteria kind; selects the decoding strategy.
    pub kind: String,
    /// Type whose instances are queried.
    pub type_name: String,
    /// Kind-specific parameters.
    pub params: Vec<QueryParam>,
}

impl QueryNode {
    /// Parameter at `idx`.
    pub fn param(&self, idx: usize) -> Option<&QueryParam> {
        self.params.get(idx)
    }
}

const TEXT: i8 = 0;
const FLAG: i8 = 1;
const TEXTS: i8 = 2;
const OBJECT: i8 = 3;

impl Encodable for QueryNode {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn encode(&self, out: &mut FieldWriter<'_>) -> Result<(), CodecError> {
        out.write_string(Some(self.kind.as_str()))?;
        out.write_string(Some(self.type_name.as_str()))?;
        let count = i32::try_from(self.params.len()).map_err(|_| CodecError::LengthTooLarge {
            len: self.params.len(),
            max: i32::MAX as usize,
        })?;
        out.write_int(count)?;
        for param in &self.params {
            match param {
                QueryParam::Text(text) => {
                    out.write_byte(TEXT)?;
                    out.write_string(text.as_deref())?;
                }
                QueryParam::Flag(flag) => {
                    out.write_byte(FLAG)?;
                    out.write_bool(*flag)?;
                }
                QueryParam::Texts(texts) => {
                    out.write_byte(TEXTS)?;
                    out.write_dense_array(texts.as_slice())?;
                }
                QueryParam::Object(node) => {
                    out.write_byte(OBJECT)?;
                    out.write_encodable(Some(node))?;
                }
            }
        }
        Ok(())
    }
}

impl Decodable for QueryNode {
    const TYPE_NAME: &'static str = "objwire.QueryNode";

    fn decode(input: &mut FieldReader<'_>) -> Result<Self, CodecError> {
        let kind = input.read_required_string()?;
        let type_name = input.read_required_string()?;
        let raw = input.read_int()?;
        let count = usize::try_from(raw).map_err(|_| CodecError::NegativeLength(raw))?;
        let mut params = Vec::with_capacity(count.min(16));
        for _ in 0..count {
            let param = match input.read_byte()? {
                TEXT => QueryParam::Text(input.read_string()?),
                FLAG => QueryParam::Flag(input.read_bool()?),
                TEXTS => QueryParam::Texts(input.read_dense_array()?),
                OBJECT => QueryParam::Object(input.read_required_encodable()?),
                variant => {
                    return Err(CodecError::UnknownVariant {
                        type_name: Self::TYPE_NAME,
                        variant,
                    })
                }
            };
            params.push(param);
        }
        Ok(Self {
            kind,
            type_name,
            params,
        })
    }
}
