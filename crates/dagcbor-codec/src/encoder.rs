use ciborium_ll::{simple, Encoder, Header};
use dagcbor_types::DagNode;

use crate::config::KeyOrder;
use crate::error::{CodecError, CodecResult};
use crate::transform::TransformedNode;

/// Turns a transformed block tree into bytes.
pub trait BlockEncoder {
    fn encode(&self, node: &TransformedNode) -> CodecResult<Vec<u8>>;
}

/// CBOR encoder for transformed block trees.
///
/// Item framing is delegated to `ciborium-ll`: definite-length arrays and
/// maps, shortest-form integer and float heads. Tagged links are written as
/// tag 42 around a byte string. The tree is walked with an explicit work
/// stack.
#[derive(Clone, Copy, Debug, Default)]
pub struct CborEncoder {
    key_order: KeyOrder,
}

enum Work<'a> {
    Node(&'a TransformedNode),
    Key(&'a str),
}

impl CborEncoder {
    pub fn new(key_order: KeyOrder) -> Self {
        Self { key_order }
    }

    fn ordered<'a>(
        &self,
        entries: &'a [(String, TransformedNode)],
    ) -> Vec<&'a (String, TransformedNode)> {
        let mut refs: Vec<_> = entries.iter().collect();
        if self.key_order == KeyOrder::Canonical {
            refs.sort_by(|(a, _), (b, _)| {
                a.len().cmp(&b.len()).then_with(|| a.as_bytes().cmp(b.as_bytes()))
            });
        }
        refs
    }

    fn write_leaf(&self, enc: &mut Encoder<&mut Vec<u8>>, value: &DagNode) -> CodecResult<()> {
        match value {
            DagNode::Null => enc.push(Header::Simple(simple::NULL)).map_err(io)?,
            DagNode::Bool(true) => enc.push(Header::Simple(simple::TRUE)).map_err(io)?,
            DagNode::Bool(false) => enc.push(Header::Simple(simple::FALSE)).map_err(io)?,
            DagNode::Integer(i) => enc.push(integer_header(*i)?).map_err(io)?,
            DagNode::Float(f) => enc.push(Header::Float(*f)).map_err(io)?,
            DagNode::Text(t) => enc.text(t, None).map_err(io)?,
            DagNode::Bytes(b) => enc.bytes(b, None).map_err(io)?,
            DagNode::Map(map) => {
                let len = map.len().map_err(CodecError::traversal)?;
                if len != 0 {
                    return Err(CodecError::Encoding(format!(
                        "map with {len} entries in leaf position"
                    )));
                }
                enc.push(Header::Map(Some(0))).map_err(io)?
            }
            other => {
                return Err(CodecError::Encoding(format!(
                    "unexpanded {} in leaf position",
                    other.kind()
                )))
            }
        }
        Ok(())
    }
}

impl BlockEncoder for CborEncoder {
    fn encode(&self, root: &TransformedNode) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::new();
        let mut enc = Encoder::from(&mut buf);
        let mut work = vec![Work::Node(root)];

        while let Some(item) = work.pop() {
            let node = match item {
                Work::Key(key) => {
                    enc.text(key, None).map_err(io)?;
                    continue;
                }
                Work::Node(node) => node,
            };
            match node {
                TransformedNode::Leaf(value) => self.write_leaf(&mut enc, value)?,
                TransformedNode::Link(tagged) => {
                    enc.push(Header::Tag(tagged.tag())).map_err(io)?;
                    enc.bytes(tagged.payload(), None).map_err(io)?;
                }
                TransformedNode::List(items) => {
                    enc.push(Header::Array(Some(items.len()))).map_err(io)?;
                    work.extend(items.iter().rev().map(Work::Node));
                }
                TransformedNode::Map(entries) => {
                    enc.push(Header::Map(Some(entries.len()))).map_err(io)?;
                    for (key, value) in self.ordered(entries).into_iter().rev() {
                        work.push(Work::Node(value));
                        work.push(Work::Key(key));
                    }
                }
            }
        }

        drop(enc);
        Ok(buf)
    }
}

/// CBOR major type 0 or 1 head for an integer. Values outside
/// `-2^64 ..= 2^64 - 1` have no native representation.
fn integer_header(i: i128) -> CodecResult<Header> {
    let out_of_range = || CodecError::Encoding(format!("integer {i} out of CBOR range"));
    if i >= 0 {
        u64::try_from(i).map(Header::Positive).map_err(|_| out_of_range())
    } else {
        u64::try_from(-1 - i).map(Header::Negative).map_err(|_| out_of_range())
    }
}

fn io(e: std::io::Error) -> CodecError {
    CodecError::Encoding(e.to_string())
}
