//! DAG-JSON ingestion.
//!
//! Converts a `serde_json::Value` into a [`DagNode`]. An object whose only
//! key is `"/"` is reserved:
//!
//! - `{"/": "bafy..."}` is a link. The text is kept unparsed until the link
//!   is encoded.
//! - `{"/": {"bytes": "AQID"}}` is a byte string in standard base64,
//!   padded or not.
//!
//! Anything else under `"/"` is rejected. The walk keeps its own stack, so
//! nesting depth is bounded by heap rather than call stack.

use std::mem;

use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{alphabet, Engine as _};
use serde_json::map::Iter as EntryIter;
use serde_json::Value;

use crate::error::{TypeError, TypeResult};
use crate::node::{DagList, DagMap, DagNode, LinkValue};

/// Key marking a reserved DAG-JSON object.
pub const LINK_KEY: &str = "/";

/// Key of the base64 payload inside a reserved byte-string object.
pub const BYTES_KEY: &str = "bytes";

const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

impl DagNode {
    /// Build a block tree from a DAG-JSON value.
    ///
    /// Fails with [`TypeError::InvalidLink`] when a `{"/": ..}` object holds
    /// neither identifier text nor a byte-string object, and with
    /// [`TypeError::InvalidBytes`] when the byte payload is not base64.
    pub fn from_json(value: &Value) -> TypeResult<DagNode> {
        let mut frame = match Step::of(value)? {
            Step::Done(node) => return Ok(node),
            Step::Open(frame) => frame,
        };
        let mut parents: Vec<Frame<'_>> = Vec::new();

        loop {
            match frame.next_child() {
                Some(child) => match Step::of(child)? {
                    Step::Done(node) => frame.accept(node),
                    Step::Open(inner) => parents.push(mem::replace(&mut frame, inner)),
                },
                None => match parents.pop() {
                    Some(parent) => {
                        let done = mem::replace(&mut frame, parent).finish();
                        frame.accept(done);
                    }
                    None => return Ok(frame.finish()),
                },
            }
        }
    }
}

/// Outcome of visiting one JSON value.
enum Step<'a> {
    Done(DagNode),
    Open(Frame<'a>),
}

impl<'a> Step<'a> {
    fn of(value: &'a Value) -> TypeResult<Self> {
        Ok(match value {
            Value::Null => Step::Done(DagNode::Null),
            Value::Bool(b) => Step::Done(DagNode::Bool(*b)),
            Value::Number(n) => Step::Done(match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => DagNode::Integer(i.into()),
                (None, Some(u)) => DagNode::Integer(u.into()),
                _ => DagNode::Float(n.as_f64().unwrap_or(f64::NAN)),
            }),
            Value::String(s) => Step::Done(DagNode::text(s.as_str())),
            Value::Array(items) => Step::Open(Frame::List {
                items: items.iter(),
                out: Vec::with_capacity(items.len()),
            }),
            Value::Object(obj) => match obj.get(LINK_KEY) {
                Some(target) if obj.len() == 1 => Step::Done(reserved(target)?),
                _ => Step::Open(Frame::Map {
                    entries: obj.iter(),
                    key: None,
                    out: Vec::with_capacity(obj.len()),
                }),
            },
        })
    }
}

/// One array or object being converted.
enum Frame<'a> {
    List {
        items: std::slice::Iter<'a, Value>,
        out: Vec<DagNode>,
    },
    Map {
        entries: EntryIter<'a>,
        key: Option<String>,
        out: Vec<(String, DagNode)>,
    },
}

impl<'a> Frame<'a> {
    fn next_child(&mut self) -> Option<&'a Value> {
        match self {
            Frame::List { items, .. } => items.next(),
            Frame::Map { entries, key, .. } => entries.next().map(|(k, v)| {
                *key = Some(k.clone());
                v
            }),
        }
    }

    fn accept(&mut self, node: DagNode) {
        match self {
            Frame::List { out, .. } => out.push(node),
            Frame::Map { key, out, .. } => {
                if let Some(k) = key.take() {
                    out.push((k, node));
                }
            }
        }
    }

    fn finish(self) -> DagNode {
        match self {
            Frame::List { out, .. } => DagNode::List(DagList::from_nodes(out)),
            Frame::Map { out, .. } => DagNode::Map(DagMap::from_entries(out)),
        }
    }
}

/// Decode the value under a lone `"/"` key.
fn reserved(target: &Value) -> TypeResult<DagNode> {
    match target {
        Value::String(s) => Ok(DagNode::Link(LinkValue::Text(s.as_str().into()))),
        Value::Object(inner) if inner.len() == 1 && inner.contains_key(BYTES_KEY) => {
            match &inner[BYTES_KEY] {
                Value::String(encoded) => BASE64
                    .decode(encoded)
                    .map(DagNode::from)
                    .map_err(|e| TypeError::InvalidBytes(e.to_string())),
                other => Err(TypeError::InvalidBytes(format!(
                    "expected base64 text under \"{BYTES_KEY}\", got {other}"
                ))),
            }
        }
        other => Err(TypeError::InvalidLink(format!(
            "expected identifier text under \"/\", got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_map_onto_variants() {
        assert!(matches!(DagNode::from_json(&json!(null)).unwrap(), DagNode::Null));
        assert!(matches!(DagNode::from_json(&json!(true)).unwrap(), DagNode::Bool(true)));
        assert!(matches!(DagNode::from_json(&json!(-7)).unwrap(), DagNode::Integer(-7)));
        assert!(matches!(
            DagNode::from_json(&json!(u64::MAX)).unwrap(),
            DagNode::Integer(i) if i == u64::MAX as i128
        ));
        assert!(matches!(DagNode::from_json(&json!(1.5)).unwrap(), DagNode::Float(f) if f == 1.5));
        assert!(matches!(DagNode::from_json(&json!("x")).unwrap(), DagNode::Text(t) if &*t == "x"));
    }

    #[test]
    fn link_object_becomes_link() {
        let node = DagNode::from_json(&json!({"/": "bafkqaaa"})).unwrap();
        match node {
            DagNode::Link(LinkValue::Text(t)) => assert_eq!(&*t, "bafkqaaa"),
            other => panic!("expected link, got {}", other.kind()),
        }
    }

    #[test]
    fn non_string_link_target_is_rejected() {
        let err = DagNode::from_json(&json!({"link": {"/": 123}})).unwrap_err();
        assert!(matches!(err, TypeError::InvalidLink(_)));
    }

    #[test]
    fn bytes_object_becomes_bytes() {
        let node = DagNode::from_json(&json!({"data": {"/": {"bytes": "AQID"}}})).unwrap();
        let DagNode::Map(map) = node else {
            panic!("expected map");
        };
        match map.get("data").unwrap() {
            Some(DagNode::Bytes(b)) => assert_eq!(&*b, &[1u8, 2, 3]),
            other => panic!("expected bytes, got {other:?}"),
        }
    }

    #[test]
    fn padded_and_unpadded_bytes_decode_alike() {
        for encoded in ["AQI", "AQI="] {
            match DagNode::from_json(&json!({"/": {"bytes": encoded}})).unwrap() {
                DagNode::Bytes(b) => assert_eq!(&*b, &[1u8, 2]),
                other => panic!("expected bytes, got {}", other.kind()),
            }
        }
    }

    #[test]
    fn malformed_base64_is_rejected() {
        let err = DagNode::from_json(&json!({"/": {"bytes": "not base64!"}})).unwrap_err();
        assert!(matches!(err, TypeError::InvalidBytes(_)));
        let err = DagNode::from_json(&json!({"/": {"bytes": 5}})).unwrap_err();
        assert!(matches!(err, TypeError::InvalidBytes(_)));
    }

    #[test]
    fn other_objects_under_slash_are_invalid_links() {
        for target in [json!({"other": "AQID"}), json!({"bytes": "AQID", "x": 1}), json!([1])] {
            let err = DagNode::from_json(&json!({"/": target})).unwrap_err();
            assert!(matches!(err, TypeError::InvalidLink(_)));
        }
    }

    #[test]
    fn deep_nesting_is_converted_iteratively() {
        let depth = 100_000;
        let mut value = json!({"/": "bafkqaaa"});
        for i in 0..depth {
            value = if i % 2 == 0 { json!([value]) } else { json!({"k": value}) };
        }
        let mut node = DagNode::from_json(&value).unwrap();
        // serde_json drops nested values recursively.
        mem::forget(value);

        let mut levels = 0;
        loop {
            node = match node {
                DagNode::List(list) => list.snapshot().unwrap().remove(0),
                DagNode::Map(map) => map.get("k").unwrap().unwrap(),
                other => break assert_eq!(other.kind(), "link"),
            };
            levels += 1;
        }
        assert_eq!(levels, depth);
    }

    #[test]
    fn slash_key_with_siblings_is_a_plain_map() {
        let node = DagNode::from_json(&json!({"/": "x", "other": 1})).unwrap();
        let DagNode::Map(map) = node else {
            panic!("expected map");
        };
        assert_eq!(map.len().unwrap(), 2);
    }

    #[test]
    fn nested_structure_is_preserved() {
        let node = DagNode::from_json(&json!({"items": [1, {"/": "bafkqaaa"}, "s"]})).unwrap();
        let DagNode::Map(map) = node else {
            panic!("expected map");
        };
        let Some(DagNode::List(items)) = map.get("items").unwrap() else {
            panic!("expected list");
        };
        let items = items.snapshot().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].kind(), "link");
    }
}
