//! Raw ABI decoder (C3): turns signatures + raw encoded bytes into a decoded tree.

use crate::item::AbiItem;
use crate::parameter::{DataType, ParamKind, Parameter};
use crate::Error;
use num_bigint::{BigInt, Sign};
use semabi_codec::Cell;
use std::collections::HashMap;

const WORD: usize = 32;

/// A decoded parameter tree. Leaves carry a [`Cell`]; `address` values are lower-cased,
/// `bytes`/`bytesN` values are lower-case hex without a `0x` prefix, per §4.1.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Leaf(Cell),
    Tuple(Vec<(String, Decoded)>),
    Array(Vec<Decoded>),
}

impl Decoded {
    pub fn as_tuple(&self) -> Option<&[(String, Decoded)]> {
        match self {
            Decoded::Tuple(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Decoded]> {
        match self {
            Decoded::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Cell> {
        match self {
            Decoded::Leaf(cell) => Some(cell),
            _ => None,
        }
    }
}

fn read_word(region: &[u8], word_index: usize) -> Result<[u8; WORD], Error> {
    let start = word_index * WORD;
    let end = start + WORD;
    if end > region.len() {
        return Err(Error::Truncated {
            needed: end,
            have: region.len(),
        });
    }
    let mut buf = [0u8; WORD];
    buf.copy_from_slice(&region[start..end]);
    Ok(buf)
}

fn word_to_offset(word: &[u8; WORD]) -> usize {
    let mut arr = [0u8; 8];
    arr.copy_from_slice(&word[24..32]);
    u64::from_be_bytes(arr) as usize
}

fn decode_primitive_word(data_type: &DataType, word: &[u8; WORD]) -> Cell {
    match data_type {
        DataType::Bool => Cell::Boolean(word[31] != 0),
        DataType::Address => Cell::Hex(hex::encode(&word[12..32])),
        DataType::FixedBytes(n) => Cell::Hex(hex::encode(&word[..*n as usize])),
        DataType::Int(_) => Cell::Integer(BigInt::from_signed_bytes_be(word)),
        DataType::Uint(_) => Cell::Integer(BigInt::from_bytes_be(Sign::Plus, word)),
        DataType::String | DataType::Bytes => unreachable!("dynamic primitives never decode from a single word"),
    }
}

/// Word count a *static* parameter occupies inline. Only ever called on parameters for
/// which `is_dynamic()` is false, so arrays (always dynamic) never reach here.
fn static_word_count(param: &Parameter) -> usize {
    match &param.kind {
        ParamKind::Primitive(_) => 1,
        ParamKind::Tuple(components) => components.iter().map(static_word_count).sum(),
    }
}

/// The parameter describing a single element of an array/array-of-arrays parameter.
fn element_parameter(param: &Parameter) -> Parameter {
    let mut element = param.clone();
    if param.is_array_of_arrays {
        element.is_array_of_arrays = false;
        element.is_array = true;
    } else {
        element.is_array = false;
    }
    element
}

/// Decodes a sequence of parameters whose encoding occupies `region` in full — the
/// standard ABI "implicit outer tuple" rule applies at every nesting level: static
/// fields are read inline from the region's head, dynamic fields are read through an
/// offset word that is relative to the *start of this region*.
fn decode_tuple_like(params: &[Parameter], region: &[u8]) -> Result<Vec<(String, Decoded)>, Error> {
    let mut head_cursor = 0usize;
    let mut results = Vec::with_capacity(params.len());

    for param in params {
        if param.is_dynamic() {
            let head_word = read_word(region, head_cursor)?;
            let offset = word_to_offset(&head_word);
            let decoded = decode_dynamic_value(param, region, offset)?;
            results.push((param.name.clone(), decoded));
            head_cursor += 1;
        } else {
            let words = static_word_count(param);
            let start = head_cursor * WORD;
            if start + words * WORD > region.len() {
                return Err(Error::Truncated {
                    needed: start + words * WORD,
                    have: region.len(),
                });
            }
            let decoded = decode_static_value(param, &region[start..])?;
            results.push((param.name.clone(), decoded));
            head_cursor += words;
        }
    }

    Ok(results)
}

fn decode_static_value(param: &Parameter, sub: &[u8]) -> Result<Decoded, Error> {
    match &param.kind {
        ParamKind::Primitive(dt) => {
            let word = read_word(sub, 0)?;
            Ok(Decoded::Leaf(decode_primitive_word(dt, &word)))
        }
        ParamKind::Tuple(components) => Ok(Decoded::Tuple(decode_tuple_like(components, sub)?)),
    }
}

fn decode_dynamic_value(param: &Parameter, region: &[u8], offset: usize) -> Result<Decoded, Error> {
    if offset > region.len() {
        return Err(Error::BadOffset(offset));
    }
    let tail = &region[offset..];

    if param.is_array || param.is_array_of_arrays {
        let len_word = read_word(tail, 0)?;
        let len = word_to_offset(&len_word);
        let elements_region = &tail[WORD..];
        let element = element_parameter(param);
        let synthetic: Vec<Parameter> = std::iter::repeat(element).take(len).collect();
        let fields = decode_tuple_like(&synthetic, elements_region)?;
        Ok(Decoded::Array(fields.into_iter().map(|(_, d)| d).collect()))
    } else {
        match &param.kind {
            ParamKind::Tuple(components) => Ok(Decoded::Tuple(decode_tuple_like(components, tail)?)),
            ParamKind::Primitive(dt) => {
                let len_word = read_word(tail, 0)?;
                let len = word_to_offset(&len_word);
                let start = WORD;
                let end = WORD + len;
                if end > tail.len() {
                    return Err(Error::Truncated {
                        needed: end,
                        have: tail.len(),
                    });
                }
                let bytes = &tail[start..end];
                match dt {
                    DataType::Bytes => Ok(Decoded::Leaf(Cell::Hex(hex::encode(bytes)))),
                    DataType::String => Ok(Decoded::Leaf(Cell::String(
                        String::from_utf8(bytes.to_vec())
                            .map_err(|e| Error::MalformedJson(e.to_string()))?,
                    ))),
                    _ => unreachable!("only string/bytes are dynamic primitives"),
                }
            }
        }
    }
}

/// Decodes a flat parameter list (function input/output, or an event's non-indexed
/// parameters) against its ABI-encoded byte region.
pub fn decode_params(params: &[Parameter], data: &[u8]) -> Result<Vec<(String, Decoded)>, Error> {
    decode_tuple_like(params, data)
}

fn decode_indexed_param(param: &Parameter, word: &[u8; WORD]) -> Decoded {
    if param.is_array || param.is_array_of_arrays {
        return Decoded::Leaf(Cell::Hex(hex::encode(word)));
    }
    match &param.kind {
        ParamKind::Tuple(_) => Decoded::Leaf(Cell::Hex(hex::encode(word))),
        ParamKind::Primitive(dt) if dt.is_dynamic() => Decoded::Leaf(Cell::Hex(hex::encode(word))),
        ParamKind::Primitive(dt) => Decoded::Leaf(decode_primitive_word(dt, word)),
    }
}

/// Decodes an event log: validates `topics[0]` against the event's hash and the topic
/// count against the number of indexed parameters, then decodes indexed parameters
/// from the remaining topics and non-indexed parameters from `data`, §4.1.
pub fn decode_event<T: AsRef<str>>(item: &AbiItem, topics: &[T], data: &[u8]) -> Result<Vec<(String, Decoded)>, Error> {
    let AbiItem::Event { inputs, .. } = item else {
        return Err(Error::MalformedJson("decode_event called on a non-event item".into()));
    };

    let expected_hash = item.hash();
    let topic0 = topics
        .first()
        .ok_or(Error::TopicCountMismatch { expected: 1, actual: 0 })?
        .as_ref()
        .trim_start_matches("0x")
        .to_ascii_lowercase();
    if topic0 != expected_hash {
        return Err(Error::EventHashMismatch {
            expected: expected_hash,
            actual: topic0,
        });
    }

    let indexed: Vec<&Parameter> = inputs.iter().filter(|p| p.is_indexed).collect();
    let indexed_topics = &topics[1..];
    if indexed_topics.len() != indexed.len() {
        return Err(Error::TopicCountMismatch {
            expected: indexed.len(),
            actual: indexed_topics.len(),
        });
    }

    let mut indexed_map: HashMap<String, Decoded> = HashMap::with_capacity(indexed.len());
    for (param, topic) in indexed.iter().zip(indexed_topics.iter()) {
        let bytes = hex::decode(topic.as_ref().trim_start_matches("0x"))
            .map_err(|e| Error::MalformedJson(e.to_string()))?;
        if bytes.len() != WORD {
            return Err(Error::Truncated {
                needed: WORD,
                have: bytes.len(),
            });
        }
        let mut word = [0u8; WORD];
        word.copy_from_slice(&bytes);
        indexed_map.insert(param.name.clone(), decode_indexed_param(param, &word));
    }

    let non_indexed: Vec<Parameter> = inputs.iter().filter(|p| !p.is_indexed).cloned().collect();
    let mut data_map: HashMap<String, Decoded> = decode_params(&non_indexed, data)?.into_iter().collect();

    let mut result = Vec::with_capacity(inputs.len());
    for param in inputs {
        let decoded = if param.is_indexed {
            indexed_map.remove(&param.name)
        } else {
            data_map.remove(&param.name)
        };
        let decoded = decoded.ok_or_else(|| Error::MalformedJson(format!("missing decoded value for '{}'", param.name)))?;
        result.push((param.name.clone(), decoded));
    }

    Ok(result)
}

/// Decodes function calldata: strips the 4-byte selector, decodes against the input
/// type list, §4.1.
pub fn decode_function_input(item: &AbiItem, calldata: &[u8]) -> Result<Vec<(String, Decoded)>, Error> {
    if calldata.len() < 4 {
        return Err(Error::MissingSelector);
    }
    decode_params(item.inputs(), &calldata[4..])
}

/// Decodes function return data. Empty return data (zero bytes once hex-decoded)
/// yields `None` ("no output"), per §4.1.
pub fn decode_function_output(item: &AbiItem, returndata: &[u8]) -> Result<Option<Vec<(String, Decoded)>>, Error> {
    if returndata.is_empty() {
        return Ok(None);
    }
    decode_params(item.outputs(), returndata).map(Some)
}
