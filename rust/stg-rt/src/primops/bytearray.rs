//! `ByteArray#` and `MutableByteArray#` operations.
//!
//! Both share one handle space, so freezing is the identity. Multi-byte
//! elements are little-endian and indexed in units of their own width.

use super::{filled, shape_error, to_index, PrimCall, PrimOpHandler};
use crate::error::Result;
use crate::state::StgState;
use std::ops::Range;
use stg_core::{Atom, Literal};

const OPS: &[&str] = &[
    "newByteArray#",
    "newPinnedByteArray#",
    "newAlignedPinnedByteArray#",
    "sizeofByteArray#",
    "sizeofMutableByteArray#",
    "getSizeofMutableByteArray#",
    "shrinkMutableByteArray#",
    "isByteArrayPinned#",
    "isMutableByteArrayPinned#",
    "unsafeFreezeByteArray#",
    "unsafeThawByteArray#",
    "copyByteArray#",
    "copyMutableByteArray#",
    "indexIntArray#",
    "readIntArray#",
    "writeIntArray#",
    "indexWordArray#",
    "readWordArray#",
    "writeWordArray#",
    "indexWord8Array#",
    "readWord8Array#",
    "writeWord8Array#",
    "indexCharArray#",
    "readCharArray#",
    "writeCharArray#",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Int,
    Word,
    Word8,
    Char,
}

impl Element {
    fn of(name: &str) -> Option<Element> {
        let body = name
            .strip_prefix("index")
            .or_else(|| name.strip_prefix("read"))
            .or_else(|| name.strip_prefix("write"))?;
        match body {
            "IntArray#" => Some(Element::Int),
            "WordArray#" => Some(Element::Word),
            "Word8Array#" => Some(Element::Word8),
            "CharArray#" => Some(Element::Char),
            _ => None,
        }
    }

    fn width(self) -> usize {
        match self {
            Element::Int | Element::Word => 8,
            Element::Word8 | Element::Char => 1,
        }
    }

    fn decode(self, bytes: &[u8]) -> Atom {
        match self {
            Element::Word8 => Atom::word(u64::from(bytes[0])),
            Element::Char => Atom::Literal(Literal::Char(char::from(bytes[0]))),
            Element::Int | Element::Word => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                if self == Element::Int {
                    Atom::int(i64::from_le_bytes(raw))
                } else {
                    Atom::word(u64::from_le_bytes(raw))
                }
            }
        }
    }

    /// Encoded bytes, or `None` when the atom has the wrong variant.
    fn encode(self, atom: &Atom) -> Option<Vec<u8>> {
        match (self, atom) {
            (Element::Int, Atom::Literal(Literal::Int(n))) => Some(n.to_le_bytes().to_vec()),
            (Element::Word, Atom::Literal(Literal::Word(n))) => Some(n.to_le_bytes().to_vec()),
            // Truncating stores, like the hardware's.
            (Element::Word8, Atom::Literal(Literal::Word(n))) => Some(vec![*n as u8]),
            (Element::Char, Atom::Literal(Literal::Char(c))) => Some(vec![*c as u32 as u8]),
            _ => None,
        }
    }
}

/// Byte range of element `index` of width `width` in an array of `len` bytes.
fn element_range(
    state: &StgState,
    call: &PrimCall<'_>,
    len: usize,
    index: i64,
    width: usize,
) -> Result<Range<usize>> {
    let index = to_index(state, call, index)?;
    let span = index
        .checked_mul(width)
        .and_then(|start| Some((start, start.checked_add(width)?)));
    match span {
        Some((start, end)) if end <= len => Ok(start..end),
        _ => Err(shape_error(
            state,
            call,
            format!("element {} outside byte array of {} bytes", index, len),
        )),
    }
}

fn byte_range(
    state: &StgState,
    call: &PrimCall<'_>,
    len: usize,
    offset: i64,
    count: i64,
) -> Result<Range<usize>> {
    let start = to_index(state, call, offset)?;
    let count = to_index(state, call, count)?;
    match start.checked_add(count) {
        Some(end) if end <= len => Ok(start..end),
        _ => Err(shape_error(
            state,
            call,
            format!("bytes {}+{} outside byte array of {} bytes", start, count, len),
        )),
    }
}

pub struct ByteArrayOps;

impl ByteArrayOps {
    fn element_op(
        state: &mut StgState,
        call: &PrimCall<'_>,
        element: Element,
    ) -> Result<Option<Vec<Atom>>> {
        let reading = call.name.starts_with("read");
        let (h, index, value) = match (call.name.starts_with("write"), call.args) {
            (false, [Atom::ByteArray(h), i, Atom::Void]) if reading => (*h, i, None),
            (false, [Atom::ByteArray(h), i]) if !reading => (*h, i, None),
            (true, [Atom::ByteArray(h), i, v, Atom::Void]) => (*h, i, Some(v)),
            _ => return Ok(None),
        };
        let Some(index) = index.as_int() else {
            return Ok(None);
        };
        let len = state.lookup_byte_array(h)?.bytes.len();
        let range = element_range(state, call, len, index, element.width())?;
        match value {
            None => {
                let data = state.lookup_byte_array(h)?;
                Ok(Some(vec![element.decode(&data.bytes[range])]))
            }
            Some(value) => {
                let Some(encoded) = element.encode(value) else {
                    return Ok(None);
                };
                let data = state.byte_array_mut(h)?;
                data.bytes[range].copy_from_slice(&encoded);
                Ok(Some(vec![]))
            }
        }
    }

    fn copy(
        state: &mut StgState,
        call: &PrimCall<'_>,
        src: usize,
        dst: usize,
        src_off: &Atom,
        rest: &[Atom],
    ) -> Result<Option<Vec<Atom>>> {
        let [dst_off, count] = rest else {
            return Ok(None);
        };
        let (Some(src_off), Some(dst_off), Some(count)) =
            (src_off.as_int(), dst_off.as_int(), count.as_int())
        else {
            return Ok(None);
        };
        let src_len = state.lookup_byte_array(src)?.bytes.len();
        let from = byte_range(state, call, src_len, src_off, count)?;
        let copied = state.lookup_byte_array(src)?.bytes[from].to_vec();
        let dst_len = state.lookup_byte_array(dst)?.bytes.len();
        let to = byte_range(state, call, dst_len, dst_off, count)?;
        let target = state.byte_array_mut(dst)?;
        target.bytes[to].copy_from_slice(&copied);
        Ok(Some(vec![]))
    }
}

impl PrimOpHandler for ByteArrayOps {
    fn family(&self) -> &'static str {
        "ByteArray"
    }

    fn operations(&self) -> Vec<&'static str> {
        OPS.to_vec()
    }

    fn evaluate(&self, state: &mut StgState, call: &PrimCall<'_>) -> Result<Option<Vec<Atom>>> {
        if let Some(element) = Element::of(call.name) {
            return Self::element_op(state, call, element);
        }
        let result = match (call.name, call.args) {
            ("newByteArray#" | "newPinnedByteArray#", [size, Atom::Void])
            | ("newAlignedPinnedByteArray#", [size, _, Atom::Void]) => {
                let Some(size) = size.as_int() else {
                    return Ok(None);
                };
                let size = to_index(state, call, size)?;
                let bytes = filled(state, call, 0u8, size)?;
                let pinned = call.name != "newByteArray#";
                vec![Atom::ByteArray(state.new_byte_array(bytes, pinned))]
            }
            ("sizeofByteArray#" | "sizeofMutableByteArray#", [Atom::ByteArray(h)])
            | ("getSizeofMutableByteArray#", [Atom::ByteArray(h), Atom::Void]) => {
                vec![Atom::int(state.lookup_byte_array(*h)?.bytes.len() as i64)]
            }
            ("shrinkMutableByteArray#", [Atom::ByteArray(h), size, Atom::Void]) => {
                let Some(size) = size.as_int() else {
                    return Ok(None);
                };
                let size = to_index(state, call, size)?;
                let len = state.lookup_byte_array(*h)?.bytes.len();
                if size > len {
                    return Err(shape_error(
                        state,
                        call,
                        format!("cannot grow {} bytes to {}", len, size),
                    ));
                }
                state.byte_array_mut(*h)?.bytes.truncate(size);
                vec![]
            }
            ("isByteArrayPinned#" | "isMutableByteArrayPinned#", [Atom::ByteArray(h)]) => {
                vec![Atom::from_bool(state.lookup_byte_array(*h)?.pinned)]
            }
            (
                "unsafeFreezeByteArray#" | "unsafeThawByteArray#",
                [Atom::ByteArray(h), Atom::Void],
            ) => {
                state.lookup_byte_array(*h)?;
                vec![Atom::ByteArray(*h)]
            }
            (
                "copyByteArray#" | "copyMutableByteArray#",
                [Atom::ByteArray(src), src_off, Atom::ByteArray(dst), rest @ .., Atom::Void],
            ) => {
                return Self::copy(state, call, *src, *dst, src_off, rest);
            }
            _ => return Ok(None),
        };
        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use stg_core::syntax::ResultType;

    static POLY: ResultType = ResultType::Poly;

    fn run(st: &mut StgState, name: &str, args: &[Atom]) -> Result<Option<Vec<Atom>>> {
        let call = PrimCall {
            name,
            args,
            result_type: &POLY,
            result_tycon: None,
        };
        ByteArrayOps.evaluate(st, &call)
    }

    #[test]
    fn test_int_elements_round_through_bytes() {
        let mut st = StgState::new();
        let out = run(&mut st, "newByteArray#", &[Atom::int(16), Atom::Void]);
        let ba = out.unwrap().unwrap()[0].clone();

        let args = [ba.clone(), Atom::int(1), Atom::int(-2), Atom::Void];
        run(&mut st, "writeIntArray#", &args).unwrap();
        let args = [ba.clone(), Atom::int(1), Atom::Void];
        assert_eq!(
            run(&mut st, "readIntArray#", &args).unwrap(),
            Some(vec![Atom::int(-2)])
        );
        let args = [ba.clone(), Atom::int(8)];
        assert_eq!(
            run(&mut st, "indexWord8Array#", &args).unwrap(),
            Some(vec![Atom::word(0xfe)])
        );
        assert_eq!(
            run(&mut st, "sizeofMutableByteArray#", &[ba]).unwrap(),
            Some(vec![Atom::int(16)])
        );
    }

    #[test]
    fn test_pinning_and_freeze_identity() {
        let mut st = StgState::new();
        let args = [Atom::int(4), Atom::Void];
        let pinned = run(&mut st, "newPinnedByteArray#", &args).unwrap().unwrap();
        assert_eq!(
            run(&mut st, "isByteArrayPinned#", &pinned).unwrap(),
            Some(vec![Atom::int(1)])
        );
        let args = [pinned[0].clone(), Atom::Void];
        let frozen = run(&mut st, "unsafeFreezeByteArray#", &args).unwrap();
        assert_eq!(frozen, Some(pinned));
    }

    #[test]
    fn test_unallocatable_size_is_shape_error() {
        let mut st = StgState::new();
        let sizes = [
            ("newByteArray#", vec![Atom::int(i64::MAX), Atom::Void]),
            ("newPinnedByteArray#", vec![Atom::int(i64::MAX), Atom::Void]),
            (
                "newAlignedPinnedByteArray#",
                vec![Atom::int(i64::MAX), Atom::int(8), Atom::Void],
            ),
        ];
        for (name, args) in sizes {
            let err = run(&mut st, name, &args).unwrap_err();
            assert!(matches!(err.kind, ErrorKind::PrimOpShape { .. }), "{name}");
        }
        assert_eq!(st.stats().byte_arrays, 0);
    }

    #[test]
    fn test_element_out_of_bounds() {
        let mut st = StgState::new();
        let h = st.new_byte_array(vec![0; 7], false);
        let args = [Atom::ByteArray(h), Atom::int(0)];
        let err = run(&mut st, "indexIntArray#", &args).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::PrimOpShape { .. }));
    }

    #[test]
    fn test_copy_between_byte_arrays() {
        let mut st = StgState::new();
        let src = st.new_byte_array(vec![1, 2, 3, 4], false);
        let dst = st.new_byte_array(vec![0; 4], false);
        let args = [
            Atom::ByteArray(src),
            Atom::int(2),
            Atom::ByteArray(dst),
            Atom::int(0),
            Atom::int(2),
            Atom::Void,
        ];
        run(&mut st, "copyByteArray#", &args).unwrap();
        assert_eq!(st.lookup_byte_array(dst).unwrap().bytes, vec![3, 4, 0, 0]);
    }

    #[test]
    fn test_wrong_element_variant_declined() {
        let mut st = StgState::new();
        let h = st.new_byte_array(vec![0; 8], false);
        let args = [Atom::ByteArray(h), Atom::int(0), Atom::word(1), Atom::Void];
        let out = run(&mut st, "writeIntArray#", &args).unwrap();
        assert_eq!(out, None);
    }
}
