//! Boxed arrays, both the regular and the small flavour.
//!
//! Each flavour has an immutable and a mutable space. Freezing and thawing
//! copy the elements into a fresh handle in the other space; indices are
//! bounds-checked and an out-of-range access is a `PrimOpShape` error.

use super::{filled, shape_error, to_index, PrimCall, PrimOpHandler};
use crate::error::Result;
use crate::state::{ArrayKind, StgState};
use std::ops::Range;
use stg_core::Atom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayOp {
    New,
    Read,
    Write,
    Index,
    Size,
    SizeMutable,
    GetSizeMutable,
    UnsafeFreeze,
    UnsafeThaw,
    Freeze,
    Thaw,
    Copy,
    CopyMutable,
}

const LARGE: &[(&str, ArrayOp)] = &[
    ("newArray#", ArrayOp::New),
    ("readArray#", ArrayOp::Read),
    ("writeArray#", ArrayOp::Write),
    ("indexArray#", ArrayOp::Index),
    ("sizeofArray#", ArrayOp::Size),
    ("sizeofMutableArray#", ArrayOp::SizeMutable),
    ("unsafeFreezeArray#", ArrayOp::UnsafeFreeze),
    ("unsafeThawArray#", ArrayOp::UnsafeThaw),
    ("freezeArray#", ArrayOp::Freeze),
    ("thawArray#", ArrayOp::Thaw),
    ("copyArray#", ArrayOp::Copy),
    ("copyMutableArray#", ArrayOp::CopyMutable),
];

const SMALL: &[(&str, ArrayOp)] = &[
    ("newSmallArray#", ArrayOp::New),
    ("readSmallArray#", ArrayOp::Read),
    ("writeSmallArray#", ArrayOp::Write),
    ("indexSmallArray#", ArrayOp::Index),
    ("sizeofSmallArray#", ArrayOp::Size),
    ("sizeofSmallMutableArray#", ArrayOp::SizeMutable),
    ("getSizeofSmallMutableArray#", ArrayOp::GetSizeMutable),
    ("unsafeFreezeSmallArray#", ArrayOp::UnsafeFreeze),
    ("unsafeThawSmallArray#", ArrayOp::UnsafeThaw),
    ("freezeSmallArray#", ArrayOp::Freeze),
    ("thawSmallArray#", ArrayOp::Thaw),
    ("copySmallArray#", ArrayOp::Copy),
    ("copySmallMutableArray#", ArrayOp::CopyMutable),
];

#[derive(Debug, Clone, Copy)]
pub struct ArrayOps {
    small: bool,
}

impl ArrayOps {
    /// `Array#` and `MutableArray#`.
    pub fn large() -> Self {
        Self { small: false }
    }

    /// `SmallArray#` and `SmallMutableArray#`.
    pub fn small() -> Self {
        Self { small: true }
    }

    fn table(&self) -> &'static [(&'static str, ArrayOp)] {
        if self.small {
            SMALL
        } else {
            LARGE
        }
    }

    fn frozen_kind(&self) -> ArrayKind {
        if self.small {
            ArrayKind::SmallArray
        } else {
            ArrayKind::Array
        }
    }

    fn mutable_kind(&self) -> ArrayKind {
        if self.small {
            ArrayKind::SmallMutableArray
        } else {
            ArrayKind::MutableArray
        }
    }

    fn frozen(&self, atom: &Atom) -> Option<usize> {
        match (self.small, atom) {
            (false, Atom::Array(h)) | (true, Atom::SmallArray(h)) => Some(*h),
            _ => None,
        }
    }

    fn mutable(&self, atom: &Atom) -> Option<usize> {
        match (self.small, atom) {
            (false, Atom::MutableArray(h)) | (true, Atom::SmallMutableArray(h)) => Some(*h),
            _ => None,
        }
    }

    fn frozen_atom(&self, h: usize) -> Atom {
        if self.small {
            Atom::SmallArray(h)
        } else {
            Atom::Array(h)
        }
    }

    fn mutable_atom(&self, h: usize) -> Atom {
        if self.small {
            Atom::SmallMutableArray(h)
        } else {
            Atom::MutableArray(h)
        }
    }

    /// Source handle and kind for a read-only access: frozen for the
    /// immutable operations, mutable otherwise.
    fn source(&self, atom: &Atom, want_mutable: bool) -> Option<(ArrayKind, usize)> {
        if want_mutable {
            self.mutable(atom).map(|h| (self.mutable_kind(), h))
        } else {
            self.frozen(atom).map(|h| (self.frozen_kind(), h))
        }
    }
}

fn int_args<const N: usize>(args: &[Atom]) -> Option<[i64; N]> {
    let mut out = [0; N];
    for (slot, atom) in out.iter_mut().zip(args) {
        *slot = atom.as_int()?;
    }
    (args.len() == N).then_some(out)
}

/// `offset .. offset + count`, checked against `len`.
fn checked_range(
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
            format!("range {}+{} outside array of size {}", start, count, len),
        )),
    }
}

fn checked_slot(state: &StgState, call: &PrimCall<'_>, len: usize, index: i64) -> Result<usize> {
    checked_range(state, call, len, index, 1).map(|r| r.start)
}

impl PrimOpHandler for ArrayOps {
    fn family(&self) -> &'static str {
        if self.small {
            "SmallArray"
        } else {
            "Array"
        }
    }

    fn operations(&self) -> Vec<&'static str> {
        self.table().iter().map(|(n, _)| *n).collect()
    }

    fn evaluate(&self, state: &mut StgState, call: &PrimCall<'_>) -> Result<Option<Vec<Atom>>> {
        let Some(op) = self
            .table()
            .iter()
            .find(|(n, _)| *n == call.name)
            .map(|(_, op)| *op)
        else {
            return Ok(None);
        };

        let result = match (op, call.args) {
            (ArrayOp::New, [size, init, Atom::Void]) => {
                let Some(size) = size.as_int() else {
                    return Ok(None);
                };
                let size = to_index(state, call, size)?;
                let elements = filled(state, call, init.clone(), size)?;
                let h = state.new_array_of(self.mutable_kind(), elements);
                vec![self.mutable_atom(h)]
            }
            (ArrayOp::Read, [arr, i, Atom::Void]) | (ArrayOp::Index, [arr, i]) => {
                let Some((kind, h)) = self.source(arr, op == ArrayOp::Read) else {
                    return Ok(None);
                };
                let Some(i) = i.as_int() else {
                    return Ok(None);
                };
                let elems = state.lookup_array_of(kind, h)?;
                let slot = checked_slot(state, call, elems.len(), i)?;
                vec![elems[slot].clone()]
            }
            (ArrayOp::Write, [arr, i, value, Atom::Void]) => {
                let (Some(h), Some(i)) = (self.mutable(arr), i.as_int()) else {
                    return Ok(None);
                };
                let len = state.lookup_array_of(self.mutable_kind(), h)?.len();
                let slot = checked_slot(state, call, len, i)?;
                state.array_of_mut(self.mutable_kind(), h)?[slot] = value.clone();
                vec![]
            }
            (ArrayOp::Size, [arr])
            | (ArrayOp::SizeMutable, [arr])
            | (ArrayOp::GetSizeMutable, [arr, Atom::Void]) => {
                let Some((kind, h)) = self.source(arr, op != ArrayOp::Size) else {
                    return Ok(None);
                };
                vec![Atom::int(state.lookup_array_of(kind, h)?.len() as i64)]
            }
            (ArrayOp::UnsafeFreeze, [arr, Atom::Void]) => {
                let Some(h) = self.mutable(arr) else {
                    return Ok(None);
                };
                let elems = state.lookup_array_of(self.mutable_kind(), h)?.to_vec();
                let h = state.new_array_of(self.frozen_kind(), elems);
                vec![self.frozen_atom(h)]
            }
            (ArrayOp::UnsafeThaw, [arr, Atom::Void]) => {
                let Some(h) = self.frozen(arr) else {
                    return Ok(None);
                };
                let elems = state.lookup_array_of(self.frozen_kind(), h)?.to_vec();
                let h = state.new_array_of(self.mutable_kind(), elems);
                vec![self.mutable_atom(h)]
            }
            (ArrayOp::Freeze | ArrayOp::Thaw, [arr, rest @ .., Atom::Void]) => {
                let thaw = op == ArrayOp::Thaw;
                let (Some((kind, h)), Some([offset, count])) =
                    (self.source(arr, !thaw), int_args::<2>(rest))
                else {
                    return Ok(None);
                };
                let elems = state.lookup_array_of(kind, h)?;
                let range = checked_range(state, call, elems.len(), offset, count)?;
                let copied = elems[range].to_vec();
                if thaw {
                    let h = state.new_array_of(self.mutable_kind(), copied);
                    vec![self.mutable_atom(h)]
                } else {
                    let h = state.new_array_of(self.frozen_kind(), copied);
                    vec![self.frozen_atom(h)]
                }
            }
            (ArrayOp::Copy | ArrayOp::CopyMutable, [src, src_off, dst, rest @ .., Atom::Void]) => {
                let from_mutable = op == ArrayOp::CopyMutable;
                let (Some((kind, src)), Some(dst)) =
                    (self.source(src, from_mutable), self.mutable(dst))
                else {
                    return Ok(None);
                };
                let (Some(src_off), Some([dst_off, count])) =
                    (src_off.as_int(), int_args::<2>(rest))
                else {
                    return Ok(None);
                };
                let source = state.lookup_array_of(kind, src)?;
                let from = checked_range(state, call, source.len(), src_off, count)?;
                let copied = source[from].to_vec();
                let dst_len = state.lookup_array_of(self.mutable_kind(), dst)?.len();
                let to = checked_range(state, call, dst_len, dst_off, count)?;
                let target = state.array_of_mut(self.mutable_kind(), dst)?;
                target[to].clone_from_slice(&copied);
                vec![]
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

    fn run(
        ops: ArrayOps,
        st: &mut StgState,
        name: &str,
        args: &[Atom],
    ) -> Result<Option<Vec<Atom>>> {
        let call = PrimCall {
            name,
            args,
            result_type: &POLY,
            result_tycon: None,
        };
        ops.evaluate(st, &call)
    }

    fn one(r: Result<Option<Vec<Atom>>>) -> Atom {
        let mut atoms = r.unwrap().unwrap();
        assert_eq!(atoms.len(), 1);
        atoms.remove(0)
    }

    #[test]
    fn test_new_write_read() {
        let ops = ArrayOps::large();
        let mut st = StgState::new();
        let args = [Atom::int(3), Atom::int(0), Atom::Void];
        let arr = one(run(ops, &mut st, "newArray#", &args));
        assert_eq!(arr, Atom::MutableArray(0));

        let args = [arr.clone(), Atom::int(1), Atom::int(7), Atom::Void];
        run(ops, &mut st, "writeArray#", &args).unwrap();
        let args = [arr.clone(), Atom::int(1), Atom::Void];
        assert_eq!(one(run(ops, &mut st, "readArray#", &args)), Atom::int(7));
        let size = one(run(ops, &mut st, "sizeofMutableArray#", &[arr]));
        assert_eq!(size, Atom::int(3));
    }

    #[test]
    fn test_freeze_copies_into_frozen_space() {
        let ops = ArrayOps::small();
        let mut st = StgState::new();
        let args = [Atom::int(2), Atom::int(4), Atom::Void];
        let marr = one(run(ops, &mut st, "newSmallArray#", &args));
        let args = [marr.clone(), Atom::Void];
        let frozen = one(run(ops, &mut st, "unsafeFreezeSmallArray#", &args));
        assert_eq!(frozen, Atom::SmallArray(0));

        let args = [marr, Atom::int(0), Atom::int(9), Atom::Void];
        run(ops, &mut st, "writeSmallArray#", &args).unwrap();
        let args = [frozen, Atom::int(0)];
        assert_eq!(
            one(run(ops, &mut st, "indexSmallArray#", &args)),
            Atom::int(4)
        );
    }

    #[test]
    fn test_copy_and_thaw_slice() {
        let ops = ArrayOps::large();
        let mut st = StgState::new();
        let src = st.new_array_of(ArrayKind::Array, (0..5).map(Atom::int).collect());
        let args = [Atom::int(4), Atom::Void, Atom::Void];
        let dst = one(run(ops, &mut st, "newArray#", &args));
        let args = [
            Atom::Array(src),
            Atom::int(1),
            dst.clone(),
            Atom::int(2),
            Atom::int(2),
            Atom::Void,
        ];
        run(ops, &mut st, "copyArray#", &args).unwrap();
        assert_eq!(
            st.lookup_mutable_array(0).unwrap(),
            &[Atom::Void, Atom::Void, Atom::int(1), Atom::int(2)]
        );

        let args = [Atom::Array(src), Atom::int(3), Atom::int(2), Atom::Void];
        let thawed = one(run(ops, &mut st, "thawArray#", &args));
        assert_eq!(thawed, Atom::MutableArray(1));
        assert_eq!(
            st.lookup_mutable_array(1).unwrap(),
            &[Atom::int(3), Atom::int(4)]
        );
    }

    #[test]
    fn test_out_of_bounds_is_shape_error() {
        let ops = ArrayOps::large();
        let mut st = StgState::new();
        let args = [Atom::int(1), Atom::int(0), Atom::Void];
        let arr = one(run(ops, &mut st, "newArray#", &args));

        let args = [arr.clone(), Atom::int(1), Atom::Void];
        let err = run(ops, &mut st, "readArray#", &args).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::PrimOpShape { .. }));
        let args = [arr, Atom::int(-1), Atom::Void];
        let err = run(ops, &mut st, "readArray#", &args).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::PrimOpShape { .. }));
    }

    #[test]
    fn test_unallocatable_size_is_shape_error() {
        for ops in [ArrayOps::large(), ArrayOps::small()] {
            let mut st = StgState::new();
            let name = if ops.small {
                "newSmallArray#"
            } else {
                "newArray#"
            };
            let args = [Atom::int(1 << 60), Atom::int(0), Atom::Void];
            let err = run(ops, &mut st, name, &args).unwrap_err();
            assert!(matches!(err.kind, ErrorKind::PrimOpShape { .. }));
            assert_eq!(
                st.stats().mutable_arrays + st.stats().small_mutable_arrays,
                0
            );
        }
    }

    #[test]
    fn test_wrong_flavour_is_declined() {
        let mut st = StgState::new();
        let h = st.new_array_of(ArrayKind::SmallArray, vec![Atom::int(1)]);
        let args = [Atom::SmallArray(h)];
        let out = run(ArrayOps::large(), &mut st, "sizeofArray#", &args).unwrap();
        assert_eq!(out, None);
    }
}
