//! Atoms: the values that cross closure and argument boundaries.
//!
//! An atom is either an inline scalar or a reference (a heap address or an
//! integer handle into one of the interpreter's auxiliary object spaces).
//! Composite values are never atoms; they live on the heap behind an [`Addr`].

use std::fmt;

/// A heap address. Addresses are handed out by a monotonic counter and never
/// reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Addr(pub usize);

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Integral machine literals. Floating-point values have their own atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Literal {
    Int(i64),
    Word(u64),
    Char(char),
    NullAddr,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}#", n),
            Literal::Word(n) => write!(f, "{}##", n),
            Literal::Char(c) => write!(f, "{:?}#", c),
            Literal::NullAddr => write!(f, "nullAddr#"),
        }
    }
}

/// A pointer into the string-literal table: which literal, and the byte
/// offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringPtr {
    pub id: u32,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    HeapPtr(Addr),
    Literal(Literal),
    StringPtr(StringPtr),
    Void,
    Float(f32),
    Double(f64),
    StablePointer(Box<Atom>),
    MVar(usize),
    Array(usize),
    MutableArray(usize),
    SmallArray(usize),
    SmallMutableArray(usize),
    MutVar(usize),
    ByteArray(usize),
    WeakPointer(usize),
    ThreadId(usize),
}

impl Atom {
    pub fn int(n: i64) -> Self {
        Atom::Literal(Literal::Int(n))
    }

    pub fn word(n: u64) -> Self {
        Atom::Literal(Literal::Word(n))
    }

    /// Primitive comparisons answer with an `Int#` of 1 or 0.
    pub fn from_bool(b: bool) -> Self {
        Atom::int(if b { 1 } else { 0 })
    }

    pub fn as_heap_ptr(&self) -> Option<Addr> {
        match self {
            Atom::HeapPtr(addr) => Some(*addr),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Atom::Literal(Literal::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn as_word(&self) -> Option<u64> {
        match self {
            Atom::Literal(Literal::Word(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Atom::Void)
    }

    /// Short variant name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Atom::HeapPtr(_) => "HeapPtr",
            Atom::Literal(_) => "Literal",
            Atom::StringPtr(_) => "StringPtr",
            Atom::Void => "Void",
            Atom::Float(_) => "Float",
            Atom::Double(_) => "Double",
            Atom::StablePointer(_) => "StablePointer",
            Atom::MVar(_) => "MVar",
            Atom::Array(_) => "Array",
            Atom::MutableArray(_) => "MutableArray",
            Atom::SmallArray(_) => "SmallArray",
            Atom::SmallMutableArray(_) => "SmallMutableArray",
            Atom::MutVar(_) => "MutVar",
            Atom::ByteArray(_) => "ByteArray",
            Atom::WeakPointer(_) => "WeakPointer",
            Atom::ThreadId(_) => "ThreadId",
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::HeapPtr(addr) => write!(f, "{}", addr),
            Atom::Literal(lit) => write!(f, "{}", lit),
            Atom::StringPtr(p) => write!(f, "<string {}+{}>", p.id, p.offset),
            Atom::Void => write!(f, "void#"),
            Atom::Float(x) => write!(f, "{}#", x),
            Atom::Double(x) => write!(f, "{}##", x),
            Atom::StablePointer(inner) => write!(f, "<stable {}>", inner),
            other => match other.handle() {
                Some(h) => write!(f, "<{} {}>", other.kind_name(), h),
                None => write!(f, "<{}>", other.kind_name()),
            },
        }
    }
}

impl Atom {
    fn handle(&self) -> Option<usize> {
        match self {
            Atom::MVar(h)
            | Atom::Array(h)
            | Atom::MutableArray(h)
            | Atom::SmallArray(h)
            | Atom::SmallMutableArray(h)
            | Atom::MutVar(h)
            | Atom::ByteArray(h)
            | Atom::WeakPointer(h)
            | Atom::ThreadId(h) => Some(*h),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bool_encodes_one_and_zero() {
        assert_eq!(Atom::from_bool(true), Atom::int(1));
        assert_eq!(Atom::from_bool(false), Atom::int(0));
    }

    #[test]
    fn test_nan_atoms_are_not_equal() {
        assert_ne!(Atom::Float(f32::NAN), Atom::Float(f32::NAN));
    }

    #[test]
    fn test_display() {
        assert_eq!(Atom::HeapPtr(Addr(4)).to_string(), "@4");
        assert_eq!(Atom::int(-2).to_string(), "-2#");
        assert_eq!(Atom::MutVar(3).to_string(), "<MutVar 3>");
    }
}
