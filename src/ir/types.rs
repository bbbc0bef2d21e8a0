//! Type tags carried by variables, fields and allocation sites.

use crate::ir::class::ClassId;
use std::fmt;

/// A type in the analyzed program's type system. Primitives other than
/// `Int` are collapsed away: the analysis core only ever needs to know
/// whether a value *can* hold an integer (for the constant-propagation
/// lattice) and whether a value is a reference type (for points-to).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    /// Any other primitive (float, bool, char, ...) that constant
    /// propagation does not model but that still needs a type slot.
    OtherPrimitive,
    Class(ClassId),
    Array(Box<Type>),
}

impl Type {
    /// Whether a variable of this type is eligible for the integer
    /// constant-propagation lattice.
    pub fn can_hold_int(&self) -> bool {
        matches!(self, Type::Int)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Class(_) | Type::Array(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::OtherPrimitive => write!(f, "primitive"),
            Type::Class(id) => write!(f, "class#{}", id.as_u32()),
            Type::Array(elem) => write!(f, "{}[]", elem),
        }
    }
}
