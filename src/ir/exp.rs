//! Expressions that appear on the right-hand side of statements.

use crate::ir::call_site::CallSiteId;
use crate::ir::class::{ClassId, FieldId};
use crate::ir::types::Type;
use crate::ir::var::VarId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Ushr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Clone, Debug)]
pub enum Exp {
    Var(VarId),
    IntConst(i32),
    Binary(BinOp, VarId, VarId),
    Unary(UnOp, VarId),
    NewObject(ClassId),
    NewArray(Type),
    /// A method invocation used as an expression; the call's destination is
    /// carried on the owning `Stmt::Invoke`, not here.
    InvokeExp(CallSiteId),
    InstanceFieldAccess { base: VarId, field: FieldId },
    StaticFieldAccess(FieldId),
    ArrayAccess { base: VarId, index: VarId },
    Cast(VarId, Type),
    This,
}
