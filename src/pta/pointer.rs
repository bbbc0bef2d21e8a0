//! Pointer-flow-graph nodes. Unlike heap objects (`ObjId`), pointers are
//! never stored *inside* a points-to set, only used as map keys, so they
//! need no `Idx` impl — `Hash + Eq + Copy` is enough for `DiffPTData`.

use crate::ir::{FieldId, MethodId, VarId};
use crate::pta::context::ContextId;
use crate::pta::obj::ObjId;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Pointer {
    /// A local variable, under the context active at its defining method.
    Var(ContextId, MethodId, VarId),
    /// A static field: one location program-wide, no context.
    StaticField(FieldId),
    /// An instance field on a specific heap object.
    InstanceField(ObjId, FieldId),
    /// All elements of an array object, merged into a single node (the
    /// array load/store matching rule never distinguishes indices).
    ArrayElem(ObjId),
}
