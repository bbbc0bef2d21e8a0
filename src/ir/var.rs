//! Local variables. Every `Var` is scoped to exactly one method and
//! identified by a small index local to that method, mirroring how MIR
//! locals are addressed in `rupta`.

use crate::ir::types::Type;
use crate::newtype_index;

newtype_index! {
    pub struct VarId { "var#{}" }
}

#[derive(Clone, Debug)]
pub struct Var {
    pub id: VarId,
    pub name: String,
    pub ty: Type,
}

impl Var {
    pub fn can_hold_int(&self) -> bool {
        self.ty.can_hold_int()
    }
}
