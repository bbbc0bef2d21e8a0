//! Statements, in program order, addressed by their index within
//! `Method::stmts`. Control-flow statements (`If`/`Switch`/`Goto`) target
//! other statements by index; the CFG builder turns those into edges.

use crate::ir::call_site::CallSiteId;
use crate::ir::class::FieldId;
use crate::ir::exp::Exp;
use crate::ir::var::VarId;

#[derive(Clone, Debug)]
pub enum Stmt {
    /// `lhs = rhs`, covering copies, constants, arithmetic, casts and
    /// object/array allocation — anything whose right-hand side is a plain
    /// `Exp` with no side effect beyond defining `lhs`.
    Assign { lhs: VarId, rhs: Exp },
    LoadField { lhs: VarId, base: VarId, field: FieldId },
    StoreField { base: VarId, field: FieldId, rhs: VarId },
    LoadStaticField { lhs: VarId, field: FieldId },
    StoreStaticField { field: FieldId, rhs: VarId },
    LoadArray { lhs: VarId, base: VarId, index: VarId },
    StoreArray { base: VarId, index: VarId, rhs: VarId },
    /// A call used for its side effects (result, if any, discarded or
    /// stored directly rather than via `Exp::InvokeExp`).
    Invoke { call_site: CallSiteId, dest: Option<VarId> },
    If { cond: VarId, target: usize },
    Switch { var: VarId, cases: Vec<(i32, usize)>, default: usize },
    Goto(usize),
    Return(Option<VarId>),
    Nop,
}

impl Stmt {
    /// The call site this statement invokes, if any — covers both
    /// statement-level `Invoke` and an `InvokeExp` nested in an `Assign`.
    pub fn call_site(&self) -> Option<CallSiteId> {
        match self {
            Stmt::Invoke { call_site, .. } => Some(*call_site),
            Stmt::Assign { rhs: Exp::InvokeExp(cs), .. } => Some(*cs),
            _ => None,
        }
    }

    /// The variable defined by this statement, if any.
    pub fn def(&self) -> Option<VarId> {
        match self {
            Stmt::Assign { lhs, .. }
            | Stmt::LoadField { lhs, .. }
            | Stmt::LoadStaticField { lhs, .. }
            | Stmt::LoadArray { lhs, .. } => Some(*lhs),
            Stmt::Invoke { dest, .. } => *dest,
            _ => None,
        }
    }

    /// Successor statement indices within the same method, given this
    /// statement's own index and the index of the following statement in
    /// program order (`fallthrough`, `None` at the end of the method).
    pub fn successors(&self, index: usize, fallthrough: Option<usize>) -> Vec<usize> {
        match self {
            Stmt::Goto(target) => vec![*target],
            Stmt::If { target, .. } => {
                let mut succs = vec![*target];
                succs.extend(fallthrough);
                succs
            }
            Stmt::Switch { cases, default, .. } => {
                let mut succs: Vec<usize> = cases.iter().map(|(_, t)| *t).collect();
                succs.push(*default);
                succs
            }
            Stmt::Return(_) => vec![],
            _ => {
                let _ = index;
                fallthrough.into_iter().collect()
            }
        }
    }
}
