//! Backward may-liveness: a variable is live at a program point if some
//! path from that point reads it before it is redefined. Feeds the
//! dead-code detector, which flags assignments whose left-hand side is
//! never live afterward.

use std::collections::HashSet;

use crate::cfg::{Cfg, CfgNode};
use crate::dataflow::analysis::DataflowAnalysis;
use crate::ir::{Exp, Method, Stmt, VarId};

pub type LiveSet = HashSet<VarId>;

pub struct Liveness<'m> {
    pub method: &'m Method,
}

impl<'m> Liveness<'m> {
    pub fn new(method: &'m Method) -> Self {
        Liveness { method }
    }
}

impl<'m> DataflowAnalysis for Liveness<'m> {
    type Fact = LiveSet;

    fn is_forward(&self) -> bool {
        false
    }

    fn new_boundary_fact(&self, _cfg: &Cfg) -> LiveSet {
        HashSet::new()
    }

    fn new_initial_fact(&self) -> LiveSet {
        HashSet::new()
    }

    fn meet_into(&self, fact: &LiveSet, target: &mut LiveSet) -> bool {
        let before = target.len();
        target.extend(fact.iter().copied());
        target.len() != before
    }

    fn transfer_node(&self, node: CfgNode, out: &LiveSet, input: &mut LiveSet) -> bool {
        let mut next = out.clone();
        if let CfgNode::Stmt(i) = node {
            let stmt = &self.method.stmts[i];
            if let Some(def) = stmt.def() {
                next.remove(&def);
            }
            for u in stmt_uses(stmt) {
                next.insert(u);
            }
        }
        let changed = next != *input;
        *input = next;
        changed
    }
}

fn stmt_uses(stmt: &Stmt) -> Vec<VarId> {
    match stmt {
        Stmt::Assign { rhs, .. } => exp_uses(rhs),
        Stmt::LoadField { base, .. } => vec![*base],
        Stmt::StoreField { base, rhs, .. } => vec![*base, *rhs],
        Stmt::LoadStaticField { .. } => vec![],
        Stmt::StoreStaticField { rhs, .. } => vec![*rhs],
        Stmt::LoadArray { base, index, .. } => vec![*base, *index],
        Stmt::StoreArray { base, index, rhs } => vec![*base, *index, *rhs],
        Stmt::Invoke { call_site: _, .. } => vec![],
        Stmt::If { cond, .. } => vec![*cond],
        Stmt::Switch { var, .. } => vec![*var],
        Stmt::Goto(_) | Stmt::Nop => vec![],
        Stmt::Return(v) => v.iter().copied().collect(),
    }
}

fn exp_uses(exp: &Exp) -> Vec<VarId> {
    match exp {
        Exp::Var(v) => vec![*v],
        Exp::IntConst(_) => vec![],
        Exp::Binary(_, l, r) => vec![*l, *r],
        Exp::Unary(_, v) => vec![*v],
        Exp::NewObject(_) | Exp::NewArray(_) | Exp::InvokeExp(_) | Exp::StaticFieldAccess(_) | Exp::This => vec![],
        Exp::InstanceFieldAccess { base, .. } => vec![*base],
        Exp::ArrayAccess { base, index } => vec![*base, *index],
        Exp::Cast(v, _) => vec![*v],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataflow::solver::solve;
    use crate::ir::{ClassId, MethodId, Type, Var};

    fn method() -> Method {
        // x = 1; y = x; return y;  -- x is live only between stmt 0 and 1.
        let x = VarId::from_u32(0);
        let y = VarId::from_u32(1);
        Method {
            id: MethodId::from_u32(0),
            declaring_class: ClassId::from_u32(0),
            name: "m".into(),
            subsignature: "m()".into(),
            is_static: true,
            is_abstract: false,
            vars: vec![
                Var { id: x, name: "x".into(), ty: Type::Int },
                Var { id: y, name: "y".into(), ty: Type::Int },
            ],
            params: vec![],
            this_var: None,
            return_type: Type::Int,
            stmts: vec![
                Stmt::Assign { lhs: x, rhs: Exp::IntConst(1) },
                Stmt::Assign { lhs: y, rhs: Exp::Var(x) },
                Stmt::Return(Some(y)),
            ],
        }
    }

    #[test]
    fn x_not_live_after_copy_to_y() {
        let m = method();
        let cfg = Cfg::build(&m);
        let result = solve(&Liveness::new(&m), &cfg);
        let x = VarId::from_u32(0);
        assert!(result.out_fact(CfgNode::Stmt(0)).contains(&x));
        assert!(!result.out_fact(CfgNode::Stmt(1)).contains(&x));
    }
}
