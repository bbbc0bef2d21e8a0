//! Dead-code detection: statements unreachable given known constant
//! branch conditions, unioned with side-effect-free assignments whose
//! left-hand side is never live afterward. Consumes the already-complete
//! intra-procedural constant-propagation and liveness results rather than
//! re-deriving either.

use std::collections::HashSet;

use crate::cfg::{Cfg, CfgNode};
use crate::dataflow::liveness::LiveSet;
use crate::dataflow::solver::DataflowResult;
use crate::ir::{BinOp, Exp, Method, Stmt};
use crate::lattice::{CPFact, Value};

pub struct DeadCode {
    /// CFG nodes no predecessor's known-constant branch can ever reach.
    pub unreachable: HashSet<CfgNode>,
    /// Statement indices of assignments whose result is side-effect-free
    /// and never observed.
    pub dead_assigns: HashSet<usize>,
}

impl DeadCode {
    pub fn is_dead(&self, index: usize) -> bool {
        self.unreachable.contains(&CfgNode::Stmt(index)) || self.dead_assigns.contains(&index)
    }
}

pub fn find_dead_statements(method: &Method, cfg: &Cfg, cp: &DataflowResult<CPFact>, live: &DataflowResult<LiveSet>) -> DeadCode {
    let reachable = reachable_nodes(method, cfg, cp);
    let unreachable = (0..method.stmts.len())
        .map(CfgNode::Stmt)
        .filter(|n| !reachable.contains(n))
        .collect();
    DeadCode { unreachable, dead_assigns: dead_assigns(method, live) }
}

fn reachable_nodes(method: &Method, cfg: &Cfg, cp: &DataflowResult<CPFact>) -> HashSet<CfgNode> {
    let mut seen = HashSet::new();
    let mut stack = vec![CfgNode::Entry];
    seen.insert(CfgNode::Entry);
    while let Some(node) = stack.pop() {
        for s in taken_successors(method, cfg, node, cp) {
            if seen.insert(s) {
                stack.push(s);
            }
        }
    }
    seen
}

/// The successors of `node` a concrete run could actually take, pruning an
/// `If`/`Switch` branch the constant-propagation result proves can't be
/// taken. Any other node's successors are exactly `cfg.successors`.
fn taken_successors(method: &Method, cfg: &Cfg, node: CfgNode, cp: &DataflowResult<CPFact>) -> Vec<CfgNode> {
    let CfgNode::Stmt(i) = node else { return cfg.successors(node).to_vec() };
    let stmt = &method.stmts[i];
    let fallthrough = if i + 1 < method.stmts.len() { Some(i + 1) } else { None };

    let targets: Vec<usize> = match stmt {
        Stmt::If { cond, target } => match cp.in_fact(node).get(*cond) {
            Value::Const(0) => fallthrough.into_iter().collect(),
            Value::Const(_) => vec![*target],
            _ => stmt.successors(i, fallthrough),
        },
        Stmt::Switch { var, cases, default } => match cp.in_fact(node).get(*var) {
            Value::Const(c) => cases.iter().find(|(k, _)| *k == c).map(|(_, t)| vec![*t]).unwrap_or_else(|| vec![*default]),
            _ => stmt.successors(i, fallthrough),
        },
        _ => stmt.successors(i, fallthrough),
    };

    if targets.is_empty() {
        vec![CfgNode::Exit]
    } else {
        targets.into_iter().map(CfgNode::Stmt).collect()
    }
}

fn dead_assigns(method: &Method, live: &DataflowResult<LiveSet>) -> HashSet<usize> {
    method
        .stmts
        .iter()
        .enumerate()
        .filter_map(|(i, stmt)| match stmt {
            Stmt::Assign { lhs, rhs } if is_side_effect_free(rhs) => {
                let still_live = live.out_fact(CfgNode::Stmt(i)).contains(lhs);
                (!still_live).then_some(i)
            }
            _ => None,
        })
        .collect()
}

fn is_side_effect_free(rhs: &Exp) -> bool {
    match rhs {
        Exp::NewObject(_) | Exp::NewArray(_) | Exp::InvokeExp(_) | Exp::Cast(..) => false,
        Exp::InstanceFieldAccess { .. } | Exp::ArrayAccess { .. } => false,
        Exp::Binary(op, ..) if matches!(op, BinOp::Div | BinOp::Rem) => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataflow::constprop::ConstantPropagation;
    use crate::dataflow::liveness::Liveness;
    use crate::dataflow::solver::solve;
    use crate::ir::{ClassId, MethodId, Type, Var, VarId};

    fn method_with_stmts(stmts: Vec<Stmt>) -> Method {
        Method {
            id: MethodId::from_u32(0),
            declaring_class: ClassId::from_u32(0),
            name: "m".into(),
            subsignature: "m()".into(),
            is_static: true,
            is_abstract: false,
            vars: vec![
                Var { id: VarId::from_u32(0), name: "cond".into(), ty: Type::Int },
                Var { id: VarId::from_u32(1), name: "x".into(), ty: Type::Int },
            ],
            params: vec![],
            this_var: None,
            return_type: Type::Int,
            stmts,
        }
    }

    #[test]
    fn constant_condition_prunes_dead_branch() {
        let cond = VarId::from_u32(0);
        // cond = 0; if (cond) goto 3 else fallthrough; [2] x = 1 (live, taken);
        // [3] x = 2 (dead, never taken); [4] return x;
        let x = VarId::from_u32(1);
        let m = method_with_stmts(vec![
            Stmt::Assign { lhs: cond, rhs: Exp::IntConst(0) },
            Stmt::If { cond, target: 3 },
            Stmt::Assign { lhs: x, rhs: Exp::IntConst(1) },
            Stmt::Assign { lhs: x, rhs: Exp::IntConst(2) },
            Stmt::Return(Some(x)),
        ]);
        let cfg = Cfg::build(&m);
        let cp = solve(&ConstantPropagation::new(&m), &cfg);
        let live = solve(&Liveness::new(&m), &cfg);
        let dead = find_dead_statements(&m, &cfg, &cp, &live);
        assert!(dead.is_dead(3));
        assert!(!dead.is_dead(2));
    }

    #[test]
    fn unobserved_pure_assign_is_dead() {
        let x = VarId::from_u32(1);
        let m = method_with_stmts(vec![
            Stmt::Assign { lhs: x, rhs: Exp::IntConst(1) },
            Stmt::Assign { lhs: x, rhs: Exp::IntConst(2) },
            Stmt::Return(Some(x)),
        ]);
        let cfg = Cfg::build(&m);
        let cp = solve(&ConstantPropagation::new(&m), &cfg);
        let live = solve(&Liveness::new(&m), &cfg);
        let dead = find_dead_statements(&m, &cfg, &cp, &live);
        assert!(dead.is_dead(0));
        assert!(!dead.is_dead(1));
    }
}
