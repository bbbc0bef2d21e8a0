//! Intra-procedural constant propagation: a forward dataflow analysis over
//! the [`Value`] lattice. Field/array loads, static loads and call results
//! are conservatively `NAC` here — they are refined into real facts only
//! by the inter-procedural analysis in `crate::icfg`, which has access to
//! points-to information this intra-procedural pass does not.

use crate::cfg::{Cfg, CfgNode};
use crate::dataflow::analysis::DataflowAnalysis;
use crate::ir::{Exp, Method, Stmt};
use crate::lattice::{evaluate, CPFact, Value};

pub struct ConstantPropagation<'m> {
    pub method: &'m Method,
}

impl<'m> ConstantPropagation<'m> {
    pub fn new(method: &'m Method) -> Self {
        ConstantPropagation { method }
    }
}

impl<'m> DataflowAnalysis for ConstantPropagation<'m> {
    type Fact = CPFact;

    fn is_forward(&self) -> bool {
        true
    }

    fn new_boundary_fact(&self, _cfg: &Cfg) -> CPFact {
        // Parameters enter the method as NAC: the caller could pass
        // anything, and this pass has no caller context.
        let mut fact = CPFact::new();
        for &p in &self.method.params {
            if self.method.var(p).can_hold_int() {
                fact.update(p, Value::Nac);
            }
        }
        fact
    }

    fn new_initial_fact(&self) -> CPFact {
        CPFact::new()
    }

    fn meet_into(&self, fact: &CPFact, target: &mut CPFact) -> bool {
        let mut changed = false;
        for (var, value) in fact.iter() {
            let merged = target.get(var).meet(value);
            changed |= target.update(var, merged);
        }
        changed
    }

    fn transfer_node(&self, node: CfgNode, input: &CPFact, out: &mut CPFact) -> bool {
        let mut next = input.clone();
        if let CfgNode::Stmt(i) = node {
            apply_stmt(&self.method.stmts[i], input, &mut next, self.method);
        }
        let changed = !facts_equal(&next, out);
        *out = next;
        changed
    }
}

fn apply_stmt(stmt: &Stmt, input: &CPFact, out: &mut CPFact, method: &Method) {
    match stmt {
        Stmt::Assign { lhs, rhs } => {
            if method.var(*lhs).can_hold_int() {
                let v = match rhs {
                    Exp::Var(_) | Exp::IntConst(_) | Exp::Binary(..) | Exp::Unary(..) => {
                        evaluate(rhs, input, method)
                    }
                    _ => Value::Nac,
                };
                out.update(*lhs, v);
            }
        }
        Stmt::LoadField { lhs, .. } | Stmt::LoadStaticField { lhs, .. } | Stmt::LoadArray { lhs, .. } => {
            if method.var(*lhs).can_hold_int() {
                out.update(*lhs, Value::Nac);
            }
        }
        Stmt::Invoke { dest: Some(d), .. } => {
            if method.var(*d).can_hold_int() {
                out.update(*d, Value::Nac);
            }
        }
        _ => {}
    }
}

fn facts_equal(a: &CPFact, b: &CPFact) -> bool {
    let a_vars: Vec<_> = a.iter().collect();
    let b_vars: Vec<_> = b.iter().collect();
    if a_vars.len() != b_vars.len() {
        return false;
    }
    a_vars.iter().all(|(var, val)| b.get(*var) == *val)
}
