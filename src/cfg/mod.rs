//! Control-flow graphs built from a method's flat statement list plus its
//! `If`/`Switch`/`Goto`/`Return` targets.

use std::collections::HashMap;

use crate::ir::Method;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CfgNode {
    Entry,
    Stmt(usize),
    Exit,
}

pub struct Cfg<'m> {
    pub method: &'m Method,
    succs: HashMap<CfgNode, Vec<CfgNode>>,
    preds: HashMap<CfgNode, Vec<CfgNode>>,
}

impl<'m> Cfg<'m> {
    pub fn build(method: &'m Method) -> Cfg<'m> {
        let mut succs: HashMap<CfgNode, Vec<CfgNode>> = HashMap::new();
        let mut preds: HashMap<CfgNode, Vec<CfgNode>> = HashMap::new();

        let len = method.stmts.len();
        let mut add_edge = |from: CfgNode, to: CfgNode| {
            succs.entry(from).or_default().push(to);
            preds.entry(to).or_default().push(from);
        };

        if len == 0 {
            add_edge(CfgNode::Entry, CfgNode::Exit);
            return Cfg { method, succs, preds };
        }

        add_edge(CfgNode::Entry, CfgNode::Stmt(0));

        for (i, stmt) in method.stmts.iter().enumerate() {
            let fallthrough = if i + 1 < len { Some(i + 1) } else { None };
            let targets = stmt.successors(i, fallthrough);
            if targets.is_empty() {
                add_edge(CfgNode::Stmt(i), CfgNode::Exit);
            } else {
                for t in targets {
                    add_edge(CfgNode::Stmt(i), CfgNode::Stmt(t));
                }
            }
        }

        Cfg { method, succs, preds }
    }

    pub fn entry(&self) -> CfgNode {
        CfgNode::Entry
    }

    pub fn exit(&self) -> CfgNode {
        CfgNode::Exit
    }

    pub fn successors(&self, node: CfgNode) -> &[CfgNode] {
        self.succs.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn predecessors(&self, node: CfgNode) -> &[CfgNode] {
        self.preds.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// All nodes reachable from `Entry`, in an arbitrary but stable order
    /// (used to seed the worklist solver).
    pub fn nodes(&self) -> Vec<CfgNode> {
        let mut order = vec![CfgNode::Entry];
        let mut seen = vec![CfgNode::Entry];
        let mut i = 0;
        while i < order.len() {
            let n = order[i];
            i += 1;
            for &s in self.successors(n) {
                if !seen.contains(&s) {
                    seen.push(s);
                    order.push(s);
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Stmt, Type, Var, VarId};

    fn method_with_stmts(stmts: Vec<Stmt>) -> Method {
        Method {
            id: crate::ir::MethodId::from_u32(0),
            declaring_class: crate::ir::ClassId::from_u32(0),
            name: "m".into(),
            subsignature: "m()".into(),
            is_static: true,
            is_abstract: false,
            vars: vec![Var { id: VarId::from_u32(0), name: "x".into(), ty: Type::Int }],
            params: vec![],
            this_var: None,
            return_type: Type::Int,
            stmts,
        }
    }

    #[test]
    fn straight_line_falls_through_to_exit() {
        let m = method_with_stmts(vec![Stmt::Nop, Stmt::Nop]);
        let cfg = Cfg::build(&m);
        assert_eq!(cfg.successors(CfgNode::Entry), &[CfgNode::Stmt(0)]);
        assert_eq!(cfg.successors(CfgNode::Stmt(0)), &[CfgNode::Stmt(1)]);
        assert_eq!(cfg.successors(CfgNode::Stmt(1)), &[CfgNode::Exit]);
    }

    #[test]
    fn if_has_two_successors() {
        let v = VarId::from_u32(0);
        let m = method_with_stmts(vec![
            Stmt::If { cond: v, target: 2 },
            Stmt::Nop,
            Stmt::Return(None),
        ]);
        let cfg = Cfg::build(&m);
        let mut succs = cfg.successors(CfgNode::Stmt(0)).to_vec();
        succs.sort_by_key(|n| match n {
            CfgNode::Stmt(i) => *i,
            _ => usize::MAX,
        });
        assert_eq!(succs, vec![CfgNode::Stmt(1), CfgNode::Stmt(2)]);
    }
}
