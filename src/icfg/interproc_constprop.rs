//! Inter-procedural constant propagation over the ICFG. Loads/stores of
//! heap locations (instance fields, static fields, array cells) are
//! resolved through a shared heap-value map keyed by points-to-derived
//! aliasing rather than being conservatively `NAC`, as the intra-procedural
//! pass in `crate::dataflow::constprop` must treat them.
//!
//! The heap-value map and its dependent-load indices are confined to this
//! module, matching the constraint that this global state never leaks out
//! as module-wide mutable state — it lives on the `Solver` for the
//! duration of one `solve` call.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::cfg::CfgNode;
use crate::icfg::graph::{Icfg, IcfgEdge, IcfgNode};
use crate::ir::{ClassHierarchy, Exp, FieldId, MethodId, Program, Stmt, VarId};
use crate::lattice::{evaluate, CPFact, Value};
use crate::pta::{ContextId, ObjId, PointsToResult, Pointer};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum IndexKey {
    Const(i32),
    Nac,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum HeapKey {
    Instance(ObjId, FieldId),
    Static(FieldId),
    Array(ObjId, IndexKey),
}

/// For every heap object, the set of contextualized variables whose
/// points-to set contains it — precomputed once so a store's dependent
/// loads can be found without rescanning the program.
pub struct AliasMap {
    aliases: HashMap<ObjId, HashSet<(ContextId, MethodId, VarId)>>,
}

impl AliasMap {
    pub fn build(pta: &PointsToResult) -> AliasMap {
        let mut aliases: HashMap<ObjId, HashSet<(ContextId, MethodId, VarId)>> = HashMap::new();
        for (ptr, set) in pta.pt.propa_pts_map.iter() {
            if let Pointer::Var(ctx, mid, var) = *ptr {
                for obj in set.iter() {
                    aliases.entry(obj).or_default().insert((ctx, mid, var));
                }
            }
        }
        AliasMap { aliases }
    }

    /// The `(ctx, method, var)` triples whose points-to set contains `obj`.
    pub fn vars_aliasing(&self, obj: ObjId) -> impl Iterator<Item = &(ContextId, MethodId, VarId)> {
        self.aliases.get(&obj).into_iter().flatten()
    }
}

pub struct IcfgDataflowResult {
    in_facts: HashMap<IcfgNode, CPFact>,
    out_facts: HashMap<IcfgNode, CPFact>,
}

impl IcfgDataflowResult {
    pub fn in_fact(&self, node: IcfgNode) -> &CPFact {
        &self.in_facts[&node]
    }

    pub fn out_fact(&self, node: IcfgNode) -> &CPFact {
        &self.out_facts[&node]
    }
}

pub fn solve(program: &Program, icfg: &Icfg, pta: &PointsToResult, entry: IcfgNode) -> IcfgDataflowResult {
    let mut solver = Solver::new(program, icfg, pta);
    solver.run(entry)
}

struct Solver<'p> {
    program: &'p Program,
    icfg: &'p Icfg,
    pta: &'p PointsToResult,
    alias: AliasMap,
    heap: HashMap<HeapKey, Value>,
    array_keys: HashMap<ObjId, HashSet<IndexKey>>,
    static_load_index: HashMap<FieldId, Vec<IcfgNode>>,
    field_base_uses: HashMap<(ContextId, MethodId, VarId), Vec<(IcfgNode, FieldId)>>,
    array_base_uses: HashMap<(ContextId, MethodId, VarId), Vec<IcfgNode>>,
    in_facts: HashMap<IcfgNode, CPFact>,
    out_facts: HashMap<IcfgNode, CPFact>,
    worklist: VecDeque<IcfgNode>,
    queued: HashSet<IcfgNode>,
}

impl<'p> Solver<'p> {
    fn new(program: &'p Program, icfg: &'p Icfg, pta: &'p PointsToResult) -> Self {
        let mut solver = Solver {
            program,
            icfg,
            pta,
            alias: AliasMap::build(pta),
            heap: HashMap::new(),
            array_keys: HashMap::new(),
            static_load_index: HashMap::new(),
            field_base_uses: HashMap::new(),
            array_base_uses: HashMap::new(),
            in_facts: HashMap::new(),
            out_facts: HashMap::new(),
            worklist: VecDeque::new(),
            queued: HashSet::new(),
        };
        solver.index_loads();
        solver
    }

    fn index_loads(&mut self) {
        for &node in self.icfg.nodes() {
            let CfgNode::Stmt(i) = node.cfg else { continue };
            let method = self.program.method(node.method);
            match &method.stmts[i] {
                Stmt::LoadField { base, field, .. } => {
                    self.field_base_uses.entry((node.ctx, node.method, *base)).or_default().push((node, *field));
                }
                Stmt::LoadStaticField { field, .. } => {
                    self.static_load_index.entry(*field).or_default().push(node);
                }
                Stmt::LoadArray { base, .. } => {
                    self.array_base_uses.entry((node.ctx, node.method, *base)).or_default().push(node);
                }
                Stmt::Assign { rhs, .. } => match rhs {
                    Exp::InstanceFieldAccess { base, field } => {
                        self.field_base_uses.entry((node.ctx, node.method, *base)).or_default().push((node, *field));
                    }
                    Exp::ArrayAccess { base, .. } => {
                        self.array_base_uses.entry((node.ctx, node.method, *base)).or_default().push(node);
                    }
                    _ => {}
                },
                _ => {}
            }
        }
    }

    fn enqueue(&mut self, node: IcfgNode) {
        if self.queued.insert(node) {
            self.worklist.push_back(node);
        }
    }

    fn boundary_fact(&self, entry: IcfgNode) -> CPFact {
        let method = self.program.method(entry.method);
        let mut fact = CPFact::new();
        for &p in &method.params {
            if method.var(p).can_hold_int() {
                fact.update(p, Value::Nac);
            }
        }
        fact
    }

    fn run(mut self, entry: IcfgNode) -> IcfgDataflowResult {
        for &node in self.icfg.nodes() {
            self.in_facts.insert(node, CPFact::new());
            self.out_facts.insert(node, CPFact::new());
        }
        let boundary = self.boundary_fact(entry);
        self.in_facts.insert(entry, boundary.clone());
        self.out_facts.insert(entry, boundary);

        let nodes: Vec<IcfgNode> = self.icfg.nodes().to_vec();
        for node in nodes {
            if node != entry {
                self.enqueue(node);
            }
        }

        while let Some(node) = self.worklist.pop_front() {
            self.queued.remove(&node);
            let preds: Vec<(IcfgEdge, IcfgNode)> = self.icfg.predecessors(node).to_vec();
            let mut merged = CPFact::new();
            for (edge, pred) in preds {
                let pred_out = self.out_facts.get(&pred).cloned().unwrap_or_else(CPFact::new);
                let transferred = self.transfer_edge(edge, pred, node, &pred_out);
                meet_fact_into(&transferred, &mut merged);
            }
            self.in_facts.insert(node, merged.clone());

            let new_out = self.transfer_node(node, &merged);
            let changed = !facts_equal(&new_out, self.out_facts.get(&node).unwrap());
            self.out_facts.insert(node, new_out);

            if changed {
                let succs: Vec<IcfgNode> = self.icfg.successors(node).iter().map(|(_, s)| *s).collect();
                for succ in succs {
                    if succ != entry {
                        self.enqueue(succ);
                    }
                }
            }
        }

        IcfgDataflowResult { in_facts: self.in_facts, out_facts: self.out_facts }
    }

    fn transfer_edge(&self, edge: IcfgEdge, source: IcfgNode, target: IcfgNode, out: &CPFact) -> CPFact {
        match edge {
            IcfgEdge::Normal => out.clone(),
            IcfgEdge::CallToReturn { call_site } => {
                let mut fact = out.clone();
                let cs = self.program.call_site(call_site);
                if let Some(d) = cs.dest {
                    fact.remove(d);
                }
                fact
            }
            IcfgEdge::Call { call_site } => {
                let cs = self.program.call_site(call_site);
                let callee = self.program.method(target.method);
                let mut fact = CPFact::new();
                for (arg, param) in cs.args.iter().zip(callee.params.iter()) {
                    if callee.var(*param).can_hold_int() {
                        fact.update(*param, out.get(*arg));
                    }
                }
                fact
            }
            IcfgEdge::Return { call_site } => {
                let cs = self.program.call_site(call_site);
                let callee = self.program.method(source.method);
                let mut fact = CPFact::new();
                if let Some(lhs) = cs.dest {
                    let caller = self.program.method(target.method);
                    if caller.var(lhs).can_hold_int() {
                        let mut acc = Value::Undef;
                        for rv in int_return_vars(callee) {
                            acc = acc.meet(out.get(rv));
                        }
                        fact.update(lhs, acc);
                    }
                }
                fact
            }
        }
    }

    fn transfer_node(&mut self, node: IcfgNode, merged_in: &CPFact) -> CPFact {
        let CfgNode::Stmt(i) = node.cfg else { return merged_in.clone() };
        let method = self.program.method(node.method);
        let stmt = method.stmts[i].clone();
        if stmt.call_site().is_some() {
            // Call node: the lhs, if any, is supplied by the Return edge
            // into the call-to-return node, not here.
            return merged_in.clone();
        }
        let mut out = merged_in.clone();
        self.apply_stmt(node, &stmt, merged_in, &mut out);
        out
    }

    fn apply_stmt(&mut self, node: IcfgNode, stmt: &Stmt, input: &CPFact, out: &mut CPFact) {
        let method = self.program.method(node.method);
        match stmt {
            Stmt::Assign { lhs, rhs } => {
                if method.var(*lhs).can_hold_int() {
                    let v = match rhs {
                        Exp::Var(_) | Exp::IntConst(_) | Exp::Binary(..) | Exp::Unary(..) => evaluate(rhs, input, method),
                        Exp::InstanceFieldAccess { base, field } => self.load_instance(node, *base, *field),
                        Exp::StaticFieldAccess(field) => self.load_static(*field),
                        Exp::ArrayAccess { base, index } => self.load_array(node, *base, input, *index),
                        _ => Value::Nac,
                    };
                    out.update(*lhs, v);
                }
            }
            Stmt::LoadField { lhs, base, field } => {
                if method.var(*lhs).can_hold_int() {
                    let v = self.load_instance(node, *base, *field);
                    out.update(*lhs, v);
                }
            }
            Stmt::LoadStaticField { lhs, field } => {
                if method.var(*lhs).can_hold_int() {
                    let v = self.load_static(*field);
                    out.update(*lhs, v);
                }
            }
            Stmt::LoadArray { lhs, base, index } => {
                if method.var(*lhs).can_hold_int() {
                    let v = self.load_array(node, *base, input, *index);
                    out.update(*lhs, v);
                }
            }
            Stmt::StoreField { base, field, rhs } => {
                if method.var(*rhs).can_hold_int() {
                    let v = input.get(*rhs);
                    self.store_instance(node, *base, *field, v);
                }
            }
            Stmt::StoreStaticField { field, rhs } => {
                if method.var(*rhs).can_hold_int() {
                    let v = input.get(*rhs);
                    self.store_static(*field, v);
                }
            }
            Stmt::StoreArray { base, index, rhs } => {
                if method.var(*rhs).can_hold_int() {
                    let v = input.get(*rhs);
                    self.store_array(node, *base, *index, input, v);
                }
            }
            _ => {}
        }
    }

    fn load_instance(&self, node: IcfgNode, base: VarId, field: FieldId) -> Value {
        let objs = self.pta.pts_of(node.ctx, node.method, base);
        let mut acc = Value::Undef;
        for obj in objs {
            let v = self.heap.get(&HeapKey::Instance(obj, field)).copied().unwrap_or(Value::Undef);
            acc = acc.meet(v);
        }
        acc
    }

    fn load_static(&self, field: FieldId) -> Value {
        self.heap.get(&HeapKey::Static(field)).copied().unwrap_or(Value::Undef)
    }

    fn load_array(&self, node: IcfgNode, base: VarId, input: &CPFact, index: VarId) -> Value {
        let objs = self.pta.pts_of(node.ctx, node.method, base);
        let idx_val = input.get(index);
        let mut acc = Value::Undef;
        for obj in objs {
            match idx_val {
                Value::Undef => {}
                Value::Const(i) => {
                    let exact = self.heap.get(&HeapKey::Array(obj, IndexKey::Const(i))).copied().unwrap_or(Value::Undef);
                    let nac_bucket = self.heap.get(&HeapKey::Array(obj, IndexKey::Nac)).copied().unwrap_or(Value::Undef);
                    acc = acc.meet(exact).meet(nac_bucket);
                }
                Value::Nac => {
                    if let Some(keys) = self.array_keys.get(&obj) {
                        for key in keys {
                            acc = acc.meet(self.heap.get(&HeapKey::Array(obj, *key)).copied().unwrap_or(Value::Undef));
                        }
                    }
                }
            }
        }
        acc
    }

    fn store_instance(&mut self, node: IcfgNode, base: VarId, field: FieldId, v: Value) {
        let objs = self.pta.pts_of(node.ctx, node.method, base);
        for obj in objs {
            let key = HeapKey::Instance(obj, field);
            let old = self.heap.get(&key).copied().unwrap_or(Value::Undef);
            let merged = old.meet(v);
            if merged != old {
                self.heap.insert(key, merged);
                let dependents: Vec<IcfgNode> = self
                    .alias
                    .vars_aliasing(obj)
                    .filter_map(|&(ctx, mid, var)| self.field_base_uses.get(&(ctx, mid, var)))
                    .flatten()
                    .filter(|(_, f)| *f == field)
                    .map(|(n, _)| *n)
                    .collect();
                for d in dependents {
                    self.enqueue(d);
                }
            }
        }
    }

    fn store_static(&mut self, field: FieldId, v: Value) {
        let key = HeapKey::Static(field);
        let old = self.heap.get(&key).copied().unwrap_or(Value::Undef);
        let merged = old.meet(v);
        if merged != old {
            self.heap.insert(key, merged);
            let dependents = self.static_load_index.get(&field).cloned().unwrap_or_default();
            for d in dependents {
                self.enqueue(d);
            }
        }
    }

    fn store_array(&mut self, node: IcfgNode, base: VarId, index: VarId, input: &CPFact, v: Value) {
        let objs = self.pta.pts_of(node.ctx, node.method, base);
        let idx_val = input.get(index);
        let index_key = match idx_val {
            Value::Undef => return,
            Value::Const(i) => IndexKey::Const(i),
            Value::Nac => IndexKey::Nac,
        };
        for obj in objs {
            self.array_keys.entry(obj).or_default().insert(index_key);
            let key = HeapKey::Array(obj, index_key);
            let old = self.heap.get(&key).copied().unwrap_or(Value::Undef);
            let merged = old.meet(v);
            if merged != old {
                self.heap.insert(key, merged);
                let dependents: Vec<IcfgNode> = self
                    .alias
                    .vars_aliasing(obj)
                    .filter_map(|&(ctx, mid, var)| self.array_base_uses.get(&(ctx, mid, var)))
                    .flatten()
                    .copied()
                    .collect();
                for d in dependents {
                    self.enqueue(d);
                }
            }
        }
    }
}

fn int_return_vars(method: &crate::ir::Method) -> Vec<VarId> {
    method
        .stmts
        .iter()
        .filter_map(|s| match s {
            Stmt::Return(Some(v)) if method.var(*v).can_hold_int() => Some(*v),
            _ => None,
        })
        .collect()
}

fn meet_fact_into(fact: &CPFact, target: &mut CPFact) {
    for (var, value) in fact.iter() {
        let merged = target.get(var).meet(value);
        target.update(var, merged);
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
