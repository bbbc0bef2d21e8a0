//! In-memory program representation plus a JSON loader.
//!
//! The on-disk format is a direct, unglamorous serialization of the IR in
//! this module: classes name their fields and methods, methods name their
//! locals and statements reference locals and each other by name/index.
//! This is not meant to be a bytecode parser for any real language — it
//! exists so the CLI and integration tests can build real `Program`
//! values without embedding them as Rust literals.

use std::collections::HashMap;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

use crate::ir::call_site::{CallKind, CallSite, CallSiteId};
use crate::ir::class::{Class, ClassId, Field, FieldId, Method, MethodId};
use crate::ir::hierarchy::ClassHierarchy;
use crate::ir::exp::{BinOp, Exp, UnOp};
use crate::ir::stmt::Stmt;
use crate::ir::types::Type;
use crate::ir::var::{Var, VarId};
use crate::util::index::Idx;

/// A fully-built, self-contained program: every class, method and
/// statement the analyses operate over.
pub struct Program {
    pub classes: Vec<Class>,
    pub methods: Vec<Method>,
    pub call_sites: Vec<CallSite>,
    class_by_name: HashMap<String, ClassId>,
    subtypes: HashMap<ClassId, Vec<ClassId>>,
}

impl ClassHierarchy for Program {
    fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.index()]
    }

    fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.index()]
    }

    fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.class_by_name.get(name).copied()
    }

    fn direct_subtypes(&self, class: ClassId) -> Vec<ClassId> {
        self.subtypes.get(&class).cloned().unwrap_or_default()
    }
}

impl Program {
    pub fn call_site(&self, id: CallSiteId) -> &CallSite {
        &self.call_sites[id.index()]
    }

    pub fn method_by_subsig(&self, class: ClassId, subsig: &str) -> Option<MethodId> {
        self.resolve_method(class, &subsig.to_string())
    }

    pub fn entry_method(&self, subsignature: &str) -> Result<MethodId> {
        for m in &self.methods {
            if m.subsignature == subsignature {
                return Ok(m.id);
            }
        }
        bail!("no method with subsignature `{}` found", subsignature)
    }

    pub fn load_json(text: &str) -> Result<Program> {
        let raw: ProgramJson = serde_json::from_str(text).context("parsing program JSON")?;
        build_program(raw)
    }
}

// ---- JSON schema -----------------------------------------------------

#[derive(Deserialize)]
struct ProgramJson {
    classes: Vec<ClassJson>,
}

#[derive(Deserialize)]
struct ClassJson {
    name: String,
    #[serde(default)]
    superclass: Option<String>,
    #[serde(default)]
    interfaces: Vec<String>,
    #[serde(default)]
    is_abstract: bool,
    #[serde(default)]
    is_interface: bool,
    #[serde(default)]
    fields: Vec<FieldJson>,
    #[serde(default)]
    methods: Vec<MethodJson>,
}

#[derive(Deserialize)]
struct FieldJson {
    name: String,
    #[serde(rename = "type")]
    ty: TypeJson,
    #[serde(default)]
    is_static: bool,
}

#[derive(Deserialize)]
struct MethodJson {
    name: String,
    subsignature: String,
    #[serde(default)]
    is_static: bool,
    #[serde(default)]
    is_abstract: bool,
    #[serde(default)]
    has_this: bool,
    return_type: TypeJson,
    #[serde(default)]
    vars: Vec<VarJson>,
    #[serde(default)]
    params: Vec<String>,
    #[serde(default)]
    stmts: Vec<StmtJson>,
}

#[derive(Deserialize)]
struct VarJson {
    name: String,
    #[serde(rename = "type")]
    ty: TypeJson,
}

#[derive(Deserialize, Clone)]
#[serde(tag = "kind")]
enum TypeJson {
    Int,
    Other,
    Class { name: String },
    Array { elem: Box<TypeJson> },
}

#[derive(Deserialize)]
#[serde(tag = "kind")]
enum StmtJson {
    Assign { lhs: String, rhs: ExpJson },
    LoadField { lhs: String, base: String, class: String, field: String },
    StoreField { base: String, class: String, field: String, rhs: String },
    LoadStaticField { lhs: String, class: String, field: String },
    StoreStaticField { class: String, field: String, rhs: String },
    LoadArray { lhs: String, base: String, index: String },
    StoreArray { base: String, index: String, rhs: String },
    Invoke { #[serde(flatten)] call: CallSiteJson, dest: Option<String> },
    If { cond: String, target: usize },
    Switch { var: String, cases: Vec<(i32, usize)>, default: usize },
    Goto { target: usize },
    Return { var: Option<String> },
    Nop,
}

#[derive(Deserialize)]
#[serde(tag = "kind")]
enum ExpJson {
    Var { name: String },
    IntConst { value: i32 },
    Binary { op: String, l: String, r: String },
    Unary { op: String, v: String },
    NewObject { class: String },
    NewArray { elem: TypeJson },
    Invoke { #[serde(flatten)] call: CallSiteJson },
    InstanceFieldAccess { base: String, class: String, field: String },
    StaticFieldAccess { class: String, field: String },
    ArrayAccess { base: String, index: String },
    Cast { var: String, to: TypeJson },
    This,
}

#[derive(Deserialize)]
struct CallSiteJson {
    call_kind: String,
    declaring_class: String,
    subsignature: String,
    #[serde(default)]
    receiver: Option<String>,
    #[serde(default)]
    args: Vec<String>,
}

// ---- building -----------------------------------------------------

fn parse_call_kind(s: &str) -> Result<CallKind> {
    Ok(match s {
        "static" => CallKind::Static,
        "special" => CallKind::Special,
        "virtual" => CallKind::Virtual,
        "interface" => CallKind::Interface,
        "dynamic" => CallKind::Dynamic,
        other => bail!("unknown call kind `{other}`"),
    })
}

fn build_program(raw: ProgramJson) -> Result<Program> {
    let mut class_by_name = HashMap::new();
    for (i, c) in raw.classes.iter().enumerate() {
        class_by_name.insert(c.name.clone(), ClassId::new(i));
    }

    let resolve_class = |name: &str| -> Result<ClassId> {
        class_by_name
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("unknown class `{name}`"))
    };

    let mut field_by_name: HashMap<(ClassId, String), FieldId> = HashMap::new();
    let mut classes = Vec::with_capacity(raw.classes.len());
    let mut all_fields = Vec::new();

    for (ci, c) in raw.classes.iter().enumerate() {
        let class_id = ClassId::new(ci);
        let mut field_ids = Vec::new();
        for fj in &c.fields {
            let fid = FieldId::new(all_fields.len());
            field_by_name.insert((class_id, fj.name.clone()), fid);
            all_fields.push(Field {
                id: fid,
                name: fj.name.clone(),
                declaring_class: class_id,
                ty: resolve_type(&fj.ty, &class_by_name)?,
                is_static: fj.is_static,
            });
            field_ids.push(fid);
        }
        classes.push(Class {
            id: class_id,
            name: c.name.clone(),
            superclass: c.superclass.as_deref().map(resolve_class).transpose()?,
            interfaces: c
                .interfaces
                .iter()
                .map(|n| resolve_class(n))
                .collect::<Result<_>>()?,
            is_abstract: c.is_abstract,
            is_interface: c.is_interface,
            fields: field_ids,
            methods: Vec::new(),
        });
    }

    // Resolve fields declared on `class` by name, walking superclasses for
    // inherited static fields the JSON didn't redeclare.
    let find_field = |class: ClassId, name: &str, classes: &[Class]| -> Result<FieldId> {
        let mut cur = Some(class);
        while let Some(c) = cur {
            if let Some(fid) = field_by_name.get(&(c, name.to_string())) {
                return Ok(*fid);
            }
            cur = classes[c.index()].superclass;
        }
        Err(anyhow!("unknown field `{name}` on class `{}`", classes[class.index()].name))
    };

    let mut methods = Vec::new();
    let mut call_sites = Vec::new();
    let mut method_class = Vec::new();

    for (ci, c) in raw.classes.iter().enumerate() {
        let class_id = ClassId::new(ci);
        for mj in &c.methods {
            let mid = MethodId::new(methods.len());
            method_class.push((mid, class_id));
            classes[ci].methods.push(mid);

            let mut var_by_name = HashMap::new();
            let mut vars = Vec::new();
            if mj.has_this {
                let vid = VarId::new(vars.len());
                var_by_name.insert("this".to_string(), vid);
                vars.push(Var { id: vid, name: "this".to_string(), ty: Type::Class(class_id) });
            }
            for vj in &mj.vars {
                let vid = VarId::new(vars.len());
                var_by_name.insert(vj.name.clone(), vid);
                vars.push(Var { id: vid, name: vj.name.clone(), ty: resolve_type(&vj.ty, &class_by_name)? });
            }
            let params = mj
                .params
                .iter()
                .map(|p| {
                    var_by_name
                        .get(p)
                        .copied()
                        .ok_or_else(|| anyhow!("param `{p}` not declared in `vars` for method `{}`", mj.subsignature))
                })
                .collect::<Result<Vec<_>>>()?;
            let this_var = var_by_name.get("this").copied().filter(|_| mj.has_this);

            let lookup_var = |name: &str| -> Result<VarId> {
                var_by_name
                    .get(name)
                    .copied()
                    .ok_or_else(|| anyhow!("unknown variable `{name}` in method `{}`", mj.subsignature))
            };

            let mut stmts = Vec::with_capacity(mj.stmts.len());
            for sj in &mj.stmts {
                stmts.push(build_stmt(
                    sj,
                    mid,
                    class_id,
                    &lookup_var,
                    &resolve_class,
                    &class_by_name,
                    &classes,
                    &find_field,
                    &mut call_sites,
                )?);
            }

            methods.push(Method {
                id: mid,
                declaring_class: class_id,
                name: mj.name.clone(),
                subsignature: mj.subsignature.clone(),
                is_static: mj.is_static,
                is_abstract: mj.is_abstract,
                vars,
                params,
                this_var,
                return_type: resolve_type(&mj.return_type, &class_by_name)?,
                stmts,
            });
        }
    }

    let mut subtypes: HashMap<ClassId, Vec<ClassId>> = HashMap::new();
    for c in &classes {
        if let Some(sup) = c.superclass {
            subtypes.entry(sup).or_default().push(c.id);
        }
        for i in &c.interfaces {
            subtypes.entry(*i).or_default().push(c.id);
        }
    }

    classes.shrink_to_fit();
    Ok(Program {
        classes,
        methods,
        call_sites,
        class_by_name,
        subtypes,
    })
}

fn resolve_type(ty: &TypeJson, class_by_name: &HashMap<String, ClassId>) -> Result<Type> {
    Ok(match ty {
        TypeJson::Int => Type::Int,
        TypeJson::Other => Type::OtherPrimitive,
        TypeJson::Class { name } => Type::Class(
            class_by_name
                .get(name)
                .copied()
                .ok_or_else(|| anyhow!("unknown class `{name}`"))?,
        ),
        TypeJson::Array { elem } => Type::Array(Box::new(resolve_type(elem, class_by_name)?)),
    })
}

fn build_call_site(
    cj: &CallSiteJson,
    caller: MethodId,
    lookup_var: &impl Fn(&str) -> Result<VarId>,
    resolve_class: &impl Fn(&str) -> Result<ClassId>,
    dest: Option<VarId>,
    call_sites: &mut Vec<CallSite>,
) -> Result<CallSiteId> {
    let id = CallSiteId::new(call_sites.len());
    call_sites.push(CallSite {
        id,
        kind: parse_call_kind(&cj.call_kind)?,
        caller,
        declaring_class: resolve_class(&cj.declaring_class)?,
        subsignature: cj.subsignature.clone(),
        receiver: cj.receiver.as_deref().map(lookup_var).transpose()?,
        args: cj.args.iter().map(|a| lookup_var(a)).collect::<Result<_>>()?,
        dest,
    });
    Ok(id)
}

#[allow(clippy::too_many_arguments)]
fn build_stmt(
    sj: &StmtJson,
    mid: MethodId,
    _class_id: ClassId,
    lookup_var: &impl Fn(&str) -> Result<VarId>,
    resolve_class: &impl Fn(&str) -> Result<ClassId>,
    class_by_name: &HashMap<String, ClassId>,
    classes: &[Class],
    find_field: &impl Fn(ClassId, &str, &[Class]) -> Result<FieldId>,
    call_sites: &mut Vec<CallSite>,
) -> Result<Stmt> {
    Ok(match sj {
        StmtJson::Assign { lhs, rhs } => Stmt::Assign {
            lhs: lookup_var(lhs)?,
            rhs: build_exp(rhs, mid, lookup_var, resolve_class, class_by_name, classes, find_field, call_sites)?,
        },
        StmtJson::LoadField { lhs, base, class, field } => Stmt::LoadField {
            lhs: lookup_var(lhs)?,
            base: lookup_var(base)?,
            field: find_field(resolve_class(class)?, field, classes)?,
        },
        StmtJson::StoreField { base, class, field, rhs } => Stmt::StoreField {
            base: lookup_var(base)?,
            field: find_field(resolve_class(class)?, field, classes)?,
            rhs: lookup_var(rhs)?,
        },
        StmtJson::LoadStaticField { lhs, class, field } => Stmt::LoadStaticField {
            lhs: lookup_var(lhs)?,
            field: find_field(resolve_class(class)?, field, classes)?,
        },
        StmtJson::StoreStaticField { class, field, rhs } => Stmt::StoreStaticField {
            field: find_field(resolve_class(class)?, field, classes)?,
            rhs: lookup_var(rhs)?,
        },
        StmtJson::LoadArray { lhs, base, index } => Stmt::LoadArray {
            lhs: lookup_var(lhs)?,
            base: lookup_var(base)?,
            index: lookup_var(index)?,
        },
        StmtJson::StoreArray { base, index, rhs } => Stmt::StoreArray {
            base: lookup_var(base)?,
            index: lookup_var(index)?,
            rhs: lookup_var(rhs)?,
        },
        StmtJson::Invoke { call, dest } => {
            let dest_id = dest.as_deref().map(lookup_var).transpose()?;
            let cs = build_call_site(call, mid, lookup_var, resolve_class, dest_id, call_sites)?;
            Stmt::Invoke { call_site: cs, dest: dest_id }
        }
        StmtJson::If { cond, target } => Stmt::If { cond: lookup_var(cond)?, target: *target },
        StmtJson::Switch { var, cases, default } => Stmt::Switch {
            var: lookup_var(var)?,
            cases: cases.clone(),
            default: *default,
        },
        StmtJson::Goto { target } => Stmt::Goto(*target),
        StmtJson::Return { var } => Stmt::Return(var.as_deref().map(lookup_var).transpose()?),
        StmtJson::Nop => Stmt::Nop,
    })
}

#[allow(clippy::too_many_arguments)]
fn build_exp(
    ej: &ExpJson,
    mid: MethodId,
    lookup_var: &impl Fn(&str) -> Result<VarId>,
    resolve_class: &impl Fn(&str) -> Result<ClassId>,
    class_by_name: &HashMap<String, ClassId>,
    classes: &[Class],
    find_field: &impl Fn(ClassId, &str, &[Class]) -> Result<FieldId>,
    call_sites: &mut Vec<CallSite>,
) -> Result<Exp> {
    Ok(match ej {
        ExpJson::Var { name } => Exp::Var(lookup_var(name)?),
        ExpJson::IntConst { value } => Exp::IntConst(*value),
        ExpJson::Binary { op, l, r } => Exp::Binary(parse_binop(op)?, lookup_var(l)?, lookup_var(r)?),
        ExpJson::Unary { op, v } => Exp::Unary(parse_unop(op)?, lookup_var(v)?),
        ExpJson::NewObject { class } => Exp::NewObject(resolve_class(class)?),
        ExpJson::NewArray { elem } => Exp::NewArray(resolve_type(elem, class_by_name)?),
        ExpJson::Invoke { call } => {
            let cs = build_call_site(call, mid, lookup_var, resolve_class, None, call_sites)?;
            Exp::InvokeExp(cs)
        }
        ExpJson::InstanceFieldAccess { base, class, field } => Exp::InstanceFieldAccess {
            base: lookup_var(base)?,
            field: find_field(resolve_class(class)?, field, classes)?,
        },
        ExpJson::StaticFieldAccess { class, field } => {
            Exp::StaticFieldAccess(find_field(resolve_class(class)?, field, classes)?)
        }
        ExpJson::ArrayAccess { base, index } => Exp::ArrayAccess { base: lookup_var(base)?, index: lookup_var(index)? },
        ExpJson::Cast { var, to } => Exp::Cast(lookup_var(var)?, resolve_type(to, class_by_name)?),
        ExpJson::This => Exp::This,
    })
}

fn parse_binop(s: &str) -> Result<BinOp> {
    Ok(match s {
        "add" => BinOp::Add,
        "sub" => BinOp::Sub,
        "mul" => BinOp::Mul,
        "div" => BinOp::Div,
        "rem" => BinOp::Rem,
        "and" => BinOp::And,
        "or" => BinOp::Or,
        "xor" => BinOp::Xor,
        "shl" => BinOp::Shl,
        "shr" => BinOp::Shr,
        "ushr" => BinOp::Ushr,
        "eq" => BinOp::Eq,
        "ne" => BinOp::Ne,
        "lt" => BinOp::Lt,
        "le" => BinOp::Le,
        "gt" => BinOp::Gt,
        "ge" => BinOp::Ge,
        other => bail!("unknown binary operator `{other}`"),
    })
}

fn parse_unop(s: &str) -> Result<UnOp> {
    Ok(match s {
        "neg" => UnOp::Neg,
        "not" => UnOp::Not,
        other => bail!("unknown unary operator `{other}`"),
    })
}
