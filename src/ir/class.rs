//! Classes, fields and methods.

use crate::ir::types::Type;
use crate::ir::var::{Var, VarId};
use crate::ir::stmt::Stmt;
use crate::newtype_index;
use crate::util::index::Idx;

newtype_index! {
    pub struct ClassId { "class#{}" }
}

newtype_index! {
    pub struct FieldId { "field#{}" }
}

newtype_index! {
    pub struct MethodId { "method#{}" }
}

#[derive(Clone, Debug)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
    pub declaring_class: ClassId,
    pub ty: Type,
    pub is_static: bool,
}

#[derive(Clone, Debug)]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    pub superclass: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    pub is_abstract: bool,
    pub is_interface: bool,
    pub fields: Vec<FieldId>,
    pub methods: Vec<MethodId>,
}

/// A method's subsignature: name plus erased parameter types, used by
/// virtual dispatch to find overriding methods across the hierarchy
/// without depending on a fully-qualified id.
pub type Subsignature = String;

#[derive(Clone, Debug)]
pub struct Method {
    pub id: MethodId,
    pub declaring_class: ClassId,
    pub name: String,
    pub subsignature: Subsignature,
    pub is_static: bool,
    pub is_abstract: bool,
    /// Every local declared in the method, indexed by `VarId`.
    pub vars: Vec<Var>,
    pub params: Vec<VarId>,
    pub this_var: Option<VarId>,
    pub return_type: Type,
    pub stmts: Vec<Stmt>,
}

impl Method {
    pub fn is_concrete(&self) -> bool {
        !self.is_abstract
    }

    pub fn var(&self, id: VarId) -> &Var {
        &self.vars[id.index()]
    }

    /// The subset of statements in this method that are method invocations,
    /// precomputed so the points-to solver does not re-scan every statement
    /// each time it processes the method.
    pub fn invoke_stmt_indices(&self) -> Vec<usize> {
        self.stmts
            .iter()
            .enumerate()
            .filter(|(_, s)| s.call_site().is_some())
            .map(|(i, _)| i)
            .collect()
    }
}
