//! The in-memory intermediate representation: classes, methods,
//! statements, expressions and call sites, plus the JSON program loader.

pub mod call_site;
pub mod class;
pub mod exp;
pub mod hierarchy;
pub mod program;
pub mod stmt;
pub mod types;
pub mod var;

pub use call_site::{CallKind, CallSite, CallSiteId};
pub use class::{Class, ClassId, Field, FieldId, Method, MethodId, Subsignature};
pub use exp::{BinOp, Exp, UnOp};
pub use hierarchy::ClassHierarchy;
pub use program::Program;
pub use stmt::Stmt;
pub use types::Type;
pub use var::{Var, VarId};
