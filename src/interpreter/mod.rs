//! The interpreter capability.
//!
//! The interpreted program's object graph is owned elsewhere. The core only
//! reaches into it through these two traits, addressing objects by their
//! stable identity:
//! - `Interpreter`: lookups, field reads and message sends used by the game loop
//! - `ObjectGraph`: read-only introspection used by the dynamic diagram

pub mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Id;

/// Fully-qualified name of the game singleton.
pub const GAME_FQN: &str = "wollok.game.game";
/// Fully-qualified name of the input/output singleton that queues events.
pub const IO_FQN: &str = "wollok.lang.io";
/// Name of the package holding interactively introduced bindings.
pub const REPL: &str = "REPL";

pub const LIST_MODULE: &str = "wollok.lang.List";
pub const SET_MODULE: &str = "wollok.lang.Set";
pub const OBJECT_MODULE: &str = "wollok.lang.Object";

/// Failures raised on the interpreter side. The core propagates these to its
/// host untouched.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("object not found: {0}")]
    MissingObject(String),
    #[error("dangling reference to object {0}")]
    DanglingReference(Id),
    #[error("{module} does not understand {selector}/{arity}")]
    MessageNotUnderstood {
        module: String,
        selector: String,
        arity: usize,
    },
    #[error("field '{field}' is missing or not a {expected}")]
    BadField {
        field: String,
        expected: &'static str,
    },
    #[error("program not found: {0}")]
    MissingProgram(String),
    #[error("{0}")]
    Raised(String),
}

/// The built-in value wrapped by an object, if any.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InnerValue {
    /// A plain object with no built-in payload.
    #[default]
    Object,
    Null,
    Number(f64),
    String(String),
    Boolean(bool),
    List(Vec<Id>),
    Set(Vec<Id>),
}

pub trait Interpreter {
    /// Look up a well-known object by fully-qualified name.
    fn object(&self, fqn: &str) -> Result<Id, RuntimeError>;

    /// Read a field slot. `None` when the object has no such field.
    fn get(&self, object: &Id, field: &str) -> Option<Id>;

    fn inner(&self, object: &Id) -> InnerValue;

    /// Whether a method `selector` taking `arity` arguments can be looked up
    /// on the object's module.
    fn responds_to(&self, object: &Id, selector: &str, arity: usize) -> bool;

    fn send(&mut self, selector: &str, receiver: &Id, args: &[Id]) -> Result<Id, RuntimeError>;

    /// Wrap a built-in value into a fresh interpreter object.
    fn reify(&mut self, value: InnerValue) -> Id;

    /// Fully-qualified name of the first program declared in `package`.
    fn program_in(&self, package: &str) -> Option<String>;

    fn exec_program(&mut self, program: &str) -> Result<(), RuntimeError>;

    fn inner_string(&self, object: &Id) -> Option<String> {
        match self.inner(object) {
            InnerValue::String(s) => Some(s),
            _ => None,
        }
    }

    fn inner_number(&self, object: &Id) -> Option<f64> {
        match self.inner(object) {
            InnerValue::Number(n) => Some(n),
            _ => None,
        }
    }

    fn inner_boolean(&self, object: &Id) -> Option<bool> {
        match self.inner(object) {
            InnerValue::Boolean(b) => Some(b),
            _ => None,
        }
    }

    fn inner_collection(&self, object: &Id) -> Option<Vec<Id>> {
        match self.inner(object) {
            InnerValue::List(elements) | InnerValue::Set(elements) => Some(elements),
            _ => None,
        }
    }

    fn list(&mut self, elements: Vec<Id>) -> Id {
        self.reify(InnerValue::List(elements))
    }
}

/// A named slot: an object field or a REPL binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: Id,
    #[serde(default)]
    pub constant: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedObject {
    pub name: String,
    pub id: Id,
}

/// `import package.*` has no member; `import package.member` names one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
}

/// The top-level names a package declares and the packages it imports.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackageScope {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<NamedObject>,
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default)]
    pub programs: Vec<String>,
}

pub trait ObjectGraph {
    /// Module of the object, `None` for null.
    fn module_fqn(&self, object: &Id) -> Option<String>;

    fn fields(&self, object: &Id) -> Vec<Field>;

    /// Elements of a list or set, in iteration order.
    fn elements(&self, object: &Id) -> Option<Vec<Id>>;

    /// Name of the well-known object, when the object was declared as one.
    fn well_known_name(&self, object: &Id) -> Option<String>;

    fn print_string(&self, object: &Id) -> String;

    fn package(&self, fqn: &str) -> Option<PackageScope>;

    fn repl_bindings(&self) -> Vec<Field>;

    fn is_null(&self, object: &Id) -> bool {
        self.module_fqn(object).is_none()
    }
}

/// Last segment of a fully-qualified name.
pub fn short_name(fqn: &str) -> &str {
    fqn.rsplit('.').next().unwrap_or(fqn)
}
