//! Lexical scope chain.
//!
//! Each [`Environment`] owns its own name→value map and optionally points at a
//! parent scope it shares but does not own. Name resolution walks outward from the
//! innermost scope, so inner bindings shadow outer ones. Only [`Environment::define`]
//! mutates, and it only ever touches the scope it is called on.
//!
//! The root scope holding the built-in procedures is built once per process and
//! handed out behind an [`Arc`]; since it is never reachable mutably, no session
//! can corrupt it. Sessions get a child scope of the root, where assigning to a
//! built-in name shadows it for that session only.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::Error;
use crate::ast::Value;
use crate::builtinops::builtin_ops;

/// Shared root scope, populated from the builtin registry on first use
static BUILTIN_ENV: LazyLock<Arc<Environment>> = LazyLock::new(|| {
    let mut env = Environment::new();
    for op in builtin_ops() {
        env.define(op.name, Value::Builtin(op));
    }
    Arc::new(env)
});

/// Environment for variable bindings
#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: HashMap<String, Value>,
    parent: Option<Arc<Environment>>,
}

impl Environment {
    /// Empty scope with no parent
    pub fn new() -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: None,
        }
    }

    /// Empty scope whose lookups fall back to `parent`
    pub fn with_parent(parent: Arc<Environment>) -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// The process-wide root scope holding the built-in procedures
    pub fn builtins() -> Arc<Environment> {
        Arc::clone(&BUILTIN_ENV)
    }

    /// Fresh top-level scope for an evaluation session, rooted at [`Environment::builtins`]
    pub fn session() -> Self {
        Environment::with_parent(Environment::builtins())
    }

    pub fn parent(&self) -> Option<&Arc<Environment>> {
        self.parent.as_ref()
    }

    /// Insert or overwrite `name` in this scope; ancestors are never touched
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Innermost binding of `name`, if any scope in the chain has one
    pub fn get(&self, name: &str) -> Option<&Value> {
        let mut scope = self;
        loop {
            if let Some(value) = scope.bindings.get(name) {
                return Some(value);
            }
            scope = scope.parent.as_deref()?;
        }
    }

    /// Resolve `name` through the chain, failing with a NameError when unbound
    pub fn lookup(&self, name: &str) -> Result<&Value, Error> {
        self.get(name)
            .ok_or_else(|| Error::NameError(name.to_owned()))
    }

    /// Whether this scope itself (not an ancestor) binds `name`
    pub fn defines_locally(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// All bindings visible from this scope, sorted by name
    /// Inner bindings override outer ones
    pub fn bindings(&self) -> Vec<(String, Value)> {
        let mut bindings = HashMap::new();

        if let Some(parent) = &self.parent {
            for (name, value) in parent.bindings() {
                bindings.insert(name, value);
            }
        }

        for (name, value) in &self.bindings {
            bindings.insert(name.clone(), value.clone());
        }

        let mut result: Vec<_> = bindings.into_iter().collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }
}
