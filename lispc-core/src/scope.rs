//! Generation-time symbol tables.
//!
//! Scopes form a chain from the innermost `defun`/`let` body out to the
//! root. They are stored in an arena and refer to their parent by
//! index; since generation enters and leaves scopes in strict nesting
//! order, leaving a scope simply drops the last record.

use std::collections::HashMap;

use crate::error::CoreError;

/// What an identifier stands for while code is being generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A function, referred to by its generated name (`L0`, `L1`, ...).
    Function(String),
    /// Target text spliced verbatim wherever the name is referenced.
    Expression(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScopeId(usize);

#[derive(Debug, Default)]
struct ScopeRecord {
    parent: Option<ScopeId>,
    symbols: HashMap<String, Value>,
}

#[derive(Debug)]
pub struct Scopes {
    records: Vec<ScopeRecord>,
    current: ScopeId,
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

impl Scopes {
    /// A chain holding only an empty root scope.
    pub fn new() -> Self {
        Scopes {
            records: vec![ScopeRecord::default()],
            current: ScopeId(0),
        }
    }

    fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    #[cfg(test)]
    fn current(&self) -> ScopeId {
        self.current
    }

    /// Number of scopes on the chain, the root included.
    #[cfg(test)]
    fn depth(&self) -> usize {
        self.records.len()
    }

    /// Push a child of the current scope and make it current.
    pub fn enter(&mut self) {
        let id = ScopeId(self.records.len());
        self.records.push(ScopeRecord {
            parent: Some(self.current),
            symbols: HashMap::new(),
        });
        self.current = id;
    }

    /// Drop the current scope and make its parent current again.
    /// The root scope is never dropped.
    pub fn leave(&mut self) {
        if let Some(parent) = self.records[self.current.0].parent {
            self.records.truncate(self.current.0);
            self.current = parent;
        }
    }

    /// Resolve `name`, innermost scope first.
    pub fn get(&self, name: &str) -> Result<&Value, CoreError> {
        let mut scope = Some(self.current);
        while let Some(ScopeId(index)) = scope {
            let record = &self.records[index];
            if let Some(value) = record.symbols.get(name) {
                return Ok(value);
            }
            scope = record.parent;
        }
        Err(CoreError::SymbolNotFound(name.to_string()))
    }

    /// Bind `name` in the current scope, or in the root scope when
    /// `global` is set. The target scope must not already hold `name`.
    pub fn set(&mut self, name: &str, value: Value, global: bool) -> Result<(), CoreError> {
        let target = if global { self.root() } else { self.current };
        let symbols = &mut self.records[target.0].symbols;
        if symbols.contains_key(name) {
            return Err(CoreError::DuplicateSymbol(name.to_string()));
        }
        symbols.insert(name.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(text: &str) -> Value {
        Value::Expression(text.to_string())
    }

    #[test]
    fn missing_symbol_is_reported() {
        let scopes = Scopes::new();
        let err = scopes.get("x").unwrap_err();
        assert!(matches!(err, CoreError::SymbolNotFound(name) if name == "x"));
    }

    #[test]
    fn child_scope_shadows_parent() {
        let mut scopes = Scopes::new();
        scopes.set("x", expr("INT(1)"), false).unwrap();
        scopes.enter();
        scopes.set("x", expr("INT(2)"), false).expect("shadowing is allowed");
        assert_eq!(scopes.get("x").unwrap(), &expr("INT(2)"));
        scopes.leave();
        assert_eq!(scopes.get("x").unwrap(), &expr("INT(1)"));
    }

    #[test]
    fn redefinition_in_same_scope_fails() {
        let mut scopes = Scopes::new();
        scopes.enter();
        scopes.set("x", expr("INT(1)"), false).unwrap();
        let err = scopes.set("x", expr("INT(2)"), false).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateSymbol(name) if name == "x"));
    }

    #[test]
    fn lookup_walks_to_the_root() {
        let mut scopes = Scopes::new();
        scopes.set("f", Value::Function("L0".to_string()), false).unwrap();
        scopes.enter();
        scopes.enter();
        assert_eq!(scopes.get("f").unwrap(), &Value::Function("L0".to_string()));
    }

    #[test]
    fn global_set_lands_in_root_and_outlives_children() {
        let mut scopes = Scopes::new();
        scopes.enter();
        scopes.enter();
        scopes
            .set("f", Value::Function("L0".to_string()), true)
            .unwrap();
        scopes.leave();
        scopes.leave();
        assert_eq!(scopes.current(), scopes.root());
        assert_eq!(scopes.get("f").unwrap(), &Value::Function("L0".to_string()));
    }

    #[test]
    fn global_set_checks_only_the_root() {
        let mut scopes = Scopes::new();
        scopes.set("f", Value::Function("L0".to_string()), true).unwrap();
        scopes.enter();
        let err = scopes
            .set("f", Value::Function("L1".to_string()), true)
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateSymbol(_)));

        // A local binding of the same name in a child is still fine.
        scopes.set("f", expr("ARG(0)"), false).unwrap();
    }

    #[test]
    fn leave_discards_child_bindings() {
        let mut scopes = Scopes::new();
        scopes.enter();
        scopes.set("a", expr("INT(1)"), false).unwrap();
        assert_eq!(scopes.depth(), 2);
        scopes.leave();
        assert_eq!(scopes.depth(), 1);
        assert!(scopes.get("a").is_err());

        // Leaving the root is a no-op.
        scopes.leave();
        assert_eq!(scopes.depth(), 1);
    }
}
