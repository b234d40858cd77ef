//! Lexical environments.
//!
//! An [`Environment`] is a handle to one scope: a local frame of bindings plus the
//! scope it extends. Handles are cheap to clone and every clone sees the same
//! frame, which is how a closure and the scope it was defined in share state.
//!
//! Names are single-assignment: [`Environment::set`] refuses any name that is
//! already visible, whether it was bound in this frame or inherited. Shadowing
//! only happens through [`Environment::extend`] (closure calls and `let`).

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::Error;
use crate::ast::Value;

/// Environment for variable bindings
#[derive(Clone, Default)]
pub struct Environment(Rc<Scope>);

#[derive(Default)]
struct Scope {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Environment>,
}

impl Environment {
    /// A fresh, empty top-level environment
    pub fn new() -> Self {
        Environment::default()
    }

    /// A top-level environment pre-seeded with bindings
    pub fn with_bindings<I>(bindings: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        Environment(Rc::new(Scope {
            bindings: RefCell::new(bindings.into_iter().collect()),
            parent: None,
        }))
    }

    /// A child scope that sees everything visible here plus `bindings`.
    /// Names in `bindings` shadow inherited ones; the receiver is not modified.
    pub fn extend<I>(&self, bindings: I) -> Environment
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        Environment(Rc::new(Scope {
            bindings: RefCell::new(bindings.into_iter().collect()),
            parent: Some(self.clone()),
        }))
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(value) = env.0.bindings.borrow().get(name) {
                return Some(value.clone());
            }
            scope = env.0.parent.as_ref();
        }
        None
    }

    /// Resolve a name, failing with `UnboundSymbol`
    pub fn lookup(&self, name: &str) -> Result<Value, Error> {
        self.get(name)
            .ok_or_else(|| Error::UnboundSymbol(name.to_owned()))
    }

    /// Whether `name` is bound here or in any enclosing scope
    pub fn contains(&self, name: &str) -> bool {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if env.0.bindings.borrow().contains_key(name) {
                return true;
            }
            scope = env.0.parent.as_ref();
        }
        false
    }

    /// Bind `name` in this scope, unless it is already visible.
    pub fn set(&self, name: &str, value: Value) -> Result<(), Error> {
        if self.contains(name) {
            return Err(Error::AlreadyDefined(name.to_owned()));
        }
        self.0.bindings.borrow_mut().insert(name.to_owned(), value);
        Ok(())
    }

    /// Drop every binding made in this frame.
    ///
    /// A closure defined here holds this frame, so a frame with functions in it
    /// keeps itself alive until it is cleared.
    pub fn clear(&self) {
        let bindings = self.0.bindings.take();
        drop(bindings);
    }

    /// Get all bindings visible from this environment.
    /// Returns a Vec of (name, value) pairs sorted by name
    pub fn get_all_bindings(&self) -> Vec<(String, Value)> {
        let mut bindings = HashMap::new();

        if let Some(parent) = &self.0.parent {
            bindings.extend(parent.get_all_bindings());
        }
        // Local bindings shadow inherited ones
        for (name, value) in self.0.bindings.borrow().iter() {
            bindings.insert(name.clone(), value.clone());
        }

        let mut result: Vec<_> = bindings.into_iter().collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }
}

impl fmt::Debug for Environment {
    // Values may hold closures over this very environment, so only names are shown
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .get_all_bindings()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        f.debug_struct("Environment").field("names", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Closure, sym, val};

    #[test]
    fn test_lookup_and_unbound() {
        let env = Environment::with_bindings([("x".to_owned(), val(1))]);
        assert_eq!(env.lookup("x").ok(), Some(val(1)));
        match env.lookup("y") {
            Err(Error::UnboundSymbol(name)) => assert_eq!(name, "y"),
            other => panic!("expected UnboundSymbol, got {other:?}"),
        }
    }

    #[test]
    fn test_set_is_single_assignment() {
        let env = Environment::new();
        assert!(env.set("x", val(1)).is_ok());
        assert!(matches!(env.set("x", val(2)), Err(Error::AlreadyDefined(_))));
        assert_eq!(env.lookup("x").ok(), Some(val(1)));
    }

    #[test]
    fn test_set_rejects_inherited_names() {
        let parent = Environment::new();
        assert!(parent.set("x", val(1)).is_ok());
        let child = parent.extend([("y".to_owned(), val(2))]);

        assert!(matches!(child.set("x", val(3)), Err(Error::AlreadyDefined(_))));
        assert!(matches!(child.set("y", val(3)), Err(Error::AlreadyDefined(_))));
        assert!(child.set("z", val(3)).is_ok());
    }

    #[test]
    fn test_extend_does_not_touch_parent() {
        let parent = Environment::with_bindings([("x".to_owned(), val(1))]);
        let child = parent.extend([("x".to_owned(), val(10)), ("y".to_owned(), val(2))]);
        assert!(child.set("z", val(3)).is_ok());

        assert_eq!(child.lookup("x").ok(), Some(val(10)));
        assert_eq!(child.lookup("y").ok(), Some(val(2)));
        assert_eq!(parent.lookup("x").ok(), Some(val(1)));
        assert!(!parent.contains("y"));
        assert!(!parent.contains("z"));
    }

    #[test]
    fn test_clones_share_the_frame() {
        let env = Environment::new();
        let alias = env.clone();
        assert!(alias.set("x", val(1)).is_ok());
        assert_eq!(env.lookup("x").ok(), Some(val(1)));
    }

    #[test]
    fn test_get_all_bindings_sorted_and_shadowed() {
        let parent = Environment::with_bindings([
            ("b".to_owned(), val(1)),
            ("a".to_owned(), val(2)),
        ]);
        let child = parent.extend([("b".to_owned(), val(3))]);
        assert_eq!(
            child.get_all_bindings(),
            vec![("a".to_owned(), val(2)), ("b".to_owned(), val(3))]
        );
    }

    #[test]
    fn test_clear_releases_recursive_definitions() {
        let env = Environment::new();
        let recursive = val(Closure::new(env.clone(), vec![], val(vec![sym("f")])));
        assert!(env.set("f", recursive).is_ok());

        // The closure's captured handle keeps the frame alive
        let frame = Rc::downgrade(&env.0);
        assert_eq!(Rc::strong_count(&env.0), 2);

        env.clear();
        assert!(env.get_all_bindings().is_empty());
        assert_eq!(Rc::strong_count(&env.0), 1);

        drop(env);
        assert!(frame.upgrade().is_none());
    }
}
