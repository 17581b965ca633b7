//! 词法环境
//!
//! 每个作用域一个 Frame，通过 parent 链向外查找。

use crate::error::{RuntimeError, RuntimeResult};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
struct Binding {
    value: Value,
    mutable: bool,
}

struct Frame {
    vars: HashMap<String, Binding>,
    parent: Option<Env>,
}

#[derive(Clone)]
pub struct Env(Rc<RefCell<Frame>>);

impl Env {
    pub fn new() -> Self {
        Env(Rc::new(RefCell::new(Frame {
            vars: HashMap::new(),
            parent: None,
        })))
    }

    pub fn child(&self) -> Self {
        Env(Rc::new(RefCell::new(Frame {
            vars: HashMap::new(),
            parent: Some(self.clone()),
        })))
    }

    /// 在当前作用域声明 (同名覆盖)
    pub fn declare(&self, name: impl Into<String>, value: Value, mutable: bool) {
        self.0
            .borrow_mut()
            .vars
            .insert(name.into(), Binding { value, mutable });
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        let frame = self.0.borrow();
        match frame.vars.get(name) {
            Some(binding) => Some(binding.value.clone()),
            None => frame.parent.as_ref().and_then(|parent| parent.lookup(name)),
        }
    }

    pub fn get(&self, name: &str) -> RuntimeResult<Value> {
        self.lookup(name).ok_or_else(|| RuntimeError::Reference {
            name: name.to_string(),
        })
    }

    /// 给最近一个声明了 `name` 的作用域赋值
    pub fn assign(&self, name: &str, value: Value) -> RuntimeResult<()> {
        let mut frame = self.0.borrow_mut();
        if let Some(binding) = frame.vars.get_mut(name) {
            if !binding.mutable {
                return Err(RuntimeError::ConstAssignment(name.to_string()));
            }
            binding.value = value;
            return Ok(());
        }
        match &frame.parent {
            Some(parent) => parent.assign(name, value),
            None => Err(RuntimeError::Reference {
                name: name.to_string(),
            }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.0.borrow();
        let mut names: Vec<&String> = frame.vars.keys().collect();
        names.sort();
        f.debug_struct("Env")
            .field("names", &names)
            .field("has_parent", &frame.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_parents() {
        let global = Env::new();
        global.declare("a", Value::Number(1.0), true);
        let inner = global.child();
        inner.declare("b", Value::Number(2.0), true);

        assert_eq!(inner.lookup("a"), Some(Value::Number(1.0)));
        assert_eq!(global.lookup("b"), None);
    }

    #[test]
    fn test_assign_updates_outer_binding() {
        let global = Env::new();
        global.declare("a", Value::Number(1.0), true);
        let inner = global.child();
        inner.assign("a", Value::Number(5.0)).unwrap();
        assert_eq!(global.lookup("a"), Some(Value::Number(5.0)));
    }

    #[test]
    fn test_const_and_missing() {
        let env = Env::new();
        env.declare("c", Value::Null, false);
        assert!(matches!(
            env.assign("c", Value::Null),
            Err(RuntimeError::ConstAssignment(_))
        ));
        assert!(matches!(
            env.assign("nope", Value::Null),
            Err(RuntimeError::Reference { .. })
        ));
    }
}
