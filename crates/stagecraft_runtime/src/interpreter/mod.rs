//! Tree-walking Interpreter
//!
//! 直接遍历语法树执行脚本。语句产生 `Completion`，表达式产生 `Value`。

mod expr;
pub mod ops;

use crate::builtins;
use crate::env::Env;
use crate::error::{RuntimeError, RuntimeResult};
use crate::value::{Function, Value};
use stagecraft_syntax::ast::*;
use std::rc::Rc;

/// 脚本函数调用的最大嵌套深度
pub const MAX_CALL_DEPTH: usize = 256;

/// 语句执行结果
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// 正常结束，携带最后一个表达式语句的值
    Normal(Option<Value>),
    Return(Value),
    Break(Option<String>),
    Continue(Option<String>),
}

/// 声明绑定还是给已有变量赋值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    Declare { mutable: bool },
    Assign,
}

pub struct Interpreter {
    globals: Env,
    depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Env::new();
        builtins::install_globals(&globals);
        Self { globals, depth: 0 }
    }

    pub fn globals(&self) -> &Env {
        &self.globals
    }

    /// 执行整个程序，返回最后一个表达式语句的值
    pub fn run_program(&mut self, program: &Program) -> RuntimeResult<Value> {
        let env = self.globals.child();
        tracing::trace!(statements = program.body.len(), "running program");
        match self.exec_block(&program.body, &env)? {
            Completion::Normal(value) => Ok(value.unwrap_or(Value::Undefined)),
            Completion::Return(value) => Ok(value),
            Completion::Break(_) | Completion::Continue(_) => Err(RuntimeError::Type(
                "break or continue outside of a loop".to_string(),
            )),
        }
    }

    /// 在同一个作用域里执行一串语句 (先提升函数声明)
    pub fn exec_block(&mut self, stmts: &[Stmt], env: &Env) -> RuntimeResult<Completion> {
        for stmt in stmts {
            if let Stmt::Function { func, .. } = stmt {
                if let Some(name) = &func.name {
                    env.declare(name.clone(), self.closure(func, env), true);
                }
            }
        }

        let mut last = None;
        for stmt in stmts {
            match self.exec_stmt(stmt, env)? {
                Completion::Normal(Some(value)) => last = Some(value),
                Completion::Normal(None) => {}
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal(last))
    }

    pub fn exec_stmt(&mut self, stmt: &Stmt, env: &Env) -> RuntimeResult<Completion> {
        match stmt {
            Stmt::Expr { expr, .. } => Ok(Completion::Normal(Some(self.eval_expr(expr, env)?))),
            Stmt::VarDecl(decl) => {
                self.exec_var_decl(decl, env)?;
                Ok(Completion::Normal(None))
            }
            // 已在 exec_block 中提升
            Stmt::Function { .. } => Ok(Completion::Normal(None)),
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Stmt::If {
                test,
                consequent,
                alternate,
                ..
            } => {
                if self.eval_expr(test, env)?.truthy() {
                    self.exec_stmt(consequent, env)
                } else if let Some(alternate) = alternate {
                    self.exec_stmt(alternate, env)
                } else {
                    Ok(Completion::Normal(None))
                }
            }
            Stmt::For { .. } | Stmt::ForEach { .. } | Stmt::While { .. } => {
                self.exec_loop(stmt, env, &[])
            }
            Stmt::Break { label, .. } => Ok(Completion::Break(label.clone())),
            Stmt::Continue { label, .. } => Ok(Completion::Continue(label.clone())),
            Stmt::Labeled { .. } => self.exec_labeled(stmt, env, Vec::new()),
            Stmt::Throw { value, .. } => Err(RuntimeError::Thrown(self.eval_expr(value, env)?)),
            Stmt::Try {
                block,
                handler,
                finalizer,
                ..
            } => self.exec_try(block, handler.as_ref(), finalizer.as_deref(), env),
            Stmt::Block { body, .. } => self.exec_block(body, &env.child()),
            Stmt::Empty { .. } => Ok(Completion::Normal(None)),
        }
    }

    fn exec_var_decl(&mut self, decl: &VarDecl, env: &Env) -> RuntimeResult<()> {
        let mode = BindMode::Declare {
            mutable: decl.kind != DeclKind::Const,
        };
        for declarator in &decl.declarators {
            let value = match &declarator.init {
                Some(init) => self.eval_expr(init, env)?,
                None => Value::Undefined,
            };
            self.bind_pattern(&declarator.pattern, value, env, mode)?;
        }
        Ok(())
    }

    // outer: inner: for (...) 收集所有标签再执行
    fn exec_labeled(
        &mut self,
        stmt: &Stmt,
        env: &Env,
        mut labels: Vec<String>,
    ) -> RuntimeResult<Completion> {
        match stmt {
            Stmt::Labeled { label, body, .. } => {
                labels.push(label.clone());
                self.exec_labeled(body, env, labels)
            }
            Stmt::For { .. } | Stmt::ForEach { .. } | Stmt::While { .. } => {
                self.exec_loop(stmt, env, &labels)
            }
            other => match self.exec_stmt(other, env)? {
                Completion::Break(Some(label)) if labels.contains(&label) => {
                    Ok(Completion::Normal(None))
                }
                completion => Ok(completion),
            },
        }
    }

    fn exec_loop(&mut self, stmt: &Stmt, env: &Env, labels: &[String]) -> RuntimeResult<Completion> {
        match stmt {
            Stmt::While { test, body, .. } => {
                while self.eval_expr(test, env)?.truthy() {
                    if let Some(done) = loop_control(self.exec_stmt(body, env)?, labels) {
                        return Ok(done);
                    }
                }
            }
            Stmt::For {
                init,
                test,
                update,
                body,
                ..
            } => {
                let loop_env = env.child();
                match init {
                    Some(ForInit::VarDecl(decl)) => self.exec_var_decl(decl, &loop_env)?,
                    Some(ForInit::Expr(expr)) => {
                        self.eval_expr(expr, &loop_env)?;
                    }
                    None => {}
                }
                loop {
                    if let Some(test) = test {
                        if !self.eval_expr(test, &loop_env)?.truthy() {
                            break;
                        }
                    }
                    if let Some(done) = loop_control(self.exec_stmt(body, &loop_env)?, labels) {
                        return Ok(done);
                    }
                    if let Some(update) = update {
                        self.eval_expr(update, &loop_env)?;
                    }
                }
            }
            Stmt::ForEach {
                kind,
                binding,
                source,
                body,
                ..
            } => {
                let source = self.eval_expr(source, env)?;
                let mode = match binding.decl {
                    Some(decl) => BindMode::Declare {
                        mutable: decl != DeclKind::Const,
                    },
                    None => BindMode::Assign,
                };
                for item in iterate(*kind, &source)? {
                    let iter_env = env.child();
                    self.bind_pattern(&binding.pattern, item, &iter_env, mode)?;
                    if let Some(done) = loop_control(self.exec_stmt(body, &iter_env)?, labels) {
                        return Ok(done);
                    }
                }
            }
            other => return self.exec_stmt(other, env),
        }
        Ok(Completion::Normal(None))
    }

    fn exec_try(
        &mut self,
        block: &[Stmt],
        handler: Option<&CatchClause>,
        finalizer: Option<&[Stmt]>,
        env: &Env,
    ) -> RuntimeResult<Completion> {
        let result = match (self.exec_block(block, &env.child()), handler) {
            (Err(err), Some(handler)) => {
                tracing::trace!(error = %err, "caught script exception");
                let catch_env = env.child();
                if let Some(param) = &handler.param {
                    let mode = BindMode::Declare { mutable: true };
                    self.bind_pattern(param, err.into_value(), &catch_env, mode)?;
                }
                self.exec_block(&handler.body, &catch_env)
            }
            (result, _) => result,
        };

        if let Some(finalizer) = finalizer {
            // finally 中的 return/break 或错误覆盖之前的结果
            match self.exec_block(finalizer, &env.child())? {
                Completion::Normal(_) => {}
                abrupt => return Ok(abrupt),
            }
        }
        result
    }

    /// 按模式绑定 (解构数组和对象)
    pub fn bind_pattern(
        &mut self,
        pattern: &Pattern,
        value: Value,
        env: &Env,
        mode: BindMode,
    ) -> RuntimeResult<()> {
        match pattern {
            Pattern::Ident(name) => match mode {
                BindMode::Declare { mutable } => {
                    env.declare(name.clone(), value, mutable);
                    Ok(())
                }
                BindMode::Assign => env.assign(name, value),
            },
            Pattern::Array(items) => {
                let elements = match &value {
                    Value::Array(array) => array.borrow().clone(),
                    Value::Str(s) => s.chars().map(|c| Value::string(c.to_string())).collect(),
                    other => {
                        return Err(RuntimeError::Type(format!(
                            "{} is not iterable",
                            other.type_name()
                        )))
                    }
                };
                for (i, item) in items.iter().enumerate() {
                    let element = elements.get(i).cloned().unwrap_or(Value::Undefined);
                    self.bind_pattern(item, element, env, mode)?;
                }
                Ok(())
            }
            Pattern::Object(props) => {
                if value.is_nullish() {
                    return Err(RuntimeError::Type(format!(
                        "cannot destructure `{}`",
                        value
                    )));
                }
                for prop in props {
                    let field = self.get_property(&value, &prop.key)?;
                    self.bind_pattern(&prop.value, field, env, mode)?;
                }
                Ok(())
            }
        }
    }

    pub fn closure(&self, func: &Rc<stagecraft_syntax::ast::Function>, env: &Env) -> Value {
        Value::Function(Rc::new(Function::Closure {
            func: func.clone(),
            env: env.clone(),
        }))
    }

    /// 调用一个函数值
    pub fn call_value(&mut self, callee: &Value, args: &[Value]) -> RuntimeResult<Value> {
        let func = callee.as_function().ok_or_else(|| {
            RuntimeError::Type(format!("{} is not a function", callee.type_name()))
        })?;
        if self.depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::CallDepth(MAX_CALL_DEPTH));
        }
        self.depth += 1;
        let result = self.invoke(func, args);
        self.depth -= 1;
        result
    }

    fn invoke(&mut self, func: &Function, args: &[Value]) -> RuntimeResult<Value> {
        match func {
            Function::Native { call, .. } => call(self, args),
            Function::Closure { func, env } => {
                let call_env = env.child();
                let mode = BindMode::Declare { mutable: true };
                for (i, param) in func.params.iter().enumerate() {
                    let value = if param.rest {
                        Value::array(args.iter().skip(i).cloned().collect())
                    } else {
                        match (args.get(i), &param.default) {
                            (Some(arg), _) if !matches!(arg, Value::Undefined) => arg.clone(),
                            (_, Some(default)) => self.eval_expr(default, &call_env)?,
                            (arg, None) => arg.cloned().unwrap_or(Value::Undefined),
                        }
                    };
                    self.bind_pattern(&param.pattern, value, &call_env, mode)?;
                }
                match &func.body {
                    FunctionBody::Expr(body) => self.eval_expr(body, &call_env),
                    FunctionBody::Block(body) => match self.exec_block(body, &call_env)? {
                        Completion::Return(value) => Ok(value),
                        _ => Ok(Value::Undefined),
                    },
                }
            }
        }
    }
}

// 循环体结束后的处理：Some 表示循环需要退出并返回该结果
fn loop_control(completion: Completion, labels: &[String]) -> Option<Completion> {
    let own = |label: &Option<String>| match label {
        None => true,
        Some(label) => labels.contains(label),
    };
    match completion {
        Completion::Normal(_) => None,
        Completion::Continue(ref label) if own(label) => None,
        Completion::Break(ref label) if own(label) => Some(Completion::Normal(None)),
        abrupt => Some(abrupt),
    }
}

/// for-of 取元素，for-in 取键
pub fn iterate(kind: IterKind, source: &Value) -> RuntimeResult<Vec<Value>> {
    match (kind, source) {
        (IterKind::Of, Value::Array(items)) => Ok(items.borrow().clone()),
        (IterKind::Of, Value::Str(s)) => Ok(s.chars().map(|c| Value::string(c.to_string())).collect()),
        (IterKind::Of, other) => Err(RuntimeError::Type(format!(
            "{} is not iterable",
            other.type_name()
        ))),
        (IterKind::In, Value::Array(items)) => Ok((0..items.borrow().len())
            .map(|i| Value::string(i.to_string()))
            .collect()),
        (IterKind::In, Value::Str(s)) => Ok((0..s.chars().count())
            .map(|i| Value::string(i.to_string()))
            .collect()),
        (IterKind::In, Value::Object(map)) => Ok(map.borrow().keys().map(Value::string).collect()),
        (IterKind::In, _) => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagecraft_syntax::parse_program;

    fn run(source: &str) -> RuntimeResult<Value> {
        let program = parse_program(source).unwrap();
        Interpreter::new().run_program(&program)
    }

    #[test]
    fn test_completion_value() {
        assert_eq!(run("let a = 2; a * 21;").unwrap(), Value::Number(42.0));
        assert_eq!(run("let a = 2;").unwrap(), Value::Undefined);
    }

    #[test]
    fn test_loops_and_labels() {
        let source = r#"
            const out = [];
            outer: for (const x of [1, 2, 3]) {
                for (let i = 0; i < 3; i++) {
                    if (i == 1) continue outer;
                    if (x == 3) break outer;
                    out.push(x * 10 + i);
                }
            }
            out;
        "#;
        assert_eq!(
            run(source).unwrap(),
            Value::array(vec![10.0.into(), 20.0.into()])
        );
    }

    #[test]
    fn test_function_hoisting_and_closures() {
        let source = r#"
            const add = make(10);
            function make(base) { return (x) => base + x; }
            add(5);
        "#;
        assert_eq!(run(source).unwrap(), Value::Number(15.0));
    }

    #[test]
    fn test_destructuring_and_defaults() {
        let source = r#"
            function f([a, b], { c: d }, e = 7, ...rest) { return [a, b, d, e, rest.length]; }
            f([1, 2], { c: 3 }, undefined, 8, 9);
        "#;
        assert_eq!(
            run(source).unwrap(),
            Value::array(vec![
                1.0.into(),
                2.0.into(),
                3.0.into(),
                7.0.into(),
                2.0.into()
            ])
        );
    }

    #[test]
    fn test_try_catch_finally() {
        let source = r#"
            let log = [];
            try { throw "boom"; } catch (e) { log.push(e); } finally { log.push("done"); }
            try { missing(); } catch (e) { log.push(typeof e); }
            log.join("|");
        "#;
        assert_eq!(run(source).unwrap(), Value::string("boom|done|string"));
    }

    #[test]
    fn test_const_assignment_fails() {
        let err = run("const a = 1; a = 2;").unwrap_err();
        assert!(matches!(err, RuntimeError::ConstAssignment(name) if name == "a"));
    }

    #[test]
    fn test_uncaught_throw() {
        let err = run("throw 5;").unwrap_err();
        assert!(matches!(err, RuntimeError::Thrown(Value::Number(n)) if n == 5.0));
    }

    #[test]
    fn test_call_depth_guard() {
        let err = run("function f(n) { return f(n + 1); } f(0);").unwrap_err();
        assert!(matches!(err, RuntimeError::CallDepth(MAX_CALL_DEPTH)));
    }

    #[test]
    fn test_for_in_keys() {
        let source = r#"
            const keys = [];
            for (const k in { a: 1, b: 2 }) keys.push(k);
            for (const i in ["x"]) keys.push(i);
            keys.join(",");
        "#;
        assert_eq!(run(source).unwrap(), Value::string("a,b,0"));
    }

    #[test]
    fn test_while_loop() {
        assert_eq!(
            run("let n = 0; while (n < 5) n += 2; n;").unwrap(),
            Value::Number(6.0)
        );
    }
}
