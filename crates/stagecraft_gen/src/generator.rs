//! Generator
//!
//! 持有函数体、名字集合，以及延迟编译并缓存的 [`GeneratorProgram`]。

use crate::context::Context;
use crate::error::StagingResult;
use crate::exec::execute;
use crate::options::GeneratorOptions;
use crate::program::GeneratorProgram;
use crate::registry::Registry;
use crate::rewrite::rewrite;
use stagecraft_runtime::{Interpreter, Value};
use stagecraft_syntax::ast::{FunctionSource, Stmt};
use stagecraft_syntax::{parse_function, parse_program};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug)]
pub struct Generator {
    body: Vec<Stmt>,
    registry: Registry,
    program: RefCell<Option<Rc<GeneratorProgram>>>,
}

impl Generator {
    /// 从函数源码构造 (函数声明、函数表达式或箭头函数)
    pub fn new(source: &str, options: GeneratorOptions) -> StagingResult<Self> {
        let func = parse_function(source)?;
        Self::from_function(func, options)
    }

    pub fn from_function(func: FunctionSource, options: GeneratorOptions) -> StagingResult<Self> {
        let registry = Registry::new(&func.params, &options)?;
        let generator = Self {
            body: func.body,
            registry,
            program: RefCell::new(None),
        };
        if !options.skip_build {
            generator.compile()?;
        }
        Ok(generator)
    }

    pub fn body(&self) -> &[Stmt] {
        &self.body
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn is_compiled(&self) -> bool {
        self.program.borrow().is_some()
    }

    /// 编译 (如果还没有编译过)
    pub fn compile(&self) -> StagingResult<()> {
        self.program().map(|_| ())
    }

    /// 缓存的生成器程序，需要时先编译
    pub fn program(&self) -> StagingResult<Rc<GeneratorProgram>> {
        if let Some(program) = self.program.borrow().as_ref() {
            return Ok(program.clone());
        }
        // 每次编译使用自己的名字集合副本
        let program = Rc::new(rewrite(&self.body, self.registry.clone())?);
        tracing::debug!(
            instructions = program.instructions.len(),
            literals = program.literal_count(),
            "compiled generator"
        );
        *self.program.borrow_mut() = Some(program.clone());
        Ok(program)
    }

    /// 生成程序文本
    pub fn build(&self, context: &Context) -> StagingResult<String> {
        // 先克隆出来：分段调用可能重新进入同一个生成器
        let program = self.program()?;
        let text = execute(&program, context)?;
        tracing::debug!(bytes = text.len(), "built program text");
        Ok(text)
    }

    /// 生成并执行程序文本，返回最后一个表达式语句的值
    pub fn evaluate(&self, context: &Context) -> StagingResult<Value> {
        let text = self.build(context)?;
        let program = parse_program(&text)?;
        Ok(Interpreter::new().run_program(&program)?)
    }

    /// 合并两个生成器：语句依次排列，名字集合取并集，立即编译
    pub fn join(&self, other: &Generator) -> StagingResult<Generator> {
        let joined = self.join_deferred(other);
        joined.compile()?;
        Ok(joined)
    }

    /// 合并但不编译，第一次 build 时编译
    pub fn join_deferred(&self, other: &Generator) -> Generator {
        let body = self.body.iter().chain(other.body.iter()).cloned().collect();
        Generator {
            body,
            registry: self.registry.union(&other.registry),
            program: RefCell::new(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StagingError;

    #[test]
    fn test_eager_and_deferred_compilation() {
        let generator = Generator::new("($a) => { f($a); }", GeneratorOptions::new()).unwrap();
        assert!(generator.is_compiled());

        let generator =
            Generator::new("($a) => { f($a); }", GeneratorOptions::new().skip_build()).unwrap();
        assert!(!generator.is_compiled());
        generator.build(&Context::new().with("$a", 1.0)).unwrap();
        assert!(generator.is_compiled());
    }

    #[test]
    fn test_program_is_cached() {
        let generator = Generator::new("($a) => { f($a); }", GeneratorOptions::new()).unwrap();
        let first = generator.program().unwrap();
        let second = generator.program().unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_skip_build_defers_rewrite_errors() {
        let source = "($a) => { $l: while (x) {} }";
        assert!(Generator::new(source, GeneratorOptions::new()).is_err());

        let generator = Generator::new(source, GeneratorOptions::new().skip_build()).unwrap();
        let err = generator.build(&Context::new().with("$a", 1.0)).unwrap_err();
        assert!(matches!(err, StagingError::InvalidLabel { .. }));
    }

    #[test]
    fn test_construction_errors() {
        let err = Generator::new("([a]) => a", GeneratorOptions::new()).unwrap_err();
        assert!(matches!(err, StagingError::UnsupportedParameter { .. }));

        let err = Generator::new("1 + 2", GeneratorOptions::new()).unwrap_err();
        assert!(matches!(err, StagingError::Syntax(_)));
    }

    #[test]
    fn test_evaluate_returns_completion_value() {
        let generator =
            Generator::new("($a) => { $a * 2; }", GeneratorOptions::new().inline_all()).unwrap();
        let value = generator.evaluate(&Context::new().with("$a", 21.0)).unwrap();
        assert_eq!(value, Value::Number(42.0));
    }

    #[test]
    fn test_join_deferred() {
        let a = Generator::new("($a) => { f($a); }", GeneratorOptions::new().inline_all()).unwrap();
        let b = Generator::new("($b) => { g($b); }", GeneratorOptions::new()).unwrap();
        let joined = a.join_deferred(&b);
        assert!(!joined.is_compiled());
        assert_eq!(joined.body().len(), 2);

        let ctx = Context::new().with("$a", 1.0).with("$b", 2.0);
        assert_eq!(joined.build(&ctx).unwrap(), "const $b = 2;f(1);g($b);");
        assert!(joined.is_compiled());
    }
}
