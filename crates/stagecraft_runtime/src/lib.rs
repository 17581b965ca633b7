//! Stagecraft Runtime
//!
//! 脚本语言的树遍历解释器：值、环境、内置函数。

pub mod builtins;
pub mod env;
pub mod error;
pub mod interpreter;
pub mod value;

pub use env::Env;
pub use error::{RuntimeError, RuntimeResult};
pub use interpreter::{iterate, BindMode, Completion, Interpreter, MAX_CALL_DEPTH};
pub use value::{format_date, Function, NativeFn, Value};
