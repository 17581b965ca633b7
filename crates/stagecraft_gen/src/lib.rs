//! Stagecraft Generator
//!
//! 分段代码生成：函数参数中带 `$` 前缀的名字在生成期给出值，
//! 能在生成期判定的结构 (条件、集合迭代、调用、访问链) 立即求值，
//! 其余部分原样留给生成出来的程序在运行期执行。
//!
//! ```rust
//! use stagecraft_gen::{Context, Generator, GeneratorOptions};
//!
//! let generator = Generator::new(
//!     "($cond) => { if ($cond === 0) { a(); } else { b(); } }",
//!     GeneratorOptions::new().inline_all(),
//! )
//! .unwrap();
//! let text = generator.build(&Context::new().with("$cond", 0.0)).unwrap();
//! assert_eq!(text, "{a();}");
//! ```

pub mod buffer;
pub mod classify;
pub mod context;
pub mod error;
pub mod exec;
pub mod generator;
pub mod options;
pub mod program;
pub mod registry;
pub mod rewrite;
pub mod serialize;

pub use context::Context;
pub use error::{StagingError, StagingResult};
pub use generator::Generator;
pub use options::{GeneratorOptions, InlinePolicy};
pub use program::{GeneratorProgram, Instruction};
pub use registry::Registry;
pub use serialize::{insert_code, serialize};
