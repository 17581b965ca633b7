use crate::value::Value;
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// 脚本执行期错误
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    #[error("{name} is not defined")]
    Reference { name: String },

    #[error("{0}")]
    Type(String),

    #[error("assignment to constant variable `{0}`")]
    ConstAssignment(String),

    #[error("uncaught exception: {0}")]
    Thrown(Value),

    #[error("maximum call depth of {0} exceeded")]
    CallDepth(usize),

    #[error("{0}")]
    Native(String),
}

impl RuntimeError {
    /// 被 catch 捕获时看到的值：throw 的原值，其余错误是消息字符串
    pub fn into_value(self) -> Value {
        match self {
            RuntimeError::Thrown(value) => value,
            other => Value::string(other.to_string()),
        }
    }
}
