//! Generator Program
//!
//! 改写的产物：生成期执行的指令列表。`Display` 输出一份可读的清单，
//! 形如一个拼接 `result` 字符串的函数。

use stagecraft_syntax::ast::{Expr, IterKind, Pattern};
use stagecraft_syntax::printer::{expr_to_string, pattern_to_string, quote, Precedence};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// 追加字面文本
    Literal(String),

    /// 追加表达式值的序列化形式
    ///
    /// `min` 是所在位置要求的优先级；`at_start` 表示文本位于语句
    /// 或箭头函数体的开头。执行器据此决定是否加括号。
    Inline {
        expr: Expr,
        min: Precedence,
        at_start: bool,
    },

    /// 追加分段调用结果的显示文本
    Call(Expr),

    If {
        test: Expr,
        then: Vec<Instruction>,
        otherwise: Option<Vec<Instruction>>,
    },

    /// 在生成期展开的集合迭代
    Each {
        label: Option<String>,
        kind: IterKind,
        pattern: Pattern,
        source: Expr,
        /// 每次迭代用 `let` 声明的绑定 (未内联的那些)
        declare: Vec<String>,
        body: Vec<Instruction>,
    },

    /// 分段分支里的块语句：花括号总是成对输出
    Block(Vec<Instruction>),

    Break(String),
    Continue(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorProgram {
    /// 从上下文读取的分段参数
    pub params: Vec<String>,
    pub instructions: Vec<Instruction>,
}

impl GeneratorProgram {
    pub fn new(params: Vec<String>, instructions: Vec<Instruction>) -> Self {
        Self {
            params,
            instructions,
        }
    }

    /// 字面文本指令的数量
    pub fn literal_count(&self) -> usize {
        fn count(instructions: &[Instruction]) -> usize {
            instructions
                .iter()
                .map(|instr| match instr {
                    Instruction::Literal(_) => 1,
                    Instruction::If {
                        then, otherwise, ..
                    } => count(then) + otherwise.as_deref().map_or(0, count),
                    Instruction::Each { body, .. } | Instruction::Block(body) => count(body),
                    _ => 0,
                })
                .sum()
        }
        count(&self.instructions)
    }
}

fn write_instructions(f: &mut fmt::Formatter<'_>, instructions: &[Instruction]) -> fmt::Result {
    for instr in instructions {
        write!(f, "{}", instr)?;
    }
    Ok(())
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Literal(text) => write!(f, "result += {};", quote(text)),
            Instruction::Inline { expr, .. } => {
                write!(f, "result += __inline({});", expr_to_string(expr))
            }
            Instruction::Call(expr) => write!(f, "result += {};", expr_to_string(expr)),
            Instruction::If {
                test,
                then,
                otherwise,
            } => {
                write!(f, "if ({}) {{", expr_to_string(test))?;
                write_instructions(f, then)?;
                write!(f, "}}")?;
                if let Some(otherwise) = otherwise {
                    write!(f, " else {{")?;
                    write_instructions(f, otherwise)?;
                    write!(f, "}}")?;
                }
                Ok(())
            }
            Instruction::Each {
                label,
                kind,
                pattern,
                source,
                body,
                ..
            } => {
                if let Some(label) = label {
                    write!(f, "{}: ", label)?;
                }
                write!(
                    f,
                    "for (const {} {} {}) {{",
                    pattern_to_string(pattern),
                    kind.keyword(),
                    expr_to_string(source)
                )?;
                write_instructions(f, body)?;
                write!(f, "}}")
            }
            Instruction::Block(body) => {
                write!(f, "result += \"{{\";")?;
                write_instructions(f, body)?;
                write!(f, "result += \"}}\";")
            }
            Instruction::Break(label) => write!(f, "break {};", label),
            Instruction::Continue(label) => write!(f, "continue {};", label),
        }
    }
}

impl fmt::Display for GeneratorProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "function build({{ {} }}) {{", self.params.join(", "))?;
        writeln!(f, "let result = \"\";")?;
        for instr in &self.instructions {
            writeln!(f, "{}", instr)?;
        }
        writeln!(f, "return result;")?;
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing() {
        let program = GeneratorProgram::new(
            vec!["$n".to_string()],
            vec![
                Instruction::Literal("x * ".to_string()),
                Instruction::Inline {
                    expr: Expr::ident("$n", 0..2),
                    min: Precedence::Lowest,
                    at_start: false,
                },
                Instruction::Literal(";".to_string()),
            ],
        );
        assert_eq!(
            program.to_string(),
            "function build({ $n }) {\nlet result = \"\";\nresult += \"x * \";\nresult += __inline($n);\nresult += \";\";\nreturn result;\n}"
        );
        assert_eq!(program.literal_count(), 2);
    }

    #[test]
    fn test_block_listing() {
        let block = Instruction::Block(vec![Instruction::Literal("a();".to_string())]);
        assert_eq!(
            block.to_string(),
            r#"result += "{";result += "a();";result += "}";"#
        );
    }

    #[test]
    fn test_nested_listing() {
        let each = Instruction::Each {
            label: Some("$loop".to_string()),
            kind: IterKind::Of,
            pattern: Pattern::Ident("$item".to_string()),
            source: Expr::ident("$arr", 0..4),
            declare: vec!["$item".to_string()],
            body: vec![
                Instruction::Literal("a".to_string()),
                Instruction::Break("$loop".to_string()),
            ],
        };
        assert_eq!(
            each.to_string(),
            "$loop: for (const $item of $arr) {result += \"a\";break $loop;}"
        );
    }
}
