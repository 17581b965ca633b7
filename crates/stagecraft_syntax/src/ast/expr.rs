use crate::ast::stmt::Function;
use std::rc::Rc;

// 源码中的字节范围 (也就是起止位置: 0..5)
pub type Span = std::ops::Range<usize>;

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // 字面量: 1, "hello", true, null, undefined
    Literal(Literal),

    // 变量使用: x, $count
    Ident(String),

    // 数组字面量: [1, 2, 3]
    Array(Vec<Expr>),

    // 对象字面量: { a: 1, "b": 2, [k]: 3 }
    Object(Vec<Property>),

    // 函数表达式与箭头函数
    Function(Rc<Function>),

    // 一元操作: -a, !b, typeof c
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    // 自增自减: i++, --i
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<Expr>,
    },

    // 二元操作 (包括 && || ??)
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    // 赋值: a = 1, obj.x += 2
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },

    // 条件表达式: a ? b : c
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },

    // 成员访问: a.b, a?.b, a[k], a?.[k]
    Member {
        object: Box<Expr>,
        property: MemberProperty,
        optional: bool,
    },

    // 函数调用: f(x), obj.m(), f?.()
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        optional: bool,
    },

    // 构造: new Date("...")
    New {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    Named(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Named(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Bool(bool),
    Null,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow, // + - * / % **
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq, // == != === !==
    Lt,
    Gt,
    Leq,
    Geq, // < > <= >=
    And,
    Or,
    Nullish, // && || ??
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Leq => "<=",
            BinaryOp::Geq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Nullish => "??",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,    // -x
    Plus,   // +x
    Not,    // !x
    Typeof, // typeof x
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::Typeof => "typeof ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

impl UpdateOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
        }
    }

    /// 复合赋值对应的二元运算
    pub fn binary(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
            AssignOp::Mod => Some(BinaryOp::Mod),
        }
    }
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// 构造一个标识符表达式
    pub fn ident(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Ident(name.into()), span)
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// 成员访问链最左侧的对象表达式: `a.b[c].d` -> `a`
    pub fn chain_root(&self) -> &Expr {
        let mut current = self;
        while let ExprKind::Member { object, .. } = &current.kind {
            current = object;
        }
        current
    }
}

/// 数字的 JavaScript 风格文本: 整数不带小数点
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if value == 0.0 {
        "0".to_string()
    } else {
        format!("{}", value)
    }
}

/// 合法的标识符可以不加引号作为属性名
pub fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_chain_root() {
        let root = Expr::ident("$a", 0..2);
        let chain = Expr::new(
            ExprKind::Member {
                object: Box::new(Expr::new(
                    ExprKind::Member {
                        object: Box::new(root.clone()),
                        property: MemberProperty::Named("b".into()),
                        optional: false,
                    },
                    0..4,
                )),
                property: MemberProperty::Named("c".into()),
                optional: true,
            },
            0..7,
        );
        assert_eq!(chain.chain_root(), &root);
    }

    #[test]
    fn test_identifier_name() {
        assert!(is_identifier_name("$item"));
        assert!(is_identifier_name("_x1"));
        assert!(!is_identifier_name("1x"));
        assert!(!is_identifier_name("a b"));
    }
}
