use crate::ast::expr::{Expr, Span};
use std::rc::Rc;

// 语句：出现在函数体内部
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    // 表达式语句: target.push(1);
    Expr { expr: Expr, span: Span },

    // 变量声明: let x = 1, [a, b] = pair;
    VarDecl(VarDecl),

    // 函数声明: function some(target) { ... }
    Function { func: Rc<Function>, span: Span },

    // 返回: return 1;
    Return { value: Option<Expr>, span: Span },

    // 控制流: if (expr) stmt else stmt
    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
        span: Span,
    },

    // C 风格 for: for (init; test; update) stmt
    For {
        init: Option<ForInit>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
        span: Span,
    },

    // 集合迭代: for (const x of xs) / for (const k in obj)
    ForEach {
        kind: IterKind,
        binding: ForBinding,
        source: Expr,
        body: Box<Stmt>,
        span: Span,
    },

    // 循环: while (expr) stmt
    While {
        test: Expr,
        body: Box<Stmt>,
        span: Span,
    },

    Break { label: Option<String>, span: Span },
    Continue { label: Option<String>, span: Span },

    // 标签语句: outer: for (...) ...
    Labeled {
        label: String,
        body: Box<Stmt>,
        span: Span,
    },

    Throw { value: Expr, span: Span },

    Try {
        block: Vec<Stmt>,
        handler: Option<CatchClause>,
        finalizer: Option<Vec<Stmt>>,
        span: Span,
    },

    // 块: { ... }
    Block { body: Vec<Stmt>, span: Span },

    Empty { span: Span },
}

impl Stmt {
    pub fn span(&self) -> &Span {
        match self {
            Stmt::Expr { span, .. } => span,
            Stmt::VarDecl(decl) => &decl.span,
            Stmt::Function { span, .. } => span,
            Stmt::Return { span, .. } => span,
            Stmt::If { span, .. } => span,
            Stmt::For { span, .. } => span,
            Stmt::ForEach { span, .. } => span,
            Stmt::While { span, .. } => span,
            Stmt::Break { span, .. } => span,
            Stmt::Continue { span, .. } => span,
            Stmt::Labeled { span, .. } => span,
            Stmt::Throw { span, .. } => span,
            Stmt::Try { span, .. } => span,
            Stmt::Block { span, .. } => span,
            Stmt::Empty { span } => span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Let,
    Const,
    Var,
}

impl DeclKind {
    pub fn keyword(self) -> &'static str {
        match self {
            DeclKind::Let => "let",
            DeclKind::Const => "const",
            DeclKind::Var => "var",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: DeclKind,
    pub declarators: Vec<Declarator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub pattern: Pattern,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    VarDecl(VarDecl),
    Expr(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterKind {
    Of,
    In,
}

impl IterKind {
    pub fn keyword(self) -> &'static str {
        match self {
            IterKind::Of => "of",
            IterKind::In => "in",
        }
    }
}

/// for-of / for-in 左侧：可选的声明关键字加绑定模式
#[derive(Debug, Clone, PartialEq)]
pub struct ForBinding {
    pub decl: Option<DeclKind>,
    pub pattern: Pattern,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: Vec<Stmt>,
}

/// 绑定模式: x, [a, b], { key: value }
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Ident(String),
    Array(Vec<Pattern>),
    Object(Vec<PropertyPattern>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyPattern {
    pub key: String,
    pub value: Pattern,
}

impl Pattern {
    /// 模式引入的所有名字（按出现顺序）
    pub fn bound_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut Vec<String>) {
        match self {
            Pattern::Ident(name) => names.push(name.clone()),
            Pattern::Array(items) => items.iter().for_each(|p| p.collect_names(names)),
            Pattern::Object(props) => props.iter().for_each(|p| p.value.collect_names(names)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub pattern: Pattern,
    pub default: Option<Expr>,
    pub rest: bool,
    pub span: Span,
}

impl Param {
    pub fn simple(name: impl Into<String>, span: Span) -> Self {
        Self {
            pattern: Pattern::Ident(name.into()),
            default: None,
            rest: false,
            span,
        }
    }

    /// 简单参数：没有解构、默认值或剩余参数
    pub fn simple_name(&self) -> Option<&str> {
        match (&self.pattern, &self.default, self.rest) {
            (Pattern::Ident(name), None, false) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Vec<Stmt>),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: FunctionBody,
    pub is_arrow: bool,
}
