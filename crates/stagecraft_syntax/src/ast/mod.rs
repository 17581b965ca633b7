pub mod expr;
pub mod stmt;
pub mod visitor;

// 重新导出核心类型，方便外部直接使用 stagecraft_syntax::ast::Expr 等
pub use expr::{
    format_number, is_identifier_name, AssignOp, BinaryOp, Expr, ExprKind, Literal,
    MemberProperty, Property, PropertyKey, Span, UnaryOp, UpdateOp,
};
pub use stmt::{
    CatchClause, DeclKind, Declarator, ForBinding, ForInit, Function, FunctionBody, IterKind,
    Param, Pattern, PropertyPattern, Stmt, VarDecl,
};
pub use visitor::Visitor;

// 整个程序：顶层语句序列
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
}

/// 一个函数定义拆成参数列表和函数体
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSource {
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub span: Span,
}
