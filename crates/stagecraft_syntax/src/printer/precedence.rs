use crate::ast::{BinaryOp, Expr, ExprKind, Literal};

/// 运算符优先级，从松到紧
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    Lowest,
    Assignment,
    Conditional,
    Nullish,
    LogicalOr,
    LogicalAnd,
    Equality,
    Relational,
    Additive,
    Multiplicative,
    Exponent,
    Unary,
    Postfix,
    Call,
    Primary,
}

impl Precedence {
    /// 紧一级的优先级 (左结合运算的右操作数)
    pub fn next(self) -> Self {
        match self {
            Precedence::Lowest => Precedence::Assignment,
            Precedence::Assignment => Precedence::Conditional,
            Precedence::Conditional => Precedence::Nullish,
            Precedence::Nullish => Precedence::LogicalOr,
            Precedence::LogicalOr => Precedence::LogicalAnd,
            Precedence::LogicalAnd => Precedence::Equality,
            Precedence::Equality => Precedence::Relational,
            Precedence::Relational => Precedence::Additive,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Multiplicative => Precedence::Exponent,
            Precedence::Exponent => Precedence::Unary,
            Precedence::Unary => Precedence::Postfix,
            Precedence::Postfix => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

impl BinaryOp {
    pub fn precedence(self) -> Precedence {
        match self {
            BinaryOp::Nullish => Precedence::Nullish,
            BinaryOp::Or => Precedence::LogicalOr,
            BinaryOp::And => Precedence::LogicalAnd,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::StrictEq | BinaryOp::StrictNotEq => {
                Precedence::Equality
            }
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Leq | BinaryOp::Geq => Precedence::Relational,
            BinaryOp::Add | BinaryOp::Sub => Precedence::Additive,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => Precedence::Multiplicative,
            BinaryOp::Pow => Precedence::Exponent,
        }
    }
}

impl Expr {
    pub fn precedence(&self) -> Precedence {
        match &self.kind {
            ExprKind::Literal(Literal::Number(n)) if n.is_sign_negative() && *n != 0.0 => {
                Precedence::Unary
            }
            ExprKind::Literal(_) | ExprKind::Ident(_) | ExprKind::Array(_) | ExprKind::Object(_) => {
                Precedence::Primary
            }
            ExprKind::Function(func) => {
                if func.is_arrow {
                    Precedence::Assignment
                } else {
                    Precedence::Primary
                }
            }
            ExprKind::Unary { .. } => Precedence::Unary,
            ExprKind::Update { prefix, .. } => {
                if *prefix {
                    Precedence::Unary
                } else {
                    Precedence::Postfix
                }
            }
            ExprKind::Binary { op, .. } => op.precedence(),
            ExprKind::Assign { .. } => Precedence::Assignment,
            ExprKind::Conditional { .. } => Precedence::Conditional,
            ExprKind::Member { .. } | ExprKind::Call { .. } | ExprKind::New { .. } => {
                Precedence::Call
            }
        }
    }
}
