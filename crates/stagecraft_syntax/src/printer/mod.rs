//! Pretty Printer
//!
//! 把语法树渲染回源码文本。输出紧凑 (不缩进)，只在优先级需要时加括号。
//! `Printer` 的 `print_stmt` / `print_expr` 可以被覆盖，`walk_*` 是默认实现。

mod precedence;

pub use precedence::Precedence;

use crate::ast::*;
use std::convert::Infallible;

pub trait Printer {
    type Error;

    fn write(&mut self, text: &str);

    fn print_stmt(&mut self, stmt: &Stmt) -> Result<(), Self::Error> {
        walk_stmt(self, stmt)
    }

    /// `min`: 所在位置要求的最低优先级，低于它的表达式需要括号
    fn print_expr(&mut self, expr: &Expr, min: Precedence) -> Result<(), Self::Error> {
        walk_expr(self, expr, min)
    }
}

pub fn print_stmts<P: Printer + ?Sized>(p: &mut P, stmts: &[Stmt]) -> Result<(), P::Error> {
    for stmt in stmts {
        p.print_stmt(stmt)?;
    }
    Ok(())
}

pub fn print_block<P: Printer + ?Sized>(p: &mut P, stmts: &[Stmt]) -> Result<(), P::Error> {
    p.write("{");
    print_stmts(p, stmts)?;
    p.write("}");
    Ok(())
}

pub fn walk_stmt<P: Printer + ?Sized>(p: &mut P, stmt: &Stmt) -> Result<(), P::Error> {
    match stmt {
        Stmt::Expr { expr, .. } => {
            // 以 `{` 或 `function` 开头的表达式语句会被误读为块或声明
            if starts_ambiguously(expr) {
                p.write("(");
                p.print_expr(expr, Precedence::Lowest)?;
                p.write(")");
            } else {
                p.print_expr(expr, Precedence::Lowest)?;
            }
            p.write(";");
        }
        Stmt::VarDecl(decl) => {
            print_var_decl(p, decl)?;
            p.write(";");
        }
        Stmt::Function { func, .. } => print_function(p, func)?,
        Stmt::Return { value, .. } => {
            p.write("return");
            if let Some(value) = value {
                p.write(" ");
                p.print_expr(value, Precedence::Lowest)?;
            }
            p.write(";");
        }
        Stmt::If {
            test,
            consequent,
            alternate,
            ..
        } => {
            p.write("if (");
            p.print_expr(test, Precedence::Lowest)?;
            p.write(") ");
            match alternate {
                Some(alternate) => {
                    if ends_with_open_if(consequent) {
                        print_block(p, std::slice::from_ref(consequent.as_ref()))?;
                    } else {
                        p.print_stmt(consequent)?;
                    }
                    p.write(" else ");
                    p.print_stmt(alternate)?;
                }
                None => p.print_stmt(consequent)?,
            }
        }
        Stmt::For {
            init,
            test,
            update,
            body,
            ..
        } => {
            p.write("for (");
            match init {
                Some(ForInit::VarDecl(decl)) => print_var_decl(p, decl)?,
                Some(ForInit::Expr(expr)) => p.print_expr(expr, Precedence::Lowest)?,
                None => {}
            }
            p.write(";");
            if let Some(test) = test {
                p.write(" ");
                p.print_expr(test, Precedence::Lowest)?;
            }
            p.write(";");
            if let Some(update) = update {
                p.write(" ");
                p.print_expr(update, Precedence::Lowest)?;
            }
            p.write(") ");
            p.print_stmt(body)?;
        }
        Stmt::ForEach {
            kind,
            binding,
            source,
            body,
            ..
        } => {
            p.write("for (");
            print_for_binding(p, binding)?;
            p.write(" ");
            p.write(kind.keyword());
            p.write(" ");
            p.print_expr(source, Precedence::Assignment)?;
            p.write(") ");
            p.print_stmt(body)?;
        }
        Stmt::While { test, body, .. } => {
            p.write("while (");
            p.print_expr(test, Precedence::Lowest)?;
            p.write(") ");
            p.print_stmt(body)?;
        }
        Stmt::Break { label, .. } => print_jump(p, "break", label.as_deref()),
        Stmt::Continue { label, .. } => print_jump(p, "continue", label.as_deref()),
        Stmt::Labeled { label, body, .. } => {
            p.write(label);
            p.write(": ");
            p.print_stmt(body)?;
        }
        Stmt::Throw { value, .. } => {
            p.write("throw ");
            p.print_expr(value, Precedence::Lowest)?;
            p.write(";");
        }
        Stmt::Try {
            block,
            handler,
            finalizer,
            ..
        } => {
            p.write("try ");
            print_block(p, block)?;
            if let Some(handler) = handler {
                p.write(" catch ");
                if let Some(param) = &handler.param {
                    p.write("(");
                    print_pattern(p, param);
                    p.write(") ");
                }
                print_block(p, &handler.body)?;
            }
            if let Some(finalizer) = finalizer {
                p.write(" finally ");
                print_block(p, finalizer)?;
            }
        }
        Stmt::Block { body, .. } => print_block(p, body)?,
        Stmt::Empty { .. } => p.write(";"),
    }
    Ok(())
}

fn print_jump<P: Printer + ?Sized>(p: &mut P, keyword: &str, label: Option<&str>) {
    p.write(keyword);
    if let Some(label) = label {
        p.write(" ");
        p.write(label);
    }
    p.write(";");
}

pub fn print_var_decl<P: Printer + ?Sized>(p: &mut P, decl: &VarDecl) -> Result<(), P::Error> {
    p.write(decl.kind.keyword());
    p.write(" ");
    for (i, declarator) in decl.declarators.iter().enumerate() {
        if i > 0 {
            p.write(", ");
        }
        print_pattern(p, &declarator.pattern);
        if let Some(init) = &declarator.init {
            p.write(" = ");
            p.print_expr(init, Precedence::Assignment)?;
        }
    }
    Ok(())
}

pub fn print_for_binding<P: Printer + ?Sized>(
    p: &mut P,
    binding: &ForBinding,
) -> Result<(), P::Error> {
    if let Some(decl) = binding.decl {
        p.write(decl.keyword());
        p.write(" ");
    }
    print_pattern(p, &binding.pattern);
    Ok(())
}

pub fn print_pattern<P: Printer + ?Sized>(p: &mut P, pattern: &Pattern) {
    match pattern {
        Pattern::Ident(name) => p.write(name),
        Pattern::Array(items) => {
            p.write("[");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    p.write(", ");
                }
                print_pattern(p, item);
            }
            p.write("]");
        }
        Pattern::Object(props) => {
            p.write("{");
            for (i, prop) in props.iter().enumerate() {
                if i > 0 {
                    p.write(", ");
                }
                print_property_name(p, &prop.key);
                p.write(": ");
                print_pattern(p, &prop.value);
            }
            p.write("}");
        }
    }
}

fn print_property_name<P: Printer + ?Sized>(p: &mut P, name: &str) {
    if is_identifier_name(name) {
        p.write(name);
    } else {
        p.write(&quote(name));
    }
}

/// JSON 风格的字符串字面量
pub fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

pub fn print_params<P: Printer + ?Sized>(p: &mut P, params: &[Param]) -> Result<(), P::Error> {
    p.write("(");
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            p.write(", ");
        }
        if param.rest {
            p.write("...");
        }
        print_pattern(p, &param.pattern);
        if let Some(default) = &param.default {
            p.write(" = ");
            p.print_expr(default, Precedence::Assignment)?;
        }
    }
    p.write(")");
    Ok(())
}

pub fn print_function<P: Printer + ?Sized>(p: &mut P, func: &Function) -> Result<(), P::Error> {
    if func.is_arrow {
        print_params(p, &func.params)?;
        p.write(" => ");
        match &func.body {
            FunctionBody::Block(body) => print_block(p, body)?,
            FunctionBody::Expr(body) => {
                if matches!(body.kind, ExprKind::Object(_)) {
                    p.write("(");
                    p.print_expr(body, Precedence::Lowest)?;
                    p.write(")");
                } else {
                    p.print_expr(body, Precedence::Assignment)?;
                }
            }
        }
        return Ok(());
    }

    p.write("function");
    if let Some(name) = &func.name {
        p.write(" ");
        p.write(name);
    }
    print_params(p, &func.params)?;
    p.write(" ");
    match &func.body {
        FunctionBody::Block(body) => print_block(p, body),
        FunctionBody::Expr(body) => {
            p.write("{return ");
            p.print_expr(body, Precedence::Lowest)?;
            p.write(";}");
            Ok(())
        }
    }
}

/// 成员访问的后缀部分: .a / ?.a / [k] / ?.[k]
pub fn print_member_property<P: Printer + ?Sized>(
    p: &mut P,
    property: &MemberProperty,
    optional: bool,
) -> Result<(), P::Error> {
    match property {
        MemberProperty::Named(name) => {
            p.write(if optional { "?." } else { "." });
            p.write(name);
        }
        MemberProperty::Computed(key) => {
            if optional {
                p.write("?.");
            }
            p.write("[");
            p.print_expr(key, Precedence::Lowest)?;
            p.write("]");
        }
    }
    Ok(())
}

pub fn print_args<P: Printer + ?Sized>(p: &mut P, args: &[Expr]) -> Result<(), P::Error> {
    p.write("(");
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            p.write(", ");
        }
        p.print_expr(arg, Precedence::Assignment)?;
    }
    p.write(")");
    Ok(())
}

pub fn walk_expr<P: Printer + ?Sized>(
    p: &mut P,
    expr: &Expr,
    min: Precedence,
) -> Result<(), P::Error> {
    if expr.precedence() < min {
        p.write("(");
        walk_expr_kind(p, expr)?;
        p.write(")");
        Ok(())
    } else {
        walk_expr_kind(p, expr)
    }
}

fn walk_expr_kind<P: Printer + ?Sized>(p: &mut P, expr: &Expr) -> Result<(), P::Error> {
    match &expr.kind {
        ExprKind::Literal(lit) => print_literal(p, lit),
        ExprKind::Ident(name) => p.write(name),
        ExprKind::Array(items) => {
            p.write("[");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    p.write(", ");
                }
                p.print_expr(item, Precedence::Assignment)?;
            }
            p.write("]");
        }
        ExprKind::Object(props) => {
            p.write("{");
            for (i, prop) in props.iter().enumerate() {
                if i > 0 {
                    p.write(", ");
                }
                match &prop.key {
                    PropertyKey::Named(name) => print_property_name(p, name),
                    PropertyKey::Computed(key) => {
                        p.write("[");
                        p.print_expr(key, Precedence::Assignment)?;
                        p.write("]");
                    }
                }
                p.write(": ");
                p.print_expr(&prop.value, Precedence::Assignment)?;
            }
            p.write("}");
        }
        ExprKind::Function(func) => print_function(p, func)?,
        ExprKind::Unary { op, operand } => {
            p.write(op.symbol());
            if same_sign(*op, operand) {
                p.write(" ");
            }
            p.print_expr(operand, Precedence::Unary)?;
        }
        ExprKind::Update { op, prefix, target } => {
            if *prefix {
                p.write(op.symbol());
                p.print_expr(target, Precedence::Unary)?;
            } else {
                p.print_expr(target, Precedence::Call)?;
                p.write(op.symbol());
            }
        }
        ExprKind::Binary { op, left, right } => {
            let prec = op.precedence();
            let (left_min, right_min) = match op {
                BinaryOp::Pow => (Precedence::Postfix, Precedence::Exponent),
                _ => (prec, prec.next()),
            };
            // `??` 不能与未加括号的 && / || 混用
            let guard = |child: &Expr, min: Precedence| {
                if *op == BinaryOp::Nullish && is_logical(child) {
                    Precedence::Primary
                } else {
                    min
                }
            };
            p.print_expr(left, guard(left, left_min))?;
            p.write(" ");
            p.write(op.symbol());
            p.write(" ");
            p.print_expr(right, guard(right, right_min))?;
        }
        ExprKind::Assign { op, target, value } => {
            p.print_expr(target, Precedence::Call)?;
            p.write(" ");
            p.write(op.symbol());
            p.write(" ");
            p.print_expr(value, Precedence::Assignment)?;
        }
        ExprKind::Conditional {
            test,
            consequent,
            alternate,
        } => {
            p.print_expr(test, Precedence::Nullish)?;
            p.write(" ? ");
            p.print_expr(consequent, Precedence::Assignment)?;
            p.write(" : ");
            p.print_expr(alternate, Precedence::Assignment)?;
        }
        ExprKind::Member {
            object,
            property,
            optional,
        } => {
            // 1.toString() 无法解析
            if matches!(object.kind, ExprKind::Literal(Literal::Number(_))) {
                p.write("(");
                p.print_expr(object, Precedence::Lowest)?;
                p.write(")");
            } else {
                p.print_expr(object, Precedence::Call)?;
            }
            print_member_property(p, property, *optional)?;
        }
        ExprKind::Call {
            callee,
            args,
            optional,
        } => {
            p.print_expr(callee, Precedence::Call)?;
            if *optional {
                p.write("?.");
            }
            print_args(p, args)?;
        }
        ExprKind::New { callee, args } => {
            p.write("new ");
            if contains_call(callee) {
                p.write("(");
                p.print_expr(callee, Precedence::Lowest)?;
                p.write(")");
            } else {
                p.print_expr(callee, Precedence::Call)?;
            }
            print_args(p, args)?;
        }
    }
    Ok(())
}

fn print_literal<P: Printer + ?Sized>(p: &mut P, lit: &Literal) {
    match lit {
        Literal::Number(n) => p.write(&format_number(*n)),
        Literal::String(s) => p.write(&quote(s)),
        Literal::Bool(b) => p.write(if *b { "true" } else { "false" }),
        Literal::Null => p.write("null"),
        Literal::Undefined => p.write("undefined"),
    }
}

fn is_logical(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Binary {
            op: BinaryOp::And | BinaryOp::Or,
            ..
        }
    )
}

// `- -x` 与 `--x` 含义不同
fn same_sign(op: UnaryOp, operand: &Expr) -> bool {
    let sign = match op {
        UnaryOp::Neg => '-',
        UnaryOp::Plus => '+',
        _ => return false,
    };
    let operand_sign = match &operand.kind {
        ExprKind::Unary {
            op: UnaryOp::Neg, ..
        } => '-',
        ExprKind::Unary {
            op: UnaryOp::Plus, ..
        } => '+',
        ExprKind::Update {
            op, prefix: true, ..
        } => match op {
            UpdateOp::Increment => '+',
            UpdateOp::Decrement => '-',
        },
        ExprKind::Literal(Literal::Number(n)) if n.is_sign_negative() && *n != 0.0 => '-',
        _ => return false,
    };
    sign == operand_sign
}

fn contains_call(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Call { .. } => true,
        ExprKind::Member { object, .. } => contains_call(object),
        _ => false,
    }
}

/// 语句开头最左侧的表达式
fn leftmost(expr: &Expr) -> &Expr {
    match &expr.kind {
        ExprKind::Binary { left, .. } => leftmost(left),
        ExprKind::Assign { target, .. } => leftmost(target),
        ExprKind::Conditional { test, .. } => leftmost(test),
        ExprKind::Member { object, .. } => leftmost(object),
        ExprKind::Call { callee, .. } => leftmost(callee),
        ExprKind::Update {
            target,
            prefix: false,
            ..
        } => leftmost(target),
        _ => expr,
    }
}

fn starts_ambiguously(expr: &Expr) -> bool {
    match &leftmost(expr).kind {
        ExprKind::Object(_) => true,
        ExprKind::Function(func) => !func.is_arrow,
        _ => false,
    }
}

// if (a) if (b) x; else y; 中 else 会绑定到内层 if
fn ends_with_open_if(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::If {
            alternate: None, ..
        } => true,
        Stmt::If {
            alternate: Some(alternate),
            ..
        } => ends_with_open_if(alternate),
        Stmt::For { body, .. }
        | Stmt::ForEach { body, .. }
        | Stmt::While { body, .. }
        | Stmt::Labeled { body, .. } => ends_with_open_if(body),
        _ => false,
    }
}

/// 原样输出的打印器
#[derive(Debug, Default)]
pub struct PlainPrinter {
    out: String,
}

impl PlainPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl Printer for PlainPrinter {
    type Error = Infallible;

    fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }
}

fn infallible(result: Result<(), Infallible>) {
    if let Err(never) = result {
        match never {}
    }
}

pub fn print_program(program: &Program) -> String {
    stmts_to_string(&program.body)
}

pub fn stmts_to_string(stmts: &[Stmt]) -> String {
    let mut printer = PlainPrinter::new();
    infallible(print_stmts(&mut printer, stmts));
    printer.finish()
}

pub fn stmt_to_string(stmt: &Stmt) -> String {
    stmts_to_string(std::slice::from_ref(stmt))
}

pub fn expr_to_string(expr: &Expr) -> String {
    let mut printer = PlainPrinter::new();
    infallible(printer.print_expr(expr, Precedence::Lowest));
    printer.finish()
}

pub fn function_to_string(func: &Function) -> String {
    let mut printer = PlainPrinter::new();
    infallible(print_function(&mut printer, func));
    printer.finish()
}

pub fn pattern_to_string(pattern: &Pattern) -> String {
    let mut printer = PlainPrinter::new();
    print_pattern(&mut printer, pattern);
    printer.finish()
}
