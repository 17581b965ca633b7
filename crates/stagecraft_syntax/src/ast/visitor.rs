//! 只读遍历
//!
//! 默认方法调用 `walk_*` 完成子节点遍历；实现者只覆盖关心的节点。

use super::*;

pub trait Visitor {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt)
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr)
    }

    fn visit_pattern(&mut self, pattern: &Pattern) {
        walk_pattern(self, pattern)
    }

    fn visit_function(&mut self, func: &Function) {
        walk_function(self, func)
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(v: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Expr { expr, .. } => v.visit_expr(expr),
        Stmt::VarDecl(decl) => walk_var_decl(v, decl),
        Stmt::Function { func, .. } => v.visit_function(func),
        Stmt::Return { value, .. } => {
            if let Some(value) = value {
                v.visit_expr(value);
            }
        }
        Stmt::If {
            test,
            consequent,
            alternate,
            ..
        } => {
            v.visit_expr(test);
            v.visit_stmt(consequent);
            if let Some(alternate) = alternate {
                v.visit_stmt(alternate);
            }
        }
        Stmt::For {
            init,
            test,
            update,
            body,
            ..
        } => {
            match init {
                Some(ForInit::VarDecl(decl)) => walk_var_decl(v, decl),
                Some(ForInit::Expr(expr)) => v.visit_expr(expr),
                None => {}
            }
            if let Some(test) = test {
                v.visit_expr(test);
            }
            if let Some(update) = update {
                v.visit_expr(update);
            }
            v.visit_stmt(body);
        }
        Stmt::ForEach {
            binding,
            source,
            body,
            ..
        } => {
            v.visit_pattern(&binding.pattern);
            v.visit_expr(source);
            v.visit_stmt(body);
        }
        Stmt::While { test, body, .. } => {
            v.visit_expr(test);
            v.visit_stmt(body);
        }
        Stmt::Break { .. } | Stmt::Continue { .. } | Stmt::Empty { .. } => {}
        Stmt::Labeled { body, .. } => v.visit_stmt(body),
        Stmt::Throw { value, .. } => v.visit_expr(value),
        Stmt::Try {
            block,
            handler,
            finalizer,
            ..
        } => {
            block.iter().for_each(|s| v.visit_stmt(s));
            if let Some(handler) = handler {
                if let Some(param) = &handler.param {
                    v.visit_pattern(param);
                }
                handler.body.iter().for_each(|s| v.visit_stmt(s));
            }
            if let Some(finalizer) = finalizer {
                finalizer.iter().for_each(|s| v.visit_stmt(s));
            }
        }
        Stmt::Block { body, .. } => body.iter().for_each(|s| v.visit_stmt(s)),
    }
}

fn walk_var_decl<V: Visitor + ?Sized>(v: &mut V, decl: &VarDecl) {
    for declarator in &decl.declarators {
        v.visit_pattern(&declarator.pattern);
        if let Some(init) = &declarator.init {
            v.visit_expr(init);
        }
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(v: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Ident(_) => {}
        ExprKind::Array(items) => items.iter().for_each(|e| v.visit_expr(e)),
        ExprKind::Object(props) => {
            for prop in props {
                if let PropertyKey::Computed(key) = &prop.key {
                    v.visit_expr(key);
                }
                v.visit_expr(&prop.value);
            }
        }
        ExprKind::Function(func) => v.visit_function(func),
        ExprKind::Unary { operand, .. } => v.visit_expr(operand),
        ExprKind::Update { target, .. } => v.visit_expr(target),
        ExprKind::Binary { left, right, .. } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        ExprKind::Assign { target, value, .. } => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        ExprKind::Conditional {
            test,
            consequent,
            alternate,
        } => {
            v.visit_expr(test);
            v.visit_expr(consequent);
            v.visit_expr(alternate);
        }
        ExprKind::Member {
            object, property, ..
        } => {
            v.visit_expr(object);
            if let MemberProperty::Computed(key) = property {
                v.visit_expr(key);
            }
        }
        ExprKind::Call { callee, args, .. } | ExprKind::New { callee, args } => {
            v.visit_expr(callee);
            args.iter().for_each(|e| v.visit_expr(e));
        }
    }
}

pub fn walk_pattern<V: Visitor + ?Sized>(v: &mut V, pattern: &Pattern) {
    match pattern {
        Pattern::Ident(_) => {}
        Pattern::Array(items) => items.iter().for_each(|p| v.visit_pattern(p)),
        Pattern::Object(props) => props.iter().for_each(|p| v.visit_pattern(&p.value)),
    }
}

pub fn walk_function<V: Visitor + ?Sized>(v: &mut V, func: &Function) {
    for param in &func.params {
        v.visit_pattern(&param.pattern);
        if let Some(default) = &param.default {
            v.visit_expr(default);
        }
    }
    match &func.body {
        FunctionBody::Block(body) => body.iter().for_each(|s| v.visit_stmt(s)),
        FunctionBody::Expr(expr) => v.visit_expr(expr),
    }
}
