//! Binding-Time Classifier
//!
//! 判断一个表达式能否在生成期完全求值：收集它引用的名字，
//! 去掉原样插入的名字后，集合非空并且全部带 `$` 前缀。

use crate::registry::{is_stage_name, Registry};
use indexmap::IndexSet;
use stagecraft_syntax::ast::visitor::{walk_expr, Visitor};
use stagecraft_syntax::ast::{Expr, ExprKind, Pattern};

/// 表达式引用的名字
///
/// 访问链只贡献最左侧的标识符 (不是标识符时什么也不贡献)，
/// 嵌套函数的参数与绑定模式贡献它们的名字。
#[derive(Debug, Default)]
pub struct References {
    names: IndexSet<String>,
}

impl References {
    pub fn collect(expr: &Expr) -> IndexSet<String> {
        let mut refs = Self::default();
        refs.visit_expr(expr);
        refs.names
    }
}

impl Visitor for References {
    fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(name) => {
                self.names.insert(name.clone());
            }
            ExprKind::Member { .. } => {
                if let Some(name) = expr.chain_root().as_ident() {
                    self.names.insert(name.to_string());
                }
            }
            _ => walk_expr(self, expr),
        }
    }

    fn visit_pattern(&mut self, pattern: &Pattern) {
        self.names.extend(pattern.bound_names());
    }
}

pub fn is_decidable(expr: &Expr, registry: &Registry) -> bool {
    let names = References::collect(expr);
    let mut remaining = names.iter().filter(|name| !registry.is_raw(name)).peekable();
    remaining.peek().is_some() && remaining.all(|name| is_stage_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GeneratorOptions;
    use stagecraft_syntax::ast::{Param, Stmt};
    use stagecraft_syntax::parse_program;

    fn expr(source: &str) -> Expr {
        match parse_program(source).unwrap().body.into_iter().next() {
            Some(Stmt::Expr { expr, .. }) => expr,
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    fn registry(replace: &[&str]) -> Registry {
        let params: Vec<Param> = ["$a", "$b", "$r"]
            .iter()
            .map(|n| Param::simple(*n, 0..2))
            .collect();
        let options = replace
            .iter()
            .fold(GeneratorOptions::new(), |options, name| options.replace(*name));
        Registry::new(&params, &options).unwrap()
    }

    #[test]
    fn test_collect_chain_root_only() {
        let names = References::collect(&expr("$a.b[c].d + e;"));
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["$a", "e"]);

        let names = References::collect(&expr("f(x).y;"));
        assert!(names.is_empty());
    }

    #[test]
    fn test_collect_function_patterns_and_keys() {
        let names = References::collect(&expr("(({ k: v }, w) => $a + v);"));
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["v", "w", "$a"]);

        // 非计算的对象键不是引用
        let names = References::collect(&expr("({ key: $a, [$b]: 1 });"));
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["$a", "$b"]);
    }

    #[test]
    fn test_decidable() {
        let registry = registry(&[]);
        assert!(is_decidable(&expr("$a === 0;"), &registry));
        assert!(is_decidable(&expr("$a.length > $b;"), &registry));
        assert!(!is_decidable(&expr("$a === x;"), &registry));
        // 没有任何名字的表达式不分段
        assert!(!is_decidable(&expr("1 + 2;"), &registry));
        // 只看根：计算键里的运行期名字不影响判定
        assert!(is_decidable(&expr("$a[plain];"), &registry));
    }

    #[test]
    fn test_raw_names_are_discarded() {
        let registry = registry(&["$r"]);
        assert!(!is_decidable(&expr("$r.x;"), &registry));
        assert!(is_decidable(&expr("$r.x + $a;"), &registry));
        assert!(!is_decidable(&expr("$r.x + y;"), &registry));
    }
}
