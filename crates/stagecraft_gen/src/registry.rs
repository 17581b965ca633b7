//! Variable Registry
//!
//! 三个有序集合：`staged` ⊇ `inlined` ⊇ `raw`。
//! 只有分段循环的绑定会在改写期间临时进入 `staged`，
//! 通过 `bind` 返回的 [`BindingScope`] 精确撤销。

use crate::error::{StagingError, StagingResult};
use crate::options::{GeneratorOptions, InlinePolicy};
use indexmap::IndexSet;
use stagecraft_syntax::ast::Param;
use stagecraft_syntax::printer::pattern_to_string;

/// 分段名字的前缀
pub const STAGE_PREFIX: char = '$';

pub fn is_stage_name(name: &str) -> bool {
    name.starts_with(STAGE_PREFIX)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    staged: IndexSet<String>,
    inlined: IndexSet<String>,
    raw: IndexSet<String>,
    /// 循环绑定是否也内联
    inline_binders: bool,
}

/// 一次 `bind` 实际新增的名字
#[must_use = "a binding scope must be released with `Registry::unbind`"]
#[derive(Debug, Default)]
pub struct BindingScope {
    staged: Vec<String>,
    inlined: Vec<String>,
}

impl Registry {
    /// 从参数列表和选项建立集合
    pub fn new(params: &[Param], options: &GeneratorOptions) -> StagingResult<Self> {
        let mut staged = IndexSet::new();
        for param in params {
            let name = param.simple_name().ok_or_else(|| StagingError::UnsupportedParameter {
                param: pattern_to_string(&param.pattern),
                span: param.span.clone(),
            })?;
            if is_stage_name(name) {
                staged.insert(name.to_string());
            }
        }

        let declared = |name: &String| {
            if staged.contains(name) {
                Ok(name.clone())
            } else {
                Err(StagingError::UndeclaredOption { name: name.clone() })
            }
        };

        let raw = options
            .replace
            .iter()
            .map(declared)
            .collect::<StagingResult<IndexSet<_>>>()?;
        let mut inlined = match &options.inline {
            InlinePolicy::All => staged.clone(),
            InlinePolicy::Names(names) => names
                .iter()
                .map(declared)
                .collect::<StagingResult<IndexSet<_>>>()?,
        };
        inlined.extend(raw.iter().cloned());

        Ok(Self {
            staged,
            inlined,
            raw,
            inline_binders: options.inline == InlinePolicy::All,
        })
    }

    pub fn is_staged(&self, name: &str) -> bool {
        self.staged.contains(name)
    }

    pub fn is_inlined(&self, name: &str) -> bool {
        self.inlined.contains(name)
    }

    pub fn is_raw(&self, name: &str) -> bool {
        self.raw.contains(name)
    }

    pub fn staged(&self) -> impl Iterator<Item = &str> {
        self.staged.iter().map(String::as_str)
    }

    /// 需要在前导部分声明的名字：分段但不内联
    pub fn declared(&self) -> impl Iterator<Item = &str> {
        self.staged
            .iter()
            .filter(|name| !self.inlined.contains(*name))
            .map(String::as_str)
    }

    pub fn bind(&mut self, names: &[String]) -> BindingScope {
        let mut scope = BindingScope::default();
        for name in names {
            if self.staged.insert(name.clone()) {
                scope.staged.push(name.clone());
            }
            if self.inline_binders && self.inlined.insert(name.clone()) {
                scope.inlined.push(name.clone());
            }
        }
        scope
    }

    pub fn unbind(&mut self, scope: BindingScope) {
        for name in &scope.inlined {
            self.inlined.shift_remove(name);
        }
        for name in &scope.staged {
            self.staged.shift_remove(name);
        }
    }

    /// 集合并：self 的名字在前
    pub fn union(&self, other: &Registry) -> Registry {
        let merge = |a: &IndexSet<String>, b: &IndexSet<String>| {
            a.iter().chain(b.iter()).cloned().collect::<IndexSet<_>>()
        };
        Registry {
            staged: merge(&self.staged, &other.staged),
            inlined: merge(&self.inlined, &other.inlined),
            raw: merge(&self.raw, &other.raw),
            inline_binders: self.inline_binders || other.inline_binders,
        }
    }
}
