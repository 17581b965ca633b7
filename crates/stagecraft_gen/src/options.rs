//! Generator Options
//!
//! ```rust
//! use stagecraft_gen::GeneratorOptions;
//!
//! let options = GeneratorOptions::new().inline("$n").replace("$target");
//! assert!(!options.skip_build);
//! ```

/// 哪些分段名字在引用处直接展开成字面量
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlinePolicy {
    /// 所有分段参数，以及分段循环引入的绑定
    All,
    /// 指定的参数
    Names(Vec<String>),
}

impl Default for InlinePolicy {
    fn default() -> Self {
        InlinePolicy::Names(Vec::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub inline: InlinePolicy,
    /// 值是原样插入文本的参数 (隐含 inline)
    pub replace: Vec<String>,
    /// 构造时不编译，第一次 build 时再编译
    pub skip_build: bool,
}

impl GeneratorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inline_all(mut self) -> Self {
        self.inline = InlinePolicy::All;
        self
    }

    /// 追加一个内联参数 (对 `All` 无效果)
    pub fn inline(mut self, name: impl Into<String>) -> Self {
        if let InlinePolicy::Names(names) = &mut self.inline {
            names.push(name.into());
        }
        self
    }

    pub fn replace(mut self, name: impl Into<String>) -> Self {
        self.replace.push(name.into());
        self
    }

    pub fn skip_build(mut self) -> Self {
        self.skip_build = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let options = GeneratorOptions::new().inline("$a").inline("$b").replace("$c");
        assert_eq!(
            options.inline,
            InlinePolicy::Names(vec!["$a".to_string(), "$b".to_string()])
        );
        assert_eq!(options.replace, vec!["$c".to_string()]);

        let options = GeneratorOptions::new().inline_all().inline("$a").skip_build();
        assert_eq!(options.inline, InlinePolicy::All);
        assert!(options.skip_build);
    }
}
