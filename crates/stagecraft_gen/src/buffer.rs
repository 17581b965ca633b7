//! Output Buffer
//!
//! 改写过程按顺序记录片段：字面文本或生成期指令。
//! `finish` 把相邻的字面文本合并成一条 `Literal`。

use crate::program::Instruction;

#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Static(String),
    Dynamic(Instruction),
}

#[derive(Debug, Default)]
pub struct OutputBuffer {
    fragments: Vec<Fragment>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_static(&mut self, text: &str) {
        if !text.is_empty() {
            self.fragments.push(Fragment::Static(text.to_string()));
        }
    }

    pub fn push_dynamic(&mut self, instr: Instruction) {
        self.fragments.push(Fragment::Dynamic(instr));
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn finish(self) -> Vec<Instruction> {
        let mut instructions = Vec::new();
        let mut run = String::new();
        for fragment in self.fragments {
            match fragment {
                Fragment::Static(text) => run.push_str(&text),
                Fragment::Dynamic(instr) => {
                    if !run.is_empty() {
                        instructions.push(Instruction::Literal(std::mem::take(&mut run)));
                    }
                    instructions.push(instr);
                }
            }
        }
        if !run.is_empty() {
            instructions.push(Instruction::Literal(run));
        }
        instructions
    }
}
