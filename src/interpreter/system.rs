use std::{cell::RefCell, rc::Rc};

/// Where a running script's output goes.
pub trait SystemContext {
    fn writeln(&mut self, text: &str);
}

pub struct StdioContext;

impl SystemContext for StdioContext {
    fn writeln(&mut self, text: &str) {
        println!("{text}");
    }
}

/// Collects output in memory. Clones share the same buffer, so a copy can be
/// handed to a process and read back afterwards.
#[derive(Debug, Clone, Default)]
pub struct BufferedContext {
    buffer: Rc<RefCell<String>>,
}

impl BufferedContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.buffer.borrow().clone()
    }
}

impl SystemContext for BufferedContext {
    fn writeln(&mut self, text: &str) {
        let mut buffer = self.buffer.borrow_mut();
        buffer.push_str(text);
        buffer.push('\n');
    }
}
