use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::tool::Tool;

/// Tools known to the configuration, in registration order. The bridge
/// exposes endpoints in exactly this order, so it must stay deterministic.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool. A tool with the same name replaces the existing
    /// entry in place, keeping its position in the listing.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        match self.by_name.entry(name) {
            Entry::Occupied(slot) => self.tools[*slot.get()] = tool,
            Entry::Vacant(slot) => {
                slot.insert(self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.by_name.get(name).map(|&idx| self.tools[idx].clone())
    }

    pub fn all(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
