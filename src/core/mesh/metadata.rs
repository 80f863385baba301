use std::collections::HashMap;

/// String key-value pairs attached to a mesh or a scene.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    entries: HashMap<String, String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn add_entry(&mut self, key: String, value: String) {
        self.entries.insert(key, value);
    }

    pub fn get_entry(&self, key: &str) -> Option<&String> {
        self.entries.get(key)
    }

    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }
}
