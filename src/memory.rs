use crate::error::ConfigProtectedError;
use crate::provider::{ConfigProvider, ConfigSource};
use std::collections::HashMap;

/// In-memory configuration source. The bundled backend; file and environment
/// backends are external collaborators implementing the same traits.
pub struct MemorySource {
    entries: Vec<(String, String)>,
}

impl MemorySource {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ConfigSource for MemorySource {
    fn build(&self) -> Result<Box<dyn ConfigProvider>, ConfigProtectedError> {
        Ok(Box::new(MemoryProvider::new(self.entries.clone())))
    }
}

pub struct MemoryProvider {
    entries: Vec<(String, String)>,
    data: HashMap<String, String>,
}

impl MemoryProvider {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self {
            entries,
            data: HashMap::new(),
        }
    }
}

impl ConfigProvider for MemoryProvider {
    fn load(&mut self) -> Result<(), ConfigProtectedError> {
        self.data = self.entries.iter().cloned().collect();
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }
}
