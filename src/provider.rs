use crate::error::ConfigProtectedError;
use crate::policy::BoundDecryptor;
use crate::token_pattern::TokenPattern;
use std::collections::HashMap;
use std::fmt;

/// A declarative description of where configuration comes from. Building
/// produces the loadable provider.
pub trait ConfigSource {
    fn build(&self) -> Result<Box<dyn ConfigProvider>, ConfigProtectedError>;
}

/// A built configuration provider: loadable, readable as string key/value
/// pairs.
pub trait ConfigProvider {
    fn load(&mut self) -> Result<(), ConfigProtectedError>;
    fn get(&self, key: &str) -> Option<String>;
    fn keys(&self) -> Vec<String>;
}

/// Wraps one built provider and rewrites encrypted token spans in its string
/// values at load time. Reads serve already-decrypted plaintext; nothing is
/// decrypted lazily on access.
pub struct DecoratingProvider {
    inner: Box<dyn ConfigProvider>,
    pattern: TokenPattern,
    decryptor: BoundDecryptor,
    decoded: HashMap<String, String>,
}

impl DecoratingProvider {
    pub fn new(
        inner: Box<dyn ConfigProvider>,
        pattern: TokenPattern,
        decryptor: BoundDecryptor,
    ) -> Self {
        Self {
            inner,
            pattern,
            decryptor,
            decoded: HashMap::new(),
        }
    }
}

impl ConfigProvider for DecoratingProvider {
    fn load(&mut self) -> Result<(), ConfigProtectedError> {
        self.inner.load()?;

        // Decode into a fresh map and commit it whole: a decryption failure
        // must not leave a half-substituted snapshot behind.
        let decryptor = &self.decryptor;
        let mut decoded = HashMap::new();
        for key in self.inner.keys() {
            let value = match self.inner.get(&key) {
                Some(value) => value,
                None => continue,
            };
            let rewritten = if value.is_empty() {
                value
            } else {
                self.pattern
                    .replace_all(&value, |qualifier, payload| {
                        decryptor.unprotect(qualifier, payload)
                    })?
            };
            decoded.insert(key, rewritten);
        }

        self.decoded = decoded;
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.decoded.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.decoded.keys().cloned().collect()
    }
}

/// The assembled configuration snapshot: an ordered provider list where
/// later providers win on key collision.
pub struct ConfigRoot {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl ConfigRoot {
    pub(crate) fn new(providers: Vec<Box<dyn ConfigProvider>>) -> Self {
        Self { providers }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.providers.iter().rev().find_map(|p| p.get(key))
    }

    /// Union of all providers' keys, deduplicated and sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.providers.iter().flat_map(|p| p.keys()).collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Re-runs every provider's load, decrypting decorated ones again.
    pub fn reload(&mut self) -> Result<(), ConfigProtectedError> {
        for provider in &mut self.providers {
            provider.load()?;
        }
        Ok(())
    }

    pub fn providers(&self) -> &[Box<dyn ConfigProvider>] {
        &self.providers
    }
}

impl fmt::Debug for ConfigRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigRoot")
            .field("providers", &self.providers.len())
            .finish()
    }
}
