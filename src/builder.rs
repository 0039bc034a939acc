use crate::error::ConfigProtectedError;
use crate::policy::{DecryptorSource, ProtectionPolicy, Purpose};
use crate::provider::{ConfigProvider, ConfigRoot, ConfigSource, DecoratingProvider};
use crate::registry::{PolicyRegistry, SourceId};
use crate::token_pattern::DEFAULT_TOKEN_PATTERN;
use std::fmt;

/// Public entry point: collects configuration sources, a global protection
/// policy and per-source overrides, then builds the decorated snapshot.
pub struct ProtectedConfigBuilder {
    sources: Vec<(SourceId, Box<dyn ConfigSource>)>,
    registry: PolicyRegistry,
    next_id: u64,
}

impl ProtectedConfigBuilder {
    /// Seeds the builder's global policy. At least one of `pattern` /
    /// `source` must be supplied. A capability without a pattern gets the
    /// default token pattern; a pattern without a capability yields an
    /// invalid global policy, so providers pass through unwrapped unless an
    /// override contributes a decryptor.
    pub fn new(
        pattern: Option<&str>,
        source: Option<DecryptorSource>,
        purpose: Purpose,
    ) -> Result<Self, ConfigProtectedError> {
        if pattern.is_none() && source.is_none() {
            return Err(ConfigProtectedError::InvalidArguments(
                "either a token pattern or a decryption capability is required".to_string(),
            ));
        }
        let pattern = match pattern {
            Some(p) => p,
            None => DEFAULT_TOKEN_PATTERN,
        };
        let global = ProtectionPolicy::configure(Some(pattern), source, purpose)?;

        Ok(Self {
            sources: Vec::new(),
            registry: PolicyRegistry::new(global),
            next_id: 0,
        })
    }

    fn alloc(&mut self) -> SourceId {
        self.next_id += 1;
        SourceId(self.next_id)
    }

    /// Appends a source and returns its handle.
    pub fn add(&mut self, source: Box<dyn ConfigSource>) -> SourceId {
        let id = self.alloc();
        self.sources.push((id, source));
        id
    }

    /// Registers an override policy against the most recently added source.
    pub fn with_override(
        &mut self,
        pattern: Option<&str>,
        source: Option<DecryptorSource>,
        purpose: Purpose,
    ) -> Result<&mut Self, ConfigProtectedError> {
        let tail = match self.sources.last() {
            Some((id, _)) => *id,
            None => {
                return Err(ConfigProtectedError::InvalidArguments(
                    "cannot register an override before any source has been added".to_string(),
                ));
            }
        };
        let policy = ProtectionPolicy::configure(pattern, source, purpose)?;
        self.registry.set_override(tail, policy);
        Ok(self)
    }

    /// Builds every source in order, wraps each provider whose effective
    /// policy is valid, loads all providers and assembles the snapshot.
    /// Each call re-builds every underlying source.
    pub fn build(&mut self) -> Result<ConfigRoot, ConfigProtectedError> {
        let mut providers: Vec<Box<dyn ConfigProvider>> = Vec::with_capacity(self.sources.len());

        for index in 0..self.sources.len() {
            let provider = self.sources[index].1.build()?;

            // Two-phase registration: the override recorded against the
            // source handle moves to the provider handle now that it exists.
            // The stored handle is updated so a later build() re-keys again.
            let provider_id = self.alloc();
            let source_id = self.sources[index].0;
            self.registry.rekey(source_id, provider_id);
            self.sources[index].0 = provider_id;

            let effective = self.registry.resolve(provider_id);
            let mut provider = match effective.into_parts() {
                Some((pattern, decryptor)) => {
                    Box::new(DecoratingProvider::new(provider, pattern, decryptor))
                        as Box<dyn ConfigProvider>
                }
                None => provider,
            };
            provider.load()?;
            providers.push(provider);
        }

        Ok(ConfigRoot::new(providers))
    }
}

impl fmt::Debug for ProtectedConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtectedConfigBuilder")
            .field("sources", &self.sources.len())
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}
