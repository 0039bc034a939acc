use crate::policy::ProtectionPolicy;
use std::collections::HashMap;

/// Opaque handle identifying a configuration source before build and its
/// provider after build. Serial ids never collide, unlike content hashes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceId(pub(crate) u64);

/// Associates the builder's global policy with per-source overrides. Lives
/// exactly as long as the builder's configure-then-build lifecycle.
pub struct PolicyRegistry {
    global: ProtectionPolicy,
    overrides: HashMap<SourceId, ProtectionPolicy>,
}

impl PolicyRegistry {
    pub fn new(global: ProtectionPolicy) -> Self {
        Self {
            global,
            overrides: HashMap::new(),
        }
    }

    pub fn global(&self) -> &ProtectionPolicy {
        &self.global
    }

    /// Records or replaces the override for a source handle.
    pub fn set_override(&mut self, id: SourceId, policy: ProtectionPolicy) {
        self.overrides.insert(id, policy);
    }

    /// Moves an override entry from a source handle to the handle of the
    /// provider it built into. No-op when no entry exists.
    pub fn rekey(&mut self, old: SourceId, new: SourceId) {
        if let Some(policy) = self.overrides.remove(&old) {
            self.overrides.insert(new, policy);
        }
    }

    /// The effective policy for a provider: its override merged over the
    /// global, field by field.
    pub fn resolve(&self, id: SourceId) -> ProtectionPolicy {
        match ProtectionPolicy::merge(Some(&self.global), self.overrides.get(&id)) {
            Some(policy) => policy,
            None => self.global.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{DecryptorSource, Purpose, Unprotect};
    use crate::token_pattern::DEFAULT_TOKEN_PATTERN;
    use crate::ConfigProtectedError;
    use std::sync::Arc;

    struct FakeUnprotect;

    impl Unprotect for FakeUnprotect {
        fn unprotect(
            &self,
            purpose: &str,
            ciphertext: &str,
        ) -> Result<String, ConfigProtectedError> {
            Ok(format!("{}/{}", purpose, ciphertext))
        }
    }

    fn global_policy() -> ProtectionPolicy {
        ProtectionPolicy::configure(
            Some(DEFAULT_TOKEN_PATTERN),
            Some(DecryptorSource::Capability(Arc::new(FakeUnprotect))),
            Purpose::KeyNumber(1),
        )
        .unwrap()
    }

    fn override_policy(key: u32) -> ProtectionPolicy {
        ProtectionPolicy::configure(
            None,
            Some(DecryptorSource::Capability(Arc::new(FakeUnprotect))),
            Purpose::KeyNumber(key),
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_without_override_returns_global() {
        let registry = PolicyRegistry::new(global_policy());
        let effective = registry.resolve(SourceId(42));
        assert_eq!(effective.decryptor().unwrap().purpose(), "config-protected.Key1");
    }

    #[test]
    fn test_resolve_merges_override_over_global() {
        let mut registry = PolicyRegistry::new(global_policy());
        registry.set_override(SourceId(1), override_policy(9));

        let effective = registry.resolve(SourceId(1));
        assert!(effective.is_valid());
        // Decryptor from the override, pattern inherited from the global.
        assert_eq!(effective.decryptor().unwrap().purpose(), "config-protected.Key9");
        assert_eq!(effective.pattern().unwrap().as_str(), DEFAULT_TOKEN_PATTERN);
    }

    #[test]
    fn test_set_override_replaces() {
        let mut registry = PolicyRegistry::new(global_policy());
        registry.set_override(SourceId(1), override_policy(2));
        registry.set_override(SourceId(1), override_policy(3));

        let effective = registry.resolve(SourceId(1));
        assert_eq!(effective.decryptor().unwrap().purpose(), "config-protected.Key3");
    }

    #[test]
    fn test_rekey_moves_entry() {
        let mut registry = PolicyRegistry::new(global_policy());
        registry.set_override(SourceId(1), override_policy(5));
        registry.rekey(SourceId(1), SourceId(2));

        let moved = registry.resolve(SourceId(2));
        assert_eq!(moved.decryptor().unwrap().purpose(), "config-protected.Key5");

        // The old handle falls back to the global.
        let old = registry.resolve(SourceId(1));
        assert_eq!(old.decryptor().unwrap().purpose(), "config-protected.Key1");
    }

    #[test]
    fn test_rekey_without_entry_is_noop() {
        let mut registry = PolicyRegistry::new(global_policy());
        registry.rekey(SourceId(7), SourceId(8));
        assert!(registry.resolve(SourceId(8)).is_valid());
    }
}
