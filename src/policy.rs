use crate::error::ConfigProtectedError;
use crate::token_pattern::TokenPattern;
use std::fmt;
use std::sync::Arc;

/// Base purpose string used by the numbered-key convention.
pub const BASE_PURPOSE: &str = "config-protected";

/// The opaque decryption capability. Distinct purposes must not be able to
/// decrypt each other's ciphertext.
pub trait Unprotect {
    fn unprotect(&self, purpose: &str, ciphertext: &str) -> Result<String, ConfigProtectedError>;
}

/// Where the decryption capability comes from: either a ready-made object or
/// a callback that constructs one. The callback is resolved exactly once at
/// policy construction.
pub enum DecryptorSource {
    Capability(Arc<dyn Unprotect>),
    Configure(Box<dyn FnOnce() -> Result<Arc<dyn Unprotect>, ConfigProtectedError>>),
}

impl DecryptorSource {
    fn resolve(self) -> Result<Arc<dyn Unprotect>, ConfigProtectedError> {
        match self {
            Self::Capability(capability) => Ok(capability),
            Self::Configure(configure) => configure(),
        }
    }
}

/// Selects the purpose string a policy's capability is bound to: an explicit
/// purpose, or key number `N` under the `<base>.Key<N>` convention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Purpose {
    Named(String),
    KeyNumber(u32),
}

impl Purpose {
    pub fn derive(&self) -> String {
        match self {
            Self::Named(name) => name.clone(),
            Self::KeyNumber(n) => format!("{}.Key{}", BASE_PURPOSE, n),
        }
    }
}

impl Default for Purpose {
    fn default() -> Self {
        Self::KeyNumber(1)
    }
}

/// Joins a token qualifier onto a base purpose: `<base>.<qualifier>`.
pub(crate) fn scoped_purpose(base: &str, qualifier: Option<&str>) -> String {
    match qualifier {
        Some(q) => format!("{}.{}", base, q),
        None => base.to_string(),
    }
}

/// An `Unprotect` capability bound to a derived purpose string. A token's
/// qualifier further scopes the purpose: `<bound>.<qualifier>`.
#[derive(Clone)]
pub struct BoundDecryptor {
    capability: Arc<dyn Unprotect>,
    purpose: String,
}

impl BoundDecryptor {
    pub fn new(capability: Arc<dyn Unprotect>, purpose: String) -> Self {
        Self { capability, purpose }
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn unprotect(
        &self,
        qualifier: Option<&str>,
        ciphertext: &str,
    ) -> Result<String, ConfigProtectedError> {
        let purpose = scoped_purpose(&self.purpose, qualifier);
        self.capability.unprotect(&purpose, ciphertext)
    }
}

impl fmt::Debug for BoundDecryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundDecryptor")
            .field("purpose", &self.purpose)
            .finish_non_exhaustive()
    }
}

/// An immutable pairing of a token pattern with a purpose-bound decryptor.
/// Either field may be absent; merging fills absent fields from the global
/// policy, field by field.
#[derive(Clone, Debug)]
pub struct ProtectionPolicy {
    pattern: Option<TokenPattern>,
    decryptor: Option<BoundDecryptor>,
}

impl ProtectionPolicy {
    /// Direct field injection; used by `merge`.
    pub fn new(pattern: Option<TokenPattern>, decryptor: Option<BoundDecryptor>) -> Self {
        Self { pattern, decryptor }
    }

    /// Builds a policy from configuration arguments. At least one of
    /// `pattern` / `source` must be present. An absent pattern is NOT
    /// defaulted here, so an override without one inherits the global's
    /// pattern through `merge`.
    pub fn configure(
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
            Some(p) => Some(TokenPattern::new(p)?),
            None => None,
        };
        let decryptor = match source {
            Some(source) => Some(BoundDecryptor::new(source.resolve()?, purpose.derive())),
            None => None,
        };

        Ok(Self { pattern, decryptor })
    }

    /// Holds iff both the pattern and the decryption capability are present.
    pub fn is_valid(&self) -> bool {
        self.pattern.is_some() && self.decryptor.is_some()
    }

    pub fn pattern(&self) -> Option<&TokenPattern> {
        self.pattern.as_ref()
    }

    pub fn decryptor(&self) -> Option<&BoundDecryptor> {
        self.decryptor.as_ref()
    }

    /// `Some((pattern, decryptor))` iff the policy is valid.
    pub fn into_parts(self) -> Option<(TokenPattern, BoundDecryptor)> {
        match (self.pattern, self.decryptor) {
            (Some(pattern), Some(decryptor)) => Some((pattern, decryptor)),
            _ => None,
        }
    }

    /// Field-wise merge: the local policy's non-absent fields win over the
    /// global's, never whole-object replacement. Operands are not mutated.
    pub fn merge(global: Option<&Self>, local: Option<&Self>) -> Option<Self> {
        match (global, local) {
            (None, None) => None,
            (Some(g), None) => Some(g.clone()),
            (None, Some(l)) => Some(l.clone()),
            (Some(g), Some(l)) => Some(Self {
                pattern: l.pattern.clone().or_else(|| g.pattern.clone()),
                decryptor: l.decryptor.clone().or_else(|| g.decryptor.clone()),
            }),
        }
    }
}
