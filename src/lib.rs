pub mod builder;
pub mod crypto;
pub mod error;
pub mod memory;
pub mod policy;
pub mod provider;
pub mod registry;
pub mod seal;
pub mod token_pattern;

pub use builder::ProtectedConfigBuilder;
pub use crypto::{AesGcmProtector, generate_key};
pub use error::ConfigProtectedError;
pub use memory::{MemoryProvider, MemorySource};
pub use policy::{BoundDecryptor, DecryptorSource, ProtectionPolicy, Purpose, Unprotect};
pub use provider::{ConfigProvider, ConfigRoot, ConfigSource, DecoratingProvider};
pub use registry::{PolicyRegistry, SourceId};
pub use seal::{seal_file, seal_file_in_place, seal_text, unseal_file, unseal_text};
pub use token_pattern::{DEFAULT_TOKEN_PATTERN, TokenPattern};
