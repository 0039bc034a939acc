use std::fmt;

#[derive(Debug, PartialEq)]
pub enum ConfigProtectedError {
    InvalidPattern(String),
    MissingPayloadGroup(String),
    InvalidArguments(String),
    EncryptionFailed,
    DecryptionFailed,
    CiphertextTooShort,
    InvalidEncoding(String),
    InvalidKeyLength(usize),
    InvalidUtf8(String),
    IoError(String),
}

impl fmt::Display for ConfigProtectedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern(e) => write!(f, "Invalid token pattern: {}", e),
            Self::MissingPayloadGroup(g) => {
                write!(f, "Token pattern lacks the payload capture group '{}'", g)
            }
            Self::InvalidArguments(e) => write!(f, "Invalid arguments: {}", e),
            Self::EncryptionFailed => write!(f, "Encryption failed"),
            Self::DecryptionFailed => write!(f, "Decryption failed"),
            Self::CiphertextTooShort => write!(f, "Ciphertext too short"),
            Self::InvalidEncoding(e) => write!(f, "Invalid encoding: {}", e),
            Self::InvalidKeyLength(l) => write!(f, "Invalid key length: {} (expected 32)", l),
            Self::InvalidUtf8(e) => write!(f, "Invalid UTF-8: {}", e),
            Self::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ConfigProtectedError {}
