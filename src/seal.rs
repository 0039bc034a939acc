use crate::crypto::AesGcmProtector;
use crate::error::ConfigProtectedError;
use crate::policy::{Unprotect, scoped_purpose};
use crate::token_pattern::{DEFAULT_TOKEN_PATTERN, TokenPattern};
use std::fs;
use std::path::Path;

/// Authoring-side marker: `Encrypt:{<plaintext>}` or
/// `Encrypt:{<qualifier>}:{<plaintext>}`, rewritten to `Protected` tokens.
pub const SEAL_MARKER_PATTERN: &str =
    r"Encrypt(?::\{(?P<purpose>[^{}]+?)\})?:\{(?P<payload>[^{}]+?)\}";

/// Encrypts every `Encrypt:{...}` marker in `input`, replacing it with the
/// matching `Protected:{...}` token. A marker qualifier is carried over into
/// the token and scopes the purpose the same way decryption will.
pub fn seal_text(
    input: &str,
    protector: &AesGcmProtector,
    purpose: &str,
) -> Result<String, ConfigProtectedError> {
    let markers = TokenPattern::new(SEAL_MARKER_PATTERN)?;
    markers.replace_all(input, |qualifier, plaintext| {
        let payload = protector.protect(&scoped_purpose(purpose, qualifier), plaintext)?;
        Ok(match qualifier {
            Some(q) => format!("Protected:{{{}}}:{{{}}}", q, payload),
            None => format!("Protected:{{{}}}", payload),
        })
    })
}

/// Decrypts every `Protected:{...}` token in `input` back to plaintext.
pub fn unseal_text(
    input: &str,
    protector: &AesGcmProtector,
    purpose: &str,
) -> Result<String, ConfigProtectedError> {
    let tokens = TokenPattern::new(DEFAULT_TOKEN_PATTERN)?;
    tokens.replace_all(input, |qualifier, payload| {
        protector.unprotect(&scoped_purpose(purpose, qualifier), payload)
    })
}

/// Seals a file's markers and writes the result to a different file.
pub fn seal_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input_path: P,
    output_path: Q,
    protector: &AesGcmProtector,
    purpose: &str,
) -> Result<(), ConfigProtectedError> {
    let content = fs::read_to_string(input_path)
        .map_err(|e| ConfigProtectedError::IoError(e.to_string()))?;
    let sealed = seal_text(&content, protector, purpose)?;
    fs::write(output_path, sealed).map_err(|e| ConfigProtectedError::IoError(e.to_string()))
}

/// Seals a file's markers and overwrites the file with the result.
pub fn seal_file_in_place<P: AsRef<Path>>(
    path: P,
    protector: &AesGcmProtector,
    purpose: &str,
) -> Result<(), ConfigProtectedError> {
    let content =
        fs::read_to_string(&path).map_err(|e| ConfigProtectedError::IoError(e.to_string()))?;
    let sealed = seal_text(&content, protector, purpose)?;
    fs::write(path, sealed).map_err(|e| ConfigProtectedError::IoError(e.to_string()))
}

/// Unseals a file's tokens and returns the plaintext content.
pub fn unseal_file<P: AsRef<Path>>(
    path: P,
    protector: &AesGcmProtector,
    purpose: &str,
) -> Result<String, ConfigProtectedError> {
    let content =
        fs::read_to_string(path).map_err(|e| ConfigProtectedError::IoError(e.to_string()))?;
    unseal_text(&content, protector, purpose)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::generate_key;

    fn protector() -> AesGcmProtector {
        AesGcmProtector::new(&generate_key()).unwrap()
    }

    #[test]
    fn test_seal_then_unseal_round_trip() {
        let protector = protector();
        let input = r#"
            visible = "true"
            secret1 = "Encrypt:{one-plain}"
            secret2 = "Encrypt:{db}:{two-plain}"
        "#;

        let sealed = seal_text(input, &protector, "app.Key1").unwrap();
        assert!(!sealed.contains("Encrypt:{"));
        assert!(sealed.contains("Protected:{"));
        assert!(sealed.contains("Protected:{db}:{"));
        assert!(!sealed.contains("one-plain"));
        assert!(!sealed.contains("two-plain"));
        assert!(sealed.contains(r#"visible = "true""#));

        let unsealed = unseal_text(&sealed, &protector, "app.Key1").unwrap();
        assert!(unsealed.contains(r#"secret1 = "one-plain""#));
        assert!(unsealed.contains(r#"secret2 = "two-plain""#));
    }

    #[test]
    fn test_unseal_with_wrong_purpose_fails() {
        let protector = protector();
        let sealed = seal_text("pw = Encrypt:{hunter2}", &protector, "app.Key1").unwrap();
        let err = unseal_text(&sealed, &protector, "app.Key2").unwrap_err();
        assert_eq!(err, ConfigProtectedError::DecryptionFailed);
    }

    #[test]
    fn test_qualifier_uses_scoped_purpose() {
        let protector = protector();
        let sealed = seal_text("pw = Encrypt:{db}:{hunter2}", &protector, "app.Key1").unwrap();

        // The qualifier must survive sealing; stripping it breaks decryption.
        assert!(sealed.contains("Protected:{db}:{"));
        let unsealed = unseal_text(&sealed, &protector, "app.Key1").unwrap();
        assert_eq!(unsealed, "pw = hunter2");
    }

    #[test]
    fn test_two_markers_on_one_line() {
        let protector = protector();
        let sealed = seal_text(
            "a=Encrypt:{first-v} b=Encrypt:{db}:{second-v}",
            &protector,
            "app.Key1",
        )
        .unwrap();
        // The text between the two markers survives sealing.
        assert!(sealed.contains(" b="));

        let unsealed = unseal_text(&sealed, &protector, "app.Key1").unwrap();
        assert_eq!(unsealed, "a=first-v b=second-v");
    }

    #[test]
    fn test_seal_file_and_unseal_file() {
        let protector = protector();
        let dir = std::env::temp_dir();
        let in_path = dir.join("seal_in.toml");
        let out_path = dir.join("seal_out.toml");

        fs::write(&in_path, "token = \"Encrypt:{db-password-1}\"").unwrap();
        seal_file(&in_path, &out_path, &protector, "app.Key1").unwrap();

        let sealed = fs::read_to_string(&out_path).unwrap();
        assert!(sealed.contains("Protected:{"));
        assert!(!sealed.contains("db-password-1"));

        let unsealed = unseal_file(&out_path, &protector, "app.Key1").unwrap();
        assert!(unsealed.contains("db-password-1"));

        let _ = fs::remove_file(in_path);
        let _ = fs::remove_file(out_path);
    }

    #[test]
    fn test_seal_file_in_place() {
        let protector = protector();
        let dir = std::env::temp_dir();
        let path = dir.join("seal_inplace.yaml");

        fs::write(&path, "pass: Encrypt:{pass-word}").unwrap();
        seal_file_in_place(&path, &protector, "app.Key1").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Protected:{"));
        assert!(!content.contains("pass-word"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_missing_file_reports_io_error() {
        let protector = protector();
        let err = unseal_file("/definitely/not/here.toml", &protector, "p").unwrap_err();
        assert!(matches!(err, ConfigProtectedError::IoError(_)));
    }

    #[test]
    fn test_text_without_markers_unchanged() {
        let protector = protector();
        let input = "nothing to do here";
        assert_eq!(seal_text(input, &protector, "p").unwrap(), input);
        assert_eq!(unseal_text(input, &protector, "p").unwrap(), input);
    }
}
