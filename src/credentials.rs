use std::path::Path;

use reqwest::header::HeaderValue;

use crate::tfc::TfcError;

/// Static bearer token for the Terraform Cloud API.
///
/// Passed explicitly to every authenticated call; never logged.
#[derive(Clone)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: String) -> Result<Self, TfcError> {
        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(TfcError::Auth {
                message: "API token is empty".to_string(),
            });
        }
        HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| TfcError::Auth {
            message: "Invalid token format".to_string(),
        })?;
        Ok(Self(token))
    }

    /// Reads a token from a secret file (e.g. an exported parameter-store value).
    pub fn from_file(path: &Path) -> Result<Self, TfcError> {
        let raw = std::fs::read_to_string(path).map_err(|e| TfcError::Auth {
            message: format!("cannot read token file {}: {}", path.display(), e.kind()),
        })?;
        Self::new(raw)
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiToken([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_token_trims_whitespace() {
        let token = ApiToken::new("  tok-1\n".to_string()).unwrap();
        assert_eq!(token.expose(), "tok-1");
    }

    #[test]
    fn test_empty_token_rejected() {
        let result = ApiToken::new("   ".to_string());
        assert!(matches!(result, Err(TfcError::Auth { .. })));
    }

    #[test]
    fn test_token_with_control_characters_rejected() {
        let result = ApiToken::new("tok\u{7f}en".to_string());
        assert!(matches!(result, Err(TfcError::Auth { .. })));
    }

    #[test]
    fn test_debug_does_not_expose_token() {
        let token = ApiToken::new("super_secret_token_12345".to_string()).unwrap();
        let debug_output = format!("{:?}", token);

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_token_12345"));
    }

    #[test]
    fn test_from_file_reads_token() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "file-token").unwrap();

        let token = ApiToken::from_file(file.path()).unwrap();
        assert_eq!(token.expose(), "file-token");
    }

    #[test]
    fn test_from_missing_file_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ApiToken::from_file(&dir.path().join("absent"));
        match result {
            Err(TfcError::Auth { message }) => assert!(message.contains("cannot read token file")),
            other => panic!("expected Auth error, got {other:?}"),
        }
    }
}
