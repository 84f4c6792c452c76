use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Where the chat API key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    Secrets,
    Environment,
    Session,
}

/// Chat API key together with its origin
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredential {
    key: String,
    source: CredentialSource,
}

impl ApiCredential {
    /// Build a credential, treating blank keys as absent
    pub fn new(key: &str, source: CredentialSource) -> Option<Self> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some(Self {
            key: key.to_string(),
            source,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }
}

// Never print the key itself
impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("key", &"***")
            .field("source", &self.source)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct SecretsFile {
    #[serde(alias = "api_key", rename = "API_KEY")]
    api_key: Option<String>,
}

/// Resolves the chat API key
///
/// Lookup order: secrets file, then environment variable, then a key the
/// user supplied for their own session.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    configured: Option<ApiCredential>,
}

impl CredentialStore {
    /// Load from the secrets file at `secrets_path` and the `env_var` variable
    pub fn load(secrets_path: &Path, env_var: &str) -> Self {
        let secret = read_secrets_file(secrets_path);
        let env = std::env::var(env_var).ok();
        Self::from_sources(secret.as_deref(), env.as_deref())
    }

    pub fn from_sources(secret: Option<&str>, env: Option<&str>) -> Self {
        let configured = secret
            .and_then(|k| ApiCredential::new(k, CredentialSource::Secrets))
            .or_else(|| env.and_then(|k| ApiCredential::new(k, CredentialSource::Environment)));

        match &configured {
            Some(credential) => tracing::info!("Chat API key loaded from {:?}", credential.source()),
            None => tracing::warn!("No chat API key configured, chat requires a per-session key"),
        }

        Self { configured }
    }

    pub fn configured(&self) -> Option<&ApiCredential> {
        self.configured.as_ref()
    }

    /// Pick the credential for a request, falling back to the session key
    pub fn resolve(&self, session_key: Option<&str>) -> Option<ApiCredential> {
        self.configured
            .clone()
            .or_else(|| session_key.and_then(|k| ApiCredential::new(k, CredentialSource::Session)))
    }

    /// Status line for the AI settings panel
    pub fn status_message(&self, session_key: Option<&str>) -> String {
        match self.resolve(session_key).map(|c| c.source()) {
            Some(CredentialSource::Secrets) => "Secure Mode: API key loaded from secrets".to_string(),
            Some(CredentialSource::Environment) => {
                "Secure Mode: API key loaded from environment variables".to_string()
            }
            Some(CredentialSource::Session) => "API key detected for this session".to_string(),
            None => "API key required".to_string(),
        }
    }
}

fn read_secrets_file(path: &Path) -> Option<String> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::debug!("No secrets file at {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str::<SecretsFile>(&contents) {
        Ok(secrets) => secrets.api_key,
        Err(e) => {
            tracing::warn!("Ignoring unreadable secrets file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_secrets_take_precedence() {
        let store = CredentialStore::from_sources(Some("gsk_secret"), Some("gsk_env"));
        let credential = store.configured().unwrap();
        assert_eq!(credential.key(), "gsk_secret");
        assert_eq!(credential.source(), CredentialSource::Secrets);
    }

    #[test]
    fn test_environment_fallback() {
        let store = CredentialStore::from_sources(None, Some("gsk_env"));
        assert_eq!(store.configured().unwrap().source(), CredentialSource::Environment);

        let blank_secret = CredentialStore::from_sources(Some("  "), Some("gsk_env"));
        assert_eq!(blank_secret.configured().unwrap().key(), "gsk_env");
    }

    #[test]
    fn test_session_key_only_used_without_configured_key() {
        let empty = CredentialStore::from_sources(None, None);
        assert!(empty.resolve(None).is_none());
        assert!(empty.resolve(Some("")).is_none());

        let session = empty.resolve(Some(" gsk_session ")).unwrap();
        assert_eq!(session.key(), "gsk_session");
        assert_eq!(session.source(), CredentialSource::Session);

        let configured = CredentialStore::from_sources(None, Some("gsk_env"));
        assert_eq!(configured.resolve(Some("gsk_session")).unwrap().key(), "gsk_env");
    }

    #[test]
    fn test_debug_redacts_key() {
        let credential = ApiCredential::new("gsk_secret", CredentialSource::Secrets).unwrap();
        assert!(!format!("{:?}", credential).contains("gsk_secret"));
    }

    #[test]
    fn test_read_secrets_file() {
        let path = std::env::temp_dir().join(format!("credit-risk-secrets-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "API_KEY = \"gsk_from_file\"").unwrap();

        assert_eq!(read_secrets_file(&path).as_deref(), Some("gsk_from_file"));
        std::fs::remove_file(&path).unwrap();

        assert_eq!(read_secrets_file(&path), None);
    }

    #[test]
    fn test_status_messages() {
        let store = CredentialStore::from_sources(None, None);
        assert_eq!(store.status_message(None), "API key required");
        assert_eq!(store.status_message(Some("gsk")), "API key detected for this session");
    }
}
