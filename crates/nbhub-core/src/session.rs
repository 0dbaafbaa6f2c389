use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use serde::Deserialize;
use serde::Serialize;

use super::persistence::PersistenceError;
use super::persistence::StateStorage;

/// Storage key of the bearer credential.
pub const TOKEN_KEY: &str = "token";

/// Authorization scheme the backend expects. Fixed per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    #[default]
    Bearer,
    Jwt,
}

impl AuthScheme {
    pub fn label(self) -> &'static str {
        match self {
            Self::Bearer => "Bearer",
            Self::Jwt => "JWT",
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AuthScheme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bearer" => Ok(Self::Bearer),
            "jwt" => Ok(Self::Jwt),
            other => Err(format!("unknown auth scheme `{other}`")),
        }
    }
}

/// Injectable handle over the current credential.
///
/// Clones share the same token; the storage write happens before the
/// in-memory slot is updated so readers never observe an unpersisted token.
#[derive(Clone)]
pub struct SessionContext {
    scheme: AuthScheme,
    storage: Arc<dyn StateStorage>,
    token: Arc<RwLock<Option<String>>>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("scheme", &self.scheme)
            .field("token_present", &self.token_present())
            .finish()
    }
}

impl SessionContext {
    pub fn new(storage: Arc<dyn StateStorage>, scheme: AuthScheme) -> Self {
        Self {
            scheme,
            storage,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Loads the persisted token into memory.
    pub fn restore(&self) -> Result<bool, PersistenceError> {
        let token = self.storage.get(TOKEN_KEY)?.filter(|t| !t.is_empty());
        let present = token.is_some();
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
        Ok(present)
    }

    pub fn set_token(&self, token: &str) -> Result<(), PersistenceError> {
        self.storage.set(TOKEN_KEY, token)?;
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    pub fn clear(&self) -> Result<(), PersistenceError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.storage.remove(TOKEN_KEY)
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn token_present(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    pub fn authorization_header(&self) -> Option<String> {
        self.token()
            .map(|token| format!("{} {token}", self.scheme.label()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn token_is_persisted_before_it_is_visible() {
        let storage = Arc::new(MemoryStorage::new());
        let session = SessionContext::new(storage.clone(), AuthScheme::Bearer);

        session.set_token("abc").expect("set");

        assert_eq!(storage.get(TOKEN_KEY).expect("get").as_deref(), Some("abc"));
        assert_eq!(session.authorization_header().as_deref(), Some("Bearer abc"));
    }

    #[test]
    fn restore_reads_previous_run() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "xyz").expect("seed");

        let session = SessionContext::new(storage, AuthScheme::Jwt);
        assert!(!session.token_present());
        assert!(session.restore().expect("restore"));
        assert_eq!(session.authorization_header().as_deref(), Some("JWT xyz"));
    }

    #[test]
    fn clear_drops_token_everywhere() {
        let storage = Arc::new(MemoryStorage::new());
        let session = SessionContext::new(storage.clone(), AuthScheme::Bearer);
        let clone = session.clone();
        session.set_token("abc").expect("set");

        clone.clear().expect("clear");

        assert_eq!(session.token(), None);
        assert_eq!(storage.get(TOKEN_KEY).expect("get"), None);
    }

    #[test]
    fn scheme_parses_case_insensitively() {
        assert_eq!("JWT".parse::<AuthScheme>(), Ok(AuthScheme::Jwt));
        assert_eq!(" bearer ".parse::<AuthScheme>(), Ok(AuthScheme::Bearer));
        assert!("basic".parse::<AuthScheme>().is_err());
    }
}
