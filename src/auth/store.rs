use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::observe::{Observers, SubscriptionId};
use crate::storage::{read_json, write_json, SharedStorage, AUTH_STORAGE_KEY};

/// Exactly one credential at a time; switching kinds never passes through Anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthCredential {
    #[default]
    Anonymous,
    /// Regular user holding an API key.
    UserSession { api_key: String },
    /// Administrator holding a JWT issued by `/admin/login`.
    AdminSession { token: String, username: String },
}

impl AuthCredential {
    pub fn is_authenticated(&self) -> bool { !matches!(self, AuthCredential::Anonymous) }

    pub fn is_admin(&self) -> bool { matches!(self, AuthCredential::AdminSession { .. }) }

    pub fn token(&self) -> Option<&str> {
        match self { AuthCredential::AdminSession { token, .. } => Some(token), _ => None }
    }

    pub fn api_key(&self) -> Option<&str> {
        match self { AuthCredential::UserSession { api_key } => Some(api_key), _ => None }
    }

    pub fn username(&self) -> Option<&str> {
        match self { AuthCredential::AdminSession { username, .. } => Some(username), _ => None }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuthCredential::Anonymous => "anonymous",
            AuthCredential::UserSession { .. } => "user",
            AuthCredential::AdminSession { .. } => "admin",
        }
    }
}

/// On-disk subset. The derived flags are never written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedAuth {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, rename = "apiKey", alias = "api_key")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredAuth {
    // older clients wrapped the record as {"state": {...}, "version": n}
    Wrapped { state: PersistedAuth },
    Flat(PersistedAuth),
}

impl From<&AuthCredential> for PersistedAuth {
    fn from(c: &AuthCredential) -> Self {
        match c {
            AuthCredential::Anonymous => PersistedAuth::default(),
            AuthCredential::UserSession { api_key } => PersistedAuth { api_key: Some(api_key.clone()), ..Default::default() },
            AuthCredential::AdminSession { token, username } => PersistedAuth {
                token: Some(token.clone()),
                username: Some(username.clone()),
                api_key: None,
            },
        }
    }
}

impl From<PersistedAuth> for AuthCredential {
    fn from(p: PersistedAuth) -> Self {
        // a record carrying both keeps the token, matching header precedence
        match (p.token.filter(|t| !t.is_empty()), p.api_key.filter(|k| !k.is_empty())) {
            (Some(token), _) => AuthCredential::AdminSession { token, username: p.username.unwrap_or_else(|| "admin".to_string()) },
            (None, Some(api_key)) => AuthCredential::UserSession { api_key },
            (None, None) => AuthCredential::Anonymous,
        }
    }
}

/// Current credential, persisted under `auth-storage` on every transition.
pub struct AuthStore {
    state: RwLock<AuthCredential>,
    storage: SharedStorage,
    observers: Observers<AuthCredential>,
}

impl AuthStore {
    /// Restores the persisted credential, if any.
    pub fn load(storage: SharedStorage) -> Self {
        let initial = match read_json::<StoredAuth>(storage.as_ref(), AUTH_STORAGE_KEY) {
            Ok(Some(StoredAuth::Wrapped { state })) | Ok(Some(StoredAuth::Flat(state))) => AuthCredential::from(state),
            Ok(None) => AuthCredential::Anonymous,
            Err(e) => {
                warn!(target: "unisearch::auth", "ignoring unreadable auth record: {}", e);
                AuthCredential::Anonymous
            }
        };
        Self::with_state(storage, initial)
    }

    /// Starts from an explicit credential without touching storage.
    pub fn with_state(storage: SharedStorage, initial: AuthCredential) -> Self {
        Self { state: RwLock::new(initial), storage, observers: Observers::new() }
    }

    pub fn credential(&self) -> AuthCredential { self.state.read().clone() }

    pub fn token(&self) -> Option<String> { self.state.read().token().map(str::to_string) }

    pub fn api_key(&self) -> Option<String> { self.state.read().api_key().map(str::to_string) }

    pub fn username(&self) -> Option<String> { self.state.read().username().map(str::to_string) }

    pub fn is_authenticated(&self) -> bool { self.state.read().is_authenticated() }

    pub fn is_admin(&self) -> bool { self.state.read().is_admin() }

    /// Admin login; replaces any API key.
    pub fn set_token<T: Into<String>, U: Into<String>>(&self, token: T, username: U) {
        let username = username.into();
        info!(target: "unisearch::auth", "admin session started for {}", username);
        self.transition(AuthCredential::AdminSession { token: token.into(), username });
    }

    /// User login; replaces any admin token.
    pub fn set_api_key<K: Into<String>>(&self, api_key: K) {
        info!(target: "unisearch::auth", "user session started with API key");
        self.transition(AuthCredential::UserSession { api_key: api_key.into() });
    }

    pub fn logout(&self) {
        let was = self.state.read().label();
        info!(target: "unisearch::auth", "logout (was {})", was);
        self.transition(AuthCredential::Anonymous);
    }

    pub fn subscribe<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&AuthCredential) + Send + Sync + 'static,
    {
        self.observers.subscribe(f)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool { self.observers.unsubscribe(id) }

    fn transition(&self, next: AuthCredential) {
        *self.state.write() = next.clone();
        self.persist(&next);
        self.observers.notify(&next);
    }

    fn persist(&self, cred: &AuthCredential) {
        let res = match cred {
            AuthCredential::Anonymous => self.storage.remove(AUTH_STORAGE_KEY),
            other => write_json(self.storage.as_ref(), AUTH_STORAGE_KEY, &PersistedAuth::from(other)),
        };
        if let Err(e) = res {
            warn!(target: "unisearch::auth", "failed to persist auth state: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DurableStorage, MemoryStorage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn store() -> (Arc<MemoryStorage>, AuthStore) {
        let mem = Arc::new(MemoryStorage::new());
        let s = AuthStore::load(mem.clone());
        (mem, s)
    }

    #[test]
    fn starts_anonymous() {
        let (_, s) = store();
        assert_eq!(s.credential(), AuthCredential::Anonymous);
        assert!(!s.is_authenticated());
        assert!(!s.is_admin());
    }

    #[test]
    fn token_then_api_key_clears_admin() {
        let (mem, s) = store();
        s.set_token("jwt-1", "root");
        assert!(s.is_admin());
        assert_eq!(s.username().as_deref(), Some("root"));
        s.set_api_key("sk-abc");
        assert_eq!(s.token(), None);
        assert!(!s.is_admin());
        assert!(s.is_authenticated());
        let raw = mem.get(AUTH_STORAGE_KEY).unwrap().unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v, serde_json::json!({"token": null, "apiKey": "sk-abc", "username": null}));
    }

    #[test]
    fn api_key_then_token_clears_key() {
        let (_, s) = store();
        s.set_api_key("sk-abc");
        s.set_token("jwt-2", "admin");
        assert_eq!(s.api_key(), None);
        assert_eq!(s.token().as_deref(), Some("jwt-2"));
    }

    #[test]
    fn logout_clears_everything_and_storage() {
        let (mem, s) = store();
        s.set_token("jwt", "admin");
        s.logout();
        assert_eq!(s.credential(), AuthCredential::Anonymous);
        assert_eq!(mem.get(AUTH_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn restores_persisted_credentials() {
        let mem = Arc::new(MemoryStorage::with_entries([(AUTH_STORAGE_KEY, r#"{"token":null,"apiKey":"sk-1","username":null}"#)]));
        assert_eq!(AuthStore::load(mem).api_key().as_deref(), Some("sk-1"));

        let mem = Arc::new(MemoryStorage::with_entries([(AUTH_STORAGE_KEY, r#"{"state":{"token":"t","apiKey":"sk-1","username":"ops"},"version":0}"#)]));
        let s = AuthStore::load(mem);
        assert_eq!(s.credential(), AuthCredential::AdminSession { token: "t".into(), username: "ops".into() });

        let mem = Arc::new(MemoryStorage::with_entries([(AUTH_STORAGE_KEY, "garbage")]));
        assert!(!AuthStore::load(mem).is_authenticated());
    }

    #[test]
    fn subscribers_see_each_transition() {
        let (_, s) = store();
        let hits = Arc::new(AtomicUsize::new(0));
        let h2 = hits.clone();
        let id = s.subscribe(move |_| { h2.fetch_add(1, Ordering::SeqCst); });
        s.set_api_key("k");
        s.logout();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(s.unsubscribe(id));
        s.set_api_key("k2");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
