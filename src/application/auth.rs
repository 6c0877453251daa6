// Login use case - credential check and the "logged in" session flag
use crate::application::errors::DashboardError;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Fixed username/password pairs from configuration.
#[derive(Debug, Clone, Default)]
pub struct AllowListVerifier {
    users: HashMap<String, String>,
}

impl AllowListVerifier {
    pub fn new(users: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            users: users.into_iter().collect(),
        }
    }
}

impl CredentialVerifier for AllowListVerifier {
    fn verify(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|expected| expected == password)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub logged_in: bool,
    pub username: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    verifier: Arc<dyn CredentialVerifier>,
    session: Arc<RwLock<Session>>,
}

impl AuthService {
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            verifier,
            session: Arc::new(RwLock::new(Session::default())),
        }
    }

    /// On mismatch the current session is left as it was.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, DashboardError> {
        let username = username.trim();
        if !self.verifier.verify(username, password) {
            tracing::info!(username, "login rejected");
            return Err(DashboardError::AuthFailure);
        }

        let mut session = self.session.write().await;
        *session = Session {
            logged_in: true,
            username: Some(username.to_string()),
        };
        tracing::info!(username, "logged in");
        Ok(session.clone())
    }

    pub async fn logout(&self) {
        let mut session = self.session.write().await;
        if let Some(username) = session.username.take() {
            tracing::info!(username = %username, "logged out");
        }
        session.logged_in = false;
    }

    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }
}
