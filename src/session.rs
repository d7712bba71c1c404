use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

/// An authenticated user as reported by the identity provider.
///
/// Created on successful authentication, destroyed on logout. While no
/// identity is present every other component stays inert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque user reference, assigned by the identity provider.
    pub id: String,
    /// Display credential derived from the login email.
    pub email: String,
}

impl Identity {
    /// Uppercase initial of the login email, used as the avatar glyph.
    pub fn display_initial(&self) -> char {
        self.email
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?')
    }
}

/// Failure inside the external identity provider.
///
/// The gate takes no corrective action on these; the session simply
/// remains logged out.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Boundary to the external identity provider (OAuth login, session store).
///
/// Entirely opaque to this crate; the gate only reacts to the transitions
/// it reports.
pub trait AuthProvider {
    /// The currently persisted session, if any.
    async fn current_session(&self) -> Result<Option<Identity>, AuthError>;
    /// Delegate login to the provider's own redirect-based OAuth flow.
    async fn sign_in_with_oauth(&self, provider: &str) -> Result<(), AuthError>;
    /// Invalidate the persisted session.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Owns the current authenticated identity and publishes every transition.
///
/// Subscribers receive the initial restore of a persisted session as well as
/// later login/logout transitions. All other components key their lifecycle
/// off this channel.
pub struct SessionGate {
    tx: watch::Sender<Option<Identity>>,
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionGate {
    /// A gate with no identity; components stay inert until one appears.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Snapshot of the current identity.
    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    /// Subscribe to identity transitions. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }

    /// Restore a previously persisted session from the provider.
    ///
    /// Provider failures are logged and leave the gate logged out; there is
    /// no retry here.
    pub async fn restore(&self, provider: &impl AuthProvider) -> Option<Identity> {
        match provider.current_session().await {
            Ok(session) => {
                self.tx.send_replace(session.clone());
                session
            }
            Err(e) => {
                tracing::warn!(error = %e, "session restore failed, staying logged out");
                None
            }
        }
    }

    /// Delegate login to the provider, then publish whatever session results.
    pub async fn login(
        &self,
        provider: &impl AuthProvider,
        oauth_provider: &str,
    ) -> Result<Option<Identity>, AuthError> {
        provider.sign_in_with_oauth(oauth_provider).await?;
        Ok(self.restore(provider).await)
    }

    /// Invalidate the session and clear local state synchronously.
    ///
    /// The absent-identity transition is published even when the provider
    /// call fails; downstream caches are cleared either way.
    pub async fn logout(&self, provider: &impl AuthProvider) {
        if let Err(e) = provider.sign_out().await {
            tracing::warn!(error = %e, "provider sign-out failed");
        }
        self.tx.send_replace(None);
    }
}

/// Session restore backed by local configuration.
///
/// A CLI has no browser to run the provider's OAuth redirect in, so the
/// persisted session is whatever identity the config carries; login itself
/// stays delegated to the provider's web flow.
pub struct ConfigSession {
    identity: Option<Identity>,
}

impl ConfigSession {
    pub fn new(user_id: &str, email: &str) -> Self {
        let identity = (!user_id.is_empty()).then(|| Identity {
            id: user_id.to_string(),
            email: email.to_string(),
        });
        Self { identity }
    }
}

impl AuthProvider for ConfigSession {
    async fn current_session(&self) -> Result<Option<Identity>, AuthError> {
        Ok(self.identity.clone())
    }

    async fn sign_in_with_oauth(&self, provider: &str) -> Result<(), AuthError> {
        Err(AuthError::Provider(format!(
            "login runs through the {provider} OAuth flow in the web app; \
             place the resulting user_id and email in terjemah.toml"
        )))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeProvider {
        session: Option<Identity>,
        fail_restore: bool,
    }

    impl FakeProvider {
        fn with(session: Option<Identity>) -> Self {
            Self {
                session,
                fail_restore: false,
            }
        }
    }

    impl AuthProvider for FakeProvider {
        async fn current_session(&self) -> Result<Option<Identity>, AuthError> {
            if self.fail_restore {
                return Err(AuthError::Provider("store unreachable".into()));
            }
            Ok(self.session.clone())
        }

        async fn sign_in_with_oauth(&self, _provider: &str) -> Result<(), AuthError> {
            Ok(())
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            Ok(())
        }
    }

    fn ana() -> Identity {
        Identity {
            id: "user-ana".into(),
            email: "ana@example.com".into(),
        }
    }

    #[tokio::test]
    async fn restore_publishes_persisted_session() {
        let gate = SessionGate::new();
        let mut rx = gate.subscribe();

        let restored = gate.restore(&FakeProvider::with(Some(ana()))).await;
        assert_eq!(restored, Some(ana()));
        assert_eq!(gate.current(), Some(ana()));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().clone(), Some(ana()));
    }

    #[tokio::test]
    async fn restore_failure_stays_logged_out() {
        let gate = SessionGate::new();
        let provider = FakeProvider {
            session: Some(ana()),
            fail_restore: true,
        };

        let restored = gate.restore(&provider).await;
        assert!(restored.is_none());
        assert!(gate.current().is_none());
    }

    #[tokio::test]
    async fn logout_publishes_absent_identity() {
        let gate = SessionGate::new();
        gate.restore(&FakeProvider::with(Some(ana()))).await;
        let mut rx = gate.subscribe();

        gate.logout(&FakeProvider::with(None)).await;
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
        assert!(gate.current().is_none());
    }

    #[tokio::test]
    async fn config_session_requires_user_id() {
        let empty = ConfigSession::new("", "ana@example.com");
        assert!(empty.current_session().await.unwrap().is_none());

        let present = ConfigSession::new("user-ana", "ana@example.com");
        let identity = present.current_session().await.unwrap().unwrap();
        assert_eq!(identity.id, "user-ana");
        assert_eq!(identity.display_initial(), 'A');
    }

    #[test]
    fn display_initial_handles_empty_email() {
        let identity = Identity {
            id: "x".into(),
            email: String::new(),
        };
        assert_eq!(identity.display_initial(), '?');
    }
}
