//! Citizen identity for the current session.
//!
//! Registration writes the identity into a [`SessionStore`]; every other
//! surface builds an [`AppSession`] from that store once at startup and is
//! handed it explicitly. A missing identity falls back to a guest.

pub mod adapters;
pub mod store;

pub use store::{SessionStore, SessionStoreError};

use tracing::{debug, info};

use crate::errors::SetuResult;
use crate::types::ConversationTurn;
use store::{USER_EMAIL_KEY, USER_NAME_KEY, USER_PHONE_KEY};

pub const GUEST_NAME: &str = "Guest User";
pub const GUEST_PHONE: &str = "9876543210";

/// Citizen details captured at registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn guest() -> Self {
        Self {
            name: GUEST_NAME.to_string(),
            phone: GUEST_PHONE.to_string(),
            email: None,
        }
    }
}

/// Identity context handed to each surface at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSession {
    identity: Identity,
    guest: bool,
}

impl AppSession {
    pub fn guest() -> Self {
        Self {
            identity: Identity::guest(),
            guest: true,
        }
    }

    pub fn registered(identity: Identity) -> Self {
        Self {
            identity,
            guest: false,
        }
    }

    /// Reads the stored identity; both phone and name must be present,
    /// otherwise the guest identity is used.
    pub async fn load(store: &dyn SessionStore) -> SetuResult<Self> {
        let phone = store.get_item(USER_PHONE_KEY).await?;
        let name = store.get_item(USER_NAME_KEY).await?;

        match (phone, name) {
            (Some(phone), Some(name)) => {
                let email = store.get_item(USER_EMAIL_KEY).await?;
                info!("Loaded registered identity for {}", name);
                Ok(Self::registered(Identity { name, phone, email }))
            }
            _ => {
                debug!("No registered identity found, continuing as guest");
                Ok(Self::guest())
            }
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn is_guest(&self) -> bool {
        self.guest
    }

    pub fn phone(&self) -> &str {
        &self.identity.phone
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Opening assistant turn for the chat transcript
    pub fn welcome_turn(&self) -> ConversationTurn {
        if self.guest {
            ConversationTurn::assistant("Namaste! Kripya register karein ya chat shuru karein.")
        } else {
            ConversationTurn::assistant(format!(
                "Namaste {}! Main Yojna Setu AI hoon. Main aapki sarkari yojanaon (government schemes) ke baare mein jaankari paane aur aavedan (apply) karne mein madad kar sakta hoon. Aap mujhse kisi bhi scheme ke baare mein pooch sakte hain.",
                self.identity.name
            ))
        }
    }
}

/// Persists a freshly registered identity
pub async fn persist_identity(store: &dyn SessionStore, identity: &Identity) -> SetuResult<()> {
    store.set_item(USER_PHONE_KEY, &identity.phone).await?;
    store.set_item(USER_NAME_KEY, &identity.name).await?;
    match &identity.email {
        Some(email) => store.set_item(USER_EMAIL_KEY, email).await?,
        None => {
            store.remove_item(USER_EMAIL_KEY).await?;
        }
    }
    Ok(())
}

/// Removes the stored identity so the next session starts as guest
pub async fn forget_identity(store: &dyn SessionStore) -> SetuResult<()> {
    store.clear().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::adapters::InMemorySessionStore;
    use super::*;

    #[tokio::test]
    async fn test_empty_store_gives_guest() {
        let store = InMemorySessionStore::new();
        let session = AppSession::load(&store).await.unwrap();
        assert!(session.is_guest());
        assert_eq!(session.phone(), GUEST_PHONE);
        assert_eq!(session.name(), GUEST_NAME);
        assert!(session.welcome_turn().content.starts_with("Namaste! Kripya register"));
    }

    #[tokio::test]
    async fn test_partial_identity_gives_guest() {
        let store = InMemorySessionStore::new();
        store.set_item(USER_PHONE_KEY, "9000000001").await.unwrap();
        let session = AppSession::load(&store).await.unwrap();
        assert!(session.is_guest());
        assert_eq!(session.phone(), GUEST_PHONE);
    }

    #[tokio::test]
    async fn test_persisted_identity_round_trips_through_store() {
        let store = InMemorySessionStore::new();
        let identity = Identity {
            name: "Ramesh Kumar".to_string(),
            phone: "9000000001".to_string(),
            email: Some("ramesh@example.com".to_string()),
        };
        persist_identity(&store, &identity).await.unwrap();

        let session = AppSession::load(&store).await.unwrap();
        assert!(!session.is_guest());
        assert_eq!(session.identity(), &identity);
        assert!(session.welcome_turn().content.starts_with("Namaste Ramesh Kumar!"));

        forget_identity(&store).await.unwrap();
        assert!(AppSession::load(&store).await.unwrap().is_guest());
    }
}
