use tracing::debug;

use crate::error::StoreError;
use crate::store::{IdentityStore, PROFILE_ID_KEY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    /// Nothing to show yet; the caller should open onboarding without an error.
    RedirectToOnboarding,
}

/// The outcome of reading both identity sources, before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    resolution: Resolution,
    write_back: bool,
}

/// Picks the active profile id: the navigation value wins, the stored value
/// is the fallback. Nothing is written until [`Decision::commit`].
pub async fn decide_identity(
    navigation: Option<&str>,
    store: &dyn IdentityStore,
) -> Result<Decision, StoreError> {
    let raw = store.get(PROFILE_ID_KEY).await?;
    let stored = raw.as_deref();

    let resolution = match present(navigation).or(present(stored)) {
        Some(id) => Resolution::Resolved(id.to_string()),
        None => Resolution::RedirectToOnboarding,
    };
    let write_back = match &resolution {
        Resolution::Resolved(id) => stored != Some(id.as_str()),
        Resolution::RedirectToOnboarding => false,
    };

    Ok(Decision {
        resolution,
        write_back,
    })
}

impl Decision {
    /// Writes the resolved id back to the store so both locations agree.
    /// The write is skipped when the store already holds it.
    pub async fn commit(self, store: &dyn IdentityStore) -> Result<Resolution, StoreError> {
        match &self.resolution {
            Resolution::Resolved(id) => {
                if self.write_back {
                    store.set(PROFILE_ID_KEY, id).await?;
                }
                debug!(profile_id = %id, written = self.write_back, "identity resolved");
            }
            Resolution::RedirectToOnboarding => debug!("no profile id available"),
        }
        Ok(self.resolution)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    async fn resolve_identity(navigation: Option<&str>, store: &MemoryStore) -> Resolution {
        decide_identity(navigation, store)
            .await
            .unwrap()
            .commit(store)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn navigation_id_wins_and_overwrites_store() {
        let store = MemoryStore::with_value(PROFILE_ID_KEY, "p1");

        let resolution = resolve_identity(Some("p2"), &store).await;

        assert_eq!(resolution, Resolution::Resolved("p2".to_string()));
        assert_eq!(store.value(PROFILE_ID_KEY).as_deref(), Some("p2"));
    }

    #[tokio::test]
    async fn stored_id_is_the_fallback() {
        let store = MemoryStore::with_value(PROFILE_ID_KEY, "p1");

        let resolution = resolve_identity(None, &store).await;

        assert_eq!(resolution, Resolution::Resolved("p1".to_string()));
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn nothing_anywhere_redirects_without_writing() {
        let store = MemoryStore::default();

        assert_eq!(
            resolve_identity(None, &store).await,
            Resolution::RedirectToOnboarding
        );
        assert_eq!(
            resolve_identity(Some(""), &store).await,
            Resolution::RedirectToOnboarding
        );
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn repeated_resolution_writes_once() {
        let store = MemoryStore::default();

        let first = resolve_identity(Some("p3"), &store).await;
        let second = resolve_identity(Some("p3"), &store).await;

        assert_eq!(first, second);
        assert_eq!(
            store.writes(),
            vec![(PROFILE_ID_KEY.to_string(), "p3".to_string())]
        );
    }

    #[tokio::test]
    async fn blank_navigation_id_falls_back_to_store() {
        let store = MemoryStore::with_value(PROFILE_ID_KEY, "p1");
        assert_eq!(
            resolve_identity(Some("  "), &store).await,
            Resolution::Resolved("p1".to_string())
        );
    }

    #[tokio::test]
    async fn padded_identifiers_are_trimmed_before_use() {
        let store = MemoryStore::default();

        assert_eq!(
            resolve_identity(Some(" p1 "), &store).await,
            Resolution::Resolved("p1".to_string())
        );
        assert_eq!(store.value(PROFILE_ID_KEY).as_deref(), Some("p1"));

        let store = MemoryStore::with_value(PROFILE_ID_KEY, " p2\n");
        assert_eq!(
            resolve_identity(None, &store).await,
            Resolution::Resolved("p2".to_string())
        );
        assert_eq!(store.value(PROFILE_ID_KEY).as_deref(), Some("p2"));
    }

    #[tokio::test]
    async fn undecided_resolution_writes_nothing() {
        let store = MemoryStore::with_value(PROFILE_ID_KEY, "p1");

        let decision = decide_identity(Some("p2"), &store).await.unwrap();
        assert!(store.writes().is_empty());

        assert_eq!(
            decision.commit(&store).await.unwrap(),
            Resolution::Resolved("p2".to_string())
        );
        assert_eq!(
            store.writes(),
            vec![(PROFILE_ID_KEY.to_string(), "p2".to_string())]
        );
    }
}
