//! Driven port for profile persistence.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::profile::Profile;

use super::RepositoryError;

/// Persistence operations for user profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Load a profile by identity.
    async fn find(&self, user_id: Uuid) -> Result<Option<Profile>, RepositoryError>;

    /// Load several profiles at once, skipping missing identities.
    async fn find_many(&self, user_ids: &[Uuid]) -> Result<Vec<Profile>, RepositoryError>;

    /// Write a profile, replacing any stored row with the same identity.
    async fn save(&self, profile: &Profile) -> Result<(), RepositoryError>;
}

/// In-memory [`ProfileRepository`] for tests and local development.
#[derive(Debug, Default)]
pub struct FixtureProfileRepository {
    profiles: Mutex<HashMap<Uuid, Profile>>,
}

impl FixtureProfileRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repository with existing profiles.
    pub fn with_profiles(profiles: impl IntoIterator<Item = Profile>) -> Self {
        let map = profiles.into_iter().map(|p| (p.id(), p)).collect();
        Self {
            profiles: Mutex::new(map),
        }
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, Profile>>, RepositoryError> {
        self.profiles
            .lock()
            .map_err(|_| RepositoryError::backend("profile fixture lock poisoned"))
    }
}

#[async_trait]
impl ProfileRepository for FixtureProfileRepository {
    async fn find(&self, user_id: Uuid) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.lock()?.get(&user_id).cloned())
    }

    async fn find_many(&self, user_ids: &[Uuid]) -> Result<Vec<Profile>, RepositoryError> {
        let profiles = self.lock()?;
        Ok(user_ids
            .iter()
            .filter_map(|id| profiles.get(id).cloned())
            .collect())
    }

    async fn save(&self, profile: &Profile) -> Result<(), RepositoryError> {
        self.lock()?.insert(profile.id(), profile.clone());
        Ok(())
    }
}
