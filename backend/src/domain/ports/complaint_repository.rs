//! Driven port for complaint persistence.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::engagement::Complaint;

use super::RepositoryError;

/// Persistence operations for complaints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComplaintRepository: Send + Sync {
    /// Persist a newly filed complaint.
    async fn insert(&self, complaint: &Complaint) -> Result<(), RepositoryError>;

    /// Load a complaint by identity.
    async fn find(&self, complaint_id: Uuid) -> Result<Option<Complaint>, RepositoryError>;

    /// Complaints without a final verdict (pending or reviewed), oldest
    /// first, for the review queue.
    async fn list_unresolved(&self) -> Result<Vec<Complaint>, RepositoryError>;

    /// All complaints filed by `complainant_id`, newest first.
    async fn list_for_complainant(
        &self,
        complainant_id: Uuid,
    ) -> Result<Vec<Complaint>, RepositoryError>;

    /// Write a reviewed complaint back.
    async fn save(&self, complaint: &Complaint) -> Result<(), RepositoryError>;
}

/// In-memory [`ComplaintRepository`] for tests and local development.
#[derive(Debug, Default)]
pub struct FixtureComplaintRepository {
    complaints: Mutex<HashMap<Uuid, Complaint>>,
}

impl FixtureComplaintRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repository with existing complaints.
    pub fn with_complaints(complaints: impl IntoIterator<Item = Complaint>) -> Self {
        let map = complaints.into_iter().map(|c| (c.id(), c)).collect();
        Self {
            complaints: Mutex::new(map),
        }
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, Complaint>>, RepositoryError> {
        self.complaints
            .lock()
            .map_err(|_| RepositoryError::backend("complaint fixture lock poisoned"))
    }
}

#[async_trait]
impl ComplaintRepository for FixtureComplaintRepository {
    async fn insert(&self, complaint: &Complaint) -> Result<(), RepositoryError> {
        let mut complaints = self.lock()?;
        if complaints.contains_key(&complaint.id()) {
            return Err(RepositoryError::duplicate(format!(
                "complaint {} already exists",
                complaint.id()
            )));
        }
        complaints.insert(complaint.id(), complaint.clone());
        Ok(())
    }

    async fn find(&self, complaint_id: Uuid) -> Result<Option<Complaint>, RepositoryError> {
        Ok(self.lock()?.get(&complaint_id).cloned())
    }

    async fn list_unresolved(&self) -> Result<Vec<Complaint>, RepositoryError> {
        let complaints = self.lock()?;
        let mut unresolved: Vec<Complaint> = complaints
            .values()
            .filter(|c| !c.status().is_terminal())
            .cloned()
            .collect();
        unresolved.sort_by_key(Complaint::created_at);
        Ok(unresolved)
    }

    async fn list_for_complainant(
        &self,
        complainant_id: Uuid,
    ) -> Result<Vec<Complaint>, RepositoryError> {
        let complaints = self.lock()?;
        let mut mine: Vec<Complaint> = complaints
            .values()
            .filter(|c| c.complainant_id() == complainant_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(mine)
    }

    async fn save(&self, complaint: &Complaint) -> Result<(), RepositoryError> {
        self.lock()?.insert(complaint.id(), complaint.clone());
        Ok(())
    }
}
