//! PostgreSQL-backed [`ComplaintRepository`] using Diesel.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{ComplaintRepository, RepositoryError};
use crate::domain::{Complaint, ComplaintStatus};

use super::error_map::{map_diesel_error, map_pool_error};
use super::models::{ComplaintReviewUpdate, ComplaintRow, NewComplaintRow};
use super::pool::DbPool;
use super::schema::complaints;

/// Diesel-backed implementation of the complaint repository port.
#[derive(Clone)]
pub struct DieselComplaintRepository {
    pool: DbPool,
}

impl DieselComplaintRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_complaint(row: ComplaintRow) -> Result<Complaint, RepositoryError> {
    let status: ComplaintStatus = row
        .status
        .parse()
        .map_err(|err| RepositoryError::corrupted(format!("complaint {}: {err}", row.id)))?;
    Ok(Complaint::restore(
        row.id,
        row.ride_id,
        row.complainant_id,
        row.respondent_id,
        row.subject,
        row.description,
        status,
        row.resolution_note,
        row.created_at,
    ))
}

#[async_trait]
impl ComplaintRepository for DieselComplaintRepository {
    async fn insert(&self, complaint: &Complaint) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(complaints::table)
            .values(NewComplaintRow {
                id: complaint.id(),
                ride_id: complaint.ride_id(),
                complainant_id: complaint.complainant_id(),
                respondent_id: complaint.respondent_id(),
                subject: complaint.subject(),
                description: complaint.description(),
                status: complaint.status().as_str(),
                resolution_note: complaint.resolution_note(),
                created_at: complaint.created_at(),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find(&self, complaint_id: Uuid) -> Result<Option<Complaint>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = complaints::table
            .filter(complaints::id.eq(complaint_id))
            .select(ComplaintRow::as_select())
            .first::<ComplaintRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_complaint).transpose()
    }

    async fn list_unresolved(&self) -> Result<Vec<Complaint>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let unresolved = [
            ComplaintStatus::Pending.as_str(),
            ComplaintStatus::Reviewed.as_str(),
        ];
        let rows: Vec<ComplaintRow> = complaints::table
            .filter(complaints::status.eq_any(unresolved))
            .order(complaints::created_at.asc())
            .select(ComplaintRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_complaint).collect()
    }

    async fn list_for_complainant(
        &self,
        complainant_id: Uuid,
    ) -> Result<Vec<Complaint>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ComplaintRow> = complaints::table
            .filter(complaints::complainant_id.eq(complainant_id))
            .order(complaints::created_at.desc())
            .select(ComplaintRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_complaint).collect()
    }

    async fn save(&self, complaint: &Complaint) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(complaints::table.filter(complaints::id.eq(complaint.id())))
            .set(ComplaintReviewUpdate {
                status: complaint.status().as_str(),
                resolution_note: complaint.resolution_note(),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
