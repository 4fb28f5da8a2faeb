//! Availability matching: the filter and pagination rules drivers use to
//! browse open ride requests.
//!
//! A ride is a candidate when it is `pending`, has no driver assigned, and
//! was not requested by the browsing driver. Text filters are
//! case-insensitive substring matches; the passenger filter is exact.
//! Results are ordered newest-first and paginated with a fixed page size.

use serde::Serialize;
use uuid::Uuid;

use super::ride::Ride;
use super::ride::RideStatus;

/// Fixed number of rides per results page.
pub const PAGE_SIZE: i64 = 20;

/// Filters a driver applies when browsing pending rides.
///
/// Empty text filters match everything; a `None` passenger filter matches
/// any group size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RideSearch {
    /// Case-insensitive substring match on the pickup label.
    pub pickup: Option<String>,
    /// Case-insensitive substring match on the destination label.
    pub destination: Option<String>,
    /// Exact match on the passenger count.
    pub passengers_count: Option<i32>,
    /// Zero-based page index.
    pub page: i64,
}

impl RideSearch {
    /// Offset into the ordered candidate set for this page.
    pub fn offset(&self) -> i64 {
        self.page.max(0) * PAGE_SIZE
    }

    /// Whether `ride` is a candidate for the browsing driver.
    ///
    /// Mirrors the SQL predicate the persistence adapter issues so fixture
    /// repositories and the database agree on membership.
    pub fn matches(&self, ride: &Ride, driver_id: Uuid) -> bool {
        if ride.status() != RideStatus::Pending
            || ride.driver_id().is_some()
            || ride.passenger_id() == driver_id
        {
            return false;
        }
        if let Some(pickup) = &self.pickup {
            if !contains_ci(ride.pickup().text(), pickup) {
                return false;
            }
        }
        if let Some(destination) = &self.destination {
            if !contains_ci(ride.destination().text(), destination) {
                return false;
            }
        }
        if let Some(count) = self.passengers_count {
            if ride.passengers_count() != count {
                return false;
            }
        }
        true
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// One page of results plus the total candidate count.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page, at most [`PAGE_SIZE`].
    pub items: Vec<T>,
    /// Total candidates across all pages, for rendering page controls.
    pub total: i64,
}

impl<T> Page<T> {
    /// An empty page with a zero total.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}
