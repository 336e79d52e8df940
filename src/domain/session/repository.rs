//! Charging session repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{ChargingSession, SortOrder};
use crate::domain::DomainResult;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a new open session.
    async fn create(
        &self,
        start_percentage: i32,
        start_time: DateTime<Utc>,
    ) -> DomainResult<ChargingSession>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ChargingSession>>;

    /// Open session with the latest start time, if any.
    async fn find_open(&self) -> DomainResult<Option<ChargingSession>>;

    async fn list_all(&self, order: SortOrder) -> DomainResult<Vec<ChargingSession>>;

    /// Close `session` iff it is still open at write time.
    ///
    /// Returns `SessionAlreadyClosed` when another writer got there first.
    async fn close(
        &self,
        session: &ChargingSession,
        end_percentage: i32,
        end_time: DateTime<Utc>,
    ) -> DomainResult<ChargingSession>;

    async fn delete(&self, id: i32) -> DomainResult<()>;

    /// Remove every session, returning how many were removed.
    async fn delete_all(&self) -> DomainResult<u64>;
}
