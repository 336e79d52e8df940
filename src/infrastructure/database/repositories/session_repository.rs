//! SeaORM implementation of SessionRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sea_orm::prelude::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, Order, QueryFilter,
    QueryOrder, Set,
};

use crate::domain::session::{ChargingSession, SessionRepository, SortOrder};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::charging_session;

pub struct SeaOrmSessionRepository {
    db: DatabaseConnection,
}

impl SeaOrmSessionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: charging_session::Model) -> ChargingSession {
    ChargingSession {
        id: m.id,
        start_percentage: m.start_percentage,
        start_time: m.start_time,
        end_percentage: m.end_percentage,
        end_time: m.end_time,
    }
}

fn sea_order(order: SortOrder) -> Order {
    match order {
        SortOrder::Ascending => Order::Asc,
        SortOrder::Descending => Order::Desc,
    }
}

// ── SessionRepository impl ──────────────────────────────────────

#[async_trait]
impl SessionRepository for SeaOrmSessionRepository {
    async fn create(
        &self,
        start_percentage: i32,
        start_time: DateTime<Utc>,
    ) -> DomainResult<ChargingSession> {
        debug!("Creating charging session at {}%", start_percentage);
        let model = charging_session::ActiveModel {
            id: NotSet,
            start_percentage: Set(start_percentage),
            start_time: Set(start_time),
            end_percentage: Set(None),
            end_time: Set(None),
        };
        let inserted = model.insert(&self.db).await?;
        Ok(model_to_domain(inserted))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ChargingSession>> {
        let model = charging_session::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(model_to_domain))
    }

    async fn find_open(&self) -> DomainResult<Option<ChargingSession>> {
        let model = charging_session::Entity::find()
            .filter(charging_session::Column::EndPercentage.is_null())
            .order_by_desc(charging_session::Column::StartTime)
            .order_by_desc(charging_session::Column::Id)
            .one(&self.db)
            .await?;
        Ok(model.map(model_to_domain))
    }

    async fn list_all(&self, order: SortOrder) -> DomainResult<Vec<ChargingSession>> {
        let models = charging_session::Entity::find()
            .order_by(charging_session::Column::StartTime, sea_order(order))
            .order_by(charging_session::Column::Id, sea_order(order))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn close(
        &self,
        session: &ChargingSession,
        end_percentage: i32,
        end_time: DateTime<Utc>,
    ) -> DomainResult<ChargingSession> {
        debug!(
            "Closing charging session {} at {}%",
            session.id, end_percentage
        );

        // Single conditional UPDATE: only an open row can be closed
        let result = charging_session::Entity::update_many()
            .col_expr(
                charging_session::Column::EndPercentage,
                Expr::value(end_percentage),
            )
            .col_expr(charging_session::Column::EndTime, Expr::value(end_time))
            .filter(charging_session::Column::Id.eq(session.id))
            .filter(charging_session::Column::EndPercentage.is_null())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return match self.find_by_id(session.id).await? {
                Some(_) => Err(DomainError::SessionAlreadyClosed(session.id)),
                None => Err(DomainError::session_not_found(session.id)),
            };
        }

        let mut closed = session.clone();
        closed.close(end_percentage, end_time)?;
        Ok(closed)
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        debug!("Deleting charging session {}", id);
        let result = charging_session::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DomainError::session_not_found(id));
        }
        Ok(())
    }

    async fn delete_all(&self) -> DomainResult<u64> {
        let result = charging_session::Entity::delete_many()
            .exec(&self.db)
            .await?;
        debug!("Deleted {} charging sessions", result.rows_affected);
        Ok(result.rows_affected)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::{connect_and_migrate, DatabaseConfig};
    use chrono::{Duration, TimeZone};

    async fn repo() -> SeaOrmSessionRepository {
        let db = connect_and_migrate(&DatabaseConfig::in_memory())
            .await
            .unwrap();
        SeaOrmSessionRepository::new(db)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn create_returns_open_session_with_assigned_id() {
        let repo = repo().await;
        let a = repo.create(20, t0()).await.unwrap();
        let b = repo.create(30, t0() + Duration::hours(1)).await.unwrap();
        assert!(a.is_open());
        assert_eq!(a.start_percentage, 20);
        assert_eq!(a.start_time, t0());
        assert!(b.id > a.id);
        assert_eq!(repo.find_by_id(a.id).await.unwrap(), Some(a));
    }

    #[tokio::test]
    async fn find_open_picks_latest_start_time() {
        let repo = repo().await;
        assert!(repo.find_open().await.unwrap().is_none());

        let later = repo.create(40, t0() + Duration::hours(2)).await.unwrap();
        let earlier = repo.create(10, t0()).await.unwrap();
        let open = repo.find_open().await.unwrap().unwrap();
        assert_eq!(open.id, later.id);

        repo.close(&later, 90, t0() + Duration::hours(3)).await.unwrap();
        let open = repo.find_open().await.unwrap().unwrap();
        assert_eq!(open.id, earlier.id);
    }

    #[tokio::test]
    async fn list_all_honors_requested_order() {
        let repo = repo().await;
        let second = repo.create(50, t0() + Duration::minutes(10)).await.unwrap();
        let first = repo.create(20, t0()).await.unwrap();
        let third = repo.create(70, t0() + Duration::minutes(20)).await.unwrap();

        let asc: Vec<i32> = repo
            .list_all(SortOrder::Ascending)
            .await
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(asc, vec![first.id, second.id, third.id]);

        let desc: Vec<i32> = repo
            .list_all(SortOrder::Descending)
            .await
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(desc, vec![third.id, second.id, first.id]);
    }

    #[tokio::test]
    async fn close_persists_end_fields() {
        let repo = repo().await;
        let open = repo.create(50, t0()).await.unwrap();
        let end = t0() + Duration::minutes(45);

        let closed = repo.close(&open, 80, end).await.unwrap();
        assert!(!closed.is_open());
        assert_eq!(closed.end_percentage, Some(80));

        let stored = repo.find_by_id(open.id).await.unwrap().unwrap();
        assert_eq!(stored, closed);
        assert!(repo.find_open().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_close_of_same_session_is_rejected() {
        let repo = repo().await;
        let open = repo.create(50, t0()).await.unwrap();
        repo.close(&open, 80, t0() + Duration::minutes(30)).await.unwrap();

        // Stale copy still looks open to the caller
        let err = repo
            .close(&open, 95, t0() + Duration::minutes(40))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::SessionAlreadyClosed(id) if id == open.id));

        let stored = repo.find_by_id(open.id).await.unwrap().unwrap();
        assert_eq!(stored.end_percentage, Some(80));
    }

    #[tokio::test]
    async fn close_of_deleted_session_is_not_found() {
        let repo = repo().await;
        let open = repo.create(50, t0()).await.unwrap();
        repo.delete(open.id).await.unwrap();
        let err = repo.close(&open, 80, t0()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let repo = repo().await;
        let err = repo.delete(999).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_all_empties_the_table() {
        let repo = repo().await;
        assert_eq!(repo.delete_all().await.unwrap(), 0);

        repo.create(10, t0()).await.unwrap();
        repo.create(20, t0() + Duration::minutes(1)).await.unwrap();
        assert_eq!(repo.delete_all().await.unwrap(), 2);
        assert!(repo.list_all(SortOrder::Ascending).await.unwrap().is_empty());
    }
}
