//! Charging session entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "charging_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Battery percentage when charging started (0-100)
    pub start_percentage: i32,

    pub start_time: DateTimeUtc,

    /// Battery percentage when charging ended; NULL while open
    #[sea_orm(nullable)]
    pub end_percentage: Option<i32>,

    #[sea_orm(nullable)]
    pub end_time: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
