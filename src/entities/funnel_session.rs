use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A booking funnel session accumulating the visitor's system configuration
/// and the quote computed from it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "funnel_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: String,
    pub status: SessionStatus,
    pub system_type: Option<String>,
    pub kw_size: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub base_price: Option<Decimal>,
    pub structure_type: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub structure_surcharge: Option<Decimal>,
    pub panel_technology: Option<String>,
    pub panel_brand: Option<String>,
    pub inverter_brand: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub total_system_cost: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub gst_amount: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub final_total: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub monthly_emi: Option<Decimal>,
    pub currency: String,
    /// Uploaded document descriptors, one entry per doc type.
    #[sea_orm(column_type = "Json")]
    pub documents: Json,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session is open and still accepting updates.
    #[sea_orm(string_value = "active")]
    Active,
    /// Session has been migrated into an order and is frozen.
    #[sea_orm(string_value = "converted")]
    Converted,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
