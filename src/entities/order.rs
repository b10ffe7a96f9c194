use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A confirmed solar installation order, created by migrating a paid
/// funnel session. The quote fields are a snapshot taken at payment time.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    /// Payment intent that funded this order. Unique so webhook retries
    /// cannot create a second order for the same payment.
    #[sea_orm(unique)]
    pub payment_intent_id: Option<String>,
    pub user_id: Uuid,
    pub session_id: String,
    pub system_type: String,
    pub kw_size: i32,
    pub structure_type: Option<String>,
    pub panel_technology: Option<String>,
    pub panel_brand: Option<String>,
    pub inverter_brand: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub base_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub structure_surcharge: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub gst_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount_paid: Decimal,
    pub currency: String,
    pub status: OrderStatus,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(30))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "site_visit_scheduled")]
    SiteVisitScheduled,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl OrderStatus {
    /// Valid forward transitions for the installation workflow.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Processing, OrderStatus::SiteVisitScheduled)
                | (OrderStatus::SiteVisitScheduled, OrderStatus::Completed)
        )
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
