use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::entities::order::{self, Entity as Order};
use crate::entities::payment::{self, Entity as Payment};
use crate::entities::subscription::{self, Entity as Subscription, SubscriptionStatus};
use crate::entities::{MarketingLead, User};
use crate::errors::ServiceError;

const RECENT_ORDERS_LIMIT: u64 = 10;

/// Read-only business summary for the admin dashboard.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub total_leads: u64,
    pub total_users: u64,
    pub total_orders: u64,
    pub active_subscriptions: u64,
    /// Sum of all order totals.
    pub total_revenue: Decimal,
    /// Sum of recorded invoice payments.
    pub subscription_revenue: Decimal,
    pub recent_orders: Vec<order::Model>,
}

pub struct ReportService {
    db: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<SummaryReport, ServiceError> {
        let total_leads = MarketingLead::find().count(&*self.db).await?;
        let total_users = User::find().count(&*self.db).await?;
        let total_orders = Order::find().count(&*self.db).await?;
        let active_subscriptions = Subscription::find()
            .filter(subscription::Column::Status.eq(SubscriptionStatus::Active))
            .count(&*self.db)
            .await?;

        let orders = Order::find().all(&*self.db).await?;
        let total_revenue: Decimal = orders.iter().map(|o| o.total_amount).sum();

        let payments = Payment::find()
            .filter(payment::Column::Status.eq("paid"))
            .all(&*self.db)
            .await?;
        let subscription_revenue: Decimal = payments.iter().map(|p| p.amount).sum();

        let recent_orders = Order::find()
            .order_by_desc(order::Column::CreatedAt)
            .limit(RECENT_ORDERS_LIMIT)
            .all(&*self.db)
            .await?;

        Ok(SummaryReport {
            total_leads,
            total_users,
            total_orders,
            active_subscriptions,
            total_revenue,
            subscription_revenue,
            recent_orders,
        })
    }
}
