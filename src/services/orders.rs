use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::order::{self, Entity as Order, OrderStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Order reads and back-office status transitions. Orders are only ever
/// created by the checkout migration.
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    pub async fn get(&self, id: Uuid) -> Result<order::Model, ServiceError> {
        Order::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))
    }

    pub async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<order::Model>, ServiceError> {
        let found = Order::find()
            .filter(order::Column::PaymentIntentId.eq(payment_intent_id))
            .one(&*self.db)
            .await?;
        Ok(found)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<order::Model>, ServiceError> {
        let orders = Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(orders)
    }

    /// Paginated listing, newest first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let per_page = per_page.clamp(1, 100);
        let paginator = Order::find()
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((orders, total))
    }

    /// Moves an order along the installation workflow. Only forward
    /// transitions are allowed.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: Uuid,
        next: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let current = self.get(id).await?;

        if current.status == next {
            return Ok(current);
        }
        if !current.status.can_transition_to(next) {
            return Err(ServiceError::InvalidInput(format!(
                "Cannot move order from {:?} to {:?}",
                current.status, next
            )));
        }

        let from = current.status;
        let mut active: order::ActiveModel = current.into();
        active.status = Set(next);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&*self.db).await?;

        info!(order_id = %id, ?from, to = ?next, "order status changed");
        self.event_sender
            .send(Event::OrderStatusChanged {
                order_id: id,
                from: format!("{:?}", from),
                to: format!("{:?}", next),
            })
            .await;

        Ok(updated)
    }
}

/// Public order number shown to customers, distinct from the row id.
pub fn generate_order_number() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("SOL-{}", raw[..8].to_uppercase())
}
