use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::funnel_session::{self, Entity as FunnelSession, SessionStatus};
use crate::entities::marketing_lead::{self, Entity as MarketingLead};
use crate::entities::order::{self, Entity as Order, OrderStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::gateway::{PaymentGateway, PaymentIntent};
use crate::services::orders::generate_order_number;
use crate::services::users::UserService;

/// Result of migrating a paid funnel session into an order.
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub order_id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub amount: Decimal,
}

/// Drives the money path: payment intent creation, payment verification
/// and the idempotent session-to-order migration.
pub struct CheckoutService {
    db: Arc<DbPool>,
    gateway: Arc<dyn PaymentGateway>,
    users: Arc<UserService>,
    event_sender: Arc<EventSender>,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DbPool>,
        gateway: Arc<dyn PaymentGateway>,
        users: Arc<UserService>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            gateway,
            users,
            event_sender,
        }
    }

    /// Creates a payment intent for the session's quoted total.
    #[instrument(skip(self))]
    pub async fn create_payment(&self, session_id: &str) -> Result<PaymentIntent, ServiceError> {
        let session = self.load_session(session_id).await?;
        let final_total = session.final_total.ok_or_else(|| {
            ServiceError::ValidationError(
                "Session has no quote yet; choose a system plan first".to_string(),
            )
        })?;
        if final_total <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Quoted total must be positive".to_string(),
            ));
        }

        let amount_minor = to_minor_units(final_total)?;
        let intent = self
            .gateway
            .create_payment_intent(
                amount_minor,
                &session.currency,
                &[("session_id", session_id)],
            )
            .await?;

        info!(session_id, intent_id = %intent.id, amount_minor, "payment intent created");
        Ok(intent)
    }

    /// Client-initiated confirmation: checks the intent really succeeded
    /// at the provider, then migrates.
    #[instrument(skip(self))]
    pub async fn verify_payment(
        &self,
        session_id: &str,
        payment_intent_id: &str,
        email: Option<String>,
    ) -> Result<MigrationOutcome, ServiceError> {
        let intent = self.gateway.retrieve_payment_intent(payment_intent_id).await?;
        if intent.status != "succeeded" {
            return Err(ServiceError::PaymentFailed(format!(
                "Payment intent is {}, not succeeded",
                intent.status
            )));
        }
        self.migrate(session_id, payment_intent_id, email).await
    }

    /// Converts a paid session into an order. Safe to call repeatedly
    /// for the same payment intent; only the first call writes.
    #[instrument(skip(self, email))]
    pub async fn migrate(
        &self,
        session_id: &str,
        payment_intent_id: &str,
        email: Option<String>,
    ) -> Result<MigrationOutcome, ServiceError> {
        // Idempotency check before anything else. Webhook delivery and
        // the client's verify call race each other routinely.
        if let Some(existing) = self.find_order_by_intent(payment_intent_id).await? {
            info!(order_id = %existing.id, "migration already done for this payment intent");
            return Ok(outcome_from(existing));
        }

        let session = self.load_session(session_id).await?;
        let final_total = session.final_total.ok_or_else(|| {
            ServiceError::ValidationError("Session has no computed quote".to_string())
        })?;
        let system_type = session.system_type.clone().ok_or_else(|| {
            ServiceError::ValidationError("Session has no system plan selected".to_string())
        })?;

        let lead_phone = self.lead_phone(session_id).await?;
        let user = match self
            .users
            .find_by_identity(email.as_deref(), lead_phone.as_deref())
            .await?
        {
            Some(found) => found,
            None => {
                self.users
                    .create(email.clone(), lead_phone, None, None, None)
                    .await?
            }
        };

        let now = Utc::now().into();
        let active = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(generate_order_number()),
            payment_intent_id: Set(Some(payment_intent_id.to_string())),
            user_id: Set(user.id),
            session_id: Set(session_id.to_string()),
            system_type: Set(system_type),
            kw_size: Set(session.kw_size.unwrap_or(0)),
            structure_type: Set(session.structure_type.clone()),
            panel_technology: Set(session.panel_technology.clone()),
            panel_brand: Set(session.panel_brand.clone()),
            inverter_brand: Set(session.inverter_brand.clone()),
            base_price: Set(session.base_price.unwrap_or(Decimal::ZERO)),
            structure_surcharge: Set(session.structure_surcharge.unwrap_or(Decimal::ZERO)),
            gst_amount: Set(session.gst_amount.unwrap_or(Decimal::ZERO)),
            total_amount: Set(final_total),
            amount_paid: Set(final_total),
            currency: Set(session.currency.clone()),
            status: Set(OrderStatus::Processing),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let saved = match active.insert(&*self.db).await {
            Ok(saved) => saved,
            // Lost an insert race on the unique payment_intent_id; the
            // winner's row is the answer.
            Err(insert_err) => match self.find_order_by_intent(payment_intent_id).await? {
                Some(existing) => {
                    warn!(payment_intent_id, "migration insert raced, reusing existing order");
                    existing
                }
                None => return Err(insert_err.into()),
            },
        };

        self.mark_session_converted(session).await?;

        info!(
            order_id = %saved.id,
            order_number = %saved.order_number,
            user_id = %saved.user_id,
            "funnel session migrated to order"
        );
        self.event_sender
            .send(Event::OrderCreated {
                order_id: saved.id,
                order_number: saved.order_number.clone(),
                user_id: saved.user_id,
            })
            .await;

        Ok(outcome_from(saved))
    }

    async fn load_session(
        &self,
        session_id: &str,
    ) -> Result<funnel_session::Model, ServiceError> {
        FunnelSession::find_by_id(session_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Funnel session {} not found", session_id))
            })
    }

    async fn find_order_by_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<order::Model>, ServiceError> {
        let found = Order::find()
            .filter(order::Column::PaymentIntentId.eq(payment_intent_id))
            .one(&*self.db)
            .await?;
        Ok(found)
    }

    async fn lead_phone(&self, session_id: &str) -> Result<Option<String>, ServiceError> {
        let lead = MarketingLead::find()
            .filter(marketing_lead::Column::SessionId.eq(session_id))
            .one(&*self.db)
            .await?;
        Ok(lead.map(|l| l.phone))
    }

    async fn mark_session_converted(
        &self,
        session: funnel_session::Model,
    ) -> Result<(), ServiceError> {
        if session.status == SessionStatus::Converted {
            return Ok(());
        }
        let mut active: funnel_session::ActiveModel = session.into();
        active.status = Set(SessionStatus::Converted);
        active.updated_at = Set(Utc::now().into());
        active.update(&*self.db).await?;
        Ok(())
    }
}

fn outcome_from(order: order::Model) -> MigrationOutcome {
    MigrationOutcome {
        order_id: order.id,
        order_number: order.order_number,
        user_id: order.user_id,
        amount: order.total_amount,
    }
}

/// Converts a major-unit amount to the currency's minor unit (paise).
fn to_minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    (amount * dec!(100))
        .round()
        .to_i64()
        .ok_or_else(|| ServiceError::InternalError("Amount out of range".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_unit_conversion() {
        assert_eq!(to_minor_units(dec!(18900)).unwrap(), 1_890_000);
        assert_eq!(to_minor_units(dec!(315.50)).unwrap(), 31_550);
        assert_eq!(to_minor_units(dec!(0.004)).unwrap(), 0);
    }
}
