use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::payment;
use crate::entities::plan::{self, Entity as Plan};
use crate::entities::subscription::{self, Entity as Subscription, SubscriptionStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::gateway::{CheckoutSessionRequest, PaymentGateway};
use crate::services::users::UserService;

/// Fallback billing window when the provider event carries no period.
const DEFAULT_PERIOD_DAYS: i64 = 30;

pub struct SubscriptionService {
    db: Arc<DbPool>,
    gateway: Arc<dyn PaymentGateway>,
    users: Arc<UserService>,
    event_sender: Arc<EventSender>,
    success_url: String,
    cancel_url: String,
}

/// Result of opening a checkout for a plan.
#[derive(Debug, Clone)]
pub struct CheckoutStarted {
    pub subscription_id: Uuid,
    pub checkout_url: Option<String>,
}

impl SubscriptionService {
    pub fn new(
        db: Arc<DbPool>,
        gateway: Arc<dyn PaymentGateway>,
        users: Arc<UserService>,
        event_sender: Arc<EventSender>,
        success_url: String,
        cancel_url: String,
    ) -> Self {
        Self {
            db,
            gateway,
            users,
            event_sender,
            success_url,
            cancel_url,
        }
    }

    pub async fn list_plans(&self) -> Result<Vec<plan::Model>, ServiceError> {
        let plans = Plan::find()
            .order_by_asc(plan::Column::Price)
            .all(&*self.db)
            .await?;
        Ok(plans)
    }

    /// Opens a hosted checkout session and stores a pending subscription
    /// keyed by the checkout session id.
    #[instrument(skip(self))]
    pub async fn start_checkout(
        &self,
        user_id: Uuid,
        plan_id: &str,
    ) -> Result<CheckoutStarted, ServiceError> {
        let user = self.users.get(user_id).await?;
        let plan = Plan::find_by_id(plan_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Plan {} not found", plan_id)))?;

        let price_id = plan.provider_price_id.clone().ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Plan {} is not enabled for online checkout",
                plan_id
            ))
        })?;

        let subscription_id = Uuid::new_v4();
        let checkout = self
            .gateway
            .create_checkout_session(CheckoutSessionRequest {
                price_id,
                customer_email: user.email.clone(),
                success_url: self.success_url.clone(),
                cancel_url: self.cancel_url.clone(),
                reference_id: subscription_id.to_string(),
            })
            .await?;

        let now = Utc::now().into();
        let active = subscription::ActiveModel {
            id: Set(subscription_id),
            user_id: Set(user_id),
            plan_id: Set(plan.id.clone()),
            status: Set(SubscriptionStatus::Pending),
            checkout_session_id: Set(Some(checkout.id.clone())),
            provider_subscription_id: Set(None),
            current_period_start: Set(None),
            current_period_end: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        active.insert(&*self.db).await?;

        info!(%subscription_id, plan_id, "subscription checkout started");
        self.event_sender
            .send(Event::SubscriptionCreated {
                subscription_id,
                plan_id: plan.id,
            })
            .await;

        Ok(CheckoutStarted {
            subscription_id,
            checkout_url: checkout.url,
        })
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<subscription::Model>, ServiceError> {
        let subs = Subscription::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .order_by_desc(subscription::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(subs)
    }

    /// Activates the subscription matching a completed checkout session.
    /// Repeated delivery of the same event leaves an active row alone.
    #[instrument(skip(self))]
    pub async fn activate_from_checkout(
        &self,
        checkout_session_id: &str,
        provider_subscription_id: Option<String>,
        period_start: Option<chrono::DateTime<Utc>>,
        period_end: Option<chrono::DateTime<Utc>>,
    ) -> Result<(), ServiceError> {
        let found = Subscription::find()
            .filter(subscription::Column::CheckoutSessionId.eq(checkout_session_id))
            .one(&*self.db)
            .await?;

        let Some(sub) = found else {
            warn!(checkout_session_id, "checkout completed for unknown subscription");
            return Ok(());
        };
        if sub.status == SubscriptionStatus::Active {
            return Ok(());
        }

        let subscription_id = sub.id;
        let start = period_start.unwrap_or_else(Utc::now);
        let end = period_end.unwrap_or(start + Duration::days(DEFAULT_PERIOD_DAYS));

        let mut active: subscription::ActiveModel = sub.into();
        active.status = Set(SubscriptionStatus::Active);
        active.provider_subscription_id = Set(provider_subscription_id);
        active.current_period_start = Set(Some(start.into()));
        active.current_period_end = Set(Some(end.into()));
        active.updated_at = Set(Utc::now().into());
        active.update(&*self.db).await?;

        info!(%subscription_id, "subscription activated");
        self.event_sender
            .send(Event::SubscriptionActivated { subscription_id })
            .await;
        Ok(())
    }

    /// Records an invoice payment once. Duplicate invoices are no-ops
    /// thanks to the unique invoice id column.
    #[instrument(skip(self))]
    pub async fn record_invoice_payment(
        &self,
        invoice_id: &str,
        provider_subscription_id: Option<&str>,
        amount_minor: i64,
        currency: &str,
    ) -> Result<(), ServiceError> {
        let existing = payment::Entity::find()
            .filter(payment::Column::InvoiceId.eq(invoice_id))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Ok(());
        }

        let linked = match provider_subscription_id {
            Some(psid) => {
                Subscription::find()
                    .filter(subscription::Column::ProviderSubscriptionId.eq(psid))
                    .one(&*self.db)
                    .await?
            }
            None => None,
        };

        let amount = rust_decimal::Decimal::from(amount_minor) / dec!(100);
        let active = payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice_id.to_string()),
            subscription_id: Set(linked.as_ref().map(|s| s.id)),
            user_id: Set(linked.as_ref().map(|s| s.user_id)),
            amount: Set(amount),
            currency: Set(currency.to_uppercase()),
            status: Set("paid".to_string()),
            received_at: Set(Utc::now().into()),
        };

        match active.insert(&*self.db).await {
            Ok(_) => {
                info!(invoice_id, "invoice payment recorded");
                self.event_sender
                    .send(Event::InvoicePaymentRecorded {
                        invoice_id: invoice_id.to_string(),
                    })
                    .await;
                Ok(())
            }
            // Replayed webhook racing itself; the first write stands.
            Err(_) if self.invoice_exists(invoice_id).await? => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn invoice_exists(&self, invoice_id: &str) -> Result<bool, ServiceError> {
        Ok(payment::Entity::find()
            .filter(payment::Column::InvoiceId.eq(invoice_id))
            .one(&*self.db)
            .await?
            .is_some())
    }
}

/// Seeds the maintenance plan catalog when empty. Called at startup.
pub async fn seed_default_plans(db: &DbPool) -> Result<(), ServiceError> {
    use sea_orm::PaginatorTrait;

    if Plan::find().count(db).await? > 0 {
        return Ok(());
    }

    let now = Utc::now().into();
    let plans = vec![
        plan::ActiveModel {
            id: Set("care_basic".to_string()),
            name: Set("Solar Care Basic".to_string()),
            price: Set(dec!(499)),
            currency: Set("INR".to_string()),
            interval: Set("month".to_string()),
            provider_price_id: Set(None),
            created_at: Set(now),
        },
        plan::ActiveModel {
            id: Set("care_plus".to_string()),
            name: Set("Solar Care Plus".to_string()),
            price: Set(dec!(999)),
            currency: Set("INR".to_string()),
            interval: Set("month".to_string()),
            provider_price_id: Set(None),
            created_at: Set(now),
        },
        plan::ActiveModel {
            id: Set("care_annual".to_string()),
            name: Set("Solar Care Annual".to_string()),
            price: Set(dec!(9999)),
            currency: Set("INR".to_string()),
            interval: Set("year".to_string()),
            provider_price_id: Set(None),
            created_at: Set(now),
        },
    ];

    for p in plans {
        p.insert(db).await?;
    }
    info!("seeded default maintenance plans");
    Ok(())
}
