pub mod checkout;
pub mod documents;
pub mod funnel;
pub mod gateway;
pub mod leads;
pub mod orders;
pub mod reports;
pub mod storage;
pub mod subscriptions;
pub mod users;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::pricing::PricingParams;

use checkout::CheckoutService;
use documents::DocumentService;
use funnel::FunnelService;
use gateway::PaymentGateway;
use leads::LeadService;
use orders::OrderService;
use reports::ReportService;
use storage::DocumentStore;
use subscriptions::SubscriptionService;
use users::UserService;

/// All services, constructed once at startup and shared via the axum
/// state. Services take their collaborators explicitly; nothing global.
#[derive(Clone)]
pub struct AppServices {
    pub leads: Arc<LeadService>,
    pub funnel: Arc<FunnelService>,
    pub checkout: Arc<CheckoutService>,
    pub users: Arc<UserService>,
    pub orders: Arc<OrderService>,
    pub subscriptions: Arc<SubscriptionService>,
    pub documents: Arc<DocumentService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        config: &AppConfig,
        event_sender: Arc<EventSender>,
        gateway: Arc<dyn PaymentGateway>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let pricing = PricingParams::from_config(config);

        let users = Arc::new(UserService::new(
            db.clone(),
            event_sender.clone(),
            config.referral_credit,
        ));
        let leads = Arc::new(LeadService::new(db.clone(), event_sender.clone()));
        let funnel = Arc::new(FunnelService::new(
            db.clone(),
            event_sender.clone(),
            pricing,
        ));
        let checkout = Arc::new(CheckoutService::new(
            db.clone(),
            gateway.clone(),
            users.clone(),
            event_sender.clone(),
        ));
        let orders = Arc::new(OrderService::new(db.clone(), event_sender.clone()));
        let subscriptions = Arc::new(SubscriptionService::new(
            db.clone(),
            gateway,
            users.clone(),
            event_sender.clone(),
            config.checkout_success_url.clone(),
            config.checkout_cancel_url.clone(),
        ));
        let documents = Arc::new(DocumentService::new(db.clone(), store, event_sender));
        let reports = Arc::new(ReportService::new(db));

        Self {
            leads,
            funnel,
            checkout,
            users,
            orders,
            subscriptions,
            documents,
            reports,
        }
    }
}
