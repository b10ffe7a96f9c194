pub mod document;
pub mod funnel_session;
pub mod marketing_lead;
pub mod order;
pub mod payment;
pub mod plan;
pub mod subscription;
pub mod user;

pub use document::Entity as Document;
pub use funnel_session::Entity as FunnelSession;
pub use marketing_lead::Entity as MarketingLead;
pub use order::Entity as Order;
pub use payment::Entity as Payment;
pub use plan::Entity as Plan;
pub use subscription::Entity as Subscription;
pub use user::Entity as User;
