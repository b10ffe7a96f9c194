use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::marketing_lead::{self, Entity as MarketingLead};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Captures leads from the marketing site and opens funnel sessions.
pub struct LeadService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptureLeadRequest {
    #[validate(length(min = 7, max = 15, message = "Phone must be 7-15 characters"))]
    pub phone: String,
    #[validate(length(equal = 6, message = "Pincode must be 6 digits"))]
    pub pincode: String,
    pub source: Option<String>,
}

impl LeadService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Stores a new lead and returns the funnel session id the client
    /// should use for all subsequent funnel calls.
    #[instrument(skip(self, req), fields(pincode = %req.pincode))]
    pub async fn capture(
        &self,
        req: CaptureLeadRequest,
    ) -> Result<marketing_lead::Model, ServiceError> {
        req.validate()?;
        if !req.pincode.chars().all(|c| c.is_ascii_digit()) {
            return Err(ServiceError::ValidationError(
                "Pincode must be numeric".to_string(),
            ));
        }

        let session_id = format!("fs_{}", Uuid::new_v4().simple());
        let now = Utc::now().into();

        let lead = marketing_lead::ActiveModel {
            id: Set(Uuid::new_v4()),
            session_id: Set(session_id),
            phone: Set(req.phone),
            pincode: Set(req.pincode),
            source: Set(req.source),
            status: Set("new".to_string()),
            created_at: Set(now),
        };

        let saved = lead.insert(&*self.db).await?;
        info!(lead_id = %saved.id, session_id = %saved.session_id, "lead captured");

        self.event_sender
            .send(Event::LeadCaptured {
                lead_id: saved.id,
                session_id: saved.session_id.clone(),
            })
            .await;

        Ok(saved)
    }

    /// Looks up the lead that opened a funnel session.
    pub async fn find_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<marketing_lead::Model>, ServiceError> {
        let lead = MarketingLead::find()
            .filter(marketing_lead::Column::SessionId.eq(session_id))
            .one(&*self.db)
            .await?;
        Ok(lead)
    }

    /// Paginated admin listing, newest first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<marketing_lead::Model>, u64), ServiceError> {
        let per_page = per_page.clamp(1, 100);
        let paginator = MarketingLead::find()
            .order_by_desc(marketing_lead::Column::CreatedAt)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let leads = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((leads, total))
    }
}
