use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::entities::funnel_session::{self, Entity as FunnelSession, SessionStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::pricing::{self, PricingParams};

/// One uploaded document tracked on a funnel session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    pub doc_type: String,
    pub file_key: String,
}

/// Client-sent funnel update, tagged by `updateType`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "updateType", content = "data")]
pub enum SessionUpdate {
    #[serde(rename = "PLAN_UPDATE", rename_all = "camelCase")]
    PlanUpdate { system_type: String },
    #[serde(rename = "STRUCTURE_UPDATE", rename_all = "camelCase")]
    StructureUpdate { structure_type: String },
    #[serde(rename = "HARDWARE_UPDATE", rename_all = "camelCase")]
    HardwareUpdate {
        panel_technology: Option<String>,
        panel_brand: Option<String>,
        inverter_brand: Option<String>,
    },
    #[serde(rename = "DOC_UPLOAD", rename_all = "camelCase")]
    DocUpload { doc_type: String, file_key: String },
    #[serde(rename = "FETCH")]
    Fetch,
}

impl SessionUpdate {
    fn kind(&self) -> &'static str {
        match self {
            Self::PlanUpdate { .. } => "PLAN_UPDATE",
            Self::StructureUpdate { .. } => "STRUCTURE_UPDATE",
            Self::HardwareUpdate { .. } => "HARDWARE_UPDATE",
            Self::DocUpload { .. } => "DOC_UPLOAD",
            Self::Fetch => "FETCH",
        }
    }

    fn is_mutation(&self) -> bool {
        !matches!(self, Self::Fetch)
    }
}

/// Funnel session state returned to the client.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub status: SessionStatus,
    pub system_type: Option<String>,
    pub kw_size: Option<i32>,
    pub base_price: Option<Decimal>,
    pub structure_type: Option<String>,
    pub structure_surcharge: Option<Decimal>,
    pub panel_technology: Option<String>,
    pub panel_brand: Option<String>,
    pub inverter_brand: Option<String>,
    pub total_system_cost: Option<Decimal>,
    pub gst_amount: Option<Decimal>,
    pub final_total: Option<Decimal>,
    pub monthly_emi: Option<Decimal>,
    pub currency: String,
    pub documents: Vec<SessionDocument>,
}

impl From<funnel_session::Model> for SessionView {
    fn from(m: funnel_session::Model) -> Self {
        let documents = serde_json::from_value(m.documents.clone()).unwrap_or_default();
        SessionView {
            session_id: m.session_id,
            status: m.status,
            system_type: m.system_type,
            kw_size: m.kw_size,
            base_price: m.base_price,
            structure_type: m.structure_type,
            structure_surcharge: m.structure_surcharge,
            panel_technology: m.panel_technology,
            panel_brand: m.panel_brand,
            inverter_brand: m.inverter_brand,
            total_system_cost: m.total_system_cost,
            gst_amount: m.gst_amount,
            final_total: m.final_total,
            monthly_emi: m.monthly_emi,
            currency: m.currency,
            documents,
        }
    }
}

/// Holds the funnel session state machine and the quote recomputation
/// that follows every selection change.
pub struct FunnelService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    pricing: PricingParams,
}

impl FunnelService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, pricing: PricingParams) -> Self {
        Self {
            db,
            event_sender,
            pricing,
        }
    }

    /// Applies one update to the session, creating the session on first
    /// use. Mutations recompute the quote before persisting.
    #[instrument(skip(self, update), fields(update_type = update.kind()))]
    pub async fn apply_update(
        &self,
        session_id: &str,
        update: SessionUpdate,
    ) -> Result<SessionView, ServiceError> {
        if session_id.is_empty() {
            return Err(ServiceError::ValidationError(
                "sessionId is required".to_string(),
            ));
        }

        let existing = FunnelSession::find_by_id(session_id).one(&*self.db).await?;

        if let SessionUpdate::Fetch = update {
            let model = match existing {
                Some(m) => m,
                None => self.create_session(session_id).await?,
            };
            return Ok(model.into());
        }

        let model = match existing {
            Some(m) => m,
            None => self.create_session(session_id).await?,
        };

        if model.status == SessionStatus::Converted && update.is_mutation() {
            return Err(ServiceError::Conflict(format!(
                "Funnel session {} is already converted",
                session_id
            )));
        }

        let update_type = update.kind();
        let mut active: funnel_session::ActiveModel = model.into();

        match update {
            SessionUpdate::PlanUpdate { system_type } => {
                let plan = pricing::system_plan(&system_type).ok_or_else(|| {
                    ServiceError::ValidationError(format!("Unknown system type: {}", system_type))
                })?;
                active.system_type = Set(Some(system_type));
                active.kw_size = Set(Some(plan.kw_size));
                active.base_price = Set(Some(plan.base_price));
            }
            SessionUpdate::StructureUpdate { structure_type } => {
                let surcharge = pricing::structure_surcharge(&structure_type).ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "Unknown structure type: {}",
                        structure_type
                    ))
                })?;
                active.structure_type = Set(Some(structure_type));
                active.structure_surcharge = Set(Some(surcharge));
            }
            SessionUpdate::HardwareUpdate {
                panel_technology,
                panel_brand,
                inverter_brand,
            } => {
                // Partial merge: only supplied fields change.
                if let Some(tech) = panel_technology {
                    active.panel_technology = Set(Some(tech));
                }
                if let Some(brand) = panel_brand {
                    active.panel_brand = Set(Some(brand));
                }
                if let Some(brand) = inverter_brand {
                    active.inverter_brand = Set(Some(brand));
                }
            }
            SessionUpdate::DocUpload { doc_type, file_key } => {
                let current = active.documents.clone().unwrap();
                let mut docs: Vec<SessionDocument> =
                    serde_json::from_value(current).unwrap_or_default();
                match docs.iter_mut().find(|d| d.doc_type == doc_type) {
                    Some(existing) => existing.file_key = file_key,
                    None => docs.push(SessionDocument { doc_type, file_key }),
                }
                active.documents = Set(serde_json::to_value(docs)?);
            }
            SessionUpdate::Fetch => unreachable!("handled above"),
        }

        self.recompute_quote(&mut active);
        active.updated_at = Set(Utc::now().into());

        let saved = active.update(&*self.db).await?;
        info!(session_id = %saved.session_id, update_type, "funnel session updated");

        self.event_sender
            .send(Event::FunnelSessionUpdated {
                session_id: saved.session_id.clone(),
                update_type: update_type.to_string(),
            })
            .await;

        Ok(saved.into())
    }

    async fn create_session(
        &self,
        session_id: &str,
    ) -> Result<funnel_session::Model, ServiceError> {
        let now = Utc::now().into();
        let fresh = funnel_session::ActiveModel {
            session_id: Set(session_id.to_string()),
            status: Set(SessionStatus::Active),
            system_type: Set(None),
            kw_size: Set(None),
            base_price: Set(None),
            structure_type: Set(None),
            structure_surcharge: Set(None),
            panel_technology: Set(None),
            panel_brand: Set(None),
            inverter_brand: Set(None),
            total_system_cost: Set(None),
            gst_amount: Set(None),
            final_total: Set(None),
            monthly_emi: Set(None),
            currency: Set(self.pricing.currency.clone()),
            documents: Set(serde_json::json!([])),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = fresh.insert(&*self.db).await?;
        info!(session_id, "funnel session created");
        Ok(saved)
    }

    /// Quote is derived purely from the persisted selection. Without a
    /// chosen plan there is nothing to price.
    fn recompute_quote(&self, active: &mut funnel_session::ActiveModel) {
        let base_price = active.base_price.clone().unwrap();
        let Some(base) = base_price else {
            return;
        };
        let surcharge = active
            .structure_surcharge
            .clone()
            .unwrap()
            .unwrap_or(Decimal::ZERO);

        let quote = pricing::compute_quote(base, surcharge, &self.pricing);
        active.total_system_cost = Set(Some(quote.total_system_cost));
        active.gst_amount = Set(Some(quote.gst_amount));
        active.final_total = Set(Some(quote.final_total));
        active.monthly_emi = Set(Some(quote.monthly_emi));
        active.currency = Set(quote.currency);
    }
}
