use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::document::{self, Entity as Document, DocumentStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::storage::{document_key, DocumentStore};

/// Stores customer documents and tracks their review state.
pub struct DocumentService {
    db: Arc<DbPool>,
    store: Arc<dyn DocumentStore>,
    event_sender: Arc<EventSender>,
}

impl DocumentService {
    pub fn new(
        db: Arc<DbPool>,
        store: Arc<dyn DocumentStore>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            store,
            event_sender,
        }
    }

    /// Issues the key and PUT target for a direct funnel upload.
    pub fn upload_target(
        &self,
        base_url: &str,
        session_id: &str,
        file_name: &str,
    ) -> Result<(String, String), ServiceError> {
        if session_id.is_empty() || file_name.is_empty() {
            return Err(ServiceError::ValidationError(
                "sessionId and fileName are required".to_string(),
            ));
        }
        let key = document_key(session_id, file_name);
        let url = self.store.upload_url(base_url, &key);
        Ok((url, key))
    }

    /// Stores raw bytes under an already issued key.
    pub async fn store_raw(&self, key: &str, bytes: &[u8]) -> Result<(), ServiceError> {
        if bytes.is_empty() {
            return Err(ServiceError::ValidationError(
                "Upload body is empty".to_string(),
            ));
        }
        self.store.put(key, bytes).await
    }

    /// Stores an uploaded file and creates its pending review row.
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub async fn upload(
        &self,
        owner_user_id: Option<Uuid>,
        order_id: Option<Uuid>,
        doc_type: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<document::Model, ServiceError> {
        if doc_type.is_empty() {
            return Err(ServiceError::ValidationError(
                "docType is required".to_string(),
            ));
        }
        if bytes.is_empty() {
            return Err(ServiceError::ValidationError(
                "Uploaded file is empty".to_string(),
            ));
        }

        let scope = owner_user_id
            .map(|u| u.to_string())
            .unwrap_or_else(|| "anonymous".to_string());
        let key = document_key(&scope, file_name);
        self.store.put(&key, bytes).await?;

        let now = Utc::now().into();
        let active = document::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_user_id: Set(owner_user_id),
            order_id: Set(order_id),
            doc_type: Set(doc_type.to_string()),
            file_key: Set(key),
            status: Set(DocumentStatus::Pending),
            reviewed_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = active.insert(&*self.db).await?;

        info!(document_id = %saved.id, doc_type, "document uploaded");
        self.event_sender
            .send(Event::DocumentUploaded {
                document_id: saved.id,
                doc_type: doc_type.to_string(),
            })
            .await;
        Ok(saved)
    }

    pub async fn get(&self, id: Uuid) -> Result<document::Model, ServiceError> {
        Document::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Document {} not found", id)))
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<document::Model>, ServiceError> {
        let docs = Document::find()
            .filter(document::Column::OwnerUserId.eq(user_id))
            .order_by_desc(document::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(docs)
    }

    /// Admin review: approve or reject and stamp the reviewer.
    #[instrument(skip(self))]
    pub async fn review(
        &self,
        id: Uuid,
        approved: bool,
        reviewed_by: &str,
    ) -> Result<document::Model, ServiceError> {
        let doc = self.get(id).await?;
        let mut active: document::ActiveModel = doc.into();
        active.status = Set(if approved {
            DocumentStatus::Approved
        } else {
            DocumentStatus::Rejected
        });
        active.reviewed_by = Set(Some(reviewed_by.to_string()));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&*self.db).await?;

        info!(document_id = %id, approved, "document reviewed");
        self.event_sender
            .send(Event::DocumentReviewed {
                document_id: id,
                approved,
            })
            .await;
        Ok(updated)
    }
}
