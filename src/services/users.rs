use chrono::Utc;
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::user::{self, Entity as User};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

const REFERRAL_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const REFERRAL_CODE_ATTEMPTS: usize = 5;

/// Customer account management, including checkout-time account minting.
pub struct UserService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    referral_credit: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    /// Referral code of an existing user, credited once on first use.
    pub referral_code: Option<String>,
}

impl UserService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, referral_credit: f64) -> Self {
        Self {
            db,
            event_sender,
            referral_credit: Decimal::from_f64(referral_credit).unwrap_or(Decimal::ZERO),
        }
    }

    /// Creates or updates a user by email. Existing rows keep their id,
    /// referral code and credits; profile fields are refreshed.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn upsert(&self, req: UpsertUserRequest) -> Result<user::Model, ServiceError> {
        req.validate()?;

        let existing = User::find()
            .filter(user::Column::Email.eq(req.email.clone()))
            .one(&*self.db)
            .await?;

        if let Some(found) = existing {
            let mut active: user::ActiveModel = found.into();
            if req.phone.is_some() {
                active.phone = Set(req.phone);
            }
            if req.name.is_some() {
                active.name = Set(req.name);
            }
            if req.address.is_some() {
                active.address = Set(req.address);
            }
            active.updated_at = Set(Utc::now().into());
            let updated = active.update(&*self.db).await?;
            return Ok(updated);
        }

        let referred_by = match req.referral_code.as_deref() {
            Some(code) => self.credit_referrer(code).await?,
            None => None,
        };

        self.create(Some(req.email), req.phone, req.name, req.address, referred_by)
            .await
    }

    /// Finds a user for checkout migration: by email first, then phone.
    pub async fn find_by_identity(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Option<user::Model>, ServiceError> {
        if let Some(email) = email {
            let found = User::find()
                .filter(user::Column::Email.eq(email))
                .one(&*self.db)
                .await?;
            if found.is_some() {
                return Ok(found);
            }
        }
        if let Some(phone) = phone {
            let found = User::find()
                .filter(user::Column::Phone.eq(phone))
                .one(&*self.db)
                .await?;
            return Ok(found);
        }
        Ok(None)
    }

    /// Creates a fresh customer row with a unique referral code.
    #[instrument(skip(self, email, phone, name, address))]
    pub async fn create(
        &self,
        email: Option<String>,
        phone: Option<String>,
        name: Option<String>,
        address: Option<String>,
        referred_by: Option<Uuid>,
    ) -> Result<user::Model, ServiceError> {
        let referral_code = self.generate_referral_code().await?;
        let now = Utc::now().into();

        let active = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            phone: Set(phone),
            name: Set(name),
            role: Set("customer".to_string()),
            referral_code: Set(referral_code),
            credits: Set(Decimal::ZERO),
            address: Set(address),
            referred_by: Set(referred_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let saved = active.insert(&*self.db).await?;
        info!(user_id = %saved.id, "user created");
        self.event_sender
            .send(Event::UserCreated { user_id: saved.id })
            .await;
        Ok(saved)
    }

    pub async fn get(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        User::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))
    }

    /// Grants the referral credit to the code's owner and returns their id.
    /// An unknown code is ignored rather than failing signup.
    async fn credit_referrer(&self, code: &str) -> Result<Option<Uuid>, ServiceError> {
        let referrer = User::find()
            .filter(user::Column::ReferralCode.eq(code))
            .one(&*self.db)
            .await?;

        let Some(referrer) = referrer else {
            warn!(code, "unknown referral code ignored");
            return Ok(None);
        };

        let referrer_id = referrer.id;
        let new_credits = referrer.credits + self.referral_credit;
        let mut active: user::ActiveModel = referrer.into();
        active.credits = Set(new_credits);
        active.updated_at = Set(Utc::now().into());
        active.update(&*self.db).await?;
        info!(user_id = %referrer_id, "referral credit granted");
        Ok(Some(referrer_id))
    }

    /// `SLR` plus 6 characters from an unambiguous alphabet. Collisions
    /// are retried a few times before giving up.
    async fn generate_referral_code(&self) -> Result<String, ServiceError> {
        for _ in 0..REFERRAL_CODE_ATTEMPTS {
            let code = Self::random_referral_code();
            let taken = User::find()
                .filter(user::Column::ReferralCode.eq(code.clone()))
                .one(&*self.db)
                .await?
                .is_some();
            if !taken {
                return Ok(code);
            }
        }
        Err(ServiceError::InternalError(
            "Could not generate a unique referral code".to_string(),
        ))
    }

    fn random_referral_code() -> String {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..6)
            .map(|_| {
                let idx = rng.gen_range(0..REFERRAL_CODE_ALPHABET.len());
                REFERRAL_CODE_ALPHABET[idx] as char
            })
            .collect();
        format!("SLR{}", suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_codes_have_expected_shape() {
        for _ in 0..20 {
            let code = UserService::random_referral_code();
            assert_eq!(code.len(), 9);
            assert!(code.starts_with("SLR"));
            assert!(code[3..]
                .chars()
                .all(|c| REFERRAL_CODE_ALPHABET.contains(&(c as u8))));
        }
    }
}
