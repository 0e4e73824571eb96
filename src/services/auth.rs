use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{AccessToken, Profile},
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user_id
    pub iss: String, // issuer
    pub exp: i64,    // expiry
    pub iat: i64,    // issued at
}

pub struct AuthService {
    db: PgPool,
    config: Config,
}

impl AuthService {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self { db, config }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> AppResult<(Profile, AccessToken)> {
        let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM profiles WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        if existing.is_some() {
            return Err(AppError::UserAlreadyExists);
        }

        let password_hash = hash(password, DEFAULT_COST)
            .map_err(|e| anyhow::anyhow!("bcrypt failure: {}", e))?;

        // The SELECT above is only a fast path; concurrent registrations race
        // to the insert and lose on the unique index instead.
        let profile: Profile = sqlx::query_as(
            r#"
            INSERT INTO profiles (id, email, password_hash, full_name)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(&password_hash)
        .bind(full_name)
        .fetch_one(&self.db)
        .await
        .map_err(map_profile_insert_error)?;

        let token = self.issue_token(profile.id)?;
        Ok((profile, token))
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<(Profile, AccessToken)> {
        let profile: Option<Profile> = sqlx::query_as("SELECT * FROM profiles WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        let profile = profile.ok_or(AppError::InvalidCredentials)?;

        let valid = verify(password, &profile.password_hash)
            .map_err(|e| anyhow::anyhow!("bcrypt failure: {}", e))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.issue_token(profile.id)?;
        Ok((profile, token))
    }

    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<Profile> {
        let profile: Option<Profile> = sqlx::query_as("SELECT * FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;

        profile.ok_or(AppError::UserNotFound)
    }

    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.jwt.issuer]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })?;

        Ok(data.claims)
    }

    fn issue_token(&self, user_id: Uuid) -> AppResult<AccessToken> {
        let now = Utc::now();
        let expires_at =
            now + Duration::seconds(self.config.jwt.access_token_ttl.as_secs() as i64);

        let claims = Claims {
            sub: user_id.to_string(),
            iss: self.config.jwt.issuer.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt.secret.as_bytes()),
        )?;

        Ok(AccessToken {
            access_token,
            expires_at,
        })
    }
}

fn map_profile_insert_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::UserAlreadyExists,
        _ => AppError::Database(e),
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::error::Error as StdError;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct DuplicateEmail;

    impl std::fmt::Display for DuplicateEmail {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(
                f,
                "duplicate key value violates unique constraint \"profiles_email_key\""
            )
        }
    }

    impl StdError for DuplicateEmail {}

    impl DatabaseError for DuplicateEmail {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint \"profiles_email_key\""
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23505"))
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn duplicate_email_insert_maps_to_conflict() {
        let err = map_profile_insert_error(sqlx::Error::Database(Box::new(DuplicateEmail)));
        assert!(matches!(err, AppError::UserAlreadyExists));
    }

    #[test]
    fn other_insert_errors_stay_database_errors() {
        let err = map_profile_insert_error(sqlx::Error::PoolClosed);
        assert!(matches!(err, AppError::Database(_)));
    }
}
