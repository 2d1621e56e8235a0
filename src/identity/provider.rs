use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::claims::{IdentityClaims, Role};

/// Failures of the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The credential is missing, malformed, expired, or revoked.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
    /// The provider could not be reached or gave a malformed answer.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// An external service that turns bearer credentials into identity claims.
///
/// `verify` is the authentication path and is always fail-closed.
/// `role_of` is a secondary lookup consulted by the vote ledger's
/// administrator bar; its caller treats an error as "unknown" and proceeds.
#[rocket::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a bearer credential and return the claims it represents.
    async fn verify(&self, credential: &str) -> Result<IdentityClaims, IdentityError>;

    /// Look up the current role of a previously-verified identity.
    async fn role_of(&self, claims: &IdentityClaims) -> Result<Option<Role>, IdentityError>;
}

/// The JWT claims layout issued by the identity provider.
#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    sub: String,
    email: String,
    #[serde(default)]
    role: Option<Role>,
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    expire_at: DateTime<Utc>,
}

/// Identity provider validating provider-issued JWTs locally with a
/// shared secret. The role travels inside the signed token, so the role
/// lookup cannot fail independently of verification.
pub struct JwtIdentityProvider {
    secret: Vec<u8>,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: secret.to_vec(),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[rocket::async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn verify(&self, credential: &str) -> Result<IdentityClaims, IdentityError> {
        let token: TokenData<JwtClaims> = jsonwebtoken::decode(
            credential,
            &DecodingKey::from_secret(&self.secret),
            &self.validation,
        )
        .map_err(|e| IdentityError::InvalidCredential(e.to_string()))?;
        Ok(IdentityClaims {
            subject: token.claims.sub,
            email: token.claims.email,
            role: token.claims.role,
        })
    }

    async fn role_of(&self, claims: &IdentityClaims) -> Result<Option<Role>, IdentityError> {
        Ok(claims.role)
    }
}

/// The introspection endpoint's response shape.
#[derive(Debug, Deserialize)]
struct IntrospectionResponse {
    active: bool,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<Role>,
}

/// The subject-lookup endpoint's response shape.
#[derive(Debug, Deserialize)]
struct SubjectResponse {
    #[serde(default)]
    role: Option<Role>,
}

/// Identity provider backed by a remote token-introspection endpoint.
/// Both lookups can fail with [`IdentityError::Unavailable`] when the
/// provider is unreachable.
pub struct IntrospectionIdentityProvider {
    client: reqwest::Client,
    base_url: String,
}

impl IntrospectionIdentityProvider {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[rocket::async_trait]
impl IdentityProvider for IntrospectionIdentityProvider {
    async fn verify(&self, credential: &str) -> Result<IdentityClaims, IdentityError> {
        let response = self
            .client
            .post(format!("{}/introspect", self.base_url))
            .json(&TokenBody { token: credential })
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        let introspection: IntrospectionResponse = response
            .error_for_status()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if !introspection.active {
            return Err(IdentityError::InvalidCredential(
                "credential is not active".to_string(),
            ));
        }
        match (introspection.sub, introspection.email) {
            (Some(subject), Some(email)) => Ok(IdentityClaims {
                subject,
                email,
                role: introspection.role,
            }),
            _ => Err(IdentityError::Unavailable(
                "introspection response missing subject or email".to_string(),
            )),
        }
    }

    async fn role_of(&self, claims: &IdentityClaims) -> Result<Option<Role>, IdentityError> {
        let response = self
            .client
            .get(format!("{}/subjects/{}", self.base_url, claims.subject))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        let subject: SubjectResponse = response
            .error_for_status()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        Ok(subject.role)
    }
}

/// The introspection request body.
#[derive(Debug, Serialize)]
struct TokenBody<'a> {
    token: &'a str,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};

    use super::*;

    const SECRET: &[u8] = b"test-secret";

    fn token_for(sub: &str, role: Option<Role>, ttl: Duration) -> String {
        let claims = JwtClaims {
            sub: sub.to_string(),
            email: format!("{sub}@example.com"),
            role,
            expire_at: Utc::now() + ttl,
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
    }

    #[rocket::async_test]
    async fn verify_accepts_valid_token() {
        let provider = JwtIdentityProvider::new(SECRET);
        let token = token_for("subject-1", None, Duration::minutes(5));

        let claims = provider.verify(&token).await.unwrap();
        assert_eq!(claims.subject, "subject-1");
        assert_eq!(claims.email, "subject-1@example.com");
        assert_eq!(claims.role, None);
        assert!(!claims.is_admin());
    }

    #[rocket::async_test]
    async fn verify_extracts_role_claim() {
        let provider = JwtIdentityProvider::new(SECRET);
        let token = token_for("subject-2", Some(Role::Admin), Duration::minutes(5));

        let claims = provider.verify(&token).await.unwrap();
        assert!(claims.is_admin());
        assert_eq!(provider.role_of(&claims).await.unwrap(), Some(Role::Admin));
    }

    #[rocket::async_test]
    async fn verify_rejects_wrong_secret() {
        let provider = JwtIdentityProvider::new(b"a-different-secret");
        let token = token_for("subject-3", None, Duration::minutes(5));

        let result = provider.verify(&token).await;
        assert!(matches!(result, Err(IdentityError::InvalidCredential(_))));
    }

    #[rocket::async_test]
    async fn verify_rejects_expired_token() {
        let provider = JwtIdentityProvider::new(SECRET);
        let token = token_for("subject-4", None, Duration::minutes(-5));

        let result = provider.verify(&token).await;
        assert!(matches!(result, Err(IdentityError::InvalidCredential(_))));
    }

    #[rocket::async_test]
    async fn verify_rejects_garbage() {
        let provider = JwtIdentityProvider::new(SECRET);

        let result = provider.verify("not-a-token").await;
        assert!(matches!(result, Err(IdentityError::InvalidCredential(_))));
    }
}
