//! Reqwest-backed token verification against the identity provider.
//!
//! This adapter owns transport details only: the introspection request,
//! timeout and HTTP error mapping, and decoding the claims into an
//! [`Actor`]. Token policy (expiry, revocation) lives with the provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::domain::ports::{TokenVerificationError, TokenVerifier};
use crate::domain::{Actor, Role};

const DEFAULT_INTROSPECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Claims returned by the provider's introspection endpoint.
#[derive(Debug, Deserialize)]
struct IntrospectionDto {
    active: bool,
    sub: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

/// [`TokenVerifier`] that introspects bearer tokens over HTTP.
pub struct HttpTokenVerifier {
    client: Client,
    endpoint: Url,
}

impl HttpTokenVerifier {
    /// Build a verifier with the default introspection timeout.
    ///
    /// # Errors
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url) -> Result<Self, reqwest::Error> {
        Self::with_timeout(endpoint, DEFAULT_INTROSPECTION_TIMEOUT)
    }

    /// Build a verifier with an explicit request timeout.
    ///
    /// # Errors
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl TokenVerifier for HttpTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Actor, TokenVerificationError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[("token", token)])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            // Introspection reports inactive tokens in the body, so a
            // non-success status is a provider fault, not a verdict.
            return Err(TokenVerificationError::unavailable(format!(
                "introspection returned status {}",
                status.as_u16()
            )));
        }

        let claims: IntrospectionDto = response.json().await.map_err(|error| {
            TokenVerificationError::unavailable(format!("invalid introspection payload: {error}"))
        })?;
        actor_from_claims(claims)
    }
}

fn map_transport_error(error: reqwest::Error) -> TokenVerificationError {
    TokenVerificationError::unavailable(error.to_string())
}

fn actor_from_claims(claims: IntrospectionDto) -> Result<Actor, TokenVerificationError> {
    if !claims.active {
        return Err(TokenVerificationError::invalid("token is not active"));
    }
    let subject = claims
        .sub
        .ok_or_else(|| TokenVerificationError::invalid("claims carry no subject"))?;
    let id = subject
        .parse()
        .map_err(|_| TokenVerificationError::invalid("subject is not a UUID"))?;
    let role = match claims.role.as_deref() {
        Some("admin") => Role::Admin,
        Some("driver") => Role::Driver,
        // Unknown role claims degrade to the passenger role rather than
        // rejecting the session.
        _ => Role::Passenger,
    };
    Ok(Actor { id, role })
}

#[cfg(test)]
mod tests {
    //! Regression coverage for claims decoding; no network involved.

    use rstest::rstest;
    use uuid::Uuid;

    use super::*;

    fn claims(active: bool, sub: Option<String>, role: Option<&str>) -> IntrospectionDto {
        IntrospectionDto {
            active,
            sub,
            role: role.map(str::to_owned),
        }
    }

    #[rstest]
    fn active_claims_yield_an_actor() {
        let id = Uuid::new_v4();
        let actor = actor_from_claims(claims(true, Some(id.to_string()), Some("admin")))
            .expect("valid claims");
        assert_eq!(actor.id, id);
        assert!(actor.is_admin());
    }

    #[rstest]
    fn driver_claims_yield_the_driver_role() {
        let id = Uuid::new_v4();
        let actor = actor_from_claims(claims(true, Some(id.to_string()), Some("driver")))
            .expect("valid claims");
        assert_eq!(actor.role, Role::Driver);
    }

    #[rstest]
    fn unknown_roles_degrade_to_passenger() {
        let id = Uuid::new_v4();
        let actor = actor_from_claims(claims(true, Some(id.to_string()), Some("superuser")))
            .expect("valid claims");
        assert_eq!(actor.role, Role::Passenger);
    }

    #[rstest]
    fn inactive_tokens_are_invalid() {
        let id = Uuid::new_v4();
        assert!(matches!(
            actor_from_claims(claims(false, Some(id.to_string()), None)),
            Err(TokenVerificationError::Invalid(_))
        ));
    }

    #[rstest]
    #[case::missing_subject(None)]
    #[case::malformed_subject(Some("not-a-uuid".to_owned()))]
    fn bad_subjects_are_invalid(#[case] sub: Option<String>) {
        assert!(matches!(
            actor_from_claims(claims(true, sub, None)),
            Err(TokenVerificationError::Invalid(_))
        ));
    }

    #[rstest]
    fn introspection_payloads_decode() {
        let body = r#"{ "active": true, "sub": "6f15fdbc-9a4a-42a9-a217-0f2f1b1c90a3", "role": "admin" }"#;
        let dto: IntrospectionDto = serde_json::from_str(body).expect("payload decodes");
        assert!(dto.active);
        assert_eq!(dto.role.as_deref(), Some("admin"));
    }
}
