//! Driven port for bearer token verification.

use async_trait::async_trait;

use crate::domain::profile::{Actor, Role};

/// Failures while verifying a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenVerificationError {
    /// The token is malformed, expired, or revoked.
    #[error("invalid token: {0}")]
    Invalid(String),
    /// The identity provider could not be reached in time.
    #[error("token verification unavailable: {0}")]
    Unavailable(String),
}

impl TokenVerificationError {
    /// The token is malformed, expired, or revoked.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// The identity provider could not be reached in time.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Verifies bearer tokens and yields the acting principal.
///
/// Inbound adapters call this once per request; domain services receive the
/// resulting [`Actor`] and never see raw credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` and return the principal it identifies.
    async fn verify(&self, token: &str) -> Result<Actor, TokenVerificationError>;
}

/// [`TokenVerifier`] for tests and local development.
///
/// Accepts tokens of the form `<uuid>` or `<uuid>:<role>`, treating the
/// UUID as the subject. A bare UUID verifies as a passenger.
#[derive(Debug, Default)]
pub struct FixtureTokenVerifier;

impl FixtureTokenVerifier {
    /// Create a fixture verifier.
    pub fn new() -> Self {
        Self
    }

    /// A token this verifier accepts for `actor`.
    pub fn token_for(actor: &Actor) -> String {
        match actor.role {
            Role::Passenger => actor.id.to_string(),
            Role::Driver => format!("{}:driver", actor.id),
            Role::Admin => format!("{}:admin", actor.id),
        }
    }
}

#[async_trait]
impl TokenVerifier for FixtureTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Actor, TokenVerificationError> {
        let (subject, role) = match token.split_once(':') {
            Some((subject, "passenger")) => (subject, Role::Passenger),
            Some((subject, "driver")) => (subject, Role::Driver),
            Some((subject, "admin")) => (subject, Role::Admin),
            Some(_) => {
                return Err(TokenVerificationError::invalid(
                    "unrecognised role suffix",
                ))
            }
            None => (token, Role::Passenger),
        };
        let id = subject
            .parse()
            .map_err(|_| TokenVerificationError::invalid("subject is not a UUID"))?;
        Ok(Actor { id, role })
    }
}
