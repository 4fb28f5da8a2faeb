//! Bearer token extraction and verification.
//!
//! Handlers take [`Authenticated`] as an argument; extraction reads the
//! `Authorization` header, verifies the token through the configured
//! [`crate::domain::ports::TokenVerifier`], and yields the acting
//! principal. Raw tokens never reach handler or service code.

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::domain::ports::TokenVerificationError;
use crate::domain::{Actor, Error};

use super::state::HttpState;

/// The verified principal of the current request.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Actor);

fn bearer_token(req: &HttpRequest) -> Result<String, Error> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing Authorization header"))?
        .to_str()
        .map_err(|_| Error::unauthorized("Authorization header is not valid ASCII"))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::unauthorized("expected a bearer token"))?
        .trim();
    if token.is_empty() {
        return Err(Error::unauthorized("bearer token is empty"));
    }
    Ok(token.to_owned())
}

fn map_verification_error(error: TokenVerificationError) -> Error {
    match error {
        TokenVerificationError::Invalid(message) => {
            Error::unauthorized(format!("token rejected: {message}"))
        }
        TokenVerificationError::Unavailable(message) => {
            Error::service_unavailable(format!("token verification failed: {message}"))
        }
    }
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = bearer_token(req);
        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let token = token?;
            let actor = state
                .tokens
                .verify(&token)
                .await
                .map_err(map_verification_error)?;
            Ok(Self(actor))
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use actix_web::test::TestRequest;
    use rstest::rstest;

    use crate::domain::ErrorCode;

    use super::*;

    #[rstest]
    fn missing_header_is_unauthorized() {
        let req = TestRequest::get().to_http_request();
        let error = bearer_token(&req).expect_err("no header");
        assert_eq!(error.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    #[case("Basic dXNlcjpwdw==")]
    #[case("Bearer ")]
    #[case("token-without-scheme")]
    fn non_bearer_headers_are_rejected(#[case] value: &str) {
        let req = TestRequest::get()
            .insert_header((header::AUTHORIZATION, value))
            .to_http_request();
        assert!(bearer_token(&req).is_err());
    }

    #[rstest]
    fn bearer_token_is_extracted_and_trimmed() {
        let req = TestRequest::get()
            .insert_header((header::AUTHORIZATION, "Bearer  abc123 "))
            .to_http_request();
        assert_eq!(bearer_token(&req).expect("token"), "abc123");
    }

    #[rstest]
    fn unavailable_verifier_maps_to_service_unavailable() {
        let error =
            map_verification_error(TokenVerificationError::unavailable("timed out"));
        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    }
}
