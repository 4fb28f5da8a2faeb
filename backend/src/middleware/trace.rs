//! Request correlation middleware.
//!
//! Every request runs inside a task-local [`TraceId`] scope. Log lines,
//! error envelopes, and the `trace-id` response header all report the same
//! identifier, so one grep finds everything a request touched. Callers that
//! already carry a trace identifier (a gateway, a retrying client) send it
//! in the `trace-id` request header and get it echoed back.
//!
//! Task locals do not cross `tokio::spawn` boundaries; wrap spawned work in
//! [`TraceId::scope`] when the identifier should follow it.

use std::future::Future;
use std::task::{Context, Poll};

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::Error;
use futures_util::future::{ready, LocalBoxFuture, Ready};
use tokio::task_local;
use tracing::error;
use uuid::Uuid;

task_local! {
    static TRACE_ID: TraceId;
}

/// Header carrying the trace identifier on both requests and responses.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// A per-request correlation identifier.
///
/// Inside a request handler, [`TraceId::current`] returns the identifier
/// the middleware put in scope; outside any scope it returns `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The trace identifier in scope, if any.
    pub fn current() -> Option<Self> {
        TRACE_ID.try_with(|id| *id).ok()
    }

    /// Run `fut` with `trace_id` in scope.
    ///
    /// # Examples
    /// ```
    /// use backend::middleware::trace::TraceId;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let id: TraceId = "6f9619ff-8b86-d011-b42d-00cf4fc964ff"
    ///     .parse()
    ///     .expect("valid UUID");
    /// assert_eq!(TraceId::scope(id, async { TraceId::current() }).await, Some(id));
    /// # });
    /// ```
    pub async fn scope<Fut>(trace_id: TraceId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Middleware factory; wrap the `App` with it once, near the outside of the
/// middleware stack so the scope covers the inner layers.
///
/// Domain errors pick up the scoped identifier on construction, which is
/// how the envelope's `traceId` field and the response header end up equal.
#[derive(Clone)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware { service }))
    }
}

/// The wrapped service; constructed by [`Trace`].
pub struct TraceMiddleware<S> {
    service: S,
}

/// A caller-supplied identifier, or a fresh one when the header is absent
/// or not a UUID.
fn incoming_trace_id(req: &ServiceRequest) -> TraceId {
    req.headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or_else(TraceId::generate)
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = incoming_trace_id(&req);
        let header_value = trace_id.to_string();
        let fut = self.service.call(req);
        Box::pin(TraceId::scope(trace_id, async move {
            let mut res = fut.await?;
            match HeaderValue::from_str(&header_value) {
                Ok(value) => {
                    res.response_mut()
                        .headers_mut()
                        .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
                }
                Err(error) => {
                    error!(%error, %trace_id, "trace identifier is not a valid header value");
                }
            }
            Ok(res)
        }))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{test, web, App, HttpResponse};

    use super::*;

    async fn ok_handler() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    fn response_trace_id(res: &actix_web::dev::ServiceResponse) -> String {
        res.headers()
            .get(TRACE_ID_HEADER)
            .expect("trace id header")
            .to_str()
            .expect("ascii header")
            .to_owned()
    }

    #[tokio::test]
    async fn the_scoped_identifier_is_observable() {
        let expected = TraceId::generate();
        let observed = TraceId::scope(expected, async move { TraceId::current() }).await;
        assert_eq!(observed, Some(expected));
    }

    #[tokio::test]
    async fn no_identifier_outside_a_scope() {
        assert!(TraceId::current().is_none());
    }

    #[tokio::test]
    async fn parses_and_prints_the_same_uuid() {
        let uuid = Uuid::nil();
        let trace_id: TraceId = uuid.to_string().parse().expect("parse uuid");
        assert_eq!(trace_id.to_string(), uuid.to_string());
    }

    #[actix_web::test]
    async fn every_response_carries_a_trace_id() {
        let app = test::init_service(
            App::new()
                .wrap(Trace)
                .route("/", web::get().to(ok_handler)),
        )
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert!(res.headers().contains_key(TRACE_ID_HEADER));
    }

    #[actix_web::test]
    async fn a_caller_supplied_identifier_is_echoed() {
        let app = test::init_service(
            App::new()
                .wrap(Trace)
                .route("/", web::get().to(ok_handler)),
        )
        .await;
        let supplied = Uuid::new_v4().to_string();
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/")
                .insert_header((TRACE_ID_HEADER, supplied.clone()))
                .to_request(),
        )
        .await;
        assert_eq!(response_trace_id(&res), supplied);
    }

    #[actix_web::test]
    async fn a_malformed_caller_identifier_is_replaced() {
        let app = test::init_service(
            App::new()
                .wrap(Trace)
                .route("/", web::get().to(ok_handler)),
        )
        .await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/")
                .insert_header((TRACE_ID_HEADER, "not-a-uuid"))
                .to_request(),
        )
        .await;
        let echoed = response_trace_id(&res);
        assert_ne!(echoed, "not-a-uuid");
        echoed.parse::<TraceId>().expect("fresh uuid");
    }

    #[actix_web::test]
    async fn error_envelopes_match_the_header() {
        let app = test::init_service(App::new().wrap(Trace).route(
            "/",
            web::get().to(|| async {
                Result::<HttpResponse, crate::domain::Error>::Err(crate::domain::Error::internal(
                    "boom",
                ))
            }),
        ))
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let trace_id = response_trace_id(&res);
        let body: crate::domain::Error = test::read_body_json(res).await;
        assert_eq!(body.trace_id(), Some(trace_id.as_str()));
    }
}
