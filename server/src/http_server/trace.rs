use std::time::Duration;

use axum::extract::MatchedPath;
use http::{Request, Response};
use tower_http::trace::{MakeSpan, OnResponse};
use tracing::{field::Empty, Level, Span};

/// Spans for every request, named after the matched route and tagged with the
/// API resource (`recipes`, `pantry`, ..) it hit
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tracer;

impl<Body> MakeSpan<Body> for Tracer {
    fn make_span(&mut self, request: &Request<Body>) -> Span {
        let route = matched_route(request);

        tracing::span!(
            Level::INFO,
            "server.request",
            otel.name = format!("{} {}", request.method(), route.unwrap_or("unmatched")),
            kind = "server",
            http.request.method = %request.method(),
            http.route = route,
            url.path = %request.uri().path(),
            url.query = request.uri().query(),
            flavorhub.resource = route.and_then(api_resource),
            http.response.status_code = Empty,
            latency_ms = Empty,
        )
    }
}

impl<Body> OnResponse<Body> for Tracer {
    fn on_response(self, response: &Response<Body>, latency: Duration, span: &Span) {
        let status = response.status();
        let latency_ms = latency.as_millis();

        span.record("http.response.status_code", status.as_u16());
        span.record("latency_ms", latency_ms);

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), latency_ms, "Request failed");
        } else {
            tracing::info!(status = status.as_u16(), latency_ms, "Request finished");
        }
    }
}

/// Routes are templates like `/api/recipes/{id}`, so spans group by endpoint rather than by id.
/// Unmatched requests (the JSON fallback) have none.
fn matched_route<B>(request: &Request<B>) -> Option<&str> {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
}

fn api_resource(route: &str) -> Option<&str> {
    route
        .strip_prefix("/api/")?
        .split('/')
        .next()
        .filter(|resource| !resource.is_empty())
}
