use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    extract::{Request, State, connect_info::ConnectInfo},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use serde_json::json;

use crate::config::Config;

type IpRateLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// A per-IP request limiter for one class of endpoints.
pub struct EndpointLimiter {
    class: &'static str,
    limiter: IpRateLimiter,
    max_requests: u32,
    window: Duration,
    enabled: bool,
}

impl EndpointLimiter {
    pub fn new(class: &'static str, max_requests: u32, window: Duration, enabled: bool) -> Self {
        let burst = NonZeroU32::new(max_requests).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(window / burst.get())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        EndpointLimiter {
            class,
            limiter: RateLimiter::keyed(quota),
            max_requests,
            window,
            enabled,
        }
    }

    fn limit_body(&self) -> serde_json::Value {
        let window_minutes = self.window.as_secs().div_ceil(60);
        json!({
            "error": format!("Too many {} requests", self.class),
            "message": format!(
                "You have exceeded the {} requests per {} minute{} limit.",
                self.max_requests,
                window_minutes,
                if window_minutes > 1 { "s" } else { "" },
            ),
            "retry_after": self.window.as_secs(),
        })
    }
}

/// The full limiter set, one limiter per endpoint class. Quotas match
/// the deployed configuration: general API traffic, auth-sensitive
/// routes, provider proxy routes, and database writes.
pub struct RateLimits {
    pub global: Arc<EndpointLimiter>,
    pub auth: Arc<EndpointLimiter>,
    pub plaid: Arc<EndpointLimiter>,
    pub db_write: Arc<EndpointLimiter>,
}

impl RateLimits {
    pub fn from_config(config: &Config) -> Self {
        // Limiters are skipped wholesale in test mode.
        let enabled = !config.test_mode;

        RateLimits {
            global: Arc::new(EndpointLimiter::new(
                "API",
                100,
                Duration::from_secs(15 * 60),
                enabled,
            )),
            auth: Arc::new(EndpointLimiter::new(
                "authentication",
                5,
                Duration::from_secs(15 * 60),
                enabled,
            )),
            plaid: Arc::new(EndpointLimiter::new(
                "Plaid API",
                10,
                Duration::from_secs(60),
                enabled,
            )),
            db_write: Arc::new(EndpointLimiter::new(
                "database operation",
                5,
                Duration::from_secs(60),
                enabled,
            )),
        }
    }
}

pub async fn enforce(
    State(limiter): State<Arc<EndpointLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    if !limiter.enabled {
        return next.run(req).await;
    }

    let ip = client_ip(req.headers(), req.extensions())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.limiter.check_key(&ip).is_err() {
        tracing::warn!(
            class = limiter.class,
            client_ip = %ip,
            path = %req.uri().path(),
            "rate limit exceeded"
        );
        return (StatusCode::TOO_MANY_REQUESTS, Json(limiter.limit_body())).into_response();
    }

    next.run(req).await
}

/// Client address for keying: the first x-forwarded-for entry when a
/// proxy forwarded the request, otherwise the socket peer address.
fn client_ip(headers: &HeaderMap, extensions: &axum::http::Extensions) -> Option<IpAddr> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        if let Some(ip) = forwarded
            .split(',')
            .map(str::trim)
            .find_map(|entry| entry.parse::<IpAddr>().ok())
        {
            return Some(ip);
        }
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|connect_info| connect_info.0.ip())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{HeaderValue, Request as HttpRequest},
        middleware::from_fn_with_state,
        routing::get,
    };
    use tower::ServiceExt;

    fn limited_router(max_requests: u32, enabled: bool) -> Router {
        let limiter = Arc::new(EndpointLimiter::new(
            "API",
            max_requests,
            Duration::from_secs(60),
            enabled,
        ));

        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(from_fn_with_state(limiter, enforce))
    }

    fn request_from(ip: &'static str) -> HttpRequest<Body> {
        let mut req = HttpRequest::builder().uri("/").body(Body::empty()).unwrap();
        req.headers_mut()
            .insert("x-forwarded-for", HeaderValue::from_static(ip));
        req
    }

    #[tokio::test]
    async fn requests_over_quota_get_429() {
        let app = limited_router(2, true);

        for _ in 0..2 {
            let response = app.clone().oneshot(request_from("203.0.113.10")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.clone().oneshot(request_from("203.0.113.10")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Too many API requests");
        assert_eq!(json["retry_after"], 60);
    }

    #[tokio::test]
    async fn limits_are_tracked_per_ip() {
        let app = limited_router(1, true);

        let first = app.clone().oneshot(request_from("203.0.113.10")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let other_ip = app.clone().oneshot(request_from("198.51.100.7")).await.unwrap();
        assert_eq!(other_ip.status(), StatusCode::OK);

        let same_ip = app.clone().oneshot(request_from("203.0.113.10")).await.unwrap();
        assert_eq!(same_ip.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn disabled_limiter_passes_everything() {
        let app = limited_router(1, false);

        for _ in 0..5 {
            let response = app.clone().oneshot(request_from("203.0.113.10")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[test]
    fn xff_takes_first_parseable_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.10, 198.51.100.7"),
        );

        let ip = client_ip(&headers, &axum::http::Extensions::new());
        assert_eq!(ip, Some(IpAddr::from([203, 0, 113, 10])));
    }

    #[test]
    fn socket_addr_is_fallback_when_xff_absent() {
        let mut extensions = axum::http::Extensions::new();
        extensions.insert(ConnectInfo(SocketAddr::from(([203, 0, 113, 44], 8080))));

        let ip = client_ip(&HeaderMap::new(), &extensions);
        assert_eq!(ip, Some(IpAddr::from([203, 0, 113, 44])));
    }
}
