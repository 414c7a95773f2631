//! Per-client request limits
//!
//! Every request is sorted into a [`RouteGroup`] by method and path and
//! checked against that group's keyed limiter, keyed by client IP.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use wms_core::config::RateLimitConfig;

use super::error::ApiError;
use super::server::AppState;

type KeyedLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    Scan,
    Read,
    Write,
    Export,
    Login,
    /// Health checks and anything outside `/api`
    Unlimited,
}

impl RouteGroup {
    pub fn classify(method: &Method, path: &str) -> Self {
        if !path.starts_with("/api/") {
            return Self::Unlimited;
        }
        if path == "/api/login" {
            return Self::Login;
        }
        if path == "/api/scan" && method == Method::POST {
            return Self::Scan;
        }
        if path.starts_with("/api/report/export") || path.starts_with("/api/import/template") {
            return Self::Export;
        }
        // Query endpoints that take a POST body
        if path == "/api/report" || path == "/api/import/validate" {
            return Self::Read;
        }
        match *method {
            Method::GET | Method::HEAD | Method::OPTIONS => Self::Read,
            _ => Self::Write,
        }
    }
}

/// One keyed limiter per route group, quotas per minute
pub struct RateLimiters {
    scan: KeyedLimiter,
    read: KeyedLimiter,
    write: KeyedLimiter,
    export: KeyedLimiter,
    login: KeyedLimiter,
}

fn per_minute(n: u32) -> KeyedLimiter {
    let n = NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN);
    RateLimiter::keyed(Quota::per_minute(n))
}

impl RateLimiters {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            scan: per_minute(config.scan),
            read: per_minute(config.read),
            write: per_minute(config.write),
            export: per_minute(config.export),
            login: per_minute(config.login),
        }
    }

    /// `true` when the request may proceed.
    pub fn check(&self, group: RouteGroup, client: IpAddr) -> bool {
        let limiter = match group {
            RouteGroup::Scan => &self.scan,
            RouteGroup::Read => &self.read,
            RouteGroup::Write => &self.write,
            RouteGroup::Export => &self.export,
            RouteGroup::Login => &self.login,
            RouteGroup::Unlimited => return true,
        };
        limiter.check_key(&client).is_ok()
    }

    /// Forget clients whose buckets are full again.
    pub fn retain_recent(&self) {
        for limiter in [&self.scan, &self.read, &self.write, &self.export, &self.login] {
            limiter.retain_recent();
        }
    }
}

/// Middleware applied to the whole router.
pub async fn limit_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let group = RouteGroup::classify(request.method(), request.uri().path());
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    if !state.limiter.check(group, client) {
        tracing::warn!(%client, ?group, path = %request.uri().path(), "rate limit exceeded");
        return ApiError::RateLimited.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_routes() {
        assert_eq!(RouteGroup::classify(&Method::GET, "/health"), RouteGroup::Unlimited);
        assert_eq!(RouteGroup::classify(&Method::POST, "/api/login"), RouteGroup::Login);
        assert_eq!(RouteGroup::classify(&Method::POST, "/api/scan"), RouteGroup::Scan);
        assert_eq!(RouteGroup::classify(&Method::PUT, "/api/scan/7"), RouteGroup::Write);
        assert_eq!(RouteGroup::classify(&Method::GET, "/api/history"), RouteGroup::Read);
        assert_eq!(RouteGroup::classify(&Method::POST, "/api/report"), RouteGroup::Read);
        assert_eq!(
            RouteGroup::classify(&Method::POST, "/api/report/export"),
            RouteGroup::Export
        );
        assert_eq!(
            RouteGroup::classify(&Method::DELETE, "/api/notifications"),
            RouteGroup::Write
        );
    }

    #[test]
    fn quota_is_per_client() {
        let config = RateLimitConfig {
            login: 2,
            ..RateLimitConfig::default()
        };
        let limiters = RateLimiters::new(&config);
        let a = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let b = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        assert!(limiters.check(RouteGroup::Login, a));
        assert!(limiters.check(RouteGroup::Login, a));
        assert!(!limiters.check(RouteGroup::Login, a));
        assert!(limiters.check(RouteGroup::Login, b));
        assert!(limiters.check(RouteGroup::Unlimited, a));
    }

    #[test]
    fn zero_quota_still_allows_one() {
        let config = RateLimitConfig {
            write: 0,
            ..RateLimitConfig::default()
        };
        let limiters = RateLimiters::new(&config);
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(limiters.check(RouteGroup::Write, ip));
        assert!(!limiters.check(RouteGroup::Write, ip));
    }
}
