// File: src/monitoring/rate_limit_middleware.rs
//
// Per-client fixed-window rate limiting for the API surface:
// - TRUST_PROXY support (X-Forwarded-For, Forwarded headers)
// - Only paths under the protected prefixes are counted
// - Retry-After headers
// - Metrics and structured logging

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    Error, ResponseError,
};
use futures_util::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::ApiError;
use crate::monitoring::metrics::RATE_LIMIT_DROPS_TOTAL;
use crate::security::rate_limiter::RateLimiter;

/// Extract client IP with TRUST_PROXY support
///
/// Priority:
/// 1. X-Forwarded-For header (first IP)
/// 2. Forwarded header (for= field)
/// 3. peer_addr from connection_info
pub fn extract_client_ip(req: &ServiceRequest, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(header) = req.headers().get("X-Forwarded-For") {
            if let Ok(s) = header.to_str() {
                if let Some(ip) = s.split(',').next().map(str::trim).filter(|ip| !ip.is_empty()) {
                    return ip.to_string();
                }
            }
        }

        // RFC 7239: "for=192.0.2.1" or "for=[2001:db8:cafe::17]"
        if let Some(header) = req.headers().get("Forwarded") {
            if let Ok(s) = header.to_str() {
                if let Some(for_clause) = s
                    .split(|c: char| c == ';' || c == ',')
                    .map(str::trim)
                    .find(|c| c.to_lowercase().starts_with("for="))
                {
                    let ip = for_clause[4..]
                        .trim()
                        .trim_matches('"')
                        .trim_start_matches('[')
                        .trim_end_matches(']');
                    return ip.to_string();
                }
            }
        }
    }

    req.connection_info()
        .peer_addr()
        .unwrap_or("unknown")
        .to_string()
}

#[derive(Debug, Clone)]
pub struct RateLimitOptions {
    pub trust_proxy: bool,
    /// Only requests whose path starts with one of these are counted.
    pub protected_prefixes: Vec<String>,
}

impl Default for RateLimitOptions {
    fn default() -> Self {
        Self {
            trust_proxy: false,
            protected_prefixes: vec!["/api".into()],
        }
    }
}

impl RateLimitOptions {
    /// CORS preflights are answered without counting against the quota.
    pub fn applies_to(&self, path: &str, method: &Method) -> bool {
        if *method == Method::OPTIONS {
            return false;
        }
        self.protected_prefixes.iter().any(|p| {
            path == p || path.starts_with(&format!("{}/", p.trim_end_matches('/')))
        })
    }
}

/// Rate limiting middleware
pub struct RateLimitMiddleware {
    rate_limiter: Arc<RateLimiter>,
    opts: RateLimitOptions,
}

impl RateLimitMiddleware {
    pub fn new_with_options(rate_limiter: Arc<RateLimiter>, opts: RateLimitOptions) -> Self {
        Self { rate_limiter, opts }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            rate_limiter: Arc::clone(&self.rate_limiter),
            opts: self.opts.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    rate_limiter: Arc<RateLimiter>,
    opts: RateLimitOptions,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if self.opts.applies_to(req.path(), req.method()) {
            let client_ip = extract_client_ip(&req, self.opts.trust_proxy);
            let (allowed, retry_after) = self.rate_limiter.check_key(&client_ip);
            if !allowed {
                let err = ApiError::RateLimited {
                    retry_after_secs: retry_after,
                };
                tracing::warn!(
                    path = %req.path(),
                    client_ip = %client_ip,
                    retry_after_secs = retry_after,
                    code = err.code(),
                    "Rate limit exceeded"
                );
                RATE_LIMIT_DROPS_TOTAL.inc();

                let resp = err.error_response();
                return Box::pin(async move { Ok(req.into_response(resp.map_into_right_body())) });
            }
        }

        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_applies_only_under_api() {
        let opts = RateLimitOptions::default();
        assert!(opts.applies_to("/api", &Method::POST));
        assert!(opts.applies_to("/api/check", &Method::POST));
        assert!(opts.applies_to("/api/health", &Method::GET));
        assert!(!opts.applies_to("/apiary", &Method::GET));
        assert!(!opts.applies_to("/metrics", &Method::GET));
        assert!(!opts.applies_to("/", &Method::GET));
        assert!(!opts.applies_to("/api/check", &Method::OPTIONS));
    }

    #[test]
    fn test_extract_ip_prefers_forwarded_for_when_trusted() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "9.9.9.9, 10.0.0.1"))
            .peer_addr("127.0.0.1:5555".parse().unwrap())
            .to_srv_request();
        assert_eq!(extract_client_ip(&req, true), "9.9.9.9");
        assert_eq!(extract_client_ip(&req, false), "127.0.0.1");
    }

    #[test]
    fn test_extract_ip_from_forwarded_header() {
        let req = TestRequest::default()
            .insert_header(("Forwarded", "proto=https;for=\"[2001:db8:cafe::17]\""))
            .to_srv_request();
        assert_eq!(extract_client_ip(&req, true), "2001:db8:cafe::17");
    }
}
