//! Client address for rate limiting and audit rows

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{Extensions, HeaderMap, request::Parts};

const UNKNOWN: &str = "unknown";

/// X-Forwarded-For first (load balancer), then the peer address.
pub fn resolve(headers: &HeaderMap, extensions: &Extensions) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        // comma-separated; first entry is the original client
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_owned();
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| UNKNOWN.to_owned())
}

/// Handler extractor for the caller's address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    /// `None` when the address could not be determined
    pub fn as_audit(&self) -> Option<&str> {
        (self.0 != UNKNOWN).then_some(self.0.as_str())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve(&parts.headers, &parts.extensions)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn parts(request: http::Request<Body>) -> Parts {
        request.into_parts().0
    }

    #[test]
    fn test_forwarded_for_wins() {
        let p = parts(
            http::Request::builder()
                .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
                .body(Body::empty())
                .unwrap(),
        );
        assert_eq!(resolve(&p.headers, &p.extensions), "203.0.113.7");
    }

    #[test]
    fn test_peer_address_fallback() {
        let mut p = parts(http::Request::builder().body(Body::empty()).unwrap());
        assert_eq!(resolve(&p.headers, &p.extensions), "unknown");

        p.extensions
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 10], 51000))));
        assert_eq!(resolve(&p.headers, &p.extensions), "192.0.2.10");
    }

    #[tokio::test]
    async fn test_extractor_feeds_audit() {
        let mut p = parts(
            http::Request::builder()
                .header("x-forwarded-for", "198.51.100.4")
                .body(Body::empty())
                .unwrap(),
        );
        let ip = ClientIp::from_request_parts(&mut p, &()).await.unwrap();
        assert_eq!(ip.as_audit(), Some("198.51.100.4"));

        let mut bare = parts(http::Request::builder().body(Body::empty()).unwrap());
        let ip = ClientIp::from_request_parts(&mut bare, &()).await.unwrap();
        assert_eq!(ip.as_audit(), None);
    }
}
