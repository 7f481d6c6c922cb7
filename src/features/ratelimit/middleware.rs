use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use super::Admission;
use crate::error::too_many_requests;
use crate::state::AppState;

/// 无法确定客户端地址时共用的标识
const UNKNOWN_CLIENT: &str = "unknown";

/// 限流中间件：超出配额时直接返回 429，不进入后续处理
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(limiter) = state.rate_limiter.as_ref() else {
        return next.run(req).await;
    };

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_identity(req.headers(), peer);

    match limiter.check(&client) {
        Admission::Allowed => next.run(req).await,
        Admission::Limited { retry_after } => {
            tracing::info!(client = %client, ?retry_after, "请求被限流");
            too_many_requests(retry_after)
        }
    }
}

/// 客户端标识：`X-Forwarded-For` 首项 > `X-Real-IP` > 连接对端 IP
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    client_ip_from_headers(headers)
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn client_ip_from_headers(headers: &HeaderMap) -> Option<&str> {
    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next().map(|s| s.trim()))
        && !ip.is_empty()
    {
        return Some(ip);
    }
    if let Some(v) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let s = v.trim();
        if !s.is_empty() {
            return Some(s);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("10.0.0.7:51234".parse().unwrap())
    }

    #[test]
    fn prefers_first_forwarded_for_entry() {
        let mut h = HeaderMap::new();
        h.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 1.2.3.4 , 5.6.7.8 "),
        );
        h.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(client_identity(&h, peer()), "1.2.3.4");
    }

    #[test]
    fn falls_back_to_real_ip_then_peer() {
        let mut h = HeaderMap::new();
        h.insert("x-real-ip", HeaderValue::from_static(" 9.9.9.9 "));
        assert_eq!(client_identity(&h, peer()), "9.9.9.9");

        let h = HeaderMap::new();
        assert_eq!(client_identity(&h, peer()), "10.0.0.7");
    }

    #[test]
    fn empty_or_invalid_headers_are_ignored() {
        let mut h = HeaderMap::new();
        h.insert("x-forwarded-for", HeaderValue::from_static("   "));
        assert_eq!(client_identity(&h, peer()), "10.0.0.7");

        let mut h = HeaderMap::new();
        h.insert(
            "x-forwarded-for",
            HeaderValue::from_bytes(&[0xff, 0xfe, 0xfd]).unwrap(),
        );
        assert_eq!(client_identity(&h, None), UNKNOWN_CLIENT);
    }
}
