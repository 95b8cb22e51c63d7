//! Client identity extraction for rate limiting
//!
//! Behind a load balancer the socket address is the proxy, not the caller;
//! the first `X-Forwarded-For` entry is the original client. A forged or
//! unparsable header falls back to the socket address, so a spoofer can
//! only throttle themselves.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

pub fn extract_client_ip(headers: &HeaderMap, socket_addr: SocketAddr) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            if let Ok(ip) = first.trim().parse::<IpAddr>() {
                return ip.to_string();
            }
        }
    }
    socket_addr.ip().to_string()
}
