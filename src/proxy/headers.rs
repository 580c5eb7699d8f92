//! Header manipulation for forwarded requests and relayed responses.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Rewrite Host to the upstream authority when the rule asks for it
//!
//! # Design Decisions
//! - Headers listed in `Connection` are hop-by-hop too
//! - No X-Forwarded-* headers; upstreams see the request as the client sent it

use std::collections::HashSet;

use axum::http::header::{CONNECTION, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use axum::http::{HeaderMap, HeaderName};

use crate::routing::RouteRule;

fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-connection"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

fn connection_tokens(headers: &HeaderMap) -> HashSet<String> {
    headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Copy `headers`, dropping hop-by-hop ones.
pub fn end_to_end_headers(headers: &HeaderMap) -> HeaderMap {
    let tokens = connection_tokens(headers);
    let mut out = HeaderMap::with_capacity(headers.len());

    for (name, value) in headers {
        if is_hop_by_hop(name) || tokens.contains(name.as_str()) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }

    out
}

/// Headers sent to the upstream for a request matched by `rule`.
pub fn upstream_request_headers(incoming: &HeaderMap, rule: &RouteRule) -> HeaderMap {
    let mut headers = end_to_end_headers(incoming);
    if rule.change_origin() {
        headers.insert(HOST, rule.upstream().host_header().clone());
    }
    headers
}

/// Whether the incoming request carries a body worth streaming.
pub fn has_body(headers: &HeaderMap) -> bool {
    if headers.contains_key(TRANSFER_ENCODING) {
        return true;
    }
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .is_some_and(|len| len > 0)
}
