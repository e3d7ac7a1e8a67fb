use std::{net::IpAddr, sync::Arc};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use ipnetwork::IpNetwork;

use crate::{
    config::Config, error::AppError, middleware::client_ip::client_ip,
    services::metrics::IP_BLOCKED_COUNTER,
};

/// Blacklist first; then, if a whitelist is configured, the client must be
/// on it.
#[derive(Debug, Clone, Default)]
pub struct IpFilter {
    pub whitelist: Vec<IpNetwork>,
    pub blacklist: Vec<IpNetwork>,
}

impl IpFilter {
    pub fn from_config(config: &Config) -> Self {
        Self {
            whitelist: config.ip_whitelist.clone(),
            blacklist: config.ip_blacklist.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.whitelist.is_empty() && self.blacklist.is_empty()
    }

    pub fn allows(&self, ip: IpAddr) -> bool {
        if self.blacklist.iter().any(|net| net.contains(ip)) {
            return false;
        }
        self.whitelist.is_empty() || self.whitelist.iter().any(|net| net.contains(ip))
    }
}

#[derive(Clone)]
pub struct IpFilterState {
    pub filter: Arc<IpFilter>,
    pub trust_proxy_headers: bool,
}

pub async fn ip_filter(State(state): State<IpFilterState>, req: Request, next: Next) -> Response {
    if state.filter.is_empty() {
        return next.run(req).await;
    }

    let ip = client_ip(&req, state.trust_proxy_headers);
    if !state.filter.allows(ip) {
        IP_BLOCKED_COUNTER.inc();
        tracing::warn!(client_ip = %ip, path = %req.uri().path(), "request refused by IP filter");
        return AppError::forbidden("Access denied").into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_ip_rules;

    fn filter(whitelist: &str, blacklist: &str) -> IpFilter {
        IpFilter {
            whitelist: parse_ip_rules(whitelist).unwrap(),
            blacklist: parse_ip_rules(blacklist).unwrap(),
        }
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn empty_filter_allows_everyone() {
        assert!(filter("", "").allows(ip("203.0.113.5")));
    }

    #[test]
    fn blacklist_beats_whitelist() {
        let f = filter("10.0.0.0/8", "10.0.0.66");
        assert!(f.allows(ip("10.1.2.3")));
        assert!(!f.allows(ip("10.0.0.66")));
    }

    #[test]
    fn whitelist_excludes_the_rest() {
        let f = filter("192.168.1.0/24, ::1", "");
        assert!(f.allows(ip("192.168.1.200")));
        assert!(f.allows(ip("::1")));
        assert!(!f.allows(ip("192.168.2.1")));
    }
}
