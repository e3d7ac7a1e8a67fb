use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{extract::ConnectInfo, http::Request};

/// Address recorded when neither the socket nor a trusted proxy header
/// says who the client is (e.g. in-process tests).
pub const UNKNOWN_CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Resolves the caller's address. Proxy headers are only consulted when
/// `trust_proxy_headers` is set: `X-Real-IP` first, then the left-most
/// `X-Forwarded-For` entry.
pub fn client_ip<B>(req: &Request<B>, trust_proxy_headers: bool) -> IpAddr {
    if trust_proxy_headers {
        if let Some(ip) = forwarded_ip(req) {
            return ip;
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(UNKNOWN_CLIENT)
}

fn forwarded_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    let headers = req.headers();
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok());
    real_ip.or_else(|| {
        headers
            .get("x-forwarded-for")?
            .to_str()
            .ok()?
            .split(',')
            .next()?
            .trim()
            .parse()
            .ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request() -> axum::http::request::Builder {
        Request::builder().uri("/")
    }

    #[test]
    fn uses_the_socket_address() {
        let mut req = request().body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 5555))));
        assert_eq!(client_ip(&req, false), IpAddr::from([10, 0, 0, 7]));
    }

    #[test]
    fn ignores_proxy_headers_unless_trusted() {
        let req = request()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req, false), UNKNOWN_CLIENT);
        assert_eq!(client_ip(&req, true), IpAddr::from([203, 0, 113, 9]));
    }

    #[test]
    fn real_ip_wins_over_forwarded_for() {
        let req = request()
            .header("x-real-ip", "198.51.100.4")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req, true), IpAddr::from([198, 51, 100, 4]));
    }
}
