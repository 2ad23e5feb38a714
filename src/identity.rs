// identity.rs
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use http::HeaderMap;
use std::convert::Infallible;
use uuid::Uuid;

/// Sentinel recorded when an anonymous signal is absent from the request.
pub const UNKNOWN: &str = "UNKNOWN";

const ACTOR_HEADER: &str = "x-actor-id";
const FINGERPRINT_COOKIE: &str = "session_fingerprint";

/// The weak-identity signals every request carries. Recorded on every vote
/// row regardless of authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSignals {
    pub ip_address: String,
    pub user_agent: String,
    pub session_fingerprint: String,
}

/// Who is making the request. The actor id is attached by the identity
/// gateway in front of this service after it has verified the session;
/// this resolver never talks to the provider itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Authenticated {
        actor_id: Uuid,
        signals: ClientSignals,
    },
    Anonymous(ClientSignals),
}

impl Identity {
    /// Pure function of the request headers; never fails, missing signals
    /// fall back to [`UNKNOWN`].
    pub fn resolve(headers: &HeaderMap) -> Identity {
        let signals = ClientSignals {
            ip_address: client_ip(headers),
            user_agent: header_value(headers, "user-agent"),
            session_fingerprint: cookie_value(headers, FINGERPRINT_COOKIE)
                .unwrap_or_else(|| UNKNOWN.to_string()),
        };

        match headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
        {
            Some(actor_id) => Identity::Authenticated { actor_id, signals },
            None => Identity::Anonymous(signals),
        }
    }

    pub fn actor_id(&self) -> Option<Uuid> {
        match self {
            Identity::Authenticated { actor_id, .. } => Some(*actor_id),
            Identity::Anonymous(_) => None,
        }
    }

    pub fn signals(&self) -> &ClientSignals {
        match self {
            Identity::Authenticated { signals, .. } => signals,
            Identity::Anonymous(signals) => signals,
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn client_ip(headers: &HeaderMap) -> String {
    // x-forwarded-for may carry a proxy chain; the leftmost entry is the client.
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get("cookie")?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Identity::resolve(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn anonymous_with_no_signals_uses_sentinels() {
        let identity = Identity::resolve(&HeaderMap::new());
        assert_eq!(
            identity,
            Identity::Anonymous(ClientSignals {
                ip_address: UNKNOWN.to_string(),
                user_agent: UNKNOWN.to_string(),
                session_fingerprint: UNKNOWN.to_string(),
            })
        );
    }

    #[test]
    fn forwarded_for_takes_leftmost_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.1"));
        assert_eq!(Identity::resolve(&headers).signals().ip_address, "203.0.113.7");
    }

    #[test]
    fn real_ip_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(Identity::resolve(&headers).signals().ip_address, "198.51.100.2");
    }

    #[test]
    fn fingerprint_comes_from_the_cookie_jar() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; session_fingerprint=fp-123; lang=en"),
        );
        assert_eq!(
            Identity::resolve(&headers).signals().session_fingerprint,
            "fp-123"
        );
    }

    #[test]
    fn verified_actor_header_authenticates() {
        let actor = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            ACTOR_HEADER,
            HeaderValue::from_str(&actor.to_string()).unwrap(),
        );
        headers.insert("user-agent", HeaderValue::from_static("test-agent"));

        let identity = Identity::resolve(&headers);
        assert_eq!(identity.actor_id(), Some(actor));
        assert_eq!(identity.signals().user_agent, "test-agent");
    }

    #[test]
    fn malformed_actor_header_stays_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert_eq!(Identity::resolve(&headers).actor_id(), None);
    }
}
