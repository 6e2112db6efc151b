//! Subscriber identity cookie.
//!
//! Every client gets a stable opaque `user_id` token on its first
//! response; the token keys the progress channel topic. Identity routes
//! progress events only — it is not authentication.

use axum::extract::Request;
use axum::http::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE};
use axum::middleware::Next;
use axum::response::Response;

/// Cookie name carrying the subscriber identity.
pub const IDENTITY_COOKIE: &str = "user_id";

/// Generate a fresh identity token (UUID v4, hyphen-less).
pub fn new_identity() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Extract the subscriber identity from a request's Cookie headers.
pub fn subscriber_id(headers: &HeaderMap) -> Option<String> {
    for value in headers.get_all(COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        for pair in raw.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            if parts.next() == Some(IDENTITY_COOKIE) {
                match parts.next() {
                    Some(token) if !token.is_empty() => return Some(token.to_string()),
                    _ => {}
                }
            }
        }
    }
    None
}

/// Middleware: assign a fresh identity on the response when the request
/// did not present one.
pub async fn ensure_identity(request: Request, next: Next) -> Response {
    let known = subscriber_id(request.headers()).is_some();
    let mut response = next.run(request).await;

    if !known {
        let token = new_identity();
        if let Ok(cookie) = HeaderValue::from_str(&format!("{IDENTITY_COOKIE}={token}; Path=/")) {
            response.headers_mut().append(SET_COOKIE, cookie);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn identity_parsed_from_cookie_header() {
        assert_eq!(
            subscriber_id(&headers("user_id=abc123")),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn identity_found_among_other_cookies() {
        assert_eq!(
            subscriber_id(&headers("theme=dark; user_id=abc123; lang=en")),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn missing_or_empty_identity_is_none() {
        assert_eq!(subscriber_id(&HeaderMap::new()), None);
        assert_eq!(subscriber_id(&headers("user_id=")), None);
        assert_eq!(subscriber_id(&headers("other=1")), None);
    }

    #[test]
    fn fresh_identities_are_unique() {
        assert_ne!(new_identity(), new_identity());
    }
}
