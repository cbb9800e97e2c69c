//! Tag each request with an id that is echoed in the `X-Request-Id` response
//! header.
//!
//! An id supplied by a reverse proxy is kept if it looks sane, otherwise a
//! fresh UUIDv7 is generated.

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::{from_fn, Next},
    response::Response,
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_FORWARDED_LEN: usize = 64;

pub fn add<S: Clone + Send + Sync + 'static>(router: Router<S>) -> Router<S> {
    router.layer(from_fn(middleware))
}

async fn middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(RequestId::forwarded)
        .unwrap_or_else(RequestId::generate);

    request.extensions_mut().insert(request_id.clone());
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(REQUEST_ID_HEADER, request_id.0);
    response
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(HeaderValue);

impl RequestId {
    fn generate() -> Self {
        let encoded = URL_SAFE_NO_PAD.encode(Uuid::now_v7().as_bytes());
        Self(HeaderValue::from_str(&encoded).unwrap_or_else(|_| HeaderValue::from_static("-")))
    }

    fn forwarded(value: &HeaderValue) -> Option<Self> {
        let valid = !value.is_empty()
            && value.len() <= MAX_FORWARDED_LEN
            && value
                .as_bytes()
                .iter()
                .all(|&b| b.is_ascii_alphanumeric() || b"-_.".contains(&b));
        valid.then(|| Self(value.clone()))
    }

    pub fn as_str(&self) -> &str {
        self.0.to_str().unwrap_or_default()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 22);
    }

    #[test]
    fn forwarded_ids() {
        let ok = HeaderValue::from_static("req-123_abc.def");
        assert_eq!(RequestId::forwarded(&ok).unwrap().as_str(), "req-123_abc.def");

        for invalid in ["", "with space", "semi;colon"] {
            assert_eq!(
                RequestId::forwarded(&HeaderValue::from_static(invalid)),
                None
            );
        }

        let long = HeaderValue::from_str(&"a".repeat(MAX_FORWARDED_LEN + 1)).unwrap();
        assert_eq!(RequestId::forwarded(&long), None);
    }
}
