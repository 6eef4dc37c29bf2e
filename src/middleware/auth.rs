use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use subtle::ConstantTimeEq;

use crate::error::ApiError;
use crate::state::AppState;

/// The single shared credential guarding `/api/*`
#[derive(Clone)]
pub struct Credential {
    username: String,
    password: String,
    realm: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"***")
            .field("realm", &self.realm)
            .finish()
    }
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>, realm: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            realm: realm.into(),
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// True iff the header carries exactly this username and password
    pub fn verify(&self, headers: &HeaderMap) -> bool {
        let Ok((user, pass)) = extract_basic_from_headers(headers) else {
            return false;
        };
        // Evaluate both comparisons so timing does not reveal which one failed
        let user_ok = user.as_bytes().ct_eq(self.username.as_bytes());
        let pass_ok = pass.as_bytes().ct_eq(self.password.as_bytes());
        bool::from(user_ok & pass_ok)
    }
}

/// Basic authentication middleware for every collection route
pub async fn basic_auth_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.credential.verify(request.headers()) {
        return next.run(request).await;
    }

    tracing::warn!("Rejected unauthenticated {} {}", request.method(), request.uri().path());
    unauthorized(state.credential.realm())
}

fn unauthorized(realm: &str) -> Response {
    let mut response = ApiError::unauthorized("Unauthorized").into_response();
    let challenge = format!("Basic realm=\"{}\"", realm.replace('"', ""));
    if let Ok(value) = HeaderValue::from_str(&challenge) {
        response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
    }
    response
}

/// Extract the username/password pair from a Basic Authorization header
fn extract_basic_from_headers(headers: &HeaderMap) -> Result<(String, String), &'static str> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    let (scheme, encoded) = auth_str
        .trim()
        .split_once(' ')
        .ok_or("Authorization header must use Basic format")?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err("Authorization header must use Basic format");
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| "Invalid base64 in Authorization header")?;
    let decoded = String::from_utf8(decoded).map_err(|_| "Credentials are not valid UTF-8")?;

    let (user, pass) = decoded.split_once(':').ok_or("Credentials must be user:pass")?;
    Ok((user.to_string(), pass.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn basic(user_pass: &str) -> String {
        format!("Basic {}", STANDARD.encode(user_pass))
    }

    #[test]
    fn accepts_matching_credentials() {
        let credential = Credential::new("baker", "fl:our", "test");
        assert!(credential.verify(&headers_with(&basic("baker:fl:our"))));
        assert!(credential.verify(&headers_with(&basic("baker:fl:our").replace("Basic", "basic"))));
    }

    #[test]
    fn rejects_everything_else() {
        let credential = Credential::new("baker", "flour", "test");
        assert!(!credential.verify(&HeaderMap::new()));
        assert!(!credential.verify(&headers_with("Bearer abc")));
        assert!(!credential.verify(&headers_with("Basic !!!not-base64")));
        assert!(!credential.verify(&headers_with(&basic("bakerflour"))));
        assert!(!credential.verify(&headers_with(&basic("baker:sugar"))));
        assert!(!credential.verify(&headers_with(&basic("Baker:flour"))));
        assert!(!credential.verify(&headers_with(&basic("baker:flour "))));
        assert!(!credential.verify(&headers_with("Basic")));
    }

    #[test]
    fn unauthorized_response_carries_challenge() {
        let response = unauthorized("lunele");
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Basic realm=\"lunele\"");
    }

    #[test]
    fn debug_hides_password() {
        let rendered = format!("{:?}", Credential::new("baker", "flour", "test"));
        assert!(!rendered.contains("flour"));
    }
}
