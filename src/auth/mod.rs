//! Bearer-token claims and permission checks.
//!
//! The claims decoded here are **not a security boundary**. The token's
//! signature is never verified on the client; role and permissions are read
//! only to decide what to offer the user (hide a command, refuse early).
//! The API re-checks every permission on every request and is the only
//! authority.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde_json::{Map, Value};

use crate::models::Token;

/// Role name that bypasses every permission check.
pub const ADMIN_ROLE: &str = "admin";

/// Permission names issued by the API.
pub mod permissions {
    pub const READ_RELEASES: &str = "read:releases";
    pub const CREATE_RELEASES: &str = "create:releases";
    pub const READ_SERVICES: &str = "read:services";
    pub const CREATE_SERVICES: &str = "create:services";
    pub const READ_ENVIRONMENTS: &str = "read:environments";
    pub const READ_USERS: &str = "read:users";
}

// Input is rewritten to the standard alphabet first, padding is optional.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Role and permission hints carried by a token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenClaims {
    pub role: Option<String>,
    pub permissions: Vec<String>,
}

impl TokenClaims {
    /// Build claims from a decoded payload object.
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        let role = match payload.get("role") {
            Some(Value::String(role)) if !role.is_empty() => Some(role.clone()),
            _ => None,
        };
        let permissions = match payload.get("permissions") {
            Some(Value::String(raw)) if !raw.is_empty() => {
                raw.split(',').map(|p| p.trim().to_string()).collect()
            }
            _ => Vec::new(),
        };
        Self { role, permissions }
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }

    /// Admins pass every check; everyone else needs an exact, case-sensitive match.
    pub fn has_permission(&self, required: &str) -> bool {
        self.is_admin() || self.permissions.iter().any(|p| p == required)
    }
}

/// Decode the payload segment of a `header.payload.signature` token.
///
/// Returns `None` on any malformed input; never panics.
pub fn decode_payload(token: &str) -> Option<Map<String, Value>> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    let standard = payload.replace('-', "+").replace('_', "/");
    let bytes = PAYLOAD_ENGINE.decode(standard).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    match serde_json::from_str(&text).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Decode the claims of a token, or `None` when it cannot be read.
pub fn decode(token: &str) -> Option<TokenClaims> {
    decode_payload(token).map(|payload| TokenClaims::from_payload(&payload))
}

/// Role of the current token holder; `None` without a token or a role claim.
pub fn user_role(token: Option<&str>) -> Option<String> {
    token.and_then(decode).and_then(|claims| claims.role)
}

/// Permissions of the current token holder; empty without a token or a permissions claim.
pub fn user_permissions(token: Option<&str>) -> Vec<String> {
    token
        .and_then(decode)
        .map(|claims| claims.permissions)
        .unwrap_or_default()
}

/// Whether the current token holder may perform an action requiring `required`.
pub fn has_permission(token: Option<&str>, required: &str) -> bool {
    if user_role(token).as_deref() == Some(ADMIN_ROLE) {
        return true;
    }
    user_permissions(token).iter().any(|p| p == required)
}

/// Credentials for one session, passed explicitly to every authenticated call.
///
/// Clones share the invalidation flag: once the API answers 401 for any
/// clone, all of them report [`AuthContext::is_invalidated`].
#[derive(Clone)]
pub struct AuthContext {
    token: String,
    token_type: String,
    invalidated: Arc<AtomicBool>,
}

impl AuthContext {
    pub fn new(token: impl Into<String>, token_type: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            token_type: token_type.into(),
            invalidated: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_token(token: Token) -> Self {
        Self::new(token.access_token, token.token_type)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Claims decoded from the token, re-derived on each call.
    pub fn claims(&self) -> Option<TokenClaims> {
        decode(&self.token)
    }

    pub fn role(&self) -> Option<String> {
        user_role(Some(&self.token))
    }

    pub fn permissions(&self) -> Vec<String> {
        user_permissions(Some(&self.token))
    }

    pub fn has_permission(&self, required: &str) -> bool {
        has_permission(Some(&self.token), required)
    }

    /// Mark the token as rejected by the API.
    pub fn invalidate(&self) {
        self.invalidated.store(true, Ordering::SeqCst);
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("invalidated", &self.is_invalidated())
            .finish()
    }
}

/// Build an unsigned token around `payload`, the way the API lays tokens out.
#[cfg(test)]
pub(crate) fn unsigned_token(payload: &Value) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.c2lnbmF0dXJl")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_admin_claims_round_trip() {
        let token = unsigned_token(&json!({
            "sub": "admin@example.com",
            "role": "admin",
            "permissions": "a,b,c",
            "exp": 1_900_000_000
        }));

        let claims = decode(&token).unwrap();
        assert_eq!(claims.role.as_deref(), Some("admin"));
        assert_eq!(claims.permissions, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_permissions_are_trimmed() {
        let token = unsigned_token(&json!({
            "role": "release_manager",
            "permissions": " read:releases , create:releases,read:services "
        }));
        assert_eq!(
            user_permissions(Some(&token)),
            vec!["read:releases", "create:releases", "read:services"]
        );
    }

    #[test]
    fn test_malformed_tokens_yield_nothing() {
        for token in [
            "not-a-jwt",
            "",
            "a.b",
            "a.b.c.d",
            "header.!!!notbase64!!!.sig",
            // valid base64 of invalid UTF-8
            "h.__79.s",
            // valid base64 of "not json"
            "h.bm90IGpzb24.s",
            // valid base64 of "[1,2]", not an object
            "h.WzEsMl0.s",
        ] {
            assert_eq!(decode(token), None, "token {token:?}");
            assert_eq!(user_role(Some(token)), None);
            assert!(user_permissions(Some(token)).is_empty());
            assert!(!has_permission(Some(token), permissions::READ_RELEASES));
        }
    }

    #[test]
    fn test_no_token() {
        assert_eq!(user_role(None), None);
        assert!(user_permissions(None).is_empty());
        assert!(!has_permission(None, permissions::READ_RELEASES));
    }

    #[test]
    fn test_unicode_payload() {
        // '_' and '-' in the encoding must be mapped back before decoding
        let token = unsigned_token(&json!({"role": "qa_engineer", "name": "Zoë ~~~???>>>"}));
        assert_eq!(user_role(Some(&token)).as_deref(), Some("qa_engineer"));
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        // "{"role":"qa"}" base64 with '=' padding
        let token = "h.eyJyb2xlIjoicWEifQ==.s";
        assert_eq!(user_role(Some(token)).as_deref(), Some("qa"));
    }

    #[test]
    fn test_absent_or_non_string_claims() {
        let token = unsigned_token(&json!({"sub": "x@example.com"}));
        assert_eq!(decode(&token), Some(TokenClaims::default()));

        let token = unsigned_token(&json!({"role": 7, "permissions": ["read:releases"]}));
        assert_eq!(user_role(Some(&token)), None);
        assert!(user_permissions(Some(&token)).is_empty());

        let token = unsigned_token(&json!({"role": "", "permissions": ""}));
        assert_eq!(user_role(Some(&token)), None);
        assert!(user_permissions(Some(&token)).is_empty());
    }

    #[test]
    fn test_admin_has_every_permission() {
        let token = unsigned_token(&json!({"role": "admin"}));
        assert!(has_permission(Some(&token), "create:releases"));
        assert!(has_permission(Some(&token), "anything:at-all"));
        assert!(has_permission(Some(&token), ""));
    }

    #[test]
    fn test_permission_match_is_exact() {
        let token = unsigned_token(&json!({
            "role": "release_manager",
            "permissions": "read:releases,create:releases"
        }));
        assert!(has_permission(Some(&token), "create:releases"));
        assert!(!has_permission(Some(&token), "Create:Releases"));
        assert!(!has_permission(Some(&token), "create:release"));
        assert!(!has_permission(Some(&token), "create:services"));
    }

    #[test]
    fn test_decoding_is_idempotent() {
        let token = unsigned_token(&json!({"role": "qa_engineer", "permissions": "read:releases"}));
        assert_eq!(decode(&token), decode(&token));
    }

    #[test]
    fn test_context_claims_and_invalidation() {
        let token = unsigned_token(&json!({
            "role": "qa_engineer",
            "permissions": "read:releases,read:services"
        }));
        let ctx = AuthContext::new(token.clone(), "bearer");
        assert_eq!(ctx.bearer(), format!("Bearer {token}"));
        assert_eq!(ctx.role().as_deref(), Some("qa_engineer"));
        assert!(ctx.has_permission(permissions::READ_SERVICES));
        assert!(!ctx.has_permission(permissions::CREATE_RELEASES));

        let clone = ctx.clone();
        assert!(!clone.is_invalidated());
        ctx.invalidate();
        assert!(clone.is_invalidated());

        assert!(!format!("{ctx:?}").contains(&token));
    }
}
