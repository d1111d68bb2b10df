//! Bearer token extraction and JWT verification.
//!
//! Two verification modes are supported, picked from [`AuthConfig`]:
//!
//! - **Shared secret** (`auth.secret_key`): HS256 tokens signed with a secret known to this
//!   service. Handy for local development and tests.
//! - **Key set** (`auth.jwks_url`): RS256 tokens from an external identity provider. The JSON Web
//!   Key Set is fetched once at startup and each token picks its key through the `kid` header.
//!
//! In both modes the token must carry the configured issuer and audience and must not be expired.

use crate::{auth::error::AuthError, config::AuthConfig};
use anyhow::Context;
use axum::http::{HeaderMap, header::AUTHORIZATION};
use jsonwebtoken::{
    Algorithm, DecodingKey, Validation, decode, decode_header,
    errors::ErrorKind,
    jwk::JwkSet,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, time::Duration};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Claims this service reads from a verified token.
///
/// `exp`, `iss` and `aud` are checked during decoding and not kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

/// Pull the token out of an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers.get(AUTHORIZATION).ok_or(AuthError::HeaderMissing)?;
    let value = header.to_str().map_err(|_| AuthError::NotBearer)?;

    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        [scheme, ..] if !scheme.eq_ignore_ascii_case("bearer") => Err(AuthError::NotBearer),
        [] => Err(AuthError::NotBearer),
        [_] => Err(AuthError::TokenMissing),
        [_, token] => Ok(*token),
        _ => Err(AuthError::TooManyParts),
    }
}

enum VerificationKeys {
    Shared(DecodingKey),
    ByKeyId(HashMap<String, DecodingKey>),
}

/// Verifies bearer tokens against the configured key material
pub struct TokenVerifier {
    keys: VerificationKeys,
    validation: Validation,
}

fn validation(algorithm: Algorithm, issuer: &str, audience: &str) -> Validation {
    let mut validation = Validation::new(algorithm);
    // jsonwebtoken only checks iss/aud when present unless they are required
    validation.set_required_spec_claims(&["exp", "iss", "aud"]);
    validation.set_issuer(&[issuer]);
    validation.set_audience(&[audience]);
    validation
}

impl TokenVerifier {
    /// HS256 verification with a shared secret
    pub fn with_secret(secret: &str, issuer: &str, audience: &str) -> Self {
        Self {
            keys: VerificationKeys::Shared(DecodingKey::from_secret(secret.as_bytes())),
            validation: validation(Algorithm::HS256, issuer, audience),
        }
    }

    /// RS256 verification against a JSON Web Key Set. Keys without a `kid` or that cannot be
    /// used for verification are skipped.
    pub fn with_key_set(jwks: &JwkSet, issuer: &str, audience: &str) -> anyhow::Result<Self> {
        let mut keys = HashMap::new();
        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                warn!("Skipping JWK without a key id");
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(e) => warn!("Skipping unusable JWK {}: {}", kid, e),
            }
        }

        anyhow::ensure!(!keys.is_empty(), "JWKS contains no usable signing keys");
        debug!("Loaded {} verification keys", keys.len());

        Ok(Self {
            keys: VerificationKeys::ByKeyId(keys),
            validation: validation(Algorithm::RS256, issuer, audience),
        })
    }

    /// Download a JSON Web Key Set
    #[instrument(skip_all, fields(url = %url), err)]
    pub async fn fetch_key_set(url: &Url, timeout: Duration) -> anyhow::Result<JwkSet> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let jwks = client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await?;

        Ok(jwks)
    }

    /// Build the verifier described by the auth configuration, fetching the key set if needed
    pub async fn from_config(auth: &AuthConfig) -> anyhow::Result<Self> {
        match (&auth.secret_key, &auth.jwks_url) {
            (Some(secret), None) => {
                info!("Verifying bearer tokens with the shared secret (HS256)");
                Ok(Self::with_secret(secret, &auth.issuer, &auth.audience))
            }
            (None, Some(url)) => {
                info!("Verifying bearer tokens against JWKS at {}", url);
                let jwks = Self::fetch_key_set(url, auth.jwks_timeout)
                    .await
                    .with_context(|| format!("failed to load JWKS from {url}"))?;
                Self::with_key_set(&jwks, &auth.issuer, &auth.audience)
            }
            _ => anyhow::bail!("exactly one of auth.secret_key and auth.jwks_url must be set"),
        }
    }

    /// Verify a token's signature, expiry, issuer and audience, and decode its claims
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let key = match &self.keys {
            VerificationKeys::Shared(key) => key,
            VerificationKeys::ByKeyId(keys) => {
                let header = decode_header(token).map_err(|e| AuthError::Malformed { reason: e.to_string() })?;
                let kid = header.kid.ok_or(AuthError::MissingKeyId)?;
                keys.get(&kid).ok_or(AuthError::UnknownKey)?
            }
        };

        let token_data = decode::<Claims>(token, key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::ImmatureSignature => AuthError::InvalidClaims,
            _ => AuthError::Malformed { reason: e.to_string() },
        })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TEST_AUDIENCE, TEST_ISSUER, TEST_SECRET, mint_token, mint_token_with};
    use axum::http::HeaderValue;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    const TEST_JWKS: &str = include_str!("../../testdata/jwks.json");
    const TEST_RSA_KEY: &[u8] = include_bytes!("../../testdata/rsa_private.pem");
    const TEST_KID: &str = "quizbrew-test-key";

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn secret_verifier() -> TokenVerifier {
        TokenVerifier::with_secret(TEST_SECRET, TEST_ISSUER, TEST_AUDIENCE)
    }

    fn key_set_verifier() -> TokenVerifier {
        let jwks: JwkSet = serde_json::from_str(TEST_JWKS).unwrap();
        TokenVerifier::with_key_set(&jwks, TEST_ISSUER, TEST_AUDIENCE).unwrap()
    }

    fn rs256_token(kid: Option<&str>) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = kid.map(str::to_string);
        let claims = json!({
            "sub": "auth0|manager",
            "iss": TEST_ISSUER,
            "aud": TEST_AUDIENCE,
            "exp": chrono::Utc::now().timestamp() + 600,
            "permissions": ["get:drinks-detail"],
        });
        encode(&header, &claims, &EncodingKey::from_rsa_pem(TEST_RSA_KEY).unwrap()).unwrap()
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(&HeaderMap::new()), Err(AuthError::HeaderMissing));
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), Err(AuthError::NotBearer));
        assert_eq!(bearer_token(&headers("Bearer")), Err(AuthError::TokenMissing));
        assert_eq!(bearer_token(&headers("Bearer abc def")), Err(AuthError::TooManyParts));
        assert_eq!(bearer_token(&headers("")), Err(AuthError::NotBearer));
    }

    #[test]
    fn test_secret_verifier_accepts_valid_token() {
        let token = mint_token(&["post:drinks", "patch:drinks"]);
        let claims = secret_verifier().verify(&token).unwrap();
        assert_eq!(
            claims.permissions,
            Some(vec!["post:drinks".to_string(), "patch:drinks".to_string()])
        );
    }

    #[test]
    fn test_expired_token() {
        let token = mint_token_with(json!({
            "iss": TEST_ISSUER,
            "aud": TEST_AUDIENCE,
            "exp": chrono::Utc::now().timestamp() - 3600,
            "permissions": ["post:drinks"],
        }));
        let err = secret_verifier().verify(&token).unwrap_err();
        assert_eq!(err, AuthError::Expired);
        assert_eq!(err.code(), "token_expired");
    }

    #[test]
    fn test_wrong_audience_or_issuer() {
        for (iss, aud) in [(TEST_ISSUER, "some-other-api"), ("https://evil.example.com/", TEST_AUDIENCE)] {
            let token = mint_token_with(json!({
                "iss": iss,
                "aud": aud,
                "exp": chrono::Utc::now().timestamp() + 600,
            }));
            assert_eq!(secret_verifier().verify(&token), Err(AuthError::InvalidClaims));
        }
    }

    #[test]
    fn test_issuer_and_audience_are_required() {
        let exp = chrono::Utc::now().timestamp() + 600;
        let permissions = ["get:drinks-detail"];
        for claims in [
            json!({"exp": exp, "permissions": permissions}),
            json!({"aud": TEST_AUDIENCE, "exp": exp, "permissions": permissions}),
            json!({"iss": TEST_ISSUER, "exp": exp, "permissions": permissions}),
        ] {
            let err = secret_verifier().verify(&mint_token_with(claims)).unwrap_err();
            assert_eq!(err, AuthError::InvalidClaims);
            assert_eq!(err.code(), "invalid_claims");
        }
    }

    #[test]
    fn test_bad_signature_and_garbage() {
        let forged = TokenVerifier::with_secret("a-different-secret", TEST_ISSUER, TEST_AUDIENCE);
        let token = mint_token(&["delete:drinks"]);
        assert!(matches!(forged.verify(&token), Err(AuthError::Malformed { .. })));
        assert!(matches!(secret_verifier().verify("not-a-jwt"), Err(AuthError::Malformed { .. })));
    }

    #[test]
    fn test_key_set_verifier() {
        let verifier = key_set_verifier();

        let claims = verifier.verify(&rs256_token(Some(TEST_KID))).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("auth0|manager"));

        assert_eq!(verifier.verify(&rs256_token(None)), Err(AuthError::MissingKeyId));
        assert_eq!(verifier.verify(&rs256_token(Some("rotated-away"))), Err(AuthError::UnknownKey));
    }

    #[test]
    fn test_key_set_rejects_hs256_tokens() {
        // An HS256 token signed with the public modulus must not pass as RS256
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(TEST_KID.to_string());
        let token = encode(
            &header,
            &json!({"iss": TEST_ISSUER, "aud": TEST_AUDIENCE, "exp": chrono::Utc::now().timestamp() + 600}),
            &EncodingKey::from_secret(TEST_JWKS.as_bytes()),
        )
        .unwrap();
        assert!(matches!(key_set_verifier().verify(&token), Err(AuthError::Malformed { .. })));
    }

    #[test]
    fn test_empty_key_set_is_rejected() {
        let jwks: JwkSet = serde_json::from_str(r#"{"keys": []}"#).unwrap();
        assert!(TokenVerifier::with_key_set(&jwks, TEST_ISSUER, TEST_AUDIENCE).is_err());
    }

    #[tokio::test]
    async fn test_from_config_fetches_key_set() {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(TEST_JWKS, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let auth = AuthConfig {
            secret_key: None,
            jwks_url: Some(format!("{}/.well-known/jwks.json", server.uri()).parse().unwrap()),
            issuer: TEST_ISSUER.to_string(),
            audience: TEST_AUDIENCE.to_string(),
            ..Default::default()
        };

        let verifier = TokenVerifier::from_config(&auth).await.unwrap();
        assert!(verifier.verify(&rs256_token(Some(TEST_KID))).is_ok());
    }

    #[tokio::test]
    async fn test_from_config_fails_when_key_set_unavailable() {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let auth = AuthConfig {
            secret_key: None,
            jwks_url: Some(format!("{}/.well-known/jwks.json", server.uri()).parse().unwrap()),
            ..Default::default()
        };

        let err = TokenVerifier::from_config(&auth).await.err().expect("503 must fail startup");
        assert!(format!("{err:#}").contains("failed to load JWKS"));
    }
}
