use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::auth::{AuthConfig, AuthError, AuthResult};

/// Registered claims carried by a bearer token. The subject is the owning
/// user's email; timestamps are UNIX epoch seconds.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Stateless issuer/verifier for HS256 bearer tokens. Holds only the derived
/// keys and the configured lifetime, so concurrent use needs no coordination.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl JwtService {
    /// Build the service from configuration. The signing secret must be valid
    /// base64; anything else is a fatal misconfiguration surfaced at startup.
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        let secret_bytes =
            base64::engine::general_purpose::STANDARD.decode(config.jwt_secret.as_bytes())?;
        let encoding_key = EncodingKey::from_secret(&secret_bytes);
        let decoding_key = DecodingKey::from_secret(&secret_bytes);

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is a hard boundary; no clock-skew window.
        validation.leeway = 0;

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            token_ttl: Duration::minutes(config.token_ttl_minutes),
        })
    }

    /// Issue a signed token for `subject`, valid for the configured lifetime.
    pub fn issue(&self, subject: &str) -> AuthResult<SignedToken> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(SignedToken { token, expires_at })
    }

    /// Verify the signature and expiry, returning the subject claim.
    ///
    /// Malformed tokens, bad signatures, and expired tokens all collapse into
    /// [`AuthError::AccessDenied`]; callers never learn which check failed.
    pub fn extract_subject(&self, token: &str) -> AuthResult<String> {
        Ok(self.claims(token)?.sub)
    }

    /// True iff the token verifies, names `expected_subject`, and has not
    /// expired. The expiry re-check mirrors the subject comparison contract;
    /// a token that stops verifying mid-request degrades to `false` rather
    /// than an error.
    pub fn validate(&self, token: &str, expected_subject: &str) -> bool {
        match self.claims(token) {
            Ok(claims) => claims.sub == expected_subject && claims.exp > Utc::now().timestamp(),
            Err(_) => false,
        }
    }

    fn claims(&self, token: &str) -> AuthResult<TokenClaims> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::AccessDenied)
    }
}
