use crate::SharedData;
use crate::routing_utils::AuthErrorResponse;
use anyhow::{Context, anyhow};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, PasswordHash};
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// How long an issued access token stays valid, in seconds
const TOKEN_VALIDITY_SECONDS: i64 = 3600;

/// The claim set embedded in issued access tokens. `sub` carries the user's ID.
#[derive(Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("the provided token is expired")]
    Expired,
    #[error("the provided token could not be verified")]
    Invalid,
}

/// Issues and verifies the bearer tokens which authenticate API callers. Tokens are
/// HS256-signed JWTs whose subject is the authenticated user's ID.
pub struct TokenAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenAuthority {
    /// Constructs a TokenAuthority deriving its signing keys from [secret]
    pub fn new(secret: &[u8]) -> TokenAuthority {
        let mut validation = Validation::new(Algorithm::HS256);
        // Leeway is disabled so a token is rejected the moment its expiry passes
        validation.leeway = 0;

        TokenAuthority {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Creates a signed access token for the given user
    pub fn issue_token(&self, user_id: i32) -> Result<String, anyhow::Error> {
        let expires_at = Utc::now() + TimeDelta::seconds(TOKEN_VALIDITY_SECONDS);
        let claims = Claims {
            sub: user_id.to_string(),
            exp: expires_at.timestamp() as usize,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .context("signing a new access token")
    }

    /// Verifies an access token's signature and expiry, returning the ID of the user
    /// it was issued to
    pub fn decode_token(&self, token: &str) -> Result<i32, TokenError> {
        let token_data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
                |decode_err| match decode_err.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid,
                },
            )?;

        token_data
            .claims
            .sub
            .parse::<i32>()
            .map_err(|_| TokenError::Invalid)
    }
}

/// Hashes a raw password with Argon2id for at-rest storage
pub fn hash_password(raw_password: &str) -> Result<String, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(raw_password.as_bytes(), &salt)
        .map_err(|hash_err| anyhow!("failed to hash password: {hash_err}"))?;

    Ok(hash.to_string())
}

/// Checks a raw password against a stored Argon2id hash
pub fn verify_password(raw_password: &str, stored_hash: &str) -> Result<bool, anyhow::Error> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|parse_err| anyhow!("stored password hash is malformed: {parse_err}"))?;

    match Argon2::default().verify_password(raw_password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(other_err) => Err(anyhow!("failed to verify password: {other_err}")),
    }
}

/// Extractor which requires a valid bearer token on the request and exposes the ID of
/// the user the token was issued to. Handlers taking this extractor reject
/// unauthenticated requests with a 401 before any business logic runs.
pub struct Authenticated(pub i32);

#[axum::async_trait]
impl FromRequestParts<Arc<SharedData>> for Authenticated {
    type Rejection = AuthErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<SharedData>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthErrorResponse::MissingToken)?;
        let token = auth_header
            .to_str()
            .ok()
            .and_then(|header_value| header_value.strip_prefix("Bearer "))
            .ok_or(AuthErrorResponse::MissingToken)?;

        let user_id = state.tokens.decode_token(token)?;
        Ok(Authenticated(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    mod token_authority {
        use super::*;

        #[test]
        fn issued_token_round_trips() {
            let authority = TokenAuthority::new(b"unit-test-secret");

            let token = authority
                .issue_token(42)
                .expect("token issuance should succeed");
            let decoded_user = authority.decode_token(&token);

            assert_that!(decoded_user).is_ok_containing(42);
        }

        #[test]
        fn rejects_token_signed_with_other_secret() {
            let issuing_authority = TokenAuthority::new(b"secret-one");
            let verifying_authority = TokenAuthority::new(b"secret-two");

            let token = issuing_authority
                .issue_token(7)
                .expect("token issuance should succeed");
            let decode_result = verifying_authority.decode_token(&token);

            assert_that!(decode_result).is_err_containing(TokenError::Invalid);
        }

        #[test]
        fn rejects_expired_token() {
            let authority = TokenAuthority::new(b"unit-test-secret");
            let expired_claims = Claims {
                sub: "3".to_owned(),
                exp: (Utc::now() - TimeDelta::minutes(5)).timestamp() as usize,
            };
            let token = jsonwebtoken::encode(
                &Header::default(),
                &expired_claims,
                &authority.encoding_key,
            )
            .expect("token issuance should succeed");

            let decode_result = authority.decode_token(&token);
            assert_that!(decode_result).is_err_containing(TokenError::Expired);
        }

        #[test]
        fn rejects_garbage_token() {
            let authority = TokenAuthority::new(b"unit-test-secret");

            let decode_result = authority.decode_token("not.a.token");
            assert_that!(decode_result).is_err_containing(TokenError::Invalid);
        }
    }

    mod passwords {
        use super::*;

        #[test]
        fn correct_password_verifies() {
            let hash = hash_password("hunter2hunter2").expect("hashing should succeed");

            let verify_result = verify_password("hunter2hunter2", &hash);
            assert_that!(verify_result).is_ok_containing(true);
        }

        #[test]
        fn wrong_password_does_not_verify() {
            let hash = hash_password("hunter2hunter2").expect("hashing should succeed");

            let verify_result = verify_password("something-else", &hash);
            assert_that!(verify_result).is_ok_containing(false);
        }

        #[test]
        fn malformed_stored_hash_is_an_error() {
            let verify_result = verify_password("hunter2hunter2", "definitely-not-a-phc-string");
            assert_that!(verify_result).is_err();
        }
    }
}
