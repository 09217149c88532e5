//! # JwtTokenService
//!
//! HS256 bearer tokens. The subject is the user id, the first audience
//! entry carries the role name and the issuer is fixed per deployment.
//! Tokens are issued with an array audience; a bare string is accepted on
//! verification.
//!
//! Verification rejects (as `InvalidCredential`):
//! * bad signature or wrong algorithm
//! * expired tokens
//! * wrong issuer
//! * an empty audience, or a first audience entry that is not a known role
//! * a non-numeric subject

use chrono::{DateTime, Duration, Utc};
use domains::{Actor, DomainError, IssuedToken, Result, Role, TokenService, UserId};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Registered claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(deserialize_with = "one_or_many")]
    pub aud: Vec<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Audience {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Audience::deserialize(deserializer)? {
        Audience::One(aud) => vec![aud],
        Audience::Many(aud) => aud,
    })
}

pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
}

impl JwtTokenService {
    pub fn new(secret: &[u8], issuer: impl Into<String>, ttl: Duration) -> Self {
        let issuer = issuer.into();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_audience(&Role::ALL.map(Role::as_str));
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, actor: &Actor, now: DateTime<Utc>) -> Result<IssuedToken> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: actor.id.to_string(),
            aud: vec![actor.role.as_str().to_string()],
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(DomainError::storage)?;
        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, token: &str) -> Result<Actor> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| {
                debug!(%err, "token rejected");
                DomainError::InvalidCredential
            })?
            .claims;

        let Some(first) = claims.aud.first() else {
            debug!("token carries an empty audience");
            return Err(DomainError::InvalidCredential);
        };
        let role: Role = first.parse().map_err(|err| {
            debug!(%err, "token carries an unknown role");
            DomainError::InvalidCredential
        })?;
        let id: UserId = claims.sub.parse().map_err(|_| {
            debug!(sub = %claims.sub, "token subject is not a user id");
            DomainError::InvalidCredential
        })?;
        Ok(Actor::new(id, role))
    }
}
