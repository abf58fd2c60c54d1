//! Capability token codec for the transfer/finalize phases.
//!
//! Payload: expiry_ts (u64 BE) || attachment_id (16 bytes) || report_id (16 bytes)
//! || type (1 byte) = 41 bytes. Token = base64url(payload || HMAC-SHA256(secret, payload)).
//!
//! Tokens are never persisted: verification is purely signature plus expiry,
//! so minting and verifying are safe on multiple nodes sharing the secret.
//! A token authorizes both transfer and finalize of one attachment; the
//! state machine makes replay useless once the record is terminal.

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::AttachmentType;

/// Capability token lifetime.
pub const TOKEN_TTL: Duration = Duration::minutes(5);

const PAYLOAD_LEN: usize = 8 + 16 + 16 + 1; // expiry + attachment_id + report_id + type
const MAC_LEN: usize = 32; // SHA256
const TOKEN_LEN: usize = PAYLOAD_LEN + MAC_LEN;

/// Claims asserted by a verified capability token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    pub attachment_id: Uuid,
    pub report_id: Uuid,
    pub attachment_type: AttachmentType,
    pub expires_at: DateTime<Utc>,
}

/// Mints and verifies capability tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
}

impl TokenCodec {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Build a signed token scoped to one attachment. Returns the token and
    /// its expiry instant (mint time + 5 minutes).
    pub fn mint(
        &self,
        attachment_id: Uuid,
        report_id: Uuid,
        attachment_type: AttachmentType,
    ) -> (String, DateTime<Utc>) {
        let expires_at = Utc::now() + TOKEN_TTL;
        let token = self.mint_with_expiry(attachment_id, report_id, attachment_type, expires_at);
        (token, expires_at)
    }

    fn mint_with_expiry(
        &self,
        attachment_id: Uuid,
        report_id: Uuid,
        attachment_type: AttachmentType,
        expires_at: DateTime<Utc>,
    ) -> String {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[0..8].copy_from_slice(&(expires_at.timestamp().max(0) as u64).to_be_bytes());
        payload[8..24].copy_from_slice(attachment_id.as_bytes());
        payload[24..40].copy_from_slice(report_id.as_bytes());
        payload[40] = type_byte(attachment_type);

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret).expect("HMAC accepts any key size");
        mac.update(&payload);
        let tag = mac.finalize().into_bytes();

        let mut token_bytes = [0u8; TOKEN_LEN];
        token_bytes[0..PAYLOAD_LEN].copy_from_slice(&payload);
        token_bytes[PAYLOAD_LEN..].copy_from_slice(&tag);

        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
    }

    /// Verify signature and expiry, returning the embedded claims.
    ///
    /// `TokenInvalid` covers malformed structure and signature mismatch;
    /// `TokenExpired` covers a valid token past its expiry. Callers treat both
    /// as reject, but the codes stay distinguishable in logs.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AppError> {
        self.verify_at(token, Utc::now())
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AppError> {
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| AppError::TokenInvalid("not base64url".to_string()))?;
        if decoded.len() != TOKEN_LEN {
            return Err(AppError::TokenInvalid("wrong length".to_string()));
        }
        let (payload, tag) = decoded.split_at(PAYLOAD_LEN);
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret).expect("HMAC accepts any key size");
        mac.update(payload);
        mac.verify_slice(tag)
            .map_err(|_| AppError::TokenInvalid("signature mismatch".to_string()))?;

        let expiry_ts = u64::from_be_bytes(payload[0..8].try_into().expect("fixed slice"));
        let attachment_type = parse_type_byte(payload[40])
            .ok_or_else(|| AppError::TokenInvalid("unknown type byte".to_string()))?;
        let expires_at = DateTime::<Utc>::from_timestamp(expiry_ts as i64, 0)
            .ok_or_else(|| AppError::TokenInvalid("expiry out of range".to_string()))?;

        if now > expires_at {
            return Err(AppError::TokenExpired);
        }

        Ok(TokenClaims {
            attachment_id: Uuid::from_bytes(payload[8..24].try_into().expect("fixed slice")),
            report_id: Uuid::from_bytes(payload[24..40].try_into().expect("fixed slice")),
            attachment_type,
            expires_at,
        })
    }
}

fn type_byte(attachment_type: AttachmentType) -> u8 {
    match attachment_type {
        AttachmentType::Image => 1,
        AttachmentType::Audio => 2,
        AttachmentType::Video => 3,
    }
}

fn parse_type_byte(byte: u8) -> Option<AttachmentType> {
    match byte {
        1 => Some(AttachmentType::Image),
        2 => Some(AttachmentType::Audio),
        3 => Some(AttachmentType::Video),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(b"test-secret".to_vec())
    }

    #[test]
    fn test_mint_then_verify() {
        let codec = codec();
        let attachment_id = Uuid::new_v4();
        let report_id = Uuid::new_v4();
        let (token, expires_at) = codec.mint(attachment_id, report_id, AttachmentType::Image);

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.attachment_id, attachment_id);
        assert_eq!(claims.report_id, report_id);
        assert_eq!(claims.attachment_type, AttachmentType::Image);
        // 1-second granularity: the payload stores whole seconds.
        assert!((claims.expires_at - expires_at).num_seconds().abs() <= 1);
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec();
        let expires_at = Utc::now() - Duration::seconds(1);
        let token = codec.mint_with_expiry(
            Uuid::new_v4(),
            Uuid::new_v4(),
            AttachmentType::Audio,
            expires_at,
        );
        assert!(matches!(codec.verify(&token), Err(AppError::TokenExpired)));
    }

    #[test]
    fn test_token_valid_until_expiry_instant() {
        let codec = codec();
        let (token, expires_at) =
            codec.mint(Uuid::new_v4(), Uuid::new_v4(), AttachmentType::Video);
        // Valid right up to the embedded expiry, rejected after it.
        assert!(codec.verify_at(&token, expires_at - Duration::seconds(1)).is_ok());
        assert!(matches!(
            codec.verify_at(&token, expires_at + Duration::seconds(2)),
            Err(AppError::TokenExpired)
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let codec = codec();
        let (token, _) = codec.mint(Uuid::new_v4(), Uuid::new_v4(), AttachmentType::Image);
        let mut bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(&token)
            .unwrap();
        bytes[10] ^= 0xff;
        let tampered = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&bytes);
        assert!(matches!(
            codec.verify(&tampered),
            Err(AppError::TokenInvalid(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let (token, _) = codec().mint(Uuid::new_v4(), Uuid::new_v4(), AttachmentType::Image);
        let other = TokenCodec::new(b"other-secret".to_vec());
        assert!(matches!(other.verify(&token), Err(AppError::TokenInvalid(_))));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let codec = codec();
        assert!(matches!(
            codec.verify("not-a-token"),
            Err(AppError::TokenInvalid(_))
        ));
        assert!(matches!(codec.verify(""), Err(AppError::TokenInvalid(_))));
    }
}
