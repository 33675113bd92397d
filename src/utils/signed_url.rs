use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignedUrlError {
    #[error("malformed download token")]
    Malformed,
    #[error("download token signature mismatch")]
    BadSignature,
    #[error("download token expired")]
    Expired,
}

impl From<SignedUrlError> for crate::error::AppError {
    fn from(err: SignedUrlError) -> Self {
        crate::error::AppError::auth(err.to_string())
    }
}

/// Claims carried by a download token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadClaims {
    pub document_id: Uuid,
    pub version: i32,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies time-limited document download tokens.
///
/// Token layout: `base64url(document_id|version|expires_unix)` `.` `hex(hmac_sha256(payload))`.
#[derive(Clone)]
pub struct SignedUrlSigner {
    secret: Vec<u8>,
    ttl_secs: u64,
}

impl SignedUrlSigner {
    pub fn new(secret: impl AsRef<[u8]>, ttl_secs: u64) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn sign(&self, document_id: Uuid, version: i32) -> (String, DateTime<Utc>) {
        let expires_at = Utc::now() + chrono::Duration::seconds(self.ttl_secs as i64);
        (self.sign_until(document_id, version, expires_at), expires_at)
    }

    pub fn sign_until(&self, document_id: Uuid, version: i32, expires_at: DateTime<Utc>) -> String {
        let payload = format!("{}|{}|{}", document_id, version, expires_at.timestamp());
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload.as_bytes()),
            hex::encode(self.mac(payload.as_bytes()).finalize().into_bytes())
        )
    }

    pub fn verify(&self, token: &str) -> Result<DownloadClaims, SignedUrlError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<DownloadClaims, SignedUrlError> {
        let (encoded, signature) = token.split_once('.').ok_or(SignedUrlError::Malformed)?;
        let payload = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| SignedUrlError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| SignedUrlError::Malformed)?;

        self.mac(&payload)
            .verify_slice(&signature)
            .map_err(|_| SignedUrlError::BadSignature)?;

        let payload = String::from_utf8(payload).map_err(|_| SignedUrlError::Malformed)?;
        let mut parts = payload.split('|');
        let (Some(id), Some(version), Some(expires), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(SignedUrlError::Malformed);
        };

        let document_id = Uuid::parse_str(id).map_err(|_| SignedUrlError::Malformed)?;
        let version = version.parse::<i32>().map_err(|_| SignedUrlError::Malformed)?;
        let expires_at = expires
            .parse::<i64>()
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .ok_or(SignedUrlError::Malformed)?;

        if now >= expires_at {
            return Err(SignedUrlError::Expired);
        }

        Ok(DownloadClaims {
            document_id,
            version,
            expires_at,
        })
    }

    fn mac(&self, payload: &[u8]) -> HmacSha256 {
        // HMAC accepts keys of any length, so construction cannot fail.
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .unwrap_or_else(|_| unreachable!("hmac key length is unrestricted"));
        mac.update(payload);
        mac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> SignedUrlSigner {
        SignedUrlSigner::new("download-secret", 900)
    }

    #[test]
    fn verifies_fresh_token() {
        let id = Uuid::new_v4();
        let (token, expires_at) = signer().sign(id, 3);
        let claims = signer().verify(&token).unwrap();
        assert_eq!(claims.document_id, id);
        assert_eq!(claims.version, 3);
        assert_eq!(claims.expires_at.timestamp(), expires_at.timestamp());
    }

    #[test]
    fn rejects_expired_token() {
        let expires = Utc::now() - chrono::Duration::seconds(1);
        let token = signer().sign_until(Uuid::new_v4(), 1, expires);
        assert_eq!(signer().verify(&token), Err(SignedUrlError::Expired));
    }

    #[test]
    fn rejects_tampered_payload() {
        let id = Uuid::new_v4();
        let expires = Utc::now() + chrono::Duration::seconds(60);
        let token = signer().sign_until(id, 1, expires);
        let (_, signature) = token.split_once('.').unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(format!("{}|2|{}", id, expires.timestamp()));
        let forged = format!("{}.{}", forged_payload, signature);
        assert_eq!(signer().verify(&forged), Err(SignedUrlError::BadSignature));
    }

    #[test]
    fn rejects_other_secret_and_garbage() {
        let (token, _) = signer().sign(Uuid::new_v4(), 1);
        let other = SignedUrlSigner::new("another-secret", 900);
        assert_eq!(other.verify(&token), Err(SignedUrlError::BadSignature));
        assert_eq!(signer().verify("not-a-token"), Err(SignedUrlError::Malformed));
        assert_eq!(signer().verify("abc.zz"), Err(SignedUrlError::Malformed));
    }
}
