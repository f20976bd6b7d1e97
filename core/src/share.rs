//! Stateless share tokens for todo lists.
//!
//! # Design
//! A token is `<list id, 32 hex><signature, 32 hex>`: 64 lowercase hex
//! characters, safe in a URL path segment. The signature is the first 32 hex
//! characters of HMAC-SHA256 over the dashed form of the list id, keyed with
//! a process-wide secret. Nothing is persisted. Tokens never expire; rotating
//! the secret invalidates every outstanding token at once.
//!
//! Verification never says which check failed. Wrong length, a bad id and a
//! bad signature all produce the same [`ShareTokenError`].

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const ID_LEN: usize = 32;
const SIGNATURE_LEN: usize = 32;

/// Length of every share token.
pub const TOKEN_LEN: usize = ID_LEN + SIGNATURE_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid or malformed share token")]
pub struct ShareTokenError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareSecretError {
    #[error("share token secret must not be empty")]
    Empty,
}

/// Mints and verifies share tokens with one server-wide secret.
///
/// Every instance of a deployment must be built from the same secret, since
/// any instance may verify a token minted by another.
#[derive(Clone)]
pub struct ShareTokenCodec {
    mac: HmacSha256,
}

impl std::fmt::Debug for ShareTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareTokenCodec").finish_non_exhaustive()
    }
}

impl ShareTokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, ShareSecretError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(ShareSecretError::Empty);
        }
        // HMAC takes keys of any length; only the empty key is refused.
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| ShareSecretError::Empty)?;
        Ok(Self { mac })
    }

    /// Token for `list_id`. Deterministic for a given secret.
    pub fn encode(&self, list_id: Uuid) -> String {
        let mut token = list_id.simple().to_string();
        token.push_str(&self.signature(&list_id));
        token
    }

    /// Recover the list id from `token`, checking its signature.
    pub fn decode(&self, token: &str) -> Result<Uuid, ShareTokenError> {
        if token.len() != TOKEN_LEN || !token.is_ascii() {
            return Err(ShareTokenError);
        }
        let (id_part, signature) = token.split_at(ID_LEN);

        let dashed = format!(
            "{}-{}-{}-{}-{}",
            &id_part[0..8],
            &id_part[8..12],
            &id_part[12..16],
            &id_part[16..20],
            &id_part[20..32],
        );
        let list_id = Uuid::parse_str(&dashed).map_err(|_| ShareTokenError)?;

        // Only the canonical lowercase spelling of the id is accepted, so a
        // case flip in the id half is a different token.
        let canonical_id = list_id.simple().to_string();
        let expected = self.signature(&list_id);
        let id_ok = canonical_id.as_bytes().ct_eq(id_part.as_bytes());
        let sig_ok = expected.as_bytes().ct_eq(signature.as_bytes());

        if bool::from(id_ok & sig_ok) {
            Ok(list_id)
        } else {
            Err(ShareTokenError)
        }
    }

    fn signature(&self, list_id: &Uuid) -> String {
        let mut mac = self.mac.clone();
        mac.update(list_id.hyphenated().to_string().as_bytes());
        let mut digest = hex::encode(mac.finalize().into_bytes());
        digest.truncate(SIGNATURE_LEN);
        digest
    }
}
