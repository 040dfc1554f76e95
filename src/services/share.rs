use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::ShareConfig,
    models::{share::ShareLink, store::Store},
    services::{LookupError, resolve_board},
    storage::{Storage, StorageError},
};

/// Version tag in stored password hashes, `sha256$<salt>$<hex>`.
const HASH_VERSION: &str = "sha256";

const HMAC_BLOCK_SIZE: usize = 64;

/// Byte comparison that does not short-circuit, so password and token
/// checks leak no timing information about where a mismatch occurred.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// HMAC-SHA256 (RFC 2104) over the single available hash primitive.
fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut block_key = [0u8; HMAC_BLOCK_SIZE];
    if key.len() > HMAC_BLOCK_SIZE {
        block_key[..32].copy_from_slice(&sha256(&[key]));
    } else {
        block_key[..key.len()].copy_from_slice(key);
    }

    let inner_pad: Vec<u8> = block_key.iter().map(|b| b ^ 0x36).collect();
    let outer_pad: Vec<u8> = block_key.iter().map(|b| b ^ 0x5c).collect();

    let inner = sha256(&[&inner_pad, message]);
    sha256(&[&outer_pad, &inner])
}

/// Salted one-way password hash in the stored `sha256$<salt>$<hex>` format.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = sha256(&[salt.as_bytes(), b"$", password.as_bytes()]);
    format!("{HASH_VERSION}${salt}${}", hex::encode(digest))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(version), Some(salt), Some(hash)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if version != HASH_VERSION || salt.is_empty() || hash.is_empty() {
        return false;
    }
    let derived = hex::encode(sha256(&[salt.as_bytes(), b"$", password.as_bytes()]));
    constant_time_eq(derived.as_bytes(), hash.as_bytes())
}

/// Hex HMAC of the share token under the configured secret. This is the
/// cookie value handed out after a successful unlock.
pub fn sign_token(token: &str, secret: &str) -> String {
    hex::encode(hmac_sha256(secret.as_bytes(), token.as_bytes()))
}

pub fn cookie_name(token: &str) -> String {
    format!("share_board_{token}")
}

#[derive(Debug, Error)]
pub enum CreateShareError {
    #[error("Share password must not be empty")]
    BlankPassword,

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct CreateShareParameters {
    pub board: String,
    pub password: String,
}

/// Issues a read-only share link for a board: an opaque token plus a salted
/// password hash. The link never expires on its own.
pub fn create_share(
    store: &mut Store,
    storage: &impl Storage,
    parameters: CreateShareParameters,
) -> Result<ShareLink, CreateShareError> {
    if parameters.password.is_empty() {
        return Err(CreateShareError::BlankPassword);
    }
    let board_id = resolve_board(store, &parameters.board)?;

    let share = ShareLink {
        id: Uuid::new_v4(),
        token: Uuid::new_v4().simple().to_string(),
        board_id,
        password_hash: hash_password(&parameters.password),
        created_at: jiff::Timestamp::now(),
    };

    store.add_share(share.clone());
    storage.save(store)?;
    Ok(share)
}

#[derive(Debug, Error)]
pub enum UnlockShareError {
    /// Deliberately uniform: does not reveal whether the token or the
    /// password was wrong.
    #[error("Incorrect share link or password")]
    Incorrect,
}

pub struct UnlockedShare {
    pub board_id: Uuid,
    pub cookie_name: String,
    pub cookie_value: String,
}

/// Checks a presented password against a share link and, on success, hands
/// out the signed cookie that unlocks the read-only board view for the
/// rest of the browser session.
pub fn unlock_share(
    store: &Store,
    config: &ShareConfig,
    token: &str,
    password: &str,
) -> Result<UnlockedShare, UnlockShareError> {
    let share = store
        .find_share_by_token(token)
        .ok_or(UnlockShareError::Incorrect)?;
    if !verify_password(password, &share.password_hash) {
        log::warn!("rejected unlock attempt for share token {token}");
        return Err(UnlockShareError::Incorrect);
    }

    Ok(UnlockedShare {
        board_id: share.board_id,
        cookie_name: cookie_name(token),
        cookie_value: sign_token(token, &config.secret),
    })
}

/// Validates a previously issued share cookie.
pub fn verify_cookie(config: &ShareConfig, token: &str, cookie_value: &str) -> bool {
    let expected = sign_token(token, &config.secret);
    constant_time_eq(expected.as_bytes(), cookie_value.as_bytes())
}
