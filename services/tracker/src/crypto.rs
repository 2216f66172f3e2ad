//! Password hashing, TOTP and secret encryption.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use anyhow::{Context as _, anyhow};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngExt;
use sha2::{Digest, Sha256};
use totp_rs::{Algorithm, Secret, TOTP};

/// Number of backup codes handed out per enrolment.
pub const BACKUP_CODE_COUNT: usize = 10;

const BACKUP_CODE_CHARSET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";
const NONCE_LEN: usize = 12;

/// Hash a password into an Argon2id PHC string.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("argon2 hash: {e}"))?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC string. A malformed hash is an error,
/// a mismatch is `Ok(false)`.
pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow!("invalid password hash: {e}"))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow!("argon2 verify: {e}")),
    }
}

/// Derive the 32-byte AES key used for TOTP secrets from the server secret.
pub fn derive_key(secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"tracker-two-factor:");
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

/// Encrypt with AES-256-GCM. Returns `base64(nonce || ciphertext || tag)`.
pub fn encrypt_secret(key: &[u8; 32], plaintext: &[u8]) -> anyhow::Result<String> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| anyhow!("AES-GCM encrypt: {e}"))?;

    let mut combined = nonce_bytes.to_vec();
    combined.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(combined))
}

pub fn decrypt_secret(key: &[u8; 32], encoded: &str) -> anyhow::Result<Vec<u8>> {
    let combined = STANDARD.decode(encoded).context("decode encrypted secret")?;
    if combined.len() <= NONCE_LEN {
        return Err(anyhow!("ciphertext too short"));
    }
    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| anyhow!("AES-GCM decrypt: {e}"))
}

/// otpauth labels are `issuer:account`, so neither part may carry a colon.
fn otpauth_label(part: &str) -> String {
    part.replace(':', "")
}

fn totp(secret: Vec<u8>, issuer: &str, account: &str) -> anyhow::Result<TOTP> {
    // SHA-1, 6 digits, ±1 step skew, 30 s step
    TOTP::new(
        Algorithm::SHA1,
        6,
        1,
        30,
        secret,
        Some(otpauth_label(issuer)),
        otpauth_label(account),
    )
    .map_err(|e| anyhow!("TOTP init: {e}"))
}

/// New TOTP enrolment: raw secret bytes and the `otpauth://` URI.
pub fn generate_totp(issuer: &str, account: &str) -> anyhow::Result<(Vec<u8>, String)> {
    let secret = Secret::generate_secret()
        .to_bytes()
        .map_err(|e| anyhow!("TOTP secret: {e}"))?;
    let uri = totp(secret.clone(), issuer, account)?.get_url();
    Ok((secret, uri))
}

pub fn verify_totp(secret: &[u8], code: &str, issuer: &str, account: &str) -> anyhow::Result<bool> {
    let code = code.trim();
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Ok(false);
    }
    totp(secret.to_vec(), issuer, account)?
        .check_current(code)
        .map_err(|e| anyhow!("TOTP check: {e}"))
}

/// Generate plain backup codes in the `xxxxx-xxxxx` form.
pub fn generate_backup_codes() -> Vec<String> {
    let mut rng = rand::rng();
    (0..BACKUP_CODE_COUNT)
        .map(|_| {
            let mut code = String::with_capacity(11);
            for i in 0..10 {
                if i == 5 {
                    code.push('-');
                }
                code.push(BACKUP_CODE_CHARSET[rng.random_range(0..BACKUP_CODE_CHARSET.len())] as char);
            }
            code
        })
        .collect()
}

/// Backup codes are compared case-insensitively and without surrounding spaces.
pub fn normalize_backup_code(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}
