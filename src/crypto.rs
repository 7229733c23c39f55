// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Random and hash primitives shared by the token store, the PKCE
//! verifier, and the JWK thumbprint calculation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes mixed into a token id before hashing.
pub const TOKEN_RANDOM_BYTES: usize = 32;

/// Fills `buf` with cryptographically strong random bytes.
pub fn random_bytes(buf: &mut [u8]) {
    OsRng.fill_bytes(buf);
}

/// Returns `n` cryptographically strong random bytes.
pub fn random_vec(n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    random_bytes(&mut buf);
    buf
}

/// SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Base64url (no padding) encoding, the encoding used throughout the
/// authorization server for token ids, PKCE challenges, and JWKS fields.
pub fn b64url(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Generates an unpredictable, URL-safe token id.
///
/// The id is `base64url(sha256(secret || random))`: mixing the
/// process-wide server secret into the digest means the exposed id is
/// never a raw RNG sample, even though the normative requirement is
/// simply unpredictability (>=128 bits).
pub fn generate_token_id(server_secret: &[u8]) -> String {
    let random = random_vec(TOKEN_RANDOM_BYTES);
    let mut input = Vec::with_capacity(server_secret.len() + random.len());
    input.extend_from_slice(server_secret);
    input.extend_from_slice(&random);
    b64url(&sha256(&input))
}

/// Derives a PKCE `code_challenge` (S256 method) from a `code_verifier`.
pub fn pkce_challenge(code_verifier: &str) -> String {
    b64url(&sha256(code_verifier.as_bytes()))
}

/// Constant-time byte comparison: every byte of both slices is inspected
/// regardless of earlier mismatches, so elapsed time does not leak how
/// many leading bytes matched. Length is still observable.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pkce_reference_vector() {
        // RFC 7636 appendix B reference value.
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(pkce_challenge(verifier), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn token_ids_are_unique_and_url_safe() {
        let secret = b"server-secret";
        let a = generate_token_id(secret);
        let b = generate_token_id(secret);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn constant_time_eq_matches_equality() {
        assert!(constant_time_eq(b"hunter2", b"hunter2"));
        assert!(!constant_time_eq(b"hunter2", b"hunter3"));
        assert!(!constant_time_eq(b"short", b"longer-value"));
    }
}
