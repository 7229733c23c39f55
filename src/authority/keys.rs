// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! JWT Key Manager (C7): generates an RS256 private key on first start,
//! persists it, and exposes the public JWK set served at
//! `/.well-known/jwks.json`.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::{STANDARD as BASE64_STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use jsonwebtoken::jwk::{AlgorithmParameters, CommonParameters, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse, RSAKeyParameters, RSAKeyType};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::json;
use sha2::{Digest, Sha256};

/// Bit length of the generated RS256 key. 4096 matches the teacher's
/// standalone keygen default and gives ample margin over the RFC 7518
/// minimum.
const RS256_KEY_LENGTH: usize = 4096;

const PRIVATE_KEY_DIRECTIVE: &str = "PrivateKey";

pub struct JwtKeyManager {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    jwk: Jwk,
}

impl JwtKeyManager {
    /// Loads the persisted key at `path`, or generates and persists a
    /// new one if the file does not exist.
    pub fn load_or_generate(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let manager = Self::generate()?;
            manager.persist(path)?;
            Ok(manager)
        }
    }

    fn generate() -> Result<Self> {
        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, RS256_KEY_LENGTH)
            .context("failed to generate RSA private key")?;
        Self::from_private_key(private_key)
    }

    fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading persisted key file {}", path.display()))?;
        let line = contents
            .lines()
            .find_map(|l| l.trim().strip_prefix(PRIVATE_KEY_DIRECTIVE))
            .with_context(|| format!("{} directive not found in {}", PRIVATE_KEY_DIRECTIVE, path.display()))?
            .trim();
        let pem_bytes = BASE64_STANDARD
            .decode(line)
            .context("PrivateKey value is not valid base64")?;
        let pem = String::from_utf8(pem_bytes).context("PrivateKey PEM is not valid UTF-8")?;
        let private_key = RsaPrivateKey::from_pkcs1_pem(&pem).context("invalid RSA private key PEM")?;
        Self::from_private_key(private_key)
    }

    fn from_private_key(private_key: RsaPrivateKey) -> Result<Self> {
        let public_key = RsaPublicKey::from(&private_key);
        let jwk = build_jwk(&public_key)?;
        Ok(Self {
            private_key,
            public_key,
            jwk,
        })
    }

    /// Writes the key atomically (temp file, rename) with file mode
    /// `0600` so the private key never lands on disk world-readable.
    fn persist(&self, path: &Path) -> Result<()> {
        let pem = self
            .private_key
            .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
            .context("failed to encode private key to PEM")?;
        let encoded = BASE64_STANDARD.encode(pem.as_bytes());
        let contents = format!("{PRIVATE_KEY_DIRECTIVE} {encoded}\n");

        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).context("creating temporary key file")?;
        tmp.write_all(contents.as_bytes())
            .context("writing temporary key file")?;
        set_owner_only_permissions(tmp.path())?;
        tmp.persist(path)
            .map_err(|e| anyhow::anyhow!("renaming temporary key file into place: {e}"))?;
        set_owner_only_permissions(path)?;
        Ok(())
    }

    pub fn public_key_pem(&self) -> Result<String> {
        Ok(self
            .public_key
            .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
            .context("failed to encode public key to PEM")?
            .to_string())
    }

    pub fn key_id(&self) -> Option<String> {
        self.jwk.common.key_id.clone()
    }

    /// Serves the single-key JWK set as compact JSON.
    pub fn jwks_json(&self) -> Result<String> {
        let set = JwkSet {
            keys: vec![self.jwk.clone()],
        };
        serde_json::to_string(&set).context("serializing JWKS")
    }

    pub fn encoding_key(&self) -> Result<jsonwebtoken::EncodingKey> {
        let pem = self
            .private_key
            .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
            .context("encoding private key")?;
        jsonwebtoken::EncodingKey::from_rsa_pem(pem.as_bytes()).context("building RS256 encoding key")
    }
}

fn build_jwk(public_key: &RsaPublicKey) -> Result<Jwk> {
    // RFC 7518 §6.3.1: `n` and `e` are base64url-no-pad, not standard base64.
    let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
    let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());
    let kid = jwk_thumbprint(&n, &e)?;
    Ok(Jwk {
        common: CommonParameters {
            public_key_use: Some(PublicKeyUse::Signature),
            key_id: Some(kid),
            key_algorithm: Some(KeyAlgorithm::RS256),
            ..Default::default()
        },
        algorithm: AlgorithmParameters::RSA(RSAKeyParameters {
            key_type: RSAKeyType::RSA,
            n,
            e,
        }),
    })
}

/// RFC 7638 JWK thumbprint, used as the key's `kid`.
fn jwk_thumbprint(n: &str, e: &str) -> Result<String> {
    let canonical = json!({ "e": e, "kty": "RSA", "n": n });
    let bytes = serde_json::to_vec(&canonical)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(URL_SAFE_NO_PAD.encode(hasher.finalize()))
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_round_trips_through_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rauthd.key");
        let manager = JwtKeyManager::load_or_generate(&path).unwrap();
        assert!(path.exists());
        let reloaded = JwtKeyManager::load_or_generate(&path).unwrap();
        assert_eq!(manager.key_id(), reloaded.key_id());
    }

    #[test]
    fn jwks_json_contains_rsa_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rauthd.key");
        let manager = JwtKeyManager::load_or_generate(&path).unwrap();
        let json = manager.jwks_json().unwrap();
        assert!(json.contains("\"kty\":\"RSA\""));
    }

    #[test]
    fn jwk_n_and_e_are_base64url_no_pad() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rauthd.key");
        let manager = JwtKeyManager::load_or_generate(&path).unwrap();
        let n = match &manager.jwk.algorithm {
            AlgorithmParameters::RSA(params) => params.n.clone(),
            _ => panic!("expected RSA key parameters"),
        };
        let e = match &manager.jwk.algorithm {
            AlgorithmParameters::RSA(params) => params.e.clone(),
            _ => panic!("expected RSA key parameters"),
        };
        assert!(!n.contains('+') && !n.contains('/') && !n.contains('='));
        assert!(!e.contains('+') && !e.contains('/') && !e.contains('='));
        assert!(URL_SAFE_NO_PAD.decode(&n).is_ok());
        assert!(URL_SAFE_NO_PAD.decode(&e).is_ok());
        // jsonwebtoken's own decoder must accept what we serve.
        assert!(jsonwebtoken::DecodingKey::from_jwk(&manager.jwk).is_ok());
    }
}
