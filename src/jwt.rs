use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::Utc;
use rsa::pkcs8::EncodePublicKey;
use rsa::sha2::{Digest, Sha256};
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use serde::Serialize;

use crate::errors::SnowflakeResult;

/// Tokens are minted immediately before each request, so the window only
/// needs to cover one round trip.
const TOKEN_LIFETIME_SECS: i64 = 60;

// Snowflake's keypair validation accepts this header as-is; note the field
// is spelled `type`, not the RFC's `typ`.
#[derive(Serialize)]
struct TokenHeader {
    #[serde(rename = "type")]
    token_type: &'static str,
    alg: &'static str,
}

#[derive(Serialize)]
struct TokenClaims {
    iss: String,
    sub: String,
    iat: i64,
    exp: i64,
}

/// Create a bearer token for the statements API.
///
/// When `fingerprint` is `None` it is computed from the key with
/// [`key_fingerprint`]. Each call produces a fresh token valid for 60
/// seconds from now.
pub fn create_token(
    private_key: &RsaPrivateKey,
    account_identifier: &str,
    user: &str,
    fingerprint: Option<&str>,
) -> SnowflakeResult<String> {
    sign_token(
        private_key,
        account_identifier,
        user,
        fingerprint,
        Utc::now().timestamp(),
    )
}

fn sign_token(
    private_key: &RsaPrivateKey,
    mut account_identifier: &str,
    user: &str,
    fingerprint: Option<&str>,
    issued_at: i64,
) -> SnowflakeResult<String> {
    let fingerprint = match fingerprint {
        Some(fingerprint) => fingerprint.to_owned(),
        None => key_fingerprint(private_key)?,
    };
    log::debug!("Public key fingerprint: {}", fingerprint);
    // If there is an account region included, remove it:
    // AAA00000.us-east-1 should become AAA00000
    if let Some(dot) = account_identifier.find('.') {
        account_identifier = &account_identifier[..dot];
    }
    let qualified_username = format!(
        "{}.{}",
        account_identifier.to_ascii_uppercase(),
        user.to_ascii_uppercase()
    );

    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&TokenHeader {
        token_type: "JWT",
        alg: "RS256",
    })?);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&TokenClaims {
        iss: format!("{qualified_username}.{fingerprint}"),
        sub: qualified_username,
        iat: issued_at,
        exp: issued_at + TOKEN_LIFETIME_SECS,
    })?);

    // The server validates the signature over the exact header.payload
    // string, so the segments above must not be re-encoded.
    let message = format!("{header}.{payload}");
    let digest = Sha256::digest(message.as_bytes());
    let signature = private_key.sign(Pkcs1v15Sign::new::<Sha256>(), digest.as_slice())?;
    Ok(format!("{message}.{}", URL_SAFE_NO_PAD.encode(signature)))
}

/// The fingerprint of the public key, as Snowflake displays it in
/// `DESCRIBE USER`: a SHA-256 digest of the DER-encoded public key,
/// standard base64 with padding, prefixed with `SHA256:`.
pub fn key_fingerprint(private_key: &RsaPrivateKey) -> SnowflakeResult<String> {
    let der = private_key.to_public_key().to_public_key_der()?;
    let digest = Sha256::digest(der.as_bytes());
    Ok(format!("SHA256:{}", STANDARD.encode(digest)))
}
