//! Receipt Signers
//!
//! Receipts are signed either by the external signing server or locally with
//! an RSA key (RS512).

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mp_config::{ReceiptConfig, SigningConfig};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::entity::Receipt;
use crate::shared::error::{PlatformError, Result};

/// Environment variable holding the PEM key when no key file is configured
pub const RECEIPT_KEY_ENV: &str = "MARKETPLACE_RECEIPT_KEY";

#[async_trait]
pub trait ReceiptSigner: Send + Sync {
    fn name(&self) -> &'static str;
    /// Sign the claims and return the compact token.
    async fn sign(&self, receipt: &Receipt) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct SignedResponse {
    receipt: String,
}

/// Posts the claims to the signing server and returns its `receipt` field.
pub struct SigningServerSigner {
    client: reqwest::Client,
    url: String,
}

impl SigningServerSigner {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ReceiptSigner for SigningServerSigner {
    fn name(&self) -> &'static str {
        "signing-server"
    }

    async fn sign(&self, receipt: &Receipt) -> Result<String> {
        debug!(url = %self.url, "Calling signing server");
        let response = self.client.post(&self.url).json(receipt).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(url = %self.url, status = status.as_u16(), "Signing server rejected receipt");
            return Err(PlatformError::SigningServer { status: status.as_u16() });
        }

        let body: SignedResponse = response.json().await?;
        Ok(body.receipt)
    }
}

/// Signs with a local RSA private key.
pub struct LocalSigner {
    encoding_key: EncodingKey,
    public_key_pem: String,
}

impl LocalSigner {
    /// Build from a PKCS#8 or PKCS#1 private key PEM.
    pub fn from_pem(private_key_pem: &str) -> Result<Self> {
        use rsa::pkcs1::DecodeRsaPrivateKey;
        use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey, LineEnding};
        use rsa::{RsaPrivateKey, RsaPublicKey};

        let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(private_key_pem))
            .map_err(|e| PlatformError::key(format!("Invalid RSA private key: {}", e)))?;

        let public_key_pem = RsaPublicKey::from(&private_key)
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| PlatformError::key(format!("Failed to encode RSA public key: {}", e)))?;

        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| PlatformError::key(format!("Invalid RSA private key: {}", e)))?;

        Ok(Self {
            encoding_key,
            public_key_pem,
        })
    }

    /// Load the key from `key_path`, or from [`RECEIPT_KEY_ENV`] when the
    /// path is empty or unreadable.
    pub fn load(key_path: &str) -> Result<Self> {
        if !key_path.is_empty() {
            match fs::read_to_string(key_path) {
                Ok(pem) => {
                    info!(path = key_path, "Loaded receipt signing key from file");
                    return Self::from_pem(&pem);
                }
                Err(e) => warn!(path = key_path, error = %e, "Could not read receipt signing key"),
            }
        }

        match std::env::var(RECEIPT_KEY_ENV) {
            Ok(pem) if !pem.is_empty() => {
                info!(env = RECEIPT_KEY_ENV, "Loaded receipt signing key from env");
                Self::from_pem(&pem)
            }
            _ => Err(PlatformError::key("No receipt signing key configured")),
        }
    }

    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    /// Check a token signed by this key and return its claims.
    pub fn verify(&self, token: &str) -> Result<Receipt> {
        let decoding_key = DecodingKey::from_rsa_pem(self.public_key_pem.as_bytes())?;
        let validation = Validation::new(Algorithm::RS512);
        Ok(decode::<Receipt>(token, &decoding_key, &validation)?.claims)
    }
}

#[async_trait]
impl ReceiptSigner for LocalSigner {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn sign(&self, receipt: &Receipt) -> Result<String> {
        let header = Header::new(Algorithm::RS512);
        encode(&header, receipt, &self.encoding_key)
            .map_err(|e| PlatformError::signing(format!("Failed to encode receipt: {}", e)))
    }
}

/// The signing server when it is active, otherwise the local key.
pub fn signer_from_config(
    signing: &SigningConfig,
    receipts: &ReceiptConfig,
) -> Result<Arc<dyn ReceiptSigner>> {
    if signing.active {
        if signing.server_url.is_empty() {
            return Err(PlatformError::validation(
                "signing.server_url is required when the signing server is active",
            ));
        }
        info!(url = %signing.server_url, "Receipts signed by signing server");
        let signer = SigningServerSigner::new(
            signing.server_url.clone(),
            Duration::from_secs(signing.timeout_secs),
        )?;
        return Ok(Arc::new(signer));
    }

    info!("Receipts signed with local key");
    Ok(Arc::new(LocalSigner::load(&receipts.key_path)?))
}
