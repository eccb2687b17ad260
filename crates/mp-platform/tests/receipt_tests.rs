//! Purchase Receipt Tests
//!
//! Tests for:
//! - Claim construction per flavour
//! - Developer and reviewer authorization
//! - Local RS512 signing
//! - Signing server delegation
//! - Token caching

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mp_config::{AppConfig, ReceiptConfig, SiteConfig, DEFAULT_RECEIPT_EXPIRY_SECS};
use mp_platform::catalog::{Addon, InMemoryCatalog, Installed, User};
use mp_platform::receipt::{
    LocalSigner, Receipt, ReceiptFlavour, ReceiptService, ReceiptSigner, REVIEWER_EXPIRY_SECS,
};
use mp_platform::{PlatformError, Result};

const PRIVATE_KEY: &str = include_str!("fixtures/receipt_private.pem");
const PUBLIC_KEY: &str = include_str!("fixtures/receipt_public.pem");

const ADDON: u64 = 337141;
const BUYER_INSTALL: u64 = 1;
const REVIEWER_INSTALL: u64 = 2;
const AUTHOR_INSTALL: u64 = 3;
const NOW: i64 = 1_700_000_000;

fn site() -> SiteConfig {
    SiteConfig {
        url: "http://marketplace.test".to_string(),
        locale: "en-US".to_string(),
        app: "firefox".to_string(),
    }
}

fn receipts() -> ReceiptConfig {
    ReceiptConfig {
        receipt_url: "http://receipts.test/verify/".to_string(),
        ..ReceiptConfig::default()
    }
}

fn catalog() -> Arc<InMemoryCatalog> {
    let catalog = Arc::new(InMemoryCatalog::new());
    catalog.insert_addon(
        Addon::new(ADDON, "Something Something Steamcube!", "something-something")
            .with_origin("http://app.example")
            .with_author(10),
    );
    catalog.insert_user(User::new(5, "buyer"));
    catalog.insert_user(User::new(6, "reviewer").with_permission("Apps:Review"));
    catalog.insert_user(User::new(10, "author"));
    catalog.insert_installed(Installed::new(BUYER_INSTALL, ADDON, 5).with_uuid("buyer-uuid"));
    catalog.insert_installed(Installed::new(REVIEWER_INSTALL, ADDON, 6).with_uuid("reviewer-uuid"));
    catalog.insert_installed(Installed::new(AUTHOR_INSTALL, ADDON, 10).with_uuid("author-uuid"));
    catalog
}

fn local_service() -> ReceiptService {
    let signer = Arc::new(LocalSigner::from_pem(PRIVATE_KEY).unwrap());
    ReceiptService::new(catalog(), signer, site(), receipts())
}

/// Counts calls and returns a fixed token.
struct CountingSigner {
    calls: AtomicUsize,
}

#[async_trait]
impl ReceiptSigner for CountingSigner {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn sign(&self, _receipt: &Receipt) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("token-{}", call))
    }
}

#[tokio::test]
async fn test_standard_receipt_claims() {
    let receipt = local_service()
        .build_receipt(BUYER_INSTALL, None, NOW)
        .await
        .unwrap();

    assert_eq!(receipt.typ, "purchase-receipt");
    assert_eq!(receipt.iss, "http://marketplace.test");
    assert_eq!(receipt.iat, NOW);
    assert_eq!(receipt.nbf, NOW);
    assert_eq!(receipt.exp, NOW + DEFAULT_RECEIPT_EXPIRY_SECS);
    assert_eq!(
        receipt.detail,
        "http://marketplace.test/en-US/purchases/337141/receipt"
    );
    assert_eq!(
        receipt.reissue,
        "http://marketplace.test/en-US/app/something-something/purchase/reissue"
    );
    assert_eq!(receipt.verify, "http://receipts.test/verify/337141");
    assert_eq!(receipt.product.url, "http://app.example");
    assert_eq!(receipt.product.storedata, "id=337141");
    assert_eq!(receipt.product.flavour, None);
    assert_eq!(receipt.user.user_type, "directed-identifier");
    assert_eq!(receipt.user.value, "buyer-uuid");
}

#[tokio::test]
async fn test_reviewer_receipt_expires_within_a_day() {
    let receipt = local_service()
        .build_receipt(REVIEWER_INSTALL, Some(ReceiptFlavour::Reviewer), NOW)
        .await
        .unwrap();

    assert_eq!(receipt.exp, NOW + REVIEWER_EXPIRY_SECS);
    assert!(receipt.lifetime_secs() <= 24 * 60 * 60);
    assert_eq!(receipt.product.flavour, Some(ReceiptFlavour::Reviewer));
    assert_eq!(receipt.verify, "http://marketplace.test/verify/something-something");
}

#[tokio::test]
async fn test_overflowing_expiry_is_rejected() {
    let config = ReceiptConfig {
        expiry_seconds: i64::MAX,
        ..receipts()
    };
    let signer = Arc::new(LocalSigner::from_pem(PRIVATE_KEY).unwrap());
    let service = ReceiptService::new(catalog(), signer, site(), config);

    let err = service
        .build_receipt(BUYER_INSTALL, None, NOW)
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Validation { .. }));
}

#[tokio::test]
async fn test_author_gets_developer_receipt() {
    let receipt = local_service()
        .build_receipt(AUTHOR_INSTALL, Some(ReceiptFlavour::Developer), NOW)
        .await
        .unwrap();

    assert_eq!(receipt.exp, NOW + DEFAULT_RECEIPT_EXPIRY_SECS);
    assert_eq!(receipt.product.flavour, Some(ReceiptFlavour::Developer));
}

#[tokio::test]
async fn test_flavoured_receipt_requires_reviewer_or_author() {
    let service = local_service();

    for flavour in [ReceiptFlavour::Developer, ReceiptFlavour::Reviewer] {
        let err = service
            .build_receipt(BUYER_INSTALL, Some(flavour), NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::PermissionDenied { .. }), "{:?}", err);
    }

    assert!(service
        .build_receipt(REVIEWER_INSTALL, Some(ReceiptFlavour::Developer), NOW)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_unknown_installation_is_not_found() {
    let err = local_service().create_receipt(404, None).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_local_signature_verifies_with_public_key() {
    let token = local_service().create_receipt(BUYER_INSTALL, None).await.unwrap();

    let header = decode_header(&token).unwrap();
    assert_eq!(header.alg, Algorithm::RS512);

    let key = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap();
    let claims = decode::<Receipt>(&token, &key, &Validation::new(Algorithm::RS512))
        .unwrap()
        .claims;
    assert_eq!(claims.user.value, "buyer-uuid");
    assert_eq!(claims.verify, "http://receipts.test/verify/337141");
}

#[tokio::test]
async fn test_local_signer_verify() {
    let signer = LocalSigner::from_pem(PRIVATE_KEY).unwrap();
    assert!(signer.public_key_pem().starts_with("-----BEGIN PUBLIC KEY-----"));

    let receipt = local_service()
        .build_receipt(BUYER_INSTALL, None, chrono::Utc::now().timestamp())
        .await
        .unwrap();
    let token = signer.sign(&receipt).await.unwrap();
    assert_eq!(signer.verify(&token).unwrap(), receipt);
}

#[test]
fn test_invalid_key_is_rejected() {
    let err = LocalSigner::from_pem("not a key").err().unwrap();
    assert!(matches!(err, PlatformError::Key { .. }));
}

#[tokio::test]
async fn test_repeated_requests_use_cache() {
    let signer = Arc::new(CountingSigner {
        calls: AtomicUsize::new(0),
    });
    let service = ReceiptService::new(catalog(), signer.clone(), site(), receipts());

    let first = service.create_receipt(BUYER_INSTALL, None).await.unwrap();
    let second = service.create_receipt(BUYER_INSTALL, None).await.unwrap();
    let reviewer = service
        .create_receipt(REVIEWER_INSTALL, Some(ReceiptFlavour::Reviewer))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_ne!(first, reviewer);
    assert_eq!(signer.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cache_disabled_with_zero_ttl() {
    let signer = Arc::new(CountingSigner {
        calls: AtomicUsize::new(0),
    });
    let config = ReceiptConfig {
        cache_ttl_secs: 0,
        ..receipts()
    };
    let service = ReceiptService::new(catalog(), signer.clone(), site(), config);

    service.create_receipt(BUYER_INSTALL, None).await.unwrap();
    service.create_receipt(BUYER_INSTALL, None).await.unwrap();

    assert_eq!(signer.calls.load(Ordering::SeqCst), 2);
}

fn server_config(server: &MockServer) -> AppConfig {
    let mut config = AppConfig {
        site: site(),
        receipts: receipts(),
        ..AppConfig::default()
    };
    config.signing.active = true;
    config.signing.server_url = format!("{}/1.0/sign", server.uri());
    config
}

#[tokio::test]
async fn test_signing_server_delegation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/1.0/sign"))
        .and(body_partial_json(json!({
            "typ": "purchase-receipt",
            "user": {"type": "directed-identifier", "value": "buyer-uuid"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"receipt": "signed.by.server"})))
        .expect(1)
        .mount(&server)
        .await;

    let service = ReceiptService::from_config(catalog(), &server_config(&server)).unwrap();
    assert_eq!(service.signer_name(), "signing-server");

    let token = service.create_receipt(BUYER_INSTALL, None).await.unwrap();
    assert_eq!(token, "signed.by.server");
}

#[tokio::test]
async fn test_signing_server_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/1.0/sign"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service = ReceiptService::from_config(catalog(), &server_config(&server)).unwrap();
    let err = service.create_receipt(BUYER_INSTALL, None).await.unwrap_err();

    assert!(matches!(err, PlatformError::SigningServer { status: 500 }), "{:?}", err);
}

#[test]
fn test_active_server_requires_url() {
    let mut config = AppConfig::default();
    config.signing.active = true;

    let err = ReceiptService::from_config(catalog(), &config).err().unwrap();
    assert!(matches!(err, PlatformError::Validation { .. }));
}
