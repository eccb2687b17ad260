//! Purchase Receipts

pub mod cache;
pub mod entity;
pub mod service;
pub mod signer;

pub use cache::ReceiptCache;
pub use entity::{Receipt, ReceiptFlavour, ReceiptProduct, ReceiptUser, REVIEWER_EXPIRY_SECS};
pub use service::ReceiptService;
pub use signer::{signer_from_config, LocalSigner, ReceiptSigner, SigningServerSigner};
