//! Receipt Claims
//!
//! The claim set signed into a purchase receipt token.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::error::PlatformError;

/// `typ` claim of every purchase receipt
pub const RECEIPT_TYPE: &str = "purchase-receipt";

/// `user.type` claim, the value is the installation uuid
pub const DIRECTED_IDENTIFIER: &str = "directed-identifier";

/// Lifetime of a reviewer receipt (24 hours)
pub const REVIEWER_EXPIRY_SECS: i64 = 60 * 60 * 24;

/// Non-standard receipt variant. The standard receipt has no flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptFlavour {
    /// Issued to the app's own developers for testing
    Developer,
    /// Issued to marketplace reviewers, short-lived
    Reviewer,
}

impl ReceiptFlavour {
    pub fn as_str(self) -> &'static str {
        match self {
            ReceiptFlavour::Developer => "developer",
            ReceiptFlavour::Reviewer => "reviewer",
        }
    }
}

impl fmt::Display for ReceiptFlavour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReceiptFlavour {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "developer" => Ok(ReceiptFlavour::Developer),
            "reviewer" => Ok(ReceiptFlavour::Reviewer),
            other => Err(PlatformError::validation(format!(
                "Unknown receipt flavour: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptProduct {
    /// Origin of the app
    pub url: String,
    /// Form-encoded store data, `id={addon_id}`
    pub storedata: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub flavour: Option<ReceiptFlavour>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptUser {
    #[serde(rename = "type")]
    pub user_type: String,
    pub value: String,
}

/// Purchase receipt claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub detail: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub nbf: i64,
    pub product: ReceiptProduct,
    pub reissue: String,
    pub typ: String,
    pub user: ReceiptUser,
    pub verify: String,
}

impl Receipt {
    pub fn flavour(&self) -> Option<ReceiptFlavour> {
        self.product.flavour
    }

    /// Seconds between issue and expiry.
    pub fn lifetime_secs(&self) -> i64 {
        self.exp - self.iat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flavour_parse() {
        assert_eq!("reviewer".parse::<ReceiptFlavour>().unwrap(), ReceiptFlavour::Reviewer);
        assert_eq!("developer".parse::<ReceiptFlavour>().unwrap(), ReceiptFlavour::Developer);
        assert!("admin".parse::<ReceiptFlavour>().is_err());
    }

    #[test]
    fn test_product_type_field() {
        let product = ReceiptProduct {
            url: "http://app.example".into(),
            storedata: "id=1".into(),
            flavour: Some(ReceiptFlavour::Reviewer),
        };
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["type"], "reviewer");

        let standard = ReceiptProduct { flavour: None, ..product };
        let json = serde_json::to_value(&standard).unwrap();
        assert!(json.get("type").is_none());
    }
}
