//! The sensitive payload variants an envelope can decrypt into.
//!
//! `Item` is a sum type keyed by [`ItemKind`]; decryption dispatches on the
//! envelope's discriminator in a single `match`, which is also the one
//! registration point for new variants.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::crypto::secretbox;
use crate::error::{AppError, Result};
use crate::models::envelope::base64_bytes;

/// Discriminator selecting which variant an envelope's data decrypts into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Login,
    BankCard,
    ArbitraryText,
    Binary,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Login => "login",
            ItemKind::BankCard => "bank_card",
            ItemKind::ArbitraryText => "arbitrary_text",
            ItemKind::Binary => "binary",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "login" => Ok(ItemKind::Login),
            "bank_card" => Ok(ItemKind::BankCard),
            "arbitrary_text" => Ok(ItemKind::ArbitraryText),
            "binary" => Ok(ItemKind::Binary),
            other => Err(AppError::Validation(format!("unknown item kind: {other}"))),
        }
    }
}

/// Credentials for a site or service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Login {
    pub info: String,
    pub username: String,
    pub password: String,
    /// Origin secret of the one-time password, if registered.
    pub one_time_origin: String,
    pub recovery_codes: String,
}

/// A payment card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BankCard {
    pub info: String,
    pub card_type: String,
    pub card_num: String,
    pub card_name: String,
    pub card_cvv: String,
    pub card_exp: String,
}

/// Free-form sensitive text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ArbitraryText {
    pub text: String,
}

/// An opaque binary blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Binary {
    pub info: String,
    #[serde(with = "base64_bytes", default)]
    pub binary: Vec<u8>,
}

/// A decrypted secret record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Login(Login),
    BankCard(BankCard),
    ArbitraryText(ArbitraryText),
    Binary(Binary),
}

impl Item {
    /// The discriminator for this variant.
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Login(_) => ItemKind::Login,
            Item::BankCard(_) => ItemKind::BankCard,
            Item::ArbitraryText(_) => ItemKind::ArbitraryText,
            Item::Binary(_) => ItemKind::Binary,
        }
    }

    /// Serializes the variant payload and seals it with the passphrase.
    pub fn encrypt(&self, passphrase: &str) -> Result<Vec<u8>> {
        let plain = match self {
            Item::Login(v) => sonic_rs::to_vec(v),
            Item::BankCard(v) => sonic_rs::to_vec(v),
            Item::ArbitraryText(v) => sonic_rs::to_vec(v),
            Item::Binary(v) => sonic_rs::to_vec(v),
        }
        .map_err(|e| AppError::Serialization(e.to_string()))?;
        secretbox::seal(passphrase, &plain)
    }

    /// Opens sealed bytes and deserializes them according to `kind`.
    pub fn decrypt(kind: ItemKind, passphrase: &str, data: &[u8]) -> Result<Item> {
        let plain = secretbox::open(passphrase, data)?;
        let item = match kind {
            ItemKind::Login => Item::Login(
                sonic_rs::from_slice(&plain).map_err(|e| AppError::Serialization(e.to_string()))?,
            ),
            ItemKind::BankCard => Item::BankCard(
                sonic_rs::from_slice(&plain).map_err(|e| AppError::Serialization(e.to_string()))?,
            ),
            ItemKind::ArbitraryText => Item::ArbitraryText(
                sonic_rs::from_slice(&plain).map_err(|e| AppError::Serialization(e.to_string()))?,
            ),
            ItemKind::Binary => Item::Binary(
                sonic_rs::from_slice(&plain).map_err(|e| AppError::Serialization(e.to_string()))?,
            ),
        };
        Ok(item)
    }
}
