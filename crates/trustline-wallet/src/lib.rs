//! Trustline Wallet — Local identities, keys, master secrets and credentials.
//!
//! A [`WalletRegistry`] provisions password-protected wallets; an opened
//! [`Wallet`] holds the owner's key pairs and never hands them out. All
//! signing, decryption and credential issuance happens inside the wallet.

pub mod anoncreds;
pub mod credential_store;
pub mod error;
pub mod registry;
pub mod wallet;

pub use anoncreds::issuer_create_schema;
pub use credential_store::{CredentialFilter, CredentialInfo, CredentialStore};
pub use error::WalletError;
pub use registry::WalletRegistry;
pub use wallet::{anon_crypt, DidInfo, LocalIdentity, Wallet};
