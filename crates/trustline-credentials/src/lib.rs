//! Trustline Credentials — Schemas, credential definitions and the pure
//! offer / request / issue / verify primitives used by credential exchange.

pub mod credential;
pub mod definition;
pub mod encoding;
pub mod error;
pub mod offer;
pub mod schema;

pub use credential::{issue_credential, verify_credential, Credential};
pub use definition::{
    create_credential_definition, CredentialDefinition, CredentialDefinitionConfig, SignatureType,
};
pub use encoding::{encode_attribute, AttributeValue, CredentialValues};
pub use error::CredentialError;
pub use offer::{
    create_offer, create_request, CredentialOffer, CredentialRequest, CredentialRequestMetadata,
    MasterSecret,
};
pub use schema::Schema;
