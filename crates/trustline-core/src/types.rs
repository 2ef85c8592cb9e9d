use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Length in bytes of an Ed25519 verification key.
pub const VERKEY_LEN: usize = 32;

/// Number of verkey bytes a DID is derived from.
pub const DID_LEN: usize = 16;

/// Decentralized identifier as written to the ledger.
///
/// Unqualified base58 form, e.g. `Th7MpTaRZVRYnPiabds81Y`. DIDs created by
/// a wallet are the base58 encoding of the first 16 bytes of the verkey;
/// full 32-byte identifiers are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// Parse and validate a DID string.
    pub fn new(did: impl Into<String>) -> Result<Self, CoreError> {
        let did = did.into();
        let decoded = bs58::decode(&did)
            .into_vec()
            .map_err(|e| CoreError::InvalidDid(format!("{}: {}", did, e)))?;
        if decoded.len() != DID_LEN && decoded.len() != VERKEY_LEN {
            return Err(CoreError::InvalidDid(format!(
                "{}: expected {} or {} bytes, got {}",
                did,
                DID_LEN,
                VERKEY_LEN,
                decoded.len()
            )));
        }
        Ok(Self(did))
    }

    /// Derive the DID for a verification key.
    pub fn from_verkey_bytes(verkey: &[u8; VERKEY_LEN]) -> Self {
        Self(bs58::encode(&verkey[..DID_LEN]).into_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Did {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl FromStr for Did {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Base58-encoded Ed25519 verification key bound to a DID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Verkey(String);

impl Verkey {
    /// Parse and validate a base58 verkey.
    pub fn new(verkey: impl Into<String>) -> Result<Self, CoreError> {
        let verkey = verkey.into();
        let decoded = bs58::decode(&verkey)
            .into_vec()
            .map_err(|e| CoreError::InvalidVerkey(format!("{}: {}", verkey, e)))?;
        if decoded.len() != VERKEY_LEN {
            return Err(CoreError::InvalidVerkey(format!(
                "{}: expected {} bytes, got {}",
                verkey,
                VERKEY_LEN,
                decoded.len()
            )));
        }
        Ok(Self(verkey))
    }

    pub fn from_bytes(bytes: &[u8; VERKEY_LEN]) -> Self {
        Self(bs58::encode(bytes).into_string())
    }

    /// Decode to the raw 32 key bytes.
    pub fn to_bytes(&self) -> Result<[u8; VERKEY_LEN], CoreError> {
        let decoded = bs58::decode(&self.0)
            .into_vec()
            .map_err(|e| CoreError::InvalidVerkey(e.to_string()))?;
        decoded
            .try_into()
            .map_err(|_| CoreError::InvalidVerkey(format!("{}: wrong length", self.0)))
    }

    /// The DID a wallet would derive for this key.
    pub fn derive_did(&self) -> Result<Did, CoreError> {
        Ok(Did::from_verkey_bytes(&self.to_bytes()?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Verkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Verkey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Verkey> for String {
    fn from(verkey: Verkey) -> Self {
        verkey.0
    }
}

/// Ledger role attached to a NYM.
///
/// For authorization purposes `USER < TRUST_ANCHOR ≈ TRUST_STEWARD`: the
/// two elevated roles carry the same authority. The enum intentionally does
/// not implement `Ord`; compare through [`Role::authority`] or
/// [`Role::satisfies`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    #[default]
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "TRUST_ANCHOR")]
    TrustAnchor,
    #[serde(rename = "TRUST_STEWARD", alias = "STEWARD")]
    TrustSteward,
}

impl Role {
    /// Authority level used by ledger authorization checks.
    pub fn authority(&self) -> u8 {
        match self {
            Self::User => 0,
            Self::TrustAnchor | Self::TrustSteward => 1,
        }
    }

    /// Whether this role meets the authority of `required`.
    pub fn satisfies(&self, required: Role) -> bool {
        self.authority() >= required.authority()
    }

    /// Whether a holder of this role may write NYMs, schemas and definitions.
    pub fn can_write(&self) -> bool {
        self.satisfies(Role::TrustAnchor)
    }

    /// Whether a holder of this role may assign `target` to another DID.
    pub fn can_grant(&self, target: Role) -> bool {
        self.can_write() && self.satisfies(target)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::TrustAnchor => "TRUST_ANCHOR",
            Self::TrustSteward => "TRUST_STEWARD",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "USER" => Ok(Self::User),
            "TRUST_ANCHOR" => Ok(Self::TrustAnchor),
            "TRUST_STEWARD" | "STEWARD" => Ok(Self::TrustSteward),
            other => Err(CoreError::InvalidRole(other.to_string())),
        }
    }
}

/// Ledger identifier of a credential schema: `<did>:2:<name>:<version>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaId(pub String);

impl SchemaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the id of a schema published by `issuer`.
    pub fn build(issuer: &Did, name: &str, version: &str) -> Self {
        Self(format!("{}:2:{}:{}", issuer, name, version))
    }

    /// The DID that published the schema, if the id is well formed.
    pub fn issuer_did(&self) -> Option<&str> {
        let mut parts = self.0.splitn(4, ':');
        match (parts.next(), parts.next()) {
            (Some(did), Some("2")) => Some(did),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger identifier of a credential definition:
/// `<did>:3:<signature type>:<schema ref>:<tag>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CredDefId(pub String);

impl CredDefId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn build(issuer: &Did, signature_type: &str, schema_ref: &str, tag: &str) -> Self {
        Self(format!(
            "{}:3:{}:{}:{}",
            issuer, signature_type, schema_ref, tag
        ))
    }

    /// The DID that owns the definition, if the id is well formed.
    pub fn issuer_did(&self) -> Option<&str> {
        let mut parts = self.0.splitn(3, ':');
        match (parts.next(), parts.next()) {
            (Some(did), Some("3")) => Some(did),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredDefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_key() -> [u8; 32] {
        let mut key = [0u8; 32];
        for (i, b) in key.iter_mut().enumerate() {
            *b = i as u8 + 1;
        }
        key
    }

    #[test]
    fn test_did_from_verkey_is_valid() {
        let did = Did::from_verkey_bytes(&sample_key());
        assert!(Did::new(did.as_str()).is_ok());
        assert_eq!(bs58::decode(did.as_str()).into_vec().unwrap().len(), 16);
    }

    #[test]
    fn test_did_rejects_bad_base58() {
        assert!(Did::new("not-base58-0OIl").is_err());
    }

    #[test]
    fn test_did_rejects_wrong_length() {
        let short = bs58::encode([1u8; 8]).into_string();
        assert!(matches!(Did::new(short), Err(CoreError::InvalidDid(_))));
    }

    #[test]
    fn test_did_serde_validates() {
        let json = serde_json::to_string("abc").unwrap();
        assert!(serde_json::from_str::<Did>(&json).is_err());

        let did = Did::from_verkey_bytes(&sample_key());
        let json = serde_json::to_string(&did).unwrap();
        assert_eq!(serde_json::from_str::<Did>(&json).unwrap(), did);
    }

    #[test]
    fn test_verkey_roundtrip_and_did() {
        let key = sample_key();
        let verkey = Verkey::from_bytes(&key);
        assert_eq!(verkey.to_bytes().unwrap(), key);
        assert_eq!(verkey.derive_did().unwrap(), Did::from_verkey_bytes(&key));
    }

    #[test]
    fn test_verkey_rejects_did_length() {
        let did = Did::from_verkey_bytes(&sample_key());
        assert!(matches!(
            Verkey::new(did.as_str()),
            Err(CoreError::InvalidVerkey(_))
        ));
    }

    #[test]
    fn test_role_authority_order() {
        assert!(Role::TrustAnchor.satisfies(Role::TrustSteward));
        assert!(Role::TrustSteward.satisfies(Role::TrustAnchor));
        assert!(!Role::User.satisfies(Role::TrustAnchor));
        assert!(Role::TrustAnchor.satisfies(Role::User));
    }

    #[test]
    fn test_role_grants() {
        assert!(Role::TrustSteward.can_grant(Role::TrustAnchor));
        assert!(Role::TrustAnchor.can_grant(Role::TrustAnchor));
        assert!(Role::TrustAnchor.can_grant(Role::User));
        assert!(!Role::User.can_grant(Role::User));
        assert!(!Role::User.can_write());
    }

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("TRUST_ANCHOR".parse::<Role>().unwrap(), Role::TrustAnchor);
        assert_eq!("steward".parse::<Role>().unwrap(), Role::TrustSteward);
        assert_eq!("".parse::<Role>().unwrap(), Role::User);
        assert!("ADMIN".parse::<Role>().is_err());
        assert_eq!(Role::TrustAnchor.to_string(), "TRUST_ANCHOR");
    }

    #[test]
    fn test_role_serde_names() {
        assert_eq!(
            serde_json::to_string(&Role::TrustAnchor).unwrap(),
            "\"TRUST_ANCHOR\""
        );
        let r: Role = serde_json::from_str("\"STEWARD\"").unwrap();
        assert_eq!(r, Role::TrustSteward);
    }

    #[test]
    fn test_schema_id_build() {
        let did = Did::from_verkey_bytes(&sample_key());
        let id = SchemaId::build(&did, "Transcript", "1.2");
        assert_eq!(id.as_str(), format!("{}:2:Transcript:1.2", did));
        assert_eq!(id.issuer_did(), Some(did.as_str()));
    }

    #[test]
    fn test_cred_def_id_build() {
        let did = Did::from_verkey_bytes(&sample_key());
        let id = CredDefId::build(&did, "ED25519", "17", "TAG1");
        assert_eq!(id.as_str(), format!("{}:3:ED25519:17:TAG1", did));
        assert_eq!(id.issuer_did(), Some(did.as_str()));
        assert_eq!(CredDefId::new("garbage").issuer_did(), None);
    }
}
