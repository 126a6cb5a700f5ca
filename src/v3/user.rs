//! USM credentials.
//!
//! A [`User`] carries the security name and optional keys handed to the
//! transport. The session never derives or applies keys itself; it only
//! decides when the transport gets them (see [`super::bootstrap`]).
//!
//! Keys are tagged with a [`KeyKind`] telling the transport how much
//! derivation is still needed, and expose a packed one-byte code:
//!
//! ```text
//! 7 6 5 4 3 2 1 0
//! K K A A A A A A    K = key kind, A = algorithm id
//! ```

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{AuthProtocol, PrivProtocol};

/// Mask of the algorithm bits in a key code.
pub const KEY_ALGORITHM_MASK: u8 = 0x3f;
/// Mask of the key kind bits in a key code.
pub const KEY_KIND_MASK: u8 = 0xc0;

/// How far the key material has been derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyKind {
    /// Passphrase; needs password-to-key and localization.
    #[default]
    Password,
    /// Master key; needs localization against the engine id.
    Master,
    /// Key already localized for the target engine.
    Localized,
}

impl KeyKind {
    /// Key kind bits of the packed code.
    pub const fn bits(self) -> u8 {
        match self {
            Self::Password => 0x00,
            Self::Master => 0x40,
            Self::Localized => 0x80,
        }
    }

    /// Decode the key kind bits of a packed code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code & KEY_KIND_MASK {
            0x00 => Some(Self::Password),
            0x40 => Some(Self::Master),
            0x80 => Some(Self::Localized),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
struct Secret(Vec<u8>);

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED; {}])", self.0.len())
    }
}

// Derived keys have a fixed length per algorithm; passphrases do not.
fn material(kind: KeyKind, mut bytes: Vec<u8>, key_len: usize) -> Secret {
    if kind != KeyKind::Password {
        bytes.resize(key_len, 0);
    }
    Secret(bytes)
}

/// Authentication key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthKey {
    protocol: AuthProtocol,
    kind: KeyKind,
    secret: Secret,
}

impl AuthKey {
    /// Key from a passphrase.
    pub fn password(protocol: AuthProtocol, password: impl Into<Vec<u8>>) -> Self {
        Self::with_kind(protocol, KeyKind::Password, password)
    }

    /// Key from a master key, padded or truncated to the digest length.
    pub fn master(protocol: AuthProtocol, key: impl Into<Vec<u8>>) -> Self {
        Self::with_kind(protocol, KeyKind::Master, key)
    }

    /// Key already localized, padded or truncated to the digest length.
    pub fn localized(protocol: AuthProtocol, key: impl Into<Vec<u8>>) -> Self {
        Self::with_kind(protocol, KeyKind::Localized, key)
    }

    pub fn with_kind(protocol: AuthProtocol, kind: KeyKind, key: impl Into<Vec<u8>>) -> Self {
        Self {
            protocol,
            kind,
            secret: material(kind, key.into(), protocol.digest_len()),
        }
    }

    pub fn protocol(&self) -> AuthProtocol {
        self.protocol
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    /// Raw key material.
    pub fn as_bytes(&self) -> &[u8] {
        &self.secret.0
    }

    /// Packed kind and algorithm code.
    pub fn code(&self) -> u8 {
        self.kind.bits() | self.protocol.code()
    }
}

/// Privacy key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivKey {
    protocol: PrivProtocol,
    kind: KeyKind,
    secret: Secret,
}

impl PrivKey {
    /// Key from a passphrase.
    pub fn password(protocol: PrivProtocol, password: impl Into<Vec<u8>>) -> Self {
        Self::with_kind(protocol, KeyKind::Password, password)
    }

    /// Key from a master key, padded or truncated to the cipher key length.
    pub fn master(protocol: PrivProtocol, key: impl Into<Vec<u8>>) -> Self {
        Self::with_kind(protocol, KeyKind::Master, key)
    }

    /// Key already localized, padded or truncated to the cipher key length.
    pub fn localized(protocol: PrivProtocol, key: impl Into<Vec<u8>>) -> Self {
        Self::with_kind(protocol, KeyKind::Localized, key)
    }

    pub fn with_kind(protocol: PrivProtocol, kind: KeyKind, key: impl Into<Vec<u8>>) -> Self {
        Self {
            protocol,
            kind,
            secret: material(kind, key.into(), protocol.key_len()),
        }
    }

    pub fn protocol(&self) -> PrivProtocol {
        self.protocol
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.secret.0
    }

    pub fn code(&self) -> u8 {
        self.kind.bits() | self.protocol.code()
    }
}

/// SNMPv3 user.
///
/// Privacy without authentication cannot be expressed: the only constructor
/// taking a privacy key also takes an authentication key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct User {
    name: String,
    auth: Option<AuthKey>,
    privacy: Option<PrivKey>,
}

impl User {
    /// noAuthNoPriv user.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            auth: None,
            privacy: None,
        }
    }

    /// authNoPriv user.
    pub fn with_auth(name: impl Into<String>, auth: AuthKey) -> Self {
        Self {
            name: name.into(),
            auth: Some(auth),
            privacy: None,
        }
    }

    /// authPriv user.
    pub fn with_auth_priv(name: impl Into<String>, auth: AuthKey, privacy: PrivKey) -> Self {
        Self {
            name: name.into(),
            auth: Some(auth),
            privacy: Some(privacy),
        }
    }

    /// Anonymous identity used for engine discovery.
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn auth_key(&self) -> Option<&AuthKey> {
        self.auth.as_ref()
    }

    pub fn priv_key(&self) -> Option<&PrivKey> {
        self.privacy.as_ref()
    }

    /// Whether requests from this user are authenticated (and need time sync).
    pub fn requires_auth(&self) -> bool {
        self.auth.is_some()
    }

    pub fn requires_privacy(&self) -> bool {
        self.privacy.is_some()
    }

    /// Packed auth code, 0 when unauthenticated.
    pub fn auth_code(&self) -> u8 {
        self.auth.as_ref().map_or(0, AuthKey::code)
    }

    /// Packed privacy code, 0 when unencrypted.
    pub fn priv_code(&self) -> u8 {
        self.privacy.as_ref().map_or(0, PrivKey::code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_codes() {
        assert_eq!(AuthKey::password(AuthProtocol::Md5, "secret").code(), 0x01);
        assert_eq!(AuthKey::master(AuthProtocol::Sha1, vec![1; 20]).code(), 0x42);
        assert_eq!(
            AuthKey::localized(AuthProtocol::Sha256, vec![1; 32]).code(),
            0x84
        );
        assert_eq!(PrivKey::password(PrivProtocol::Des, "secret").code(), 0x01);
        assert_eq!(PrivKey::master(PrivProtocol::Aes128, vec![1; 16]).code(), 0x42);
        assert_eq!(
            PrivKey::localized(PrivProtocol::Des3, vec![1; 32]).code(),
            0x85
        );
    }

    #[test]
    fn test_code_masks() {
        let code = AuthKey::localized(AuthProtocol::Sha512, vec![0; 64]).code();
        assert_eq!(code & KEY_ALGORITHM_MASK, AuthProtocol::Sha512.code());
        assert_eq!(KeyKind::from_code(code), Some(KeyKind::Localized));
        assert_eq!(KeyKind::from_code(0xc1), None);
    }

    #[test]
    fn test_password_keeps_length() {
        let key = AuthKey::password(AuthProtocol::Md5, "a-rather-long-passphrase");
        assert_eq!(key.as_bytes(), b"a-rather-long-passphrase");
    }

    #[test]
    fn test_derived_keys_are_fitted() {
        let short = AuthKey::master(AuthProtocol::Md5, vec![0xaa; 4]);
        assert_eq!(short.as_bytes().len(), 16);
        assert_eq!(&short.as_bytes()[..4], &[0xaa; 4]);
        assert!(short.as_bytes()[4..].iter().all(|b| *b == 0));

        let long = AuthKey::localized(AuthProtocol::Sha1, vec![0xbb; 40]);
        assert_eq!(long.as_bytes(), &[0xbb; 20][..]);

        let des = PrivKey::localized(PrivProtocol::Des, vec![0xcc; 8]);
        assert_eq!(des.as_bytes().len(), 16);
    }

    #[test]
    fn test_user_levels() {
        let user = User::new("public-ro");
        assert!(!user.requires_auth());
        assert_eq!(user.auth_code(), 0);

        let user = User::with_auth_priv(
            "admin",
            AuthKey::password(AuthProtocol::Sha1, "authpass"),
            PrivKey::password(PrivProtocol::Aes128, "privpass"),
        );
        assert!(user.requires_auth());
        assert!(user.requires_privacy());
        assert_eq!(user.auth_code(), 0x02);
        assert_eq!(user.priv_code(), 0x02);
    }

    #[test]
    fn test_debug_redacts_key_material() {
        let key = AuthKey::password(AuthProtocol::Md5, "hunter2");
        let dbg = format!("{:?}", key);
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("REDACTED"));
    }

    #[test]
    fn test_placeholder_is_anonymous() {
        let user = User::placeholder();
        assert!(user.name().is_empty());
        assert!(!user.requires_auth());
    }
}
