//! SNMPv3 security configuration.
//!
//! Protocol identifiers, USM users with their keys, and the bootstrap state
//! machine that sequences engine discovery, key installation and time
//! synchronization. The cryptography itself belongs to the transport.

pub mod bootstrap;
mod user;

pub use bootstrap::{Bootstrap, BootstrapState, Plan, TIME_SYNC_BUDGET};
pub use user::{AuthKey, KEY_ALGORITHM_MASK, KEY_KIND_MASK, KeyKind, PrivKey, User};

/// Protocol name that matched no known algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseProtocolError {
    input: String,
    expected: &'static str,
}

impl std::fmt::Display for ParseProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}' (known: ", self.expected, self.input)?;
        let known: Vec<&str> = if self.expected == AUTH {
            AuthProtocol::ALL.iter().map(|p| p.name()).collect()
        } else {
            PrivProtocol::ALL.iter().map(|p| p.name()).collect()
        };
        write!(f, "{})", known.join(", "))
    }
}

impl std::error::Error for ParseProtocolError {}

const AUTH: &str = "unknown authentication protocol";
const PRIV: &str = "unknown privacy protocol";

/// Folds case and separators so `sha-256`, `SHA256` and `Sha_256` compare equal.
fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_'))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// USM authentication algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProtocol {
    /// HMAC-MD5-96, RFC 3414.
    Md5,
    /// HMAC-SHA-96, RFC 3414.
    Sha1,
    /// RFC 7860.
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl AuthProtocol {
    pub const ALL: [Self; 6] = [
        Self::Md5,
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
    ];

    /// Canonical name, as printed by net-snmp tools.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA",
            Self::Sha224 => "SHA-224",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    /// HMAC output size in bytes; also the size of a localized key.
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Algorithm id in the packed key code.
    pub const fn code(self) -> u8 {
        match self {
            Self::Md5 => 1,
            Self::Sha1 => 2,
            Self::Sha224 => 3,
            Self::Sha256 => 4,
            Self::Sha384 => 5,
            Self::Sha512 => 6,
        }
    }
}

impl std::fmt::Display for AuthProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for AuthProtocol {
    type Err = ParseProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = fold(s);
        if folded == "SHA1" {
            return Ok(Self::Sha1);
        }
        Self::ALL
            .into_iter()
            .find(|p| fold(p.name()) == folded)
            .ok_or_else(|| ParseProtocolError {
                input: s.to_string(),
                expected: AUTH,
            })
    }
}

/// USM privacy algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivProtocol {
    /// DES-CBC, RFC 3414.
    Des,
    /// 3DES-EDE, draft-reeder-snmpv3-usm-3desede.
    Des3,
    /// AES-CFB, RFC 3826.
    Aes128,
    Aes192,
    Aes256,
}

impl PrivProtocol {
    pub const ALL: [Self; 5] = [
        Self::Des,
        Self::Des3,
        Self::Aes128,
        Self::Aes192,
        Self::Aes256,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Des => "DES",
            Self::Des3 => "3DES",
            Self::Aes128 => "AES",
            Self::Aes192 => "AES-192",
            Self::Aes256 => "AES-256",
        }
    }

    /// Key material size in bytes. DES variants carry an 8 byte pre-IV.
    pub const fn key_len(self) -> usize {
        match self {
            Self::Des | Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Des3 | Self::Aes256 => 32,
        }
    }

    /// Algorithm id in the packed key code.
    pub const fn code(self) -> u8 {
        match self {
            Self::Des => 1,
            Self::Aes128 => 2,
            Self::Aes192 => 3,
            Self::Aes256 => 4,
            Self::Des3 => 5,
        }
    }
}

impl std::fmt::Display for PrivProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for PrivProtocol {
    type Err = ParseProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = fold(s);
        let alias = match folded.as_str() {
            "AES128" => Some(Self::Aes128),
            "DES3" | "TDES" | "3DESEDE" => Some(Self::Des3),
            _ => None,
        };
        alias
            .or_else(|| Self::ALL.into_iter().find(|p| fold(p.name()) == folded))
            .ok_or_else(|| ParseProtocolError {
                input: s.to_string(),
                expected: PRIV,
            })
    }
}
