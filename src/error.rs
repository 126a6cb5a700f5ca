//! Error types.
//!
//! One [`Error`] enum covers the session and whatever the transport reports.
//! Only [`Error::Timeout`] leaves the session able to retry the same call.

use std::time::Duration;

use crate::oid::Oid;

pub type Result<T> = std::result::Result<T, Error>;

/// Why an SNMPv3 exchange was rejected. Transports map Report PDUs onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// usmStatsUnknownUserNames report.
    UnknownUserName,
    /// usmStatsWrongDigests report or local HMAC mismatch.
    WrongDigest,
    /// usmStatsUnknownEngineIDs report.
    UnknownEngineId,
    /// usmStatsNotInTimeWindows report.
    NotInTimeWindow,
    /// usmStatsUnsupportedSecLevels report.
    UnsupportedSecLevel,
    /// usmStatsDecryptionErrors report or local decryption failure.
    DecryptionError,
    /// Any other Report PDU.
    Report,
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownUserName => write!(f, "unknown user name"),
            Self::WrongDigest => write!(f, "wrong digest"),
            Self::UnknownEngineId => write!(f, "unknown engine ID"),
            Self::NotInTimeWindow => write!(f, "not in time window"),
            Self::UnsupportedSecLevel => write!(f, "unsupported security level"),
            Self::DecryptionError => write!(f, "decryption error"),
            Self::Report => write!(f, "report PDU received"),
        }
    }
}

/// Response decode error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// BER tag other than the one the grammar requires.
    UnexpectedTag { expected: u8, actual: u8 },
    TruncatedData,
    /// Unknown PDU type.
    UnknownPduType(u8),
    /// Response PDU does not answer the outstanding request.
    UnexpectedPdu,
    /// Response request ID doesn't match.
    RequestIdMismatch { expected: i32, actual: i32 },
    /// Receive called with no request outstanding.
    NoRequestInFlight,
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{:02X}, got 0x{:02X}", expected, actual)
            }
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::UnknownPduType(t) => write!(f, "unknown PDU type: 0x{:02X}", t),
            Self::UnexpectedPdu => write!(f, "response does not match request"),
            Self::RequestIdMismatch { expected, actual } => {
                write!(f, "request ID mismatch: expected {}, got {}", expected, actual)
            }
            Self::NoRequestInFlight => write!(f, "no request in flight"),
        }
    }
}

/// Request encode error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeErrorKind {
    /// Encoded message exceeds the output buffer.
    BufferTooSmall { size: usize, max: usize },
    /// v3 request before the engine id was learned.
    EngineNotDiscovered,
    KeysNotDerived,
    /// OID cannot be encoded.
    InvalidOid,
}

impl std::fmt::Display for EncodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BufferTooSmall { size, max } => {
                write!(f, "message too large: {} bytes exceeds maximum {}", size, max)
            }
            Self::EngineNotDiscovered => write!(f, "engine not discovered"),
            Self::KeysNotDerived => write!(f, "keys not derived"),
            Self::InvalidOid => write!(f, "OID cannot be encoded"),
        }
    }
}

/// OID validation error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidErrorKind {
    /// Empty OID string.
    Empty,
    /// Invalid arc value.
    InvalidArc,
    /// More arcs than [`MAX_OID_LEN`](crate::oid::MAX_OID_LEN).
    TooManyArcs { count: usize, max: usize },
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty OID"),
            Self::InvalidArc => write!(f, "invalid arc value"),
            Self::TooManyArcs { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
        }
    }
}

/// Session configuration error kinds.
///
/// Raised while building a session, never in the middle of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// SNMPv3 selected without a user.
    MissingUser,
    /// SNMPv3 user with an empty name.
    EmptyUserName,
    /// Requests-per-second limit is zero, negative or not finite.
    InvalidRate,
    /// Requests-per-second limit leaves no time between requests.
    RateTooHigh,
    /// GETBULK max-repetitions of zero.
    ZeroPageSize,
    /// GETBULK requested on an SNMPv1 session.
    BulkOnV1,
    /// Operation only defined for SNMPv3 sessions.
    NotV3,
    /// Target address could not be resolved.
    UnresolvedAddress,
}

impl std::fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingUser => write!(f, "SNMPv3 requires a user"),
            Self::EmptyUserName => write!(f, "user name must not be empty"),
            Self::InvalidRate => write!(f, "rate limit must be a positive number"),
            Self::RateTooHigh => write!(f, "rate limit too high"),
            Self::ZeroPageSize => write!(f, "max-repetitions must be at least 1"),
            Self::BulkOnV1 => write!(f, "GETBULK is not defined for SNMPv1"),
            Self::NotV3 => write!(f, "operation requires SNMPv3"),
            Self::UnresolvedAddress => write!(f, "could not resolve address"),
        }
    }
}

/// Library error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error while waiting on or talking to the socket.
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    /// Request round exceeded the session timeout.
    #[error("timeout after {elapsed:?}")]
    Timeout { elapsed: Duration },

    /// Socket not ready; the operation should be retried once it is.
    ///
    /// Transports return this from their non-blocking calls. Sessions
    /// never surface it.
    #[error("operation would block")]
    WouldBlock,

    /// Response could not be decoded.
    #[error("decode error: {kind}")]
    Decode { kind: DecodeErrorKind },

    /// Request could not be encoded.
    #[error("encode error: {kind}")]
    Encode { kind: EncodeErrorKind },

    /// Single GET hit a missing object or instance.
    #[error("no such instance: {oid}")]
    NoSuchInstance { oid: Oid },

    /// SNMPv3 authentication or privacy failure.
    #[error("authentication failed: {kind}")]
    Auth { kind: AuthErrorKind },

    /// Invalid session configuration.
    #[error("invalid configuration: {kind}")]
    Config { kind: ConfigErrorKind },

    /// Invalid OID format.
    #[error("invalid OID: {kind}")]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>,
    },

    /// Walk received an OID not greater than the one before it.
    #[error("walk detected non-increasing OID: {previous} >= {current}")]
    NonIncreasingOid { previous: Oid, current: Oid },
}

impl Error {
    pub fn decode(kind: DecodeErrorKind) -> Self {
        Self::Decode { kind }
    }

    pub fn encode(kind: EncodeErrorKind) -> Self {
        Self::Encode { kind }
    }

    pub fn auth(kind: AuthErrorKind) -> Self {
        Self::Auth { kind }
    }

    pub fn config(kind: ConfigErrorKind) -> Self {
        Self::Config { kind }
    }

    pub fn invalid_oid(kind: OidErrorKind) -> Self {
        Self::InvalidOid { kind, input: None }
    }

    /// Invalid OID error carrying the text that failed to parse.
    pub fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::InvalidOid {
            kind,
            input: Some(input.into()),
        }
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Only timeouts qualify: the state of the session is unchanged by them.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub(crate) fn is_would_block(&self) -> bool {
        matches!(self, Self::WouldBlock)
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::WouldBlock {
            Self::WouldBlock
        } else {
            Self::Io { source }
        }
    }
}
