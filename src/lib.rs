// Allow large error types - the Error enum carries OIDs inline.
#![allow(clippy::result_large_err)]

//! # snmp-session
//!
//! SNMP v1/v2c/v3 client sessions over a pluggable transport.
//!
//! The crate is the session engine: it turns the non-blocking send/receive
//! primitives of a [`Transport`] into GET, batched GET and subtree walks,
//! runs the SNMPv3 bootstrap handshake and applies an optional rate limit.
//! Message encoding and USM cryptography belong to the transport.
//!
//! ## Features
//!
//! - Async sessions on Tokio and blocking sessions on plain threads, with
//!   identical request sequences and errors
//! - GETNEXT and GETBULK walks as a `Stream` or an `Iterator`
//! - Requests-per-second limiting, shareable across sessions
//! - Explicit SNMPv3 discovery, key installation and time sync
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use snmp_session::{SessionBuilder, oid};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), snmp_session::Error> {
//!     // `connector` builds the transport for the resolved target.
//!     let mut session = SessionBuilder::new("192.0.2.1")
//!         .community("public")
//!         .open(&connector)
//!         .await?;
//!
//!     let descr = session.get(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).await?;
//!     println!("sysDescr: {descr}");
//!
//!     let mut walk = session.fetch(&oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2));
//!     while let Some(row) = walk.next().await {
//!         println!("{}", row?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod oid;
pub mod policer;
pub mod prelude;
pub mod session;
pub mod transport;
pub mod v3;
pub mod value;
pub mod varbind;
pub mod version;

pub(crate) mod io;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{
    AuthErrorKind, ConfigErrorKind, DecodeErrorKind, EncodeErrorKind, Error, OidErrorKind, Result,
};
pub use oid::Oid;
pub use policer::{Policer, Reservation, RpsPolicer};
pub use session::{
    BlockingSession, Session, SessionBuilder, SessionConfig, Walk, WalkIter, WalkMode,
};
pub use transport::{Connector, Transport, TransportParams};
pub use value::Value;
pub use varbind::VarBind;
pub use version::Version;
