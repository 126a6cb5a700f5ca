//! Glob-import of the types most callers need.
//!
//! ```rust
//! use snmp_session::prelude::*;
//! ```
//!
//! Brings in the session types and builder, the transport traits, the
//! SNMPv3 user types and [`oid!`].

pub use crate::error::{Error, Result};
pub use crate::oid::Oid;
pub use crate::session::{BlockingSession, Session, SessionBuilder};
pub use crate::transport::{Connector, Transport, TransportParams};
pub use crate::v3::{AuthKey, AuthProtocol, PrivKey, PrivProtocol, User};
pub use crate::value::Value;
pub use crate::varbind::VarBind;
pub use crate::version::Version;

#[doc(no_inline)]
pub use crate::oid;
