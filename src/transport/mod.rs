//! Transport layer abstraction.
//!
//! A [`Transport`] owns one UDP socket bound to a single agent together with
//! the BER codec and USM machinery for it. Every request kind is split into
//! a non-blocking `send_*`/`recv_*` pair: either call may return
//! [`Error::WouldBlock`](crate::Error::WouldBlock), after which the session
//! waits for the socket's file descriptor to become writable (send) or
//! readable (recv) and calls again.
//!
//! Sessions build their transport through a [`Connector`], which receives
//! every construction-time option as [`TransportParams`].

#[cfg(any(test, feature = "testing"))]
mod mock;

#[cfg(any(test, feature = "testing"))]
pub use mock::*;

use std::net::SocketAddr;
use std::os::fd::AsRawFd;
use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;
use crate::oid::Oid;
use crate::v3::User;
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;

/// Non-blocking request/response primitives for one agent.
///
/// Only one request is in flight at a time: a session always completes (or
/// abandons) a `send_*` with its matching `recv_*` before starting the next.
///
/// Besides `WouldBlock`, calls report malformed traffic as
/// [`Error::Decode`](crate::Error::Decode) /
/// [`Error::Encode`](crate::Error::Encode) and USM failures, including
/// Report PDUs, as [`Error::Auth`](crate::Error::Auth).
pub trait Transport: AsRawFd + Send {
    /// Send a GET for one OID.
    fn send_get(&mut self, oid: &Oid) -> Result<()>;

    /// Receive the GET value.
    ///
    /// May fail with [`Error::NoSuchInstance`](crate::Error::NoSuchInstance)
    /// or return an exception value; the session treats both alike.
    fn recv_get(&mut self) -> Result<Value>;

    /// Send one GET for several OIDs.
    fn send_get_many(&mut self, oids: &[Oid]) -> Result<()>;

    /// Receive all bindings of a batched GET, exception values included.
    fn recv_get_many(&mut self) -> Result<Vec<VarBind>>;

    /// Send a GETNEXT from `oid`.
    fn send_get_next(&mut self, oid: &Oid) -> Result<()>;

    /// Receive the GETNEXT binding; `None` when the agent's view is exhausted.
    fn recv_get_next(&mut self) -> Result<Option<VarBind>>;

    /// Send a GETBULK from `oid` (non-repeaters 0).
    fn send_get_bulk(&mut self, oid: &Oid, max_repetitions: u32) -> Result<()>;

    /// Receive the GETBULK bindings in agent order.
    fn recv_get_bulk(&mut self) -> Result<Vec<VarBind>>;

    /// Send an engine discovery / time synchronization request.
    fn send_refresh(&mut self) -> Result<()>;

    /// Receive the answer and update engine id, boots and time.
    fn recv_refresh(&mut self) -> Result<()>;

    /// Replace the security identity, localizing keys against the engine id
    /// learned so far.
    fn set_keys(&mut self, user: &User) -> Result<()>;

    /// Engine id of the agent, once known.
    fn engine_id(&self) -> Option<Bytes>;
}

/// Construction options handed to a [`Connector`].
#[derive(Debug, Clone)]
pub struct TransportParams {
    /// Resolved agent address.
    pub target: SocketAddr,
    pub version: Version,
    /// Community for v1/v2c; empty for v3.
    pub community: Bytes,
    /// Initial v3 identity: the real user, or a placeholder pending discovery.
    pub user: User,
    /// Engine id supplied by the caller, skipping discovery.
    pub engine_id: Option<Bytes>,
    /// IP ToS / DSCP byte; 0 leaves the OS default.
    pub tos: u32,
    /// SO_SNDBUF; 0 leaves the OS default.
    pub send_buffer_size: usize,
    /// SO_RCVBUF; 0 leaves the OS default.
    pub recv_buffer_size: usize,
    /// Socket-level timeout, set only for blocking sessions.
    pub timeout: Option<Duration>,
}

impl TransportParams {
    /// Parameters for `target` with every other option at its default.
    pub fn new(target: SocketAddr, version: Version) -> Self {
        Self {
            target,
            version,
            community: Bytes::from_static(b"public"),
            user: User::placeholder(),
            engine_id: None,
            tos: 0,
            send_buffer_size: 0,
            recv_buffer_size: 0,
            timeout: None,
        }
    }
}

/// Factory for transports.
///
/// Any `Fn(&TransportParams) -> Result<T>` is a connector.
pub trait Connector {
    type Transport: Transport;

    fn connect(&self, params: &TransportParams) -> Result<Self::Transport>;
}

impl<F, T> Connector for F
where
    F: Fn(&TransportParams) -> Result<T>,
    T: Transport,
{
    type Transport = T;

    fn connect(&self, params: &TransportParams) -> Result<T> {
        self(params)
    }
}
