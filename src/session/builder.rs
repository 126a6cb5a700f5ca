//! Session builder.
//!
//! One builder covers every protocol version. Unless set explicitly, the
//! version follows the credentials: a session with a [`User`] speaks
//! SNMPv3, anything else SNMPv2c. All validation happens in the finishers,
//! which fail with [`Error::Config`] before any transport is created.
//!
//! # Examples
//!
//! ```rust,ignore
//! use snmp_session::SessionBuilder;
//! use snmp_session::v3::{AuthKey, AuthProtocol, PrivKey, PrivProtocol, User};
//!
//! // SNMPv2c, at most 50 requests per second
//! let session = SessionBuilder::new("192.0.2.1")
//!     .community("private")
//!     .limit_rps(50.0)
//!     .connect(&connector)?;
//!
//! // SNMPv3, engine discovered and time synchronized before returning
//! let user = User::with_auth_priv(
//!     "admin",
//!     AuthKey::password(AuthProtocol::Sha256, "authpass123"),
//!     PrivKey::password(PrivProtocol::Aes128, "privpass123"),
//! );
//! let session = SessionBuilder::new("192.0.2.1")
//!     .user(user)
//!     .open(&connector)
//!     .await?;
//! ```

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::error::{ConfigErrorKind, Error, Result};
use crate::policer::{Policer, RpsPolicer};
use crate::transport::{Connector, TransportParams};
use crate::v3::{Bootstrap, User};
use crate::version::Version;

use super::{
    BlockingSession, DEFAULT_MAX_REPETITIONS, DEFAULT_PORT, DEFAULT_TIMEOUT, Session,
    SessionConfig, SessionCore,
};

/// Address and timing options.
struct BaseConfig {
    target: String,
    port: u16,
    timeout: Duration,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl BaseConfig {
    fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    /// `host:port` literals keep their port; bare hosts get `self.port`.
    fn resolve_target(&self) -> Result<SocketAddr> {
        if let Ok(addr) = self.target.parse::<SocketAddr>() {
            return Ok(addr);
        }
        let unresolved = || Error::config(ConfigErrorKind::UnresolvedAddress);
        (self.target.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| {
                tracing::debug!(target: "snmp_session::session", target_addr = %self.target, error = %e, "address resolution failed");
                unresolved()
            })?
            .next()
            .ok_or_else(unresolved)
    }
}

/// Everything a finisher needs once validation has passed.
struct Prepared {
    params: TransportParams,
    config: SessionConfig,
    policer: Option<Arc<dyn Policer>>,
    bootstrap: Bootstrap,
}

/// Builder for [`Session`] and [`BlockingSession`].
pub struct SessionBuilder {
    base: BaseConfig,
    version: Option<Version>,
    community: Bytes,
    user: Option<User>,
    engine_id: Option<Bytes>,
    tos: u32,
    send_buffer_size: usize,
    recv_buffer_size: usize,
    max_repetitions: u32,
    allow_bulk: bool,
    policer: Option<Arc<dyn Policer>>,
    rps: Option<f64>,
}

impl SessionBuilder {
    /// Start a builder for the agent at `target` (host name or IP, with or
    /// without a port).
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            base: BaseConfig::new(target),
            version: None,
            community: Bytes::from_static(b"public"),
            user: None,
            engine_id: None,
            tos: 0,
            send_buffer_size: 0,
            recv_buffer_size: 0,
            max_repetitions: DEFAULT_MAX_REPETITIONS,
            allow_bulk: true,
            policer: None,
            rps: None,
        }
    }

    /// Agent port used when the target carries none. Default 161.
    pub fn port(mut self, port: u16) -> Self {
        self.base.port = port;
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Community for v1/v2c. Default `public`.
    pub fn community(mut self, community: impl AsRef<[u8]>) -> Self {
        self.community = Bytes::copy_from_slice(community.as_ref());
        self
    }

    /// SNMPv3 user.
    pub fn user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// Known SNMPv3 engine id. Skips discovery.
    pub fn engine_id(mut self, engine_id: impl Into<Bytes>) -> Self {
        self.engine_id = Some(engine_id.into());
        self
    }

    /// Per-round timeout. Default 10 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.base.timeout = timeout;
        self
    }

    /// IP ToS byte for outgoing packets.
    pub fn tos(mut self, tos: u32) -> Self {
        self.tos = tos;
        self
    }

    pub fn send_buffer_size(mut self, size: usize) -> Self {
        self.send_buffer_size = size;
        self
    }

    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size;
        self
    }

    /// Default GETBULK page size. Default 20.
    pub fn max_repetitions(mut self, max_repetitions: u32) -> Self {
        self.max_repetitions = max_repetitions;
        self
    }

    /// Whether `fetch` may use GETBULK. Ignored on SNMPv1.
    pub fn allow_bulk(mut self, allow_bulk: bool) -> Self {
        self.allow_bulk = allow_bulk;
        self
    }

    /// Rate limiter, possibly shared with other sessions.
    ///
    /// Takes precedence over [`limit_rps`](Self::limit_rps).
    pub fn policer(mut self, policer: Arc<dyn Policer>) -> Self {
        self.policer = Some(policer);
        self
    }

    /// Limit this session to `rps` requests per second.
    pub fn limit_rps(mut self, rps: f64) -> Self {
        self.rps = Some(rps);
        self
    }

    fn prepare(self, blocking: bool) -> Result<Prepared> {
        let version = self.version.unwrap_or(if self.user.is_some() {
            Version::V3
        } else {
            Version::V2c
        });
        if version.is_v3() {
            match &self.user {
                None => return Err(Error::config(ConfigErrorKind::MissingUser)),
                Some(user) if user.name().is_empty() => {
                    return Err(Error::config(ConfigErrorKind::EmptyUserName));
                }
                Some(_) => {}
            }
        }
        if self.max_repetitions == 0 {
            return Err(Error::config(ConfigErrorKind::ZeroPageSize));
        }
        let policer = match (self.policer, self.rps) {
            (Some(policer), _) => Some(policer),
            (None, Some(rps)) => Some(Arc::new(RpsPolicer::new(rps)?) as Arc<dyn Policer>),
            (None, None) => None,
        };
        let target = self.base.resolve_target()?;

        let (bootstrap, identity) = Bootstrap::start(version, self.user, self.engine_id.is_some());
        let community = if version.is_v3() {
            Bytes::new()
        } else {
            self.community
        };
        tracing::debug!(
            target: "snmp_session::session",
            {
                snmp.target = %target,
                %version,
                state = ?bootstrap.state(),
                throttled = policer.is_some(),
            },
            "building session"
        );

        Ok(Prepared {
            params: TransportParams {
                target,
                version,
                community,
                user: identity,
                engine_id: self.engine_id,
                tos: self.tos,
                send_buffer_size: self.send_buffer_size,
                recv_buffer_size: self.recv_buffer_size,
                timeout: blocking.then_some(self.base.timeout),
            },
            config: SessionConfig {
                version,
                timeout: self.base.timeout,
                max_repetitions: self.max_repetitions,
                allow_bulk: self.allow_bulk,
            },
            policer,
            bootstrap,
        })
    }

    fn core<C: Connector>(self, connector: &C, blocking: bool) -> Result<SessionCore<C::Transport>> {
        let prepared = self.prepare(blocking)?;
        let transport = connector.connect(&prepared.params)?;
        Ok(SessionCore::new(
            transport,
            prepared.params.target,
            prepared.config,
            prepared.policer,
            prepared.bootstrap,
        ))
    }

    /// Create an async session without running the SNMPv3 handshake.
    pub fn connect<C: Connector>(self, connector: &C) -> Result<Session<C::Transport>> {
        Ok(Session::from_core(self.core(connector, false)?))
    }

    /// Create an async session and run [`Session::refresh`].
    pub async fn open<C: Connector>(self, connector: &C) -> Result<Session<C::Transport>> {
        let mut session = self.connect(connector)?;
        session.refresh().await?;
        Ok(session)
    }

    /// Create a blocking session without running the SNMPv3 handshake.
    pub fn connect_blocking<C: Connector>(
        self,
        connector: &C,
    ) -> Result<BlockingSession<C::Transport>> {
        Ok(BlockingSession::from_core(self.core(connector, true)?))
    }

    /// Create a blocking session and run [`BlockingSession::refresh`].
    pub fn open_blocking<C: Connector>(
        self,
        connector: &C,
    ) -> Result<BlockingSession<C::Transport>> {
        let mut session = self.connect_blocking(connector)?;
        session.refresh()?;
        Ok(session)
    }
}
