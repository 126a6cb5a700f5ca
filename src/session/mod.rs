//! SNMP sessions.
//!
//! A session is bound to one agent and one credential set. It owns the
//! [`Transport`], the optional [`Policer`], the request timeout and the SNMPv3
//! [`Bootstrap`] state. Two faces share one core:
//!
//! - [`Session`] runs rounds as futures on a tokio runtime
//! - [`BlockingSession`] runs the same rounds on the calling thread
//!
//! Both issue identical request sequences and map errors identically.
//! Operations take `&mut self`, so a session has at most one request in
//! flight. Walks borrow the session for as long as they live.
//!
//! # Example
//!
//! ```rust,ignore
//! use snmp_session::{SessionBuilder, oid};
//!
//! let mut session = SessionBuilder::new("192.0.2.1")
//!     .community("public")
//!     .connect(&connector)?;
//!
//! let descr = session.get(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).await?;
//! let ifaces = session.fetch(&oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2)).collect().await?;
//! ```

mod builder;
mod walk;

pub use builder::SessionBuilder;
pub use walk::{Walk, WalkIter, WalkMode};

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::instrument;

use crate::error::{ConfigErrorKind, Error, Result};
use crate::io::{self, Get, GetBulk, GetMany, GetNext, Operation, Refresh};
use crate::oid::Oid;
use crate::policer::Policer;
use crate::transport::Transport;
use crate::v3::{Bootstrap, BootstrapState};
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;

use walk::{PageRequest, Pager};

/// Default agent port.
pub const DEFAULT_PORT: u16 = 161;
/// Default per-round timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default GETBULK max-repetitions.
pub const DEFAULT_MAX_REPETITIONS: u32 = 20;

/// Request behaviour of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub version: Version,
    /// Wall-clock bound of one round, policer delay included.
    pub timeout: Duration,
    /// Page size of bulk walks.
    pub max_repetitions: u32,
    /// Let [`Session::fetch`] use GETBULK. Never honoured on SNMPv1.
    pub allow_bulk: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            version: Version::V2c,
            timeout: DEFAULT_TIMEOUT,
            max_repetitions: DEFAULT_MAX_REPETITIONS,
            allow_bulk: true,
        }
    }
}

/// State and round execution shared by both session faces.
pub(crate) struct SessionCore<T> {
    transport: T,
    target: SocketAddr,
    config: SessionConfig,
    policer: Option<Arc<dyn Policer>>,
    bootstrap: Bootstrap,
}

impl<T: Transport> SessionCore<T> {
    pub(crate) fn new(
        transport: T,
        target: SocketAddr,
        mut config: SessionConfig,
        policer: Option<Arc<dyn Policer>>,
        bootstrap: Bootstrap,
    ) -> Self {
        config.allow_bulk &= config.version.supports_bulk();
        Self {
            transport,
            target,
            config,
            policer,
            bootstrap,
        }
    }

    async fn exchange<O: Operation>(&mut self, op: O) -> Result<O::Output> {
        io::drive(
            &mut self.transport,
            op,
            self.config.timeout,
            self.policer.as_deref(),
        )
        .await
    }

    fn exchange_blocking<O: Operation>(&mut self, op: O) -> Result<O::Output> {
        io::drive_blocking(
            &mut self.transport,
            op,
            self.config.timeout,
            self.policer.as_deref(),
        )
    }

    pub(crate) async fn page(&mut self, request: &PageRequest) -> Result<Vec<VarBind>> {
        match request.mode {
            WalkMode::GetNext => Ok(self
                .exchange(GetNext(&request.position))
                .await?
                .into_iter()
                .collect()),
            WalkMode::GetBulk { max_repetitions } => {
                self.exchange(GetBulk(&request.position, max_repetitions))
                    .await
            }
        }
    }

    pub(crate) fn page_blocking(&mut self, request: &PageRequest) -> Result<Vec<VarBind>> {
        match request.mode {
            WalkMode::GetNext => Ok(self
                .exchange_blocking(GetNext(&request.position))?
                .into_iter()
                .collect()),
            WalkMode::GetBulk { max_repetitions } => {
                self.exchange_blocking(GetBulk(&request.position, max_repetitions))
            }
        }
    }

    fn next_pager(&self, oid: &Oid) -> Pager {
        Pager::new(oid.clone(), WalkMode::GetNext)
    }

    fn bulk_pager(&self, oid: &Oid, max_repetitions: Option<u32>) -> Pager {
        let max_repetitions = max_repetitions
            .filter(|n| *n > 0)
            .unwrap_or(self.config.max_repetitions);
        let mode = WalkMode::GetBulk { max_repetitions };
        if !self.config.version.supports_bulk() {
            return Pager::failed(oid.clone(), mode, Error::config(ConfigErrorKind::BulkOnV1));
        }
        Pager::new(oid.clone(), mode)
    }

    fn fetch_pager(&self, oid: &Oid) -> Pager {
        if self.config.allow_bulk {
            self.bulk_pager(oid, None)
        } else {
            self.next_pager(oid)
        }
    }

    fn install_deferred_keys(&mut self) -> Result<()> {
        if let Some(user) = self.bootstrap.deferred_user() {
            self.transport.set_keys(user)?;
        }
        self.bootstrap.on_keys_installed();
        tracing::debug!(
            target: "snmp_session::session",
            {
                snmp.target = %self.target,
                engine_id = ?self.transport.engine_id(),
                state = ?self.bootstrap.state(),
            },
            "engine discovered, keys installed"
        );
        Ok(())
    }

    fn synchronized(&mut self) {
        self.bootstrap.on_synchronized(Instant::now());
        tracing::debug!(
            target: "snmp_session::session",
            {
                snmp.target = %self.target,
                state = ?self.bootstrap.state(),
            },
            "engine time synchronized"
        );
    }

    fn engine_id(&self) -> Result<Option<Bytes>> {
        if !self.config.version.is_v3() {
            return Err(Error::config(ConfigErrorKind::NotV3));
        }
        Ok(self.transport.engine_id())
    }
}

fn require_instance(oid: &Oid, value: Value) -> Result<Value> {
    if value.is_exception() {
        return Err(Error::NoSuchInstance { oid: oid.clone() });
    }
    Ok(value)
}

fn into_map(rows: Vec<VarBind>) -> BTreeMap<Oid, Value> {
    rows.into_iter()
        .filter(|vb| !vb.value.is_exception())
        .map(|vb| (vb.oid, vb.value))
        .collect()
}

macro_rules! impl_accessors {
    ($session:ident) => {
        impl<T: Transport> $session<T> {
            /// Protocol version, fixed at construction.
            pub fn version(&self) -> Version {
                self.core.config.version
            }

            /// Agent address.
            pub fn target(&self) -> SocketAddr {
                self.core.target
            }

            pub fn config(&self) -> &SessionConfig {
                &self.core.config
            }

            /// Current SNMPv3 handshake state.
            pub fn bootstrap_state(&self) -> BootstrapState {
                self.core.bootstrap.state()
            }

            /// Engine id of the agent, once discovered or configured.
            ///
            /// Fails with [`ConfigErrorKind::NotV3`] on v1/v2c sessions.
            pub fn engine_id(&self) -> Result<Option<Bytes>> {
                self.core.engine_id()
            }

            /// Whether a refresh is due.
            ///
            /// True while the handshake is incomplete or once the last time
            /// synchronization is older than
            /// [`TIME_SYNC_BUDGET`](crate::v3::TIME_SYNC_BUDGET). The session
            /// never refreshes on its own.
            pub fn needs_refresh(&self) -> bool {
                self.core.bootstrap.needs_refresh(Instant::now())
            }

            pub fn transport(&self) -> &T {
                &self.core.transport
            }

            pub fn transport_mut(&mut self) -> &mut T {
                &mut self.core.transport
            }
        }
    };
}

/// Async SNMP session.
pub struct Session<T> {
    core: SessionCore<T>,
}

impl<T: Transport> Session<T> {
    pub(crate) fn from_core(core: SessionCore<T>) -> Self {
        Self { core }
    }

    /// GET a single OID.
    ///
    /// Exception values (`noSuchObject`, `noSuchInstance`, `endOfMibView`)
    /// fail with [`Error::NoSuchInstance`].
    #[instrument(level = "debug", skip(self), err, fields(snmp.target = %self.core.target, snmp.oid = %oid))]
    pub async fn get(&mut self, oid: &Oid) -> Result<Value> {
        let value = self.core.exchange(Get(oid)).await?;
        require_instance(oid, value)
    }

    /// GET several OIDs in one request.
    ///
    /// OIDs the agent has no value for are left out of the map.
    #[instrument(level = "debug", skip(self, oids), err, fields(snmp.target = %self.core.target, snmp.oid_count = oids.len()))]
    pub async fn get_many(&mut self, oids: &[Oid]) -> Result<BTreeMap<Oid, Value>> {
        let rows = self.core.exchange(GetMany(oids)).await?;
        Ok(into_map(rows))
    }

    /// Walk the subtree under `oid` with GETNEXT.
    pub fn get_next(&mut self, oid: &Oid) -> Walk<'_, T> {
        let pager = self.core.next_pager(oid);
        Walk::new(&mut self.core, pager)
    }

    /// Walk the subtree under `oid` with GETBULK.
    ///
    /// `None` or `Some(0)` uses the session's max-repetitions. On SNMPv1 the
    /// walk yields [`ConfigErrorKind::BulkOnV1`] and ends.
    pub fn get_bulk(&mut self, oid: &Oid, max_repetitions: Option<u32>) -> Walk<'_, T> {
        let pager = self.core.bulk_pager(oid, max_repetitions);
        Walk::new(&mut self.core, pager)
    }

    /// Walk the subtree under `oid` with the best available request kind.
    pub fn fetch(&mut self, oid: &Oid) -> Walk<'_, T> {
        let pager = self.core.fetch_pager(oid);
        Walk::new(&mut self.core, pager)
    }

    /// Run the pending SNMPv3 handshake rounds.
    ///
    /// Discovers the engine and installs the user's keys if needed, then
    /// synchronizes engine time. No-op on v1/v2c and for users without
    /// authentication. A timeout leaves the state as it was before the
    /// failing round, so the call can be repeated.
    #[instrument(level = "debug", skip(self), err, fields(snmp.target = %self.core.target))]
    pub async fn refresh(&mut self) -> Result<()> {
        let plan = self.core.bootstrap.plan();
        if plan.discover {
            self.core.exchange(Refresh).await?;
            self.core.install_deferred_keys()?;
        }
        if plan.sync {
            self.core.exchange(Refresh).await?;
            self.core.synchronized();
        }
        Ok(())
    }
}

impl_accessors!(Session);

/// Blocking SNMP session.
///
/// Same operations as [`Session`], run on the calling thread.
pub struct BlockingSession<T> {
    core: SessionCore<T>,
}

impl<T: Transport> BlockingSession<T> {
    pub(crate) fn from_core(core: SessionCore<T>) -> Self {
        Self { core }
    }

    #[instrument(level = "debug", skip(self), err, fields(snmp.target = %self.core.target, snmp.oid = %oid))]
    pub fn get(&mut self, oid: &Oid) -> Result<Value> {
        let value = self.core.exchange_blocking(Get(oid))?;
        require_instance(oid, value)
    }

    #[instrument(level = "debug", skip(self, oids), err, fields(snmp.target = %self.core.target, snmp.oid_count = oids.len()))]
    pub fn get_many(&mut self, oids: &[Oid]) -> Result<BTreeMap<Oid, Value>> {
        let rows = self.core.exchange_blocking(GetMany(oids))?;
        Ok(into_map(rows))
    }

    pub fn get_next(&mut self, oid: &Oid) -> WalkIter<'_, T> {
        let pager = self.core.next_pager(oid);
        WalkIter::new(&mut self.core, pager)
    }

    pub fn get_bulk(&mut self, oid: &Oid, max_repetitions: Option<u32>) -> WalkIter<'_, T> {
        let pager = self.core.bulk_pager(oid, max_repetitions);
        WalkIter::new(&mut self.core, pager)
    }

    pub fn fetch(&mut self, oid: &Oid) -> WalkIter<'_, T> {
        let pager = self.core.fetch_pager(oid);
        WalkIter::new(&mut self.core, pager)
    }

    #[instrument(level = "debug", skip(self), err, fields(snmp.target = %self.core.target))]
    pub fn refresh(&mut self) -> Result<()> {
        let plan = self.core.bootstrap.plan();
        if plan.discover {
            self.core.exchange_blocking(Refresh)?;
            self.core.install_deferred_keys()?;
        }
        if plan.sync {
            self.core.exchange_blocking(Refresh)?;
            self.core.synchronized();
        }
        Ok(())
    }
}

impl_accessors!(BlockingSession);
