//! Readiness-driven request rounds.
//!
//! A round is one request/response exchange through a [`Transport`]: send,
//! then receive, each retried whenever the transport reports
//! [`Error::WouldBlock`]. [`Round`] is the retry state machine and performs
//! no waiting itself; it reports which readiness it is blocked on. Two
//! drivers supply the waiting:
//!
//! - [`drive`] suspends the task on tokio's reactor through [`AsyncFd`]
//! - [`drive_blocking`] parks the thread in `poll(2)`
//!
//! Both arm a single deadline at the start of the round. The policer delay,
//! the writable wait and the readable wait all count against it.

use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::time::Duration;

use tokio::io::Interest;
use tokio::io::unix::AsyncFd;
use tokio::time::{sleep_until, timeout_at};

use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::policer::Policer;
use crate::transport::Transport;
use crate::value::Value;
use crate::varbind::VarBind;

/// A request kind as a send/receive pair on a transport.
pub(crate) trait Operation {
    type Output;

    fn send<T: Transport>(&self, transport: &mut T) -> Result<()>;

    fn recv<T: Transport>(&self, transport: &mut T) -> Result<Self::Output>;
}

pub(crate) struct Get<'a>(pub &'a Oid);

impl Operation for Get<'_> {
    type Output = Value;

    fn send<T: Transport>(&self, transport: &mut T) -> Result<()> {
        transport.send_get(self.0)
    }

    fn recv<T: Transport>(&self, transport: &mut T) -> Result<Value> {
        transport.recv_get()
    }
}

pub(crate) struct GetMany<'a>(pub &'a [Oid]);

impl Operation for GetMany<'_> {
    type Output = Vec<VarBind>;

    fn send<T: Transport>(&self, transport: &mut T) -> Result<()> {
        transport.send_get_many(self.0)
    }

    fn recv<T: Transport>(&self, transport: &mut T) -> Result<Vec<VarBind>> {
        transport.recv_get_many()
    }
}

pub(crate) struct GetNext<'a>(pub &'a Oid);

impl Operation for GetNext<'_> {
    type Output = Option<VarBind>;

    fn send<T: Transport>(&self, transport: &mut T) -> Result<()> {
        transport.send_get_next(self.0)
    }

    fn recv<T: Transport>(&self, transport: &mut T) -> Result<Option<VarBind>> {
        transport.recv_get_next()
    }
}

pub(crate) struct GetBulk<'a>(pub &'a Oid, pub u32);

impl Operation for GetBulk<'_> {
    type Output = Vec<VarBind>;

    fn send<T: Transport>(&self, transport: &mut T) -> Result<()> {
        transport.send_get_bulk(self.0, self.1)
    }

    fn recv<T: Transport>(&self, transport: &mut T) -> Result<Vec<VarBind>> {
        transport.recv_get_bulk()
    }
}

pub(crate) struct Refresh;

impl Operation for Refresh {
    type Output = ();

    fn send<T: Transport>(&self, transport: &mut T) -> Result<()> {
        transport.send_refresh()
    }

    fn recv<T: Transport>(&self, transport: &mut T) -> Result<()> {
        transport.recv_refresh()
    }
}

/// Socket direction a round is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Readiness {
    Readable,
    Writable,
}

/// Outcome of one [`Round::advance`] step.
#[derive(Debug, PartialEq)]
pub(crate) enum Progress<O> {
    Complete(O),
    Blocked(Readiness),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Send,
    Recv,
}

/// Retry state machine of one exchange.
pub(crate) struct Round<O> {
    op: O,
    phase: Phase,
}

impl<O: Operation> Round<O> {
    pub(crate) fn new(op: O) -> Self {
        Self {
            op,
            phase: Phase::Send,
        }
    }

    /// Make as much progress as the socket allows.
    ///
    /// Errors other than `WouldBlock` end the round.
    pub(crate) fn advance<T: Transport>(&mut self, transport: &mut T) -> Result<Progress<O::Output>> {
        loop {
            match self.phase {
                Phase::Send => match self.op.send(transport) {
                    Ok(()) => self.phase = Phase::Recv,
                    Err(e) if e.is_would_block() => {
                        return Ok(Progress::Blocked(Readiness::Writable));
                    }
                    Err(e) => return Err(e),
                },
                Phase::Recv => {
                    return match self.op.recv(transport) {
                        Ok(out) => Ok(Progress::Complete(out)),
                        Err(e) if e.is_would_block() => Ok(Progress::Blocked(Readiness::Readable)),
                        Err(e) => Err(e),
                    };
                }
            }
        }
    }
}

/// Borrowed descriptor for reactor registration. Never closes the fd.
struct Fd(RawFd);

impl AsRawFd for Fd {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

/// Run one round on the tokio reactor.
///
/// The descriptor is registered for the duration of the round only and
/// deregistered when the future completes or is dropped.
pub(crate) async fn drive<T, O>(
    transport: &mut T,
    op: O,
    timeout: Duration,
    policer: Option<&dyn Policer>,
) -> Result<O::Output>
where
    T: Transport,
    O: Operation,
{
    let started = tokio::time::Instant::now();
    let deadline = started + timeout;

    if let Some(policer) = policer {
        match policer.reserve(timeout) {
            Ok(None) => {}
            Ok(Some(wait)) => sleep_until(started + wait).await,
            Err(_) => {
                sleep_until(deadline).await;
                return Err(timed_out(started.elapsed()));
            }
        }
    }

    let fd = AsyncFd::with_interest(
        Fd(transport.as_raw_fd()),
        Interest::READABLE | Interest::WRITABLE,
    )?;
    let mut round = Round::new(op);
    let mut blocked = match round.advance(transport)? {
        Progress::Complete(out) => return Ok(out),
        Progress::Blocked(readiness) => readiness,
    };
    loop {
        let ready = match blocked {
            Readiness::Readable => timeout_at(deadline, fd.readable()).await,
            Readiness::Writable => timeout_at(deadline, fd.writable()).await,
        };
        let mut guard = match ready {
            Ok(guard) => guard?,
            Err(_) => return Err(timed_out(started.elapsed())),
        };
        match round.advance(transport)? {
            Progress::Complete(out) => return Ok(out),
            Progress::Blocked(next) => {
                // Readiness is edge-triggered: only clear the direction that
                // was just found stale.
                if next == blocked {
                    guard.clear_ready();
                }
                blocked = next;
            }
        }
    }
}

/// Run one round on the calling thread.
pub(crate) fn drive_blocking<T, O>(
    transport: &mut T,
    op: O,
    timeout: Duration,
    policer: Option<&dyn Policer>,
) -> Result<O::Output>
where
    T: Transport,
    O: Operation,
{
    let started = std::time::Instant::now();
    let deadline = started + timeout;

    if let Some(policer) = policer {
        match policer.reserve(timeout) {
            Ok(None) => {}
            Ok(Some(wait)) => std::thread::sleep(wait),
            Err(_) => {
                std::thread::sleep(timeout);
                return Err(timed_out(started.elapsed()));
            }
        }
    }

    let mut round = Round::new(op);
    loop {
        let readiness = match round.advance(transport)? {
            Progress::Complete(out) => return Ok(out),
            Progress::Blocked(readiness) => readiness,
        };
        let remaining = deadline.saturating_duration_since(std::time::Instant::now());
        if remaining.is_zero() || !poll_fd(transport.as_raw_fd(), readiness, remaining)? {
            return Err(timed_out(started.elapsed()));
        }
    }
}

fn timed_out(elapsed: Duration) -> Error {
    tracing::debug!(target: "snmp_session::io", ?elapsed, "request timed out");
    Error::Timeout { elapsed }
}

/// Wait until `fd` is ready or `timeout` passes. Returns false on timeout.
fn poll_fd(fd: RawFd, readiness: Readiness, timeout: Duration) -> io::Result<bool> {
    let events = match readiness {
        Readiness::Readable => libc::POLLIN,
        Readiness::Writable => libc::POLLOUT,
    };
    let mut pollfd = libc::pollfd {
        fd,
        events,
        revents: 0,
    };
    let deadline = std::time::Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(std::time::Instant::now());
        // Round up so a sub-millisecond remainder still sleeps.
        let timeout_ms = remaining
            .as_nanos()
            .div_ceil(1_000_000)
            .min(libc::c_int::MAX as u128) as libc::c_int;

        // SAFETY: poll_target points to our stack-allocated pollfd structure.
        let poll_target = std::ptr::addr_of_mut!(pollfd);
        let res = unsafe { libc::poll(poll_target, 1, timeout_ms) };
        if res > 0 {
            return Ok(true);
        }
        if res == 0 {
            return Ok(false);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}
