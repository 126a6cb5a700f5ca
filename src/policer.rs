//! Outgoing request rate limiting.
//!
//! A [`Policer`] decides how long a session must wait before its next request
//! leaves the socket. [`RpsPolicer`] keeps requests on a fixed time grid with
//! one slot per `1 / rps` seconds: a request arriving early is delayed to the
//! next free slot, a request arriving late is sent immediately and the grid is
//! re-anchored on the latest slot that has already passed.
//!
//! Policers are shared through `Arc`, so several sessions handed the same
//! policer draw from one common budget.

use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use crate::error::{ConfigErrorKind, Error, Result};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Rate limiter consulted once per request round.
pub trait Policer: Send + Sync + std::fmt::Debug {
    /// Claim the next slot if it can be reached within `limit`.
    ///
    /// `Ok(None)` means the request may be sent right away, `Ok(Some(wait))`
    /// that the slot is claimed and starts after `wait`. `Err(wait)` refuses:
    /// the slot is further away than `limit` and nothing is claimed.
    fn reserve(&self, limit: Duration) -> Reservation;
}

/// Outcome of [`Policer::reserve`]: the wait before a claimed slot, or the
/// wait to a slot that was refused.
pub type Reservation = std::result::Result<Option<Duration>, Duration>;

/// Monotonic process clock in nanoseconds.
pub(crate) fn monotonic_ns() -> u64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let epoch = EPOCH.get_or_init(Instant::now);
    u64::try_from(epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
}

/// Grid state of an [`RpsPolicer`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct Grid {
    interval: u64,
    previous: Option<u64>,
}

impl Grid {
    fn admit(&mut self, now: u64) -> Option<Duration> {
        let Some(previous) = self.previous else {
            self.previous = Some(now);
            return None;
        };
        let interval = self.interval as i128;
        let elapsed = now as i128 - previous as i128;
        if elapsed < 0 {
            // Clock stepped back: re-anchor and hold a full slot.
            self.previous = Some(now);
            return Some(Duration::from_nanos(self.interval));
        }
        if elapsed < interval {
            self.previous = Some(previous + self.interval);
            return Some(Duration::from_nanos((interval - elapsed) as u64));
        }
        let slots = (elapsed / interval) as u64;
        self.previous = Some(previous + self.interval * slots);
        None
    }

    /// [`admit`](Self::admit), but left untouched when the wait exceeds `limit`.
    fn admit_within(&mut self, now: u64, limit: Duration) -> Reservation {
        let mut next = self.clone();
        match next.admit(now) {
            Some(wait) if wait > limit => Err(wait),
            wait => {
                *self = next;
                Ok(wait)
            }
        }
    }
}

/// Requests-per-second limiter.
#[derive(Debug)]
pub struct RpsPolicer {
    grid: Mutex<Grid>,
}

impl RpsPolicer {
    /// Create a limiter allowing at most `rps` requests per second.
    ///
    /// Fractional rates are allowed (`0.5` is one request every two seconds).
    /// Fails with [`ConfigErrorKind::InvalidRate`] for zero, negative or
    /// non-finite rates and [`ConfigErrorKind::RateTooHigh`] when the
    /// resulting interval rounds down to zero nanoseconds.
    pub fn new(rps: f64) -> Result<Self> {
        if !rps.is_finite() || rps <= 0.0 {
            return Err(Error::config(ConfigErrorKind::InvalidRate));
        }
        let interval = (NANOS_PER_SEC / rps).floor();
        if interval < 1.0 {
            return Err(Error::config(ConfigErrorKind::RateTooHigh));
        }
        Ok(Self {
            grid: Mutex::new(Grid {
                interval: interval as u64,
                previous: None,
            }),
        })
    }

    /// Spacing between slots.
    pub fn interval(&self) -> Duration {
        Duration::from_nanos(self.lock().interval)
    }

    /// Claim a slot at an explicit monotonic timestamp (nanoseconds).
    ///
    /// [`Policer::reserve`] calls this with the process clock. Exposed so the
    /// grid behaviour can be driven deterministically.
    pub fn admit_at(&self, now: u64) -> Option<Duration> {
        self.lock().admit(now)
    }

    /// [`admit_at`](Self::admit_at) that refuses, without claiming, a slot
    /// further away than `limit`.
    pub fn admit_within(&self, now: u64, limit: Duration) -> Reservation {
        self.lock().admit_within(now, limit)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Grid> {
        self.grid.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Policer for RpsPolicer {
    fn reserve(&self, limit: Duration) -> Reservation {
        let wait = self.admit_within(monotonic_ns(), limit);
        match wait {
            Ok(Some(wait)) => {
                tracing::trace!(target: "snmp_session::policer", ?wait, "request throttled")
            }
            Err(wait) => {
                tracing::debug!(target: "snmp_session::policer", ?wait, ?limit, "next slot out of reach")
            }
            Ok(None) => {}
        }
        wait
    }
}
