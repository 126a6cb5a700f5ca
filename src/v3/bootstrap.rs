//! SNMPv3 bootstrap handshake.
//!
//! Before authenticated requests can flow, a v3 session must learn the
//! agent's engine id (discovery), hand the user's keys to the transport so
//! they can be localized against that id, and synchronize engine boots/time.
//! [`Bootstrap`] tracks where a session is in that sequence and which
//! handshake rounds the next refresh has to run. It performs no I/O.
//!
//! ```text
//!                      discovery + set_keys
//!  PendingDiscovery ───────────────────────────┐
//!        │ (noauth user)                       ▼
//!        └──────────────► NoAuthNeeded   PendingTimeSync
//!                                              │ sync
//!                                              ▼
//!                                  Ready { synced_at } ◄─┐
//!                                              └─────────┘ sync
//! ```

use std::time::{Duration, Instant};

use crate::version::Version;

use super::User;

/// Age after which engine time should be resynchronized.
///
/// Agents reject messages more than 150 s outside their time window
/// (RFC 3414 section 3.2 step 7).
pub const TIME_SYNC_BUDGET: Duration = Duration::from_secs(150);

/// Handshake state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    /// Nothing to do: v1/v2c, or a v3 user without authentication whose
    /// engine id is already known.
    NoAuthNeeded,
    /// Engine id unknown; user keys are held back until it is learned.
    PendingDiscovery,
    /// Keys installed, engine time not yet synchronized.
    PendingTimeSync,
    /// Engine time synchronized at `synced_at`.
    Ready { synced_at: Instant },
}

/// Handshake rounds a refresh must run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Plan {
    /// Run a discovery round, then install the deferred keys.
    pub discover: bool,
    /// Run a time synchronization round.
    pub sync: bool,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        !self.discover && !self.sync
    }
}

/// Bootstrap state machine of one session.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    state: BootstrapState,
    deferred: Option<User>,
}

impl Bootstrap {
    /// Start the handshake for a new session.
    ///
    /// Returns the machine and the identity the transport must be built
    /// with. Without a known engine id the real user is deferred and the
    /// transport starts with an anonymous placeholder.
    pub fn start(version: Version, user: Option<User>, engine_id_known: bool) -> (Self, User) {
        let Some(user) = user.filter(|_| version.is_v3()) else {
            return (Self::settled(BootstrapState::NoAuthNeeded), User::placeholder());
        };
        if !engine_id_known {
            let machine = Self {
                state: BootstrapState::PendingDiscovery,
                deferred: Some(user),
            };
            return (machine, User::placeholder());
        }
        let state = if user.requires_auth() {
            BootstrapState::PendingTimeSync
        } else {
            BootstrapState::NoAuthNeeded
        };
        (Self::settled(state), user)
    }

    fn settled(state: BootstrapState) -> Self {
        Self {
            state,
            deferred: None,
        }
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// Rounds the next refresh has to run.
    pub fn plan(&self) -> Plan {
        match self.state {
            BootstrapState::NoAuthNeeded => Plan::default(),
            BootstrapState::PendingDiscovery => Plan {
                discover: true,
                sync: true,
            },
            BootstrapState::PendingTimeSync | BootstrapState::Ready { .. } => Plan {
                discover: false,
                sync: true,
            },
        }
    }

    /// User whose keys must be installed once discovery has succeeded.
    pub fn deferred_user(&self) -> Option<&User> {
        self.deferred.as_ref()
    }

    /// Record that discovery succeeded and the deferred keys were installed.
    pub fn on_keys_installed(&mut self) {
        if self.state != BootstrapState::PendingDiscovery {
            return;
        }
        let requires_auth = self.deferred.take().is_some_and(|u| u.requires_auth());
        self.state = if requires_auth {
            BootstrapState::PendingTimeSync
        } else {
            BootstrapState::NoAuthNeeded
        };
    }

    /// Record a successful time synchronization round.
    pub fn on_synchronized(&mut self, now: Instant) {
        if matches!(
            self.state,
            BootstrapState::PendingTimeSync | BootstrapState::Ready { .. }
        ) {
            self.state = BootstrapState::Ready { synced_at: now };
        }
    }

    /// Whether a refresh is due.
    ///
    /// True while keys or time sync are pending, or once the last sync is
    /// older than [`TIME_SYNC_BUDGET`].
    pub fn needs_refresh(&self, now: Instant) -> bool {
        match self.state {
            BootstrapState::NoAuthNeeded => false,
            BootstrapState::PendingDiscovery | BootstrapState::PendingTimeSync => true,
            BootstrapState::Ready { synced_at } => {
                now.saturating_duration_since(synced_at) >= TIME_SYNC_BUDGET
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v3::{AuthKey, AuthProtocol};

    fn auth_user() -> User {
        User::with_auth("admin", AuthKey::password(AuthProtocol::Sha1, "authpass"))
    }

    #[test]
    fn test_community_versions_need_nothing() {
        for version in [Version::V1, Version::V2c] {
            let (boot, identity) = Bootstrap::start(version, Some(auth_user()), false);
            assert_eq!(boot.state(), BootstrapState::NoAuthNeeded);
            assert!(boot.plan().is_empty());
            assert!(identity.name().is_empty());
        }
    }

    #[test]
    fn test_unknown_engine_defers_user() {
        let (boot, identity) = Bootstrap::start(Version::V3, Some(auth_user()), false);
        assert_eq!(boot.state(), BootstrapState::PendingDiscovery);
        assert_eq!(identity, User::placeholder());
        assert_eq!(boot.deferred_user().map(User::name), Some("admin"));
        assert_eq!(
            boot.plan(),
            Plan {
                discover: true,
                sync: true
            }
        );
    }

    #[test]
    fn test_known_engine_uses_real_identity() {
        let (boot, identity) = Bootstrap::start(Version::V3, Some(auth_user()), true);
        assert_eq!(boot.state(), BootstrapState::PendingTimeSync);
        assert_eq!(identity.name(), "admin");
        assert!(boot.deferred_user().is_none());

        let (boot, _) = Bootstrap::start(Version::V3, Some(User::new("ro")), true);
        assert_eq!(boot.state(), BootstrapState::NoAuthNeeded);
    }

    #[test]
    fn test_discovery_then_sync() {
        let (mut boot, _) = Bootstrap::start(Version::V3, Some(auth_user()), false);
        boot.on_keys_installed();
        assert_eq!(boot.state(), BootstrapState::PendingTimeSync);
        assert!(boot.deferred_user().is_none());

        let now = Instant::now();
        boot.on_synchronized(now);
        assert_eq!(boot.state(), BootstrapState::Ready { synced_at: now });
        assert_eq!(
            boot.plan(),
            Plan {
                discover: false,
                sync: true
            }
        );
    }

    #[test]
    fn test_noauth_discovery_settles() {
        let (mut boot, _) = Bootstrap::start(Version::V3, Some(User::new("ro")), false);
        boot.on_keys_installed();
        boot.on_synchronized(Instant::now());
        assert_eq!(boot.state(), BootstrapState::NoAuthNeeded);
        assert!(!boot.needs_refresh(Instant::now()));
    }

    #[test]
    fn test_needs_refresh_after_budget() {
        let (mut boot, _) = Bootstrap::start(Version::V3, Some(auth_user()), true);
        let synced = Instant::now();
        assert!(boot.needs_refresh(synced));
        boot.on_synchronized(synced);
        assert!(!boot.needs_refresh(synced + Duration::from_secs(149)));
        assert!(boot.needs_refresh(synced + TIME_SYNC_BUDGET));
    }
}
