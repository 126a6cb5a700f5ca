//! Common test fixtures and constants.

use std::time::Duration;

use snmp_session::transport::MockAgent;
use snmp_session::v3::{AuthKey, AuthProtocol, PrivKey, PrivProtocol, User};
use snmp_session::{Oid, Value, oid};

// =============================================================================
// Standard system MIB OIDs (1.3.6.1.2.1.1.*)
// =============================================================================

pub fn sys_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
}
pub fn sys_object_id() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 2, 0)
}
pub fn sys_uptime() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
}
pub fn sys_contact() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 4, 0)
}
pub fn sys_name() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)
}
pub fn sys_location() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 6, 0)
}

// =============================================================================
// Subtree roots (for walks)
// =============================================================================

/// System subtree root: 1.3.6.1.2.1.1
pub fn system_subtree() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1)
}

/// ifDescr column: 1.3.6.1.2.1.2.2.1.2
pub fn if_descr_column() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2)
}

/// Nonexistent OID for testing NoSuchObject/NoSuchInstance
pub fn nonexistent_oid() -> Oid {
    oid!(1, 3, 6, 1, 99, 99, 99, 0)
}

// =============================================================================
// Agents
// =============================================================================

/// System group rows, in MIB order.
pub fn system_rows() -> Vec<(Oid, Value)> {
    vec![
        (sys_descr(), Value::from("Linux core-1 6.1.0 x86_64")),
        (
            sys_object_id(),
            Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 8072, 3, 2, 10)),
        ),
        (sys_uptime(), Value::TimeTicks(123_456)),
        (sys_contact(), Value::from("noc@example.net")),
        (sys_name(), Value::from("core-1")),
        (sys_location(), Value::from("rack 4")),
    ]
}

/// Agent with the system group plus `interfaces` ifDescr rows and one
/// object after them, so walks of ifDescr run into a neighbouring column.
pub fn standard_agent(interfaces: u32) -> MockAgent {
    let if_descr = (1..=interfaces).map(|i| {
        (
            if_descr_column().child(i),
            Value::from(format!("eth{}", i - 1)),
        )
    });
    MockAgent::new()
        .with_mib(system_rows())
        .with_mib(if_descr)
        .insert(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 3, 1), Value::Integer(6))
}

/// Short timeout for tests that expect one.
pub const SHORT_TIMEOUT: Duration = Duration::from_millis(200);

// =============================================================================
// Credentials
// =============================================================================

/// Auth password for all V3 users
pub const AUTH_PASSWORD: &str = "authpass123";
/// Privacy password for all V3 users
pub const PRIV_PASSWORD: &str = "privpass123";

/// V2c read-only community
pub const COMMUNITY_RO: &[u8] = b"public";

pub mod users {
    pub const NOAUTH_USER: &str = "noauth_user";
    pub const AUTHSHA1_USER: &str = "authsha1_user";
    pub const PRIVAES128_USER: &str = "privaes128_user";
}

pub fn noauth_user() -> User {
    User::new(users::NOAUTH_USER)
}

pub fn auth_user() -> User {
    User::with_auth(
        users::AUTHSHA1_USER,
        AuthKey::password(AuthProtocol::Sha1, AUTH_PASSWORD),
    )
}

pub fn priv_user() -> User {
    User::with_auth_priv(
        users::PRIVAES128_USER,
        AuthKey::password(AuthProtocol::Sha256, AUTH_PASSWORD),
        PrivKey::password(PrivProtocol::Aes128, PRIV_PASSWORD),
    )
}
