//! SNMPv3 bootstrap handshake through the session API.

mod common;

use bytes::Bytes;
use common::*;
use snmp_session::transport::{MOCK_ENGINE_ID, MockAgent, RecordedRequest, RefreshKind};
use snmp_session::v3::BootstrapState;
use snmp_session::{Error, SessionBuilder, Value};

const KNOWN_ENGINE_ID: &[u8] = b"\x80\x00\x1f\x88\x04known";

#[tokio::test]
async fn discovery_runs_once_across_refreshes() {
    init_tracing();
    let mut session = SessionBuilder::new("127.0.0.1")
        .user(auth_user())
        .connect(&standard_agent(1))
        .unwrap();
    assert_eq!(session.bootstrap_state(), BootstrapState::PendingDiscovery);
    assert!(session.needs_refresh());
    assert_eq!(session.engine_id().unwrap(), None);

    session.refresh().await.unwrap();
    session.refresh().await.unwrap();

    let transport = session.transport();
    assert_eq!(
        transport.refresh_rounds(),
        vec![RefreshKind::Discovery, RefreshKind::Sync, RefreshKind::Sync]
    );
    assert_eq!(transport.installed_keys(), &[users::AUTHSHA1_USER.to_string()]);
    assert!(matches!(
        session.bootstrap_state(),
        BootstrapState::Ready { .. }
    ));
    assert!(!session.needs_refresh());
    assert_eq!(
        session.engine_id().unwrap(),
        Some(Bytes::from_static(MOCK_ENGINE_ID))
    );
}

#[test]
fn open_blocking_bootstraps_before_first_request() {
    let mut session = SessionBuilder::new("127.0.0.1")
        .user(priv_user())
        .open_blocking(&standard_agent(1))
        .unwrap();
    assert!(matches!(
        session.bootstrap_state(),
        BootstrapState::Ready { .. }
    ));

    assert_eq!(session.get(&sys_name()).unwrap(), Value::from("core-1"));
    assert_eq!(
        session.transport().requests(),
        &[
            RecordedRequest::Refresh(RefreshKind::Discovery),
            RecordedRequest::Refresh(RefreshKind::Sync),
            RecordedRequest::Get(sys_name()),
        ]
    );
}

#[tokio::test]
async fn known_engine_id_skips_discovery() {
    let mut session = SessionBuilder::new("127.0.0.1")
        .user(auth_user())
        .engine_id(KNOWN_ENGINE_ID)
        .open(&standard_agent(1))
        .await
        .unwrap();

    let transport = session.transport();
    assert_eq!(transport.refresh_rounds(), vec![RefreshKind::Sync]);
    assert!(transport.installed_keys().is_empty());
    assert_eq!(transport.params().user.name(), users::AUTHSHA1_USER);
    assert_eq!(
        session.engine_id().unwrap(),
        Some(Bytes::from_static(KNOWN_ENGINE_ID))
    );

    session.refresh().await.unwrap();
    assert_eq!(
        session.transport().refresh_rounds(),
        vec![RefreshKind::Sync, RefreshKind::Sync]
    );
}

#[tokio::test]
async fn noauth_user_settles_after_discovery() {
    let mut session = SessionBuilder::new("127.0.0.1")
        .user(noauth_user())
        .open(&standard_agent(1))
        .await
        .unwrap();
    assert_eq!(session.bootstrap_state(), BootstrapState::NoAuthNeeded);
    assert!(!session.needs_refresh());

    // Nothing left to do.
    session.refresh().await.unwrap();
    assert_eq!(
        session.transport().refresh_rounds(),
        vec![RefreshKind::Discovery, RefreshKind::Sync]
    );
}

#[tokio::test]
async fn noauth_user_with_known_engine_needs_nothing() {
    let session = SessionBuilder::new("127.0.0.1")
        .user(noauth_user())
        .engine_id(KNOWN_ENGINE_ID)
        .open(&standard_agent(1))
        .await
        .unwrap();
    assert!(session.transport().requests().is_empty());
}

#[test]
fn discovery_timeout_is_retryable() {
    let mut session = SessionBuilder::new("127.0.0.1")
        .user(auth_user())
        .timeout(SHORT_TIMEOUT)
        .connect_blocking(&MockAgent::new().silent())
        .unwrap();

    let err = session.refresh().unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
    assert_eq!(session.bootstrap_state(), BootstrapState::PendingDiscovery);
    assert!(session.transport().installed_keys().is_empty());
    assert_eq!(session.engine_id().unwrap(), None);

    session.transport_mut().set_silent(false);
    session.refresh().unwrap();
    assert!(matches!(
        session.bootstrap_state(),
        BootstrapState::Ready { .. }
    ));
    assert_eq!(
        session.transport().installed_keys(),
        &[users::AUTHSHA1_USER.to_string()]
    );
}

#[test]
fn sync_timeout_keeps_installed_keys() {
    let mut session = SessionBuilder::new("127.0.0.1")
        .user(auth_user())
        .timeout(SHORT_TIMEOUT)
        .open_blocking(&standard_agent(1))
        .unwrap();

    session.transport_mut().set_silent(true);
    assert!(matches!(session.refresh(), Err(Error::Timeout { .. })));
    assert!(matches!(
        session.bootstrap_state(),
        BootstrapState::Ready { .. }
    ));

    // The retry only resynchronizes; keys stay installed from the first run.
    session.transport_mut().set_silent(false);
    session.refresh().unwrap();
    let transport = session.transport();
    assert_eq!(transport.installed_keys().len(), 1);
    assert_eq!(
        transport.refresh_rounds(),
        vec![
            RefreshKind::Discovery,
            RefreshKind::Sync,
            RefreshKind::Sync,
            RefreshKind::Sync,
        ]
    );
}

#[tokio::test]
async fn community_sessions_have_no_handshake() {
    let mut session = SessionBuilder::new("127.0.0.1")
        .community(COMMUNITY_RO)
        .open(&standard_agent(1))
        .await
        .unwrap();
    assert_eq!(session.bootstrap_state(), BootstrapState::NoAuthNeeded);
    session.refresh().await.unwrap();
    assert!(session.transport().requests().is_empty());
    assert!(matches!(session.engine_id(), Err(Error::Config { .. })));
}
