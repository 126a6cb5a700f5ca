//! Mock transport for testing.
//!
//! [`MockAgent`] is an in-memory agent: a MIB in a `BTreeMap`, answered with
//! real GET/GETNEXT/GETBULK semantics, plus a queue of scripted responses
//! that take precedence over the MIB. It doubles as the [`Connector`] that
//! produces [`MockTransport`]s.
//!
//! Readiness is real: each transport owns one end of a Unix datagram socket
//! pair and the agent "answers" by writing a byte to the other end, so the
//! session's readiness waits behave as they would on a UDP socket. A silent
//! agent never writes and the session times out.

use std::collections::{BTreeMap, VecDeque};
use std::ops::Bound;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixDatagram;

use bytes::Bytes;

use super::{Connector, Transport, TransportParams};
use crate::error::{AuthErrorKind, DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use crate::v3::User;
use crate::value::Value;
use crate::varbind::VarBind;

/// Engine id reported by a [`MockAgent`] unless configured otherwise.
pub const MOCK_ENGINE_ID: &[u8] = b"\x80\x00\x1f\x88\x04mock-agent";

/// A scripted answer, consumed by the next request.
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Answer a GET with this value.
    Value(Value),
    /// Answer a GET, batched GET or GETBULK with these bindings.
    VarBinds(Vec<VarBind>),
    /// Answer a GETNEXT.
    Next(Option<VarBind>),
    /// Never answer.
    Silence,
    /// Fail the receive with an authentication error.
    AuthFailure(AuthErrorKind),
    /// Fail the receive with a decode error.
    Malformed(DecodeErrorKind),
}

/// Kind of a handshake round, as seen by the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshKind {
    /// Probe sent with the anonymous identity.
    Discovery,
    /// Probe sent with installed keys.
    Sync,
}

/// A request sent through the mock transport.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedRequest {
    Get(Oid),
    GetMany(Vec<Oid>),
    GetNext(Oid),
    GetBulk(Oid, u32),
    Refresh(RefreshKind),
}

/// In-memory agent and connector for [`MockTransport`].
///
/// # Example
///
/// ```rust,ignore
/// use snmp_session::transport::MockAgent;
/// use snmp_session::{Value, oid};
///
/// let agent = MockAgent::new()
///     .insert(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("router"))
///     .would_block_on_send(2);
/// ```
#[derive(Clone, Debug)]
pub struct MockAgent {
    mib: BTreeMap<Oid, Value>,
    engine_id: Bytes,
    script: VecDeque<MockResponse>,
    silent: bool,
    send_would_block: u32,
}

impl Default for MockAgent {
    fn default() -> Self {
        Self {
            mib: BTreeMap::new(),
            engine_id: Bytes::from_static(MOCK_ENGINE_ID),
            script: VecDeque::new(),
            silent: false,
            send_would_block: 0,
        }
    }
}

impl MockAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one object to the MIB.
    pub fn insert(mut self, oid: Oid, value: Value) -> Self {
        self.mib.insert(oid, value);
        self
    }

    /// Add many objects to the MIB.
    pub fn with_mib(mut self, objects: impl IntoIterator<Item = (Oid, Value)>) -> Self {
        self.mib.extend(objects);
        self
    }

    /// Engine id learned by discovery.
    pub fn engine_id(mut self, engine_id: impl Into<Bytes>) -> Self {
        self.engine_id = engine_id.into();
        self
    }

    /// Queue a scripted answer ahead of the MIB.
    pub fn respond(mut self, response: MockResponse) -> Self {
        self.script.push_back(response);
        self
    }

    /// Stop answering once the script is exhausted.
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Report `WouldBlock` on the next `times` sends.
    pub fn would_block_on_send(mut self, times: u32) -> Self {
        self.send_would_block = times;
        self
    }

    fn answer(&self, request: &RecordedRequest) -> Staged {
        match request {
            RecordedRequest::Get(oid) => Staged::Value(
                self.mib
                    .get(oid)
                    .cloned()
                    .unwrap_or(Value::NoSuchInstance),
            ),
            RecordedRequest::GetMany(oids) => Staged::VarBinds(
                oids.iter()
                    .map(|oid| {
                        let value = self.mib.get(oid).cloned();
                        VarBind::new(oid.clone(), value.unwrap_or(Value::NoSuchInstance))
                    })
                    .collect(),
            ),
            RecordedRequest::GetNext(oid) => Staged::Next(
                self.after(oid)
                    .next()
                    .map(|(oid, value)| VarBind::new(oid.clone(), value.clone())),
            ),
            RecordedRequest::GetBulk(oid, max_repetitions) => {
                let limit = *max_repetitions as usize;
                let mut rows: Vec<VarBind> = self
                    .after(oid)
                    .take(limit)
                    .map(|(oid, value)| VarBind::new(oid.clone(), value.clone()))
                    .collect();
                if rows.len() < limit {
                    let last = rows.last().map_or_else(|| oid.clone(), |vb| vb.oid.clone());
                    rows.push(VarBind::new(last, Value::EndOfMibView));
                }
                Staged::VarBinds(rows)
            }
            RecordedRequest::Refresh(_) => Staged::Refreshed,
        }
    }

    fn after<'a>(&'a self, oid: &Oid) -> impl Iterator<Item = (&'a Oid, &'a Value)> + 'a {
        self.mib.range((Bound::Excluded(oid.clone()), Bound::Unbounded))
    }
}

impl Connector for MockAgent {
    type Transport = MockTransport;

    fn connect(&self, params: &TransportParams) -> Result<MockTransport> {
        MockTransport::new(self.clone(), params.clone())
    }
}

#[derive(Debug)]
enum Staged {
    Value(Value),
    VarBinds(Vec<VarBind>),
    Next(Option<VarBind>),
    Refreshed,
    Failed(Error),
}

impl Staged {
    fn scripted(response: MockResponse) -> Option<Self> {
        Some(match response {
            MockResponse::Value(value) => Self::Value(value),
            MockResponse::VarBinds(rows) => Self::VarBinds(rows),
            MockResponse::Next(row) => Self::Next(row),
            MockResponse::Silence => return None,
            MockResponse::AuthFailure(kind) => Self::Failed(Error::auth(kind)),
            MockResponse::Malformed(kind) => Self::Failed(Error::decode(kind)),
        })
    }
}

fn unexpected() -> Error {
    Error::decode(DecodeErrorKind::UnexpectedPdu)
}

/// Transport half of a [`MockAgent`].
#[derive(Debug)]
pub struct MockTransport {
    agent: MockAgent,
    params: TransportParams,
    socket: UnixDatagram,
    peer: UnixDatagram,
    staged: Option<Staged>,
    keyed: bool,
    engine_discovered: bool,
    requests: Vec<RecordedRequest>,
    installed_keys: Vec<String>,
}

impl MockTransport {
    /// Create a transport talking to `agent`.
    pub fn new(agent: MockAgent, params: TransportParams) -> Result<Self> {
        let (socket, peer) = UnixDatagram::pair()?;
        socket.set_nonblocking(true)?;
        let keyed = !params.user.name().is_empty();
        Ok(Self {
            agent,
            params,
            socket,
            peer,
            staged: None,
            keyed,
            engine_discovered: false,
            requests: Vec::new(),
            installed_keys: Vec::new(),
        })
    }

    /// Requests in the order they were sent.
    pub fn requests(&self) -> &[RecordedRequest] {
        &self.requests
    }

    /// Handshake rounds in the order they were sent.
    pub fn refresh_rounds(&self) -> Vec<RefreshKind> {
        self.requests
            .iter()
            .filter_map(|r| match r {
                RecordedRequest::Refresh(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// User names passed to `set_keys`.
    pub fn installed_keys(&self) -> &[String] {
        &self.installed_keys
    }

    /// Parameters the transport was built with.
    pub fn params(&self) -> &TransportParams {
        &self.params
    }

    /// Queue a scripted answer on a live transport.
    pub fn respond(&mut self, response: MockResponse) {
        self.agent.script.push_back(response);
    }

    /// Toggle answering on a live transport.
    pub fn set_silent(&mut self, silent: bool) {
        self.agent.silent = silent;
    }

    fn submit(&mut self, request: RecordedRequest) -> Result<()> {
        if self.agent.send_would_block > 0 {
            self.agent.send_would_block -= 1;
            // Wake the reactor so the writable wait observes a fresh event.
            self.peer.send(&[0])?;
            return Err(Error::WouldBlock);
        }
        let discovery = request == RecordedRequest::Refresh(RefreshKind::Discovery);
        let staged = match self.agent.script.pop_front() {
            Some(response) => Staged::scripted(response),
            None if self.agent.silent => None,
            None => Some(self.agent.answer(&request)),
        };
        self.requests.push(request);
        if let Some(staged) = staged {
            // Only an answered discovery round reveals the engine id.
            self.engine_discovered |= discovery && matches!(staged, Staged::Refreshed);
            self.staged = Some(staged);
            self.peer.send(&[1])?;
        }
        Ok(())
    }

    fn take(&mut self) -> Result<Staged> {
        if self.requests.is_empty() {
            return Err(Error::decode(DecodeErrorKind::NoRequestInFlight));
        }
        let mut byte = [0u8; 1];
        // Drain wake-ups and replies to abandoned requests until the staged
        // answer shows up.
        loop {
            self.socket.recv(&mut byte)?;
            match self.staged.take() {
                Some(Staged::Failed(err)) => return Err(err),
                Some(staged) => return Ok(staged),
                None => continue,
            }
        }
    }
}

impl AsRawFd for MockTransport {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}

impl Transport for MockTransport {
    fn send_get(&mut self, oid: &Oid) -> Result<()> {
        self.submit(RecordedRequest::Get(oid.clone()))
    }

    fn recv_get(&mut self) -> Result<Value> {
        match self.take()? {
            Staged::Value(value) => Ok(value),
            _ => Err(unexpected()),
        }
    }

    fn send_get_many(&mut self, oids: &[Oid]) -> Result<()> {
        self.submit(RecordedRequest::GetMany(oids.to_vec()))
    }

    fn recv_get_many(&mut self) -> Result<Vec<VarBind>> {
        match self.take()? {
            Staged::VarBinds(rows) => Ok(rows),
            _ => Err(unexpected()),
        }
    }

    fn send_get_next(&mut self, oid: &Oid) -> Result<()> {
        self.submit(RecordedRequest::GetNext(oid.clone()))
    }

    fn recv_get_next(&mut self) -> Result<Option<VarBind>> {
        match self.take()? {
            Staged::Next(row) => Ok(row),
            _ => Err(unexpected()),
        }
    }

    fn send_get_bulk(&mut self, oid: &Oid, max_repetitions: u32) -> Result<()> {
        self.submit(RecordedRequest::GetBulk(oid.clone(), max_repetitions))
    }

    fn recv_get_bulk(&mut self) -> Result<Vec<VarBind>> {
        match self.take()? {
            Staged::VarBinds(rows) => Ok(rows),
            _ => Err(unexpected()),
        }
    }

    fn send_refresh(&mut self) -> Result<()> {
        let kind = if self.keyed {
            RefreshKind::Sync
        } else {
            RefreshKind::Discovery
        };
        self.submit(RecordedRequest::Refresh(kind))
    }

    fn recv_refresh(&mut self) -> Result<()> {
        match self.take()? {
            Staged::Refreshed => Ok(()),
            _ => Err(unexpected()),
        }
    }

    fn set_keys(&mut self, user: &User) -> Result<()> {
        self.installed_keys.push(user.name().to_string());
        self.keyed = !user.name().is_empty();
        Ok(())
    }

    fn engine_id(&self) -> Option<Bytes> {
        if let Some(id) = &self.params.engine_id {
            return Some(id.clone());
        }
        self.engine_discovered.then(|| self.agent.engine_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::version::Version;

    fn transport(agent: MockAgent) -> MockTransport {
        let params = TransportParams::new("127.0.0.1:161".parse().unwrap(), Version::V2c);
        agent.connect(&params).unwrap()
    }

    #[test]
    fn test_recv_before_answer_would_block() {
        let mut t = transport(MockAgent::new().silent());
        t.send_get(&oid!(1, 3, 6, 1)).unwrap();
        assert!(matches!(t.recv_get(), Err(Error::WouldBlock)));
    }

    #[test]
    fn test_get_next_walks_past_subtree() {
        let mut t = transport(
            MockAgent::new()
                .insert(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("a"))
                .insert(oid!(1, 3, 6, 1, 2, 1, 2, 1, 0), Value::Integer(2)),
        );
        t.send_get_next(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).unwrap();
        let row = t.recv_get_next().unwrap().unwrap();
        assert_eq!(row.oid, oid!(1, 3, 6, 1, 2, 1, 2, 1, 0));

        t.send_get_next(&row.oid).unwrap();
        assert_eq!(t.recv_get_next().unwrap(), None);
    }

    #[test]
    fn test_bulk_marks_end_of_mib() {
        let mut t = transport(
            MockAgent::new()
                .insert(oid!(1, 3, 6, 1, 1), Value::Integer(1))
                .insert(oid!(1, 3, 6, 1, 2), Value::Integer(2)),
        );
        t.send_get_bulk(&oid!(1, 3, 6, 1), 5).unwrap();
        let rows = t.recv_get_bulk().unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[2].is_end_of_mib_view());
        assert_eq!(rows[2].oid, oid!(1, 3, 6, 1, 2));
    }

    #[test]
    fn test_script_overrides_mib() {
        let mut t = transport(
            MockAgent::new()
                .insert(oid!(1, 3, 6, 1), Value::Integer(1))
                .respond(MockResponse::AuthFailure(AuthErrorKind::WrongDigest)),
        );
        t.send_get(&oid!(1, 3, 6, 1)).unwrap();
        assert!(matches!(t.recv_get(), Err(Error::Auth { .. })));
        t.send_get(&oid!(1, 3, 6, 1)).unwrap();
        assert_eq!(t.recv_get().unwrap(), Value::Integer(1));
    }

    #[test]
    fn test_unanswered_discovery_learns_nothing() {
        let mut t = transport(MockAgent::new().silent());
        t.send_refresh().unwrap();
        assert!(matches!(t.recv_refresh(), Err(Error::WouldBlock)));
        assert_eq!(t.engine_id(), None);

        t.set_silent(false);
        t.send_refresh().unwrap();
        t.recv_refresh().unwrap();
        assert_eq!(t.engine_id(), Some(Bytes::from_static(MOCK_ENGINE_ID)));
    }

    #[test]
    fn test_discovery_learns_engine_id() {
        let mut t = transport(MockAgent::new());
        assert_eq!(t.engine_id(), None);
        t.send_refresh().unwrap();
        t.recv_refresh().unwrap();
        assert_eq!(t.engine_id(), Some(Bytes::from_static(MOCK_ENGINE_ID)));
        assert_eq!(t.refresh_rounds(), vec![RefreshKind::Discovery]);
    }
}
