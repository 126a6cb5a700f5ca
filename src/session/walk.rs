//! Subtree walks.
//!
//! [`Pager`] is the cursor shared by both execution models: it produces the
//! next request from the last name seen and folds each response page back
//! into a row buffer. [`Walk`] drives it as an async [`Stream`], [`WalkIter`]
//! as a blocking [`Iterator`]. Each page is a full session round, so it goes
//! through the policer and gets its own timeout.
//!
//! A walk ends when a page yields fewer usable rows than were asked for. A
//! row is usable while it stays inside the base subtree and is not
//! `endOfMibView`. When a subtree holds an exact multiple of the page size,
//! the walk costs one extra round, which comes back empty or out of the
//! subtree.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::transport::Transport;
use crate::varbind::VarBind;

use super::SessionCore;

/// Request kind used for walk rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// One GETNEXT per row.
    GetNext,
    /// GETBULK with non-repeaters 0.
    GetBulk { max_repetitions: u32 },
}

impl WalkMode {
    /// Rows requested per round.
    pub fn page_size(self) -> usize {
        match self {
            Self::GetNext => 1,
            Self::GetBulk { max_repetitions } => max_repetitions as usize,
        }
    }
}

/// Next request a [`Pager`] wants sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageRequest {
    pub position: Oid,
    pub mode: WalkMode,
}

/// Walk cursor.
#[derive(Debug)]
pub(crate) struct Pager {
    base: Oid,
    position: Oid,
    mode: WalkMode,
    buffer: VecDeque<VarBind>,
    pending: Option<Error>,
    done: bool,
}

impl Pager {
    pub(crate) fn new(base: Oid, mode: WalkMode) -> Self {
        Self {
            position: base.clone(),
            base,
            mode,
            buffer: VecDeque::new(),
            pending: None,
            done: false,
        }
    }

    /// Cursor that yields `err` once and ends.
    pub(crate) fn failed(base: Oid, mode: WalkMode, err: Error) -> Self {
        let mut pager = Self::new(base, mode);
        pager.fail(err);
        pager
    }

    /// Next buffered row, or the error that ended the walk.
    pub(crate) fn pop(&mut self) -> Option<Result<VarBind>> {
        match self.buffer.pop_front() {
            Some(row) => Some(Ok(row)),
            None => self.pending.take().map(Err),
        }
    }

    /// No more rounds will be sent.
    pub(crate) fn is_done(&self) -> bool {
        self.done
    }

    pub(crate) fn request(&self) -> PageRequest {
        PageRequest {
            position: self.position.clone(),
            mode: self.mode,
        }
    }

    /// Fold a response page into the buffer.
    pub(crate) fn absorb(&mut self, page: Vec<VarBind>) {
        let mut usable = 0;
        for row in page {
            if row.is_end_of_mib_view() || !row.oid.starts_with(&self.base) {
                self.done = true;
                break;
            }
            if row.oid <= self.position {
                tracing::warn!(
                    target: "snmp_session::walk",
                    previous = %self.position,
                    current = %row.oid,
                    "agent returned non-increasing OID"
                );
                self.fail(Error::NonIncreasingOid {
                    previous: self.position.clone(),
                    current: row.oid,
                });
                return;
            }
            self.position = row.oid.clone();
            self.buffer.push_back(row);
            usable += 1;
        }
        if usable < self.mode.page_size() {
            self.done = true;
        }
    }

    /// End the walk with `err`, after the rows already buffered.
    pub(crate) fn fail(&mut self, err: Error) {
        self.pending = Some(err);
        self.done = true;
    }
}

type PageFuture<'a, T> =
    Pin<Box<dyn Future<Output = (&'a mut SessionCore<T>, Result<Vec<VarBind>>)> + Send + 'a>>;

enum State<'a, T> {
    Idle(&'a mut SessionCore<T>),
    Fetching(PageFuture<'a, T>),
    Taken,
}

/// Async walk over a subtree.
///
/// Created by [`Session::get_next`](super::Session::get_next),
/// [`Session::get_bulk`](super::Session::get_bulk) and
/// [`Session::fetch`](super::Session::fetch). The session stays mutably
/// borrowed until the walk is dropped. An error is yielded once and ends the
/// walk.
///
/// # Example
///
/// ```rust,ignore
/// let mut walk = session.fetch(&oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2));
/// while let Some(row) = walk.next().await {
///     let row = row?;
///     println!("{row}");
/// }
/// ```
pub struct Walk<'a, T> {
    pager: Pager,
    state: State<'a, T>,
}

impl<'a, T: Transport + 'a> Walk<'a, T> {
    pub(crate) fn new(core: &'a mut SessionCore<T>, pager: Pager) -> Self {
        Self {
            pager,
            state: State::Idle(core),
        }
    }

    /// Next row, or `None` once the walk has ended.
    pub async fn next(&mut self) -> Option<Result<VarBind>> {
        std::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }

    /// Collect the remaining rows, stopping at the first error.
    pub async fn collect(mut self) -> Result<Vec<VarBind>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next().await {
            rows.push(row?);
        }
        Ok(rows)
    }
}

impl<'a, T: Transport + 'a> Stream for Walk<'a, T> {
    type Item = Result<VarBind>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(item) = this.pager.pop() {
                return Poll::Ready(Some(item));
            }
            if this.pager.is_done() {
                return Poll::Ready(None);
            }
            match std::mem::replace(&mut this.state, State::Taken) {
                State::Idle(core) => {
                    let request = this.pager.request();
                    this.state = State::Fetching(Box::pin(async move {
                        let page = core.page(&request).await;
                        (core, page)
                    }));
                }
                State::Fetching(mut fut) => match fut.as_mut().poll(cx) {
                    Poll::Pending => {
                        this.state = State::Fetching(fut);
                        return Poll::Pending;
                    }
                    Poll::Ready((core, page)) => {
                        this.state = State::Idle(core);
                        match page {
                            Ok(rows) => this.pager.absorb(rows),
                            Err(e) => this.pager.fail(e),
                        }
                    }
                },
                State::Taken => return Poll::Ready(None),
            }
        }
    }
}

/// Blocking walk over a subtree.
///
/// Created by the walk methods of
/// [`BlockingSession`](super::BlockingSession).
pub struct WalkIter<'a, T> {
    pager: Pager,
    core: &'a mut SessionCore<T>,
}

impl<'a, T: Transport> WalkIter<'a, T> {
    pub(crate) fn new(core: &'a mut SessionCore<T>, pager: Pager) -> Self {
        Self { pager, core }
    }
}

impl<T: Transport> Iterator for WalkIter<'_, T> {
    type Item = Result<VarBind>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pager.pop() {
                return Some(item);
            }
            if self.pager.is_done() {
                return None;
            }
            let request = self.pager.request();
            match self.core.page_blocking(&request) {
                Ok(rows) => self.pager.absorb(rows),
                Err(e) => self.pager.fail(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::value::Value;

    fn row(arcs: &[u32]) -> VarBind {
        VarBind::new(Oid::from_slice(arcs), Value::Integer(1))
    }

    fn bulk(n: u32) -> WalkMode {
        WalkMode::GetBulk { max_repetitions: n }
    }

    fn drain(pager: &mut Pager) -> Vec<Result<VarBind>> {
        std::iter::from_fn(|| pager.pop()).collect()
    }

    #[test]
    fn test_request_follows_last_row() {
        let mut pager = Pager::new(oid!(1, 3, 6, 1, 2), bulk(2));
        assert_eq!(pager.request().position, oid!(1, 3, 6, 1, 2));

        pager.absorb(vec![row(&[1, 3, 6, 1, 2, 1]), row(&[1, 3, 6, 1, 2, 2])]);
        assert!(!pager.is_done());
        assert_eq!(pager.request().position, oid!(1, 3, 6, 1, 2, 2));
        assert_eq!(drain(&mut pager).len(), 2);
    }

    #[test]
    fn test_short_page_ends_walk() {
        let mut pager = Pager::new(oid!(1, 3, 6, 1, 2), bulk(5));
        pager.absorb(vec![row(&[1, 3, 6, 1, 2, 1])]);
        assert!(pager.is_done());
        assert_eq!(drain(&mut pager).len(), 1);
    }

    #[test]
    fn test_rows_outside_subtree_end_walk() {
        let mut pager = Pager::new(oid!(1, 3, 6, 1, 2), bulk(3));
        pager.absorb(vec![
            row(&[1, 3, 6, 1, 2, 1]),
            row(&[1, 3, 6, 1, 3, 1]),
            row(&[1, 3, 6, 1, 3, 2]),
        ]);
        assert!(pager.is_done());
        assert_eq!(drain(&mut pager).len(), 1);
    }

    #[test]
    fn test_end_of_mib_view_ends_walk() {
        let mut pager = Pager::new(oid!(1, 3, 6, 1), WalkMode::GetNext);
        pager.absorb(vec![VarBind::new(oid!(1, 3, 6, 1, 9), Value::EndOfMibView)]);
        assert!(pager.is_done());
        assert!(pager.pop().is_none());
    }

    #[test]
    fn test_empty_page_ends_walk() {
        let mut pager = Pager::new(oid!(1, 3, 6, 1), WalkMode::GetNext);
        pager.absorb(Vec::new());
        assert!(pager.is_done());
    }

    #[test]
    fn test_full_page_asks_again() {
        let mut pager = Pager::new(oid!(1, 3, 6, 1), WalkMode::GetNext);
        pager.absorb(vec![row(&[1, 3, 6, 1, 1])]);
        assert!(!pager.is_done());
    }

    #[test]
    fn test_non_increasing_oid_after_good_rows() {
        let mut pager = Pager::new(oid!(1, 3, 6, 1), bulk(3));
        pager.absorb(vec![
            row(&[1, 3, 6, 1, 5]),
            row(&[1, 3, 6, 1, 5]),
            row(&[1, 3, 6, 1, 6]),
        ]);
        assert!(pager.is_done());
        let items = drain(&mut pager);
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        match &items[1] {
            Err(Error::NonIncreasingOid { previous, current }) => {
                assert_eq!(previous, &oid!(1, 3, 6, 1, 5));
                assert_eq!(current, &oid!(1, 3, 6, 1, 5));
            }
            other => panic!("expected NonIncreasingOid, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_pager_yields_error_once() {
        let mut pager = Pager::failed(
            oid!(1, 3, 6, 1),
            bulk(10),
            Error::config(crate::error::ConfigErrorKind::BulkOnV1),
        );
        assert!(matches!(pager.pop(), Some(Err(Error::Config { .. }))));
        assert!(pager.pop().is_none());
        assert!(pager.is_done());
    }
}
