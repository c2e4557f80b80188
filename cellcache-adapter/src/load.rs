use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Weak;
use std::task::{Context, Poll, ready};

use cellcache::{LoadOutcome, LoadTicket, Pagination};
use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::{BoxError, ScrollerError};

/// A page load started by the scroller.
///
/// The loader callback has already been invoked; the host polls this task on its executor. On
/// completion the task reports back to the scroller's pagination state. If the scroller was
/// dropped in the meantime, completion changes nothing. Dropping an unfinished task counts as a
/// failed load, so pagination returns to idle and the next visibility trigger retries.
#[must_use = "the load only completes when the task is polled"]
pub struct LoadTask {
    ticket: LoadTicket,
    future: LocalBoxFuture<'static, Result<(), BoxError>>,
    state: Weak<RefCell<Pagination>>,
    done: bool,
}

impl LoadTask {
    pub(crate) fn new(
        ticket: LoadTicket,
        future: LocalBoxFuture<'static, Result<(), BoxError>>,
        state: Weak<RefCell<Pagination>>,
    ) -> Self {
        Self {
            ticket,
            future,
            state,
            done: false,
        }
    }

    fn report(&self, outcome: LoadOutcome) {
        let Some(state) = self.state.upgrade() else {
            strace!(ticket = self.ticket.id(), "load finished after teardown");
            return;
        };
        match state.try_borrow_mut() {
            Ok(mut pagination) => {
                pagination.finish(self.ticket, outcome);
            }
            Err(_) => {
                swarn!(ticket = self.ticket.id(), "pagination state busy; load result lost");
            }
        }
    }

    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }
}

impl core::fmt::Debug for LoadTask {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoadTask")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

impl Future for LoadTask {
    type Output = Result<(), ScrollerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let result = ready!(self.future.poll_unpin(cx));
        let outcome = if result.is_ok() {
            LoadOutcome::Loaded
        } else {
            LoadOutcome::Failed
        };

        self.done = true;
        self.report(outcome);

        if outcome == LoadOutcome::Failed {
            swarn!(ticket = self.ticket.id(), "page loader failed");
        }
        Poll::Ready(result.map_err(ScrollerError::LoaderFailure))
    }
}

impl Drop for LoadTask {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        sdebug!(ticket = self.ticket.id(), "load task dropped before completion");
        self.report(LoadOutcome::Failed);
    }
}
