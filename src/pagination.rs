/// Snapshot of the pagination flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoaderState {
    pub is_loading: bool,
    pub has_more: bool,
}

/// Identifies one load. Completions carrying a stale ticket are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadPhase {
    Idle,
    Loading(LoadTicket),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed,
}

/// Infinite-scroll state machine: `Idle → Loading → Idle`.
///
/// At most one load is in flight. A successful load re-arms on the next frame while the
/// sentinel stays visible and more data is available, so short pages cascade until the viewport
/// is full. A failed load returns to `Idle` without touching `has_more` and is not retried until
/// the sentinel becomes visible again.
#[derive(Clone, Debug)]
pub struct Pagination {
    has_more: bool,
    phase: LoadPhase,
    sentinel_visible: bool,
    rearm: bool,
    next_ticket: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Pagination {
    pub fn new(has_more: bool) -> Self {
        Self {
            has_more,
            phase: LoadPhase::Idle,
            sentinel_visible: false,
            rearm: false,
            next_ticket: 0,
        }
    }

    pub fn state(&self) -> LoaderState {
        LoaderState {
            is_loading: self.is_loading(),
            has_more: self.has_more,
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, LoadPhase::Loading(_))
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn sentinel_visible(&self) -> bool {
        self.sentinel_visible
    }

    /// Whether a follow-up load is scheduled for the next frame.
    pub fn is_rearmed(&self) -> bool {
        self.rearm
    }

    pub fn set_has_more(&mut self, has_more: bool) {
        if self.has_more != has_more {
            cdebug!(has_more, "set_has_more");
        }
        self.has_more = has_more;
        if !has_more {
            self.rearm = false;
        }
    }

    /// Feeds a visibility change of the sentinel.
    ///
    /// Returns a ticket when a load must start now; the caller invokes the loader and reports
    /// back through [`Pagination::finish`].
    pub fn on_sentinel_visibility(&mut self, visible: bool) -> Option<LoadTicket> {
        self.sentinel_visible = visible;
        if !visible {
            self.rearm = false;
            return None;
        }
        self.begin()
    }

    /// Completes the load identified by `ticket`.
    ///
    /// Returns `false` for stale tickets, which leave the state untouched.
    pub fn finish(&mut self, ticket: LoadTicket, outcome: LoadOutcome) -> bool {
        match self.phase {
            LoadPhase::Loading(current) if current == ticket => {}
            _ => {
                cwarn!(ticket = ticket.id(), "finish: stale load ticket");
                return false;
            }
        }
        self.phase = LoadPhase::Idle;
        self.rearm =
            outcome == LoadOutcome::Loaded && self.sentinel_visible && self.has_more;
        cdebug!(
            ticket = ticket.id(),
            loaded = outcome == LoadOutcome::Loaded,
            rearm = self.rearm,
            "load finished"
        );
        true
    }

    /// Runs a scheduled re-arm. Conditions are checked again since the sequence and flags may
    /// have changed while the load was in flight.
    pub fn on_frame(&mut self) -> Option<LoadTicket> {
        if !core::mem::take(&mut self.rearm) {
            return None;
        }
        if !self.sentinel_visible {
            return None;
        }
        self.begin()
    }

    fn begin(&mut self) -> Option<LoadTicket> {
        if !self.has_more {
            return None;
        }
        if self.is_loading() {
            ctrace!("begin: load already in flight");
            return None;
        }
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.phase = LoadPhase::Loading(ticket);
        cdebug!(ticket = ticket.id(), "load started");
        Some(ticket)
    }
}
