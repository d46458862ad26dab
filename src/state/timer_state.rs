//! Countdown state for a single room and its transitions
//!
//! `RoomTimerState` is plain data with no locking or scheduling of its own;
//! `RoomTimer` wraps it in a mutex and owns the broadcast side. Whether the
//! timer is running is derived from the presence of a `TickHandle`, so a
//! running timer without a live tick task cannot be represented.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Seconds a fresh or reset room counts down from
pub const INITIAL_SECONDS: u32 = 15;

/// Full timer state, as sent to a connection when it joins a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub remaining: u32,
    pub is_running: bool,
}

impl TimerSnapshot {
    /// Snapshot of a room that has never been started
    pub fn initial() -> Self {
        Self {
            remaining: INITIAL_SECONDS,
            is_running: false,
        }
    }
}

/// Ownership token for the one countdown task a running room may have.
///
/// Every start issues a new epoch. Ticks carrying an older epoch are
/// discarded, which keeps cancellation idempotent even when a tick has
/// already fired but not yet acquired the room lock.
#[derive(Debug, Clone)]
pub struct TickHandle {
    epoch: u64,
    token: CancellationToken,
}

impl TickHandle {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Token the countdown task waits on for cancellation
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    fn is_live(&self, epoch: u64) -> bool {
        self.epoch == epoch && !self.token.is_cancelled()
    }
}

/// Why a start request did not launch a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRejection {
    /// A countdown task is already live for this room
    AlreadyRunning,
    /// The countdown reached zero; a reset is needed first
    Exhausted,
    /// The room was removed from the registry
    Retired,
}

/// Result of applying one tick to the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Decremented; the timer keeps running
    Continue(u32),
    /// Zero reached; the timer stopped and released its handle
    Finished,
    /// The tick belongs to a cancelled or superseded task
    Stale,
}

#[derive(Debug)]
pub struct RoomTimerState {
    remaining: u32,
    tick: Option<TickHandle>,
    next_epoch: u64,
    retired: bool,
}

impl RoomTimerState {
    pub fn new() -> Self {
        Self {
            remaining: INITIAL_SECONDS,
            tick: None,
            next_epoch: 1,
            retired: false,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.tick.is_some()
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    /// Epoch of the live countdown, if any
    pub fn current_epoch(&self) -> Option<u64> {
        self.tick.as_ref().map(TickHandle::epoch)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            remaining: self.remaining,
            is_running: self.is_running(),
        }
    }

    /// Transition `Stopped(n > 0)` to `Running`, issuing a fresh tick handle.
    ///
    /// The returned handle is a clone for the countdown task; the state keeps
    /// its own copy until the countdown ends.
    pub fn begin(&mut self) -> Result<TickHandle, StartRejection> {
        if self.retired {
            return Err(StartRejection::Retired);
        }
        if self.tick.is_some() {
            return Err(StartRejection::AlreadyRunning);
        }
        if self.remaining == 0 {
            return Err(StartRejection::Exhausted);
        }

        let handle = TickHandle {
            epoch: self.next_epoch,
            token: CancellationToken::new(),
        };
        self.next_epoch += 1;
        self.tick = Some(handle.clone());
        Ok(handle)
    }

    /// Apply one periodic tick issued by the task holding `epoch`
    pub fn tick(&mut self, epoch: u64) -> TickOutcome {
        match &self.tick {
            Some(handle) if handle.is_live(epoch) => {}
            _ => return TickOutcome::Stale,
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.release();
            TickOutcome::Finished
        } else {
            TickOutcome::Continue(self.remaining)
        }
    }

    /// Cancel any countdown and rewind to `INITIAL_SECONDS`.
    ///
    /// Returns whether a countdown was cancelled.
    pub fn reset(&mut self) -> bool {
        let cancelled = self.release();
        self.remaining = INITIAL_SECONDS;
        cancelled
    }

    /// Stop for good; used when the room leaves the registry
    pub fn retire(&mut self) -> bool {
        self.retired = true;
        self.release()
    }

    /// Stop a countdown whose task failed, as if it had reached zero.
    ///
    /// Ignored when `epoch` is no longer the live countdown.
    pub fn abandon(&mut self, epoch: u64) -> bool {
        if self.current_epoch() != Some(epoch) {
            return false;
        }
        self.release();
        self.remaining = 0;
        true
    }

    fn release(&mut self) -> bool {
        match self.tick.take() {
            Some(handle) => {
                handle.token.cancel();
                true
            }
            None => false,
        }
    }
}

impl Default for RoomTimerState {
    fn default() -> Self {
        Self::new()
    }
}
