//! A room's countdown: locked state, its broadcast channel and task ownership

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::broadcast::RoomChannel;
use super::timer_state::{
    RoomTimerState, StartRejection, TickOutcome, TimerSnapshot, INITIAL_SECONDS,
};
use crate::tasks::spawn_countdown;

/// Result of a start request against one room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
    Exhausted,
    /// The room left the registry; the caller should look it up again
    Retired,
}

impl From<StartRejection> for StartOutcome {
    fn from(rejection: StartRejection) -> Self {
        match rejection {
            StartRejection::AlreadyRunning => Self::AlreadyRunning,
            StartRejection::Exhausted => Self::Exhausted,
            StartRejection::Retired => Self::Retired,
        }
    }
}

/// Called once a countdown has stopped by itself, outside the room lock
pub type IdleHook = Arc<dyn Fn(&RoomTimer) + Send + Sync>;

/// Countdown for one room.
///
/// Every mutation and the broadcast it causes happen under the same lock,
/// so subscribers observe a room's updates in the order they were applied.
pub struct RoomTimer {
    room_id: String,
    state: Mutex<RoomTimerState>,
    channel: RoomChannel,
    tick_period: Duration,
    idle_hook: Option<IdleHook>,
}

impl fmt::Debug for RoomTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomTimer")
            .field("room_id", &self.room_id)
            .field("state", &self.state)
            .field("tick_period", &self.tick_period)
            .field("idle_hook", &self.idle_hook.is_some())
            .finish()
    }
}

impl RoomTimer {
    pub fn new(room_id: impl Into<String>, tick_period: Duration, channel_capacity: usize) -> Self {
        let room_id = room_id.into();
        Self {
            channel: RoomChannel::new(room_id.clone(), channel_capacity),
            state: Mutex::new(RoomTimerState::new()),
            room_id,
            tick_period,
            idle_hook: None,
        }
    }

    pub fn with_idle_hook(mut self, hook: IdleHook) -> Self {
        self.idle_hook = Some(hook);
        self
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    fn notify_idle(&self) {
        if let Some(hook) = &self.idle_hook {
            hook(self);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RoomTimerState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Recovering poisoned timer state for room {}", self.room_id);
            poisoned.into_inner()
        })
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.lock_state().snapshot()
    }

    /// Take a snapshot and a receiver for every update after it
    pub fn subscribe(&self) -> (TimerSnapshot, broadcast::Receiver<u32>) {
        let state = self.lock_state();
        (state.snapshot(), self.channel.subscribe())
    }

    pub fn is_retired(&self) -> bool {
        self.lock_state().is_retired()
    }

    pub(crate) fn current_epoch(&self) -> Option<u64> {
        self.lock_state().current_epoch()
    }

    /// Start counting down, launching at most one tick task
    pub fn start(self: &Arc<Self>) -> StartOutcome {
        let mut state = self.lock_state();
        match state.begin() {
            Ok(handle) => {
                info!(
                    "Starting countdown for room {} at {}s (epoch {})",
                    self.room_id,
                    state.remaining(),
                    handle.epoch()
                );
                spawn_countdown(Arc::clone(self), handle, self.tick_period);
                StartOutcome::Started
            }
            Err(rejection) => {
                debug!("Ignoring start for room {}: {:?}", self.room_id, rejection);
                rejection.into()
            }
        }
    }

    /// Stop any countdown, rewind to the initial value and broadcast it.
    ///
    /// Returns `false` without broadcasting when the room has been retired.
    pub fn reset(&self) -> bool {
        let mut state = self.lock_state();
        if state.is_retired() {
            return false;
        }
        if state.reset() {
            info!("Reset running countdown for room {}", self.room_id);
        } else {
            debug!("Reset stopped countdown for room {}", self.room_id);
        }
        self.channel.publish(INITIAL_SECONDS);
        true
    }

    /// Apply a tick from the countdown task holding `epoch`
    pub fn tick(&self, epoch: u64) -> TickOutcome {
        let outcome = {
            let mut state = self.lock_state();
            let outcome = state.tick(epoch);
            match outcome {
                TickOutcome::Continue(remaining) => {
                    debug!("Room {} tick: {}s remaining", self.room_id, remaining);
                    self.channel.publish(remaining);
                }
                TickOutcome::Finished => {
                    info!("Countdown for room {} reached zero", self.room_id);
                    self.channel.publish(0);
                }
                TickOutcome::Stale => {
                    debug!("Discarding stale tick for room {} (epoch {})", self.room_id, epoch);
                }
            }
            outcome
        };
        if outcome == TickOutcome::Finished {
            self.notify_idle();
        }
        outcome
    }

    /// Stop the countdown permanently; the room is leaving the registry
    pub fn teardown(&self) {
        if self.lock_state().retire() {
            debug!("Cancelled countdown for retired room {}", self.room_id);
        }
    }

    /// Retire the room only if no countdown is running.
    ///
    /// Check and retirement share one critical section, so a concurrent
    /// start either lands first (and this returns `false`) or sees `Retired`.
    pub fn retire_if_stopped(&self) -> bool {
        let mut state = self.lock_state();
        if state.is_running() || state.is_retired() {
            return false;
        }
        state.retire();
        true
    }

    /// Stop a countdown whose task failed, leaving the room at zero
    pub fn abandon(&self, epoch: u64) {
        let abandoned = {
            let mut state = self.lock_state();
            let abandoned = state.abandon(epoch);
            if abandoned {
                warn!("Countdown for room {} abandoned at epoch {}", self.room_id, epoch);
                self.channel.publish(0);
            }
            abandoned
        };
        if abandoned {
            self.notify_idle();
        }
    }

    pub fn receiver_count(&self) -> usize {
        self.channel.receiver_count()
    }
}
