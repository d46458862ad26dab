//! Process-wide mapping from room identifier to its countdown

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::broadcast::DEFAULT_CHANNEL_CAPACITY;
use super::room_timer::{IdleHook, RoomTimer, StartOutcome};
use super::timer_state::TimerSnapshot;

/// Period between countdown ticks
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

struct RoomEntry {
    timer: Arc<RoomTimer>,
    subscribers: usize,
}

type Rooms = Mutex<HashMap<String, RoomEntry>>;

fn lock_rooms(rooms: &Rooms) -> MutexGuard<'_, HashMap<String, RoomEntry>> {
    rooms.lock().unwrap_or_else(|poisoned| {
        warn!("Recovering poisoned room registry");
        poisoned.into_inner()
    })
}

/// Remove `timer`'s room if nobody is subscribed and no countdown runs.
///
/// Lock order is registry then room, the same as `leave`.
fn reap_if_idle(rooms: &Rooms, timer: &RoomTimer) -> bool {
    let mut rooms = lock_rooms(rooms);
    let idle = matches!(
        rooms.get(timer.room_id()),
        Some(entry) if entry.subscribers == 0 && std::ptr::eq(Arc::as_ptr(&entry.timer), timer)
    );
    if !idle || !timer.retire_if_stopped() {
        return false;
    }
    rooms.remove(timer.room_id());
    info!("Removed idle room {} with no subscribers", timer.room_id());
    true
}

/// Owns every live room and the number of connections subscribed to it.
///
/// Rooms are created on first reference and removed when their last
/// subscriber leaves, or once they stop while nobody is subscribed. A
/// removed room is retired before it is dropped, so a caller still holding
/// it cannot restart its countdown; registry-level commands retry against
/// the fresh entry instead.
pub struct RoomRegistry {
    rooms: Arc<Rooms>,
    idle_hook: IdleHook,
    tick_period: Duration,
    channel_capacity: usize,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::with_tick_period(TICK_PERIOD)
    }

    pub fn with_tick_period(tick_period: Duration) -> Self {
        let rooms: Arc<Rooms> = Arc::new(Mutex::new(HashMap::new()));
        let weak = Arc::downgrade(&rooms);
        let idle_hook: IdleHook = Arc::new(move |timer: &RoomTimer| {
            if let Some(rooms) = weak.upgrade() {
                reap_if_idle(&rooms, timer);
            }
        });
        Self {
            rooms,
            idle_hook,
            tick_period,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    fn lock_rooms(&self) -> MutexGuard<'_, HashMap<String, RoomEntry>> {
        lock_rooms(&self.rooms)
    }

    fn entry<'a>(&self, rooms: &'a mut HashMap<String, RoomEntry>, room_id: &str) -> &'a mut RoomEntry {
        rooms.entry(room_id.to_string()).or_insert_with(|| {
            info!("Creating room {}", room_id);
            let timer = RoomTimer::new(room_id, self.tick_period, self.channel_capacity)
                .with_idle_hook(Arc::clone(&self.idle_hook));
            RoomEntry {
                timer: Arc::new(timer),
                subscribers: 0,
            }
        })
    }

    /// Existing room timer, or a fresh one stopped at the initial value
    pub fn get_or_create(&self, room_id: &str) -> Arc<RoomTimer> {
        let mut rooms = self.lock_rooms();
        Arc::clone(&self.entry(&mut rooms, room_id).timer)
    }

    pub fn get(&self, room_id: &str) -> Option<Arc<RoomTimer>> {
        self.lock_rooms().get(room_id).map(|entry| Arc::clone(&entry.timer))
    }

    /// Current state of a room without creating it
    pub fn snapshot(&self, room_id: &str) -> Option<TimerSnapshot> {
        self.get(room_id).map(|timer| timer.snapshot())
    }

    pub fn subscribers(&self, room_id: &str) -> usize {
        self.lock_rooms().get(room_id).map_or(0, |entry| entry.subscribers)
    }

    /// Register one subscriber for `room_id`.
    ///
    /// The snapshot and the receiver are taken together, so the receiver
    /// yields exactly the updates applied after the snapshot.
    pub fn join(&self, room_id: &str) -> (TimerSnapshot, broadcast::Receiver<u32>) {
        let timer = {
            let mut rooms = self.lock_rooms();
            let entry = self.entry(&mut rooms, room_id);
            entry.subscribers += 1;
            debug!("Room {} now has {} subscriber(s)", room_id, entry.subscribers);
            Arc::clone(&entry.timer)
        };
        timer.subscribe()
    }

    /// Drop one subscriber from `room_id`, removing the room at zero.
    ///
    /// Returns whether the room was removed.
    pub fn leave(&self, room_id: &str) -> bool {
        let mut rooms = self.lock_rooms();
        let Some(entry) = rooms.get_mut(room_id) else {
            return false;
        };

        entry.subscribers = entry.subscribers.saturating_sub(1);
        if entry.subscribers > 0 {
            debug!("Room {} now has {} subscriber(s)", room_id, entry.subscribers);
            return false;
        }

        if let Some(entry) = rooms.remove(room_id) {
            entry.timer.teardown();
        }
        info!("Removed room {} after its last subscriber left", room_id);
        true
    }

    pub fn start(&self, room_id: &str) -> StartOutcome {
        loop {
            match self.get_or_create(room_id).start() {
                StartOutcome::Retired => continue,
                outcome => return outcome,
            }
        }
    }

    /// Reset `room_id`, dropping the room again if nobody is subscribed
    pub fn reset(&self, room_id: &str) {
        loop {
            let timer = self.get_or_create(room_id);
            if timer.reset() {
                reap_if_idle(&self.rooms, &timer);
                return;
            }
        }
    }

    pub fn room_count(&self) -> usize {
        self.lock_rooms().len()
    }

    pub fn running_count(&self) -> usize {
        let timers: Vec<Arc<RoomTimer>> = self
            .lock_rooms()
            .values()
            .map(|entry| Arc::clone(&entry.timer))
            .collect();
        timers.iter().filter(|timer| timer.snapshot().is_running).count()
    }

    /// Retire every room; no countdown task survives this call
    pub fn shutdown(&self) {
        let drained: Vec<RoomEntry> = self.lock_rooms().drain().map(|(_, entry)| entry).collect();
        for entry in &drained {
            entry.timer.teardown();
        }
        info!("Room registry shut down, {} room(s) retired", drained.len());
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
