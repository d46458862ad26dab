//! Countdown tick task

use std::{future::Future, sync::Arc, time::Duration};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::state::{RoomTimer, TickHandle, TickOutcome};

/// Spawn the countdown for `room` under a supervisor.
///
/// The supervisor outlives the tick loop; if the loop panics the room is
/// stopped at zero instead of being left marked as running.
pub fn spawn_countdown(room: Arc<RoomTimer>, handle: TickHandle, period: Duration) {
    let epoch = handle.epoch();
    let worker = countdown_task(Arc::clone(&room), epoch, handle.token(), period);
    tokio::spawn(supervise(room, epoch, worker));
}

/// Run `worker` to completion and clean up after a panic
pub async fn supervise<F>(room: Arc<RoomTimer>, epoch: u64, worker: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::spawn(worker).await {
        Ok(()) => {}
        Err(e) if e.is_panic() => {
            error!("Countdown task for room {} failed: {}", room.room_id(), e);
            room.abandon(epoch);
        }
        Err(e) => {
            debug!("Countdown task for room {} ended: {}", room.room_id(), e);
            room.abandon(epoch);
        }
    }
}

/// Tick `room` once per `period` until the countdown finishes or is cancelled
pub async fn countdown_task(room: Arc<RoomTimer>, epoch: u64, token: CancellationToken, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!("Countdown for room {} cancelled (epoch {})", room.room_id(), epoch);
                break;
            }
            _ = ticker.tick() => {
                match room.tick(epoch) {
                    TickOutcome::Continue(_) => {}
                    TickOutcome::Finished | TickOutcome::Stale => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{StartOutcome, TimerSnapshot};
    use tokio::time::timeout;

    fn room() -> Arc<RoomTimer> {
        Arc::new(RoomTimer::new("room1", Duration::from_secs(1), 8))
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_worker_leaves_room_stopped_at_zero() {
        let timer = room();
        let (_, mut rx) = timer.subscribe();
        assert_eq!(timer.start(), StartOutcome::Started);
        assert_eq!(rx.recv().await.unwrap(), 14);

        let epoch = timer.current_epoch().unwrap();
        supervise(Arc::clone(&timer), epoch, async { panic!("tick failed"); }).await;

        assert_eq!(rx.recv().await.unwrap(), 0);
        assert_eq!(timer.snapshot(), TimerSnapshot { remaining: 0, is_running: false });
        assert!(timeout(Duration::from_secs(3), rx.recv()).await.is_err());

        timer.reset();
        assert_eq!(rx.recv().await.unwrap(), 15);
        assert_eq!(timer.start(), StartOutcome::Started);
        assert_eq!(rx.recv().await.unwrap(), 14);
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_exits_on_cancellation() {
        let timer = room();
        let token = CancellationToken::new();
        let worker = tokio::spawn(countdown_task(Arc::clone(&timer), 1, token.clone(), Duration::from_secs(1)));

        token.cancel();
        assert!(timeout(Duration::from_secs(1), worker).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_with_stale_epoch_exits_without_broadcast() {
        let timer = room();
        let (_, mut rx) = timer.subscribe();

        let worker = tokio::spawn(countdown_task(
            Arc::clone(&timer),
            42,
            CancellationToken::new(),
            Duration::from_secs(1),
        ));

        assert!(timeout(Duration::from_secs(3), worker).await.is_ok());
        assert!(rx.try_recv().is_err());
        assert_eq!(timer.snapshot(), TimerSnapshot::initial());
    }
}
