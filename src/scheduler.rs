//! Explicit scan scheduler
//!
//! Replaces fire-and-forget timers with an owned, awaitable tick source
//! plus a shutdown signal, so the scan loop is a plain `while` that
//! tests can drive deterministically by invoking cycles directly.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, Interval, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Scan,
    Shutdown,
}

pub struct ShutdownHandle {
    sender: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.sender.send(true);
    }
}

pub struct ScanScheduler {
    interval: Interval,
    shutdown: watch::Receiver<bool>,
}

impl ScanScheduler {
    pub fn new(period: Duration) -> (Self, ShutdownHandle) {
        let (sender, shutdown) = watch::channel(false);
        let mut interval = interval(period);
        // A slow cycle should delay the next tick, not cause a burst.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        (Self { interval, shutdown }, ShutdownHandle { sender })
    }

    /// Wait for the next scan tick or the shutdown signal, whichever
    /// comes first.
    pub async fn tick(&mut self) -> Tick {
        if *self.shutdown.borrow() {
            return Tick::Shutdown;
        }
        tokio::select! {
            _ = self.interval.tick() => Tick::Scan,
            result = self.shutdown.changed() => {
                match result {
                    Ok(()) if *self.shutdown.borrow() => Tick::Shutdown,
                    Ok(()) => Tick::Scan,
                    Err(_) => Tick::Shutdown,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ticks_arrive_on_schedule() {
        let (mut scheduler, _handle) = ScanScheduler::new(Duration::from_millis(5));
        assert_eq!(scheduler.tick().await, Tick::Scan);
        assert_eq!(scheduler.tick().await, Tick::Scan);
    }

    #[tokio::test]
    async fn shutdown_signal_ends_the_loop() {
        let (mut scheduler, handle) = ScanScheduler::new(Duration::from_secs(3600));
        // First tick fires immediately; the second would wait an hour.
        assert_eq!(scheduler.tick().await, Tick::Scan);

        handle.shutdown();
        assert_eq!(scheduler.tick().await, Tick::Shutdown);
    }

    #[tokio::test]
    async fn shutdown_wins_even_with_a_pending_tick() {
        let (mut scheduler, handle) = ScanScheduler::new(Duration::from_millis(1));
        handle.shutdown();
        assert_eq!(scheduler.tick().await, Tick::Shutdown);
    }
}
