//! Idle-session sweeper service.
//!
//! The timer never touches state itself: each tick enqueues
//! [`InboundEvent::SweepIdleSessions`] so the sweep is ordered with calls.

use std::time::Duration;

use tokio::{task::JoinHandle, time::MissedTickBehavior};

use super::{EventSender, InboundEvent};

pub struct IdleSessionSweeper {
    events: EventSender,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl IdleSessionSweeper {
    pub fn new(events: EventSender, interval: Duration) -> Self {
        Self {
            events,
            interval,
            handle: None,
        }
    }

    /// 定期実行を開始する（実行中なら何もしない）
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let events = self.events.clone();
        let interval = self.interval;
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if events.send(InboundEvent::SweepIdleSessions).is_err() {
                    tracing::debug!("Event loop closed; idle-session sweeper exiting");
                    break;
                }
            }
        }));
        tracing::info!("Idle-session sweeper started (every {:?})", self.interval);
    }

    /// 定期実行を止める
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::info!("Idle-session sweeper stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for IdleSessionSweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_sweeper_enqueues_sweep_events() {
        // テスト項目: start 後、一定間隔で SweepIdleSessions がキューに入る
        // given (前提条件):
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sweeper = IdleSessionSweeper::new(tx, Duration::from_millis(20));

        // when (操作):
        sweeper.start();

        // then (期待する結果):
        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(event, InboundEvent::SweepIdleSessions));
        assert!(sweeper.is_running());
    }

    #[tokio::test]
    async fn test_sweeper_stop_halts_ticks() {
        // テスト項目: stop 後はイベントが入らない
        // given (前提条件):
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sweeper = IdleSessionSweeper::new(tx, Duration::from_millis(20));
        sweeper.start();
        sweeper.start();

        // when (操作):
        sweeper.stop();
        while rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_millis(80)).await;

        // then (期待する結果):
        assert!(rx.try_recv().is_err());
        assert!(!sweeper.is_running());
    }

    #[tokio::test]
    async fn test_sweeper_does_not_tick_immediately() {
        // テスト項目: start 直後にはイベントが入らない
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sweeper = IdleSessionSweeper::new(tx, Duration::from_secs(3600));
        sweeper.start();
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
        sweeper.stop();
    }
}
