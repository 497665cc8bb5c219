//! Delayed and background work that reports back to the event loop
//!
//! Nothing here touches UI state. Every task ends by posting an action on the
//! loop's channel and the loop applies it on its own turn.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

/// Posts actions back to the owner of the receiving end
pub struct Scheduler<A> {
    tx: UnboundedSender<A>,
}

impl<A> Clone for Scheduler<A> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<A: Send + 'static> Scheduler<A> {
    pub fn new(tx: UnboundedSender<A>) -> Self {
        Self { tx }
    }

    /// Deliver `action` after `delay` unless cancelled first
    pub fn schedule(&self, delay: Duration, action: A) -> ScheduledTask {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(action).is_err() {
                debug!("Scheduled action dropped: event loop is gone");
            }
        });
        ScheduledTask { handle }
    }

    /// Run `work` in the background and deliver the action it produces
    pub fn spawn<F>(&self, work: F)
    where
        F: Future<Output = A> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let action = work.await;
            if tx.send(action).is_err() {
                debug!("Background result dropped: event loop is gone");
            }
        });
    }
}

/// Handle to a pending delayed action
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    pub fn cancel(self) {
        self.handle.abort();
    }
}

/// Trailing-edge debounce: only the last call within `delay` fires
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<ScheduledTask>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn call<A: Send + 'static>(&mut self, scheduler: &Scheduler<A>, action: A) {
        self.cancel();
        self.pending = Some(scheduler.schedule(self.delay, action));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn drain(rx: &mut mpsc::UnboundedReceiver<u32>) -> Vec<u32> {
        let mut out = Vec::new();
        while let Ok(v) = rx.try_recv() {
            out.push(v);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(tx);

        let _task = scheduler.schedule(Duration::from_millis(100), 7);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(drain(&mut rx).is_empty());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(drain(&mut rx), vec![7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_task_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(tx);

        let task = scheduler.schedule(Duration::from_millis(100), 1);
        task.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_keeps_only_last_call() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(tx);
        let mut debouncer = Debouncer::new(Duration::from_millis(150));

        for keystroke in 1..=3 {
            debouncer.call(&scheduler, keystroke);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(drain(&mut rx).is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(drain(&mut rx), vec![3]);
    }

    #[tokio::test]
    async fn test_spawn_posts_result() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(tx);

        scheduler.spawn(async { 40 + 2 });
        assert_eq!(rx.recv().await, Some(42));
    }
}
