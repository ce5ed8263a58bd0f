//! Cooperative shutdown signaling for background tasks, grounded verbatim
//! in `ergo-graceful-shutdown` (and the inline `ergo::graceful_shutdown`
//! module `ergo_queues` itself depends on for its scheduled-enqueuer task).
//! Used here by `queue::SharQ::start_requeue_loop` -- the periodic requeue
//! scheduler that still needs a clean way to stop.

use tokio::select;
use tokio::signal::ctrl_c;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct GracefulShutdown {
    pub shutdown_finished: JoinHandle<()>,

    start_shutdown: Option<oneshot::Sender<()>>,
    consumer: GracefulShutdownConsumer,
}

#[derive(Clone, Debug)]
pub struct GracefulShutdownConsumer(watch::Receiver<bool>);

impl GracefulShutdown {
    pub fn new() -> GracefulShutdown {
        let (shutdown_started_tx, shutdown_started_rx) = watch::channel(false);
        let (start_shutdown_tx, start_shutdown_rx) = oneshot::channel();

        let shutdown_waiter = tokio::spawn(async move {
            select! {
                _ = ctrl_c() => {},
                _ = start_shutdown_rx => {},
            };

            shutdown_started_tx.send(true).ok();
        });

        GracefulShutdown {
            start_shutdown: Some(start_shutdown_tx),
            shutdown_finished: shutdown_waiter,
            consumer: GracefulShutdownConsumer(shutdown_started_rx),
        }
    }

    pub fn consumer(&self) -> GracefulShutdownConsumer {
        self.consumer.clone()
    }

    pub fn shutdown(&mut self) {
        if let Some(sender) = self.start_shutdown.take() {
            sender.send(()).ok();
        }
    }
}

impl Default for GracefulShutdown {
    fn default() -> Self {
        GracefulShutdown::new()
    }
}

impl GracefulShutdownConsumer {
    pub fn shutting_down(&mut self) -> bool {
        *self.0.borrow()
    }

    pub async fn wait_for_shutdown(&mut self) {
        loop {
            match self.0.changed().await {
                Ok(_) => {
                    if *self.0.borrow() {
                        return;
                    }
                }
                Err(_) => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot::error::TryRecvError;
    use tokio::time::timeout;

    #[tokio::test]
    async fn consumer_must_be_send_and_sync() {
        fn takes_a_sync<T: Send + Sync>(_value: T) {}

        let gs = GracefulShutdown::new();
        takes_a_sync(gs.consumer());
    }

    #[tokio::test]
    async fn handle_manual_shutdown() {
        let mut s = GracefulShutdown::new();

        let mut done_consumer = s.consumer();
        assert!(!done_consumer.shutting_down());
        let (done_tx, mut done_rx) = oneshot::channel::<()>();
        let done_task = tokio::spawn(async move {
            done_consumer.wait_for_shutdown().await;
            done_tx.send(()).unwrap();
        });

        assert_eq!(done_rx.try_recv(), Err(TryRecvError::Empty));

        let mut before_consumer = s.consumer();
        assert!(!before_consumer.shutting_down());

        s.shutdown();

        match timeout(Duration::from_secs(2), done_task).await {
            Ok(Ok(())) => {}
            x => panic!("Done waiter failed to stop: {:?}", x),
        };

        assert!(before_consumer.shutting_down());

        let mut after_consumer = s.consumer();
        assert!(after_consumer.shutting_down());

        match timeout(Duration::from_secs(2), after_consumer.wait_for_shutdown()).await {
            Ok(()) => {}
            x => panic!(
                "Waiter started after shutdown does not indicate shutdown already happened: {:?}",
                x
            ),
        };

        match timeout(Duration::from_secs(2), s.shutdown_finished).await {
            Ok(Ok(())) => {}
            x => panic!("GracefulShutdown task didn't quit after shutdown: result {:?}", x),
        };
    }
}
