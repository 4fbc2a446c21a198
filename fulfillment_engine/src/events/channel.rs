//! The plumbing under the order-event hooks.
//!
//! Each [`EventHandler`] owns one mpsc channel and one async callback. Producers are cheap clones of the sending
//! half, handed out to whichever component needs to announce an order event. Handlers never see engine state;
//! the event payload is all they get, which keeps notification side effects from reaching back into the order
//! flow.
use std::{
    future::Future,
    pin::Pin,
    sync::{atomic::AtomicI64, Arc},
};

use log::*;
use tokio::sync::mpsc;

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Consumes the handler and processes events until every producer has been dropped, then waits for in-flight
    /// callbacks to finish before returning.
    pub async fn start_handler(mut self) {
        debug!("📬️ Event handler running");
        // Our copy of the sender would otherwise keep the channel open forever
        drop(self.sender);
        let in_flight = Arc::new(AtomicI64::new(0));
        while let Some(event) = self.listener.recv().await {
            trace!("📬️ Dispatching event to its callback");
            let callback = Arc::clone(&self.handler);
            in_flight.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let counter = in_flight.clone();
            tokio::spawn(async move {
                (callback)(event).await;
                counter.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
                trace!("📬️ Callback completed");
            });
        }
        let drain = tokio::spawn(async move {
            while in_flight.load(std::sync::atomic::Ordering::SeqCst) > 0 {
                debug!("📬️ Draining in-flight callbacks");
                tokio::time::sleep(tokio::time::Duration::from_millis(1000)).await;
            }
        });
        match drain.await {
            Ok(_) => debug!("📬️ Event handler drained and stopped"),
            Err(e) => warn!("📬️ Event handler drain task failed: {e}. The in-flight count can no longer be trusted."),
        }
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Event was dropped. No handler is listening. {e}");
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    #[tokio::test]
    async fn events_from_every_producer_reach_the_callback_before_shutdown() {
        let _ = env_logger::try_init();
        let total = Arc::new(AtomicU64::new(0));
        let tally = total.clone();
        let handler = Arc::new(move |amount| {
            let total = total.clone();
            Box::pin(async move {
                total.fetch_add(amount, Ordering::SeqCst);
                // Keep the callback in flight long enough that shutdown has to wait for it
                tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        let event_handler = EventHandler::new(2, handler);
        let checkout_feed = event_handler.subscribe();
        let webhook_feed = event_handler.subscribe();
        tokio::spawn(async move {
            for amount in [100u64, 250, 75] {
                checkout_feed.publish_event(amount).await;
            }
        });
        tokio::spawn(async move {
            for amount in [30u64, 45] {
                webhook_feed.publish_event(amount).await;
            }
        });

        event_handler.start_handler().await;
        assert_eq!(tally.load(Ordering::SeqCst), 500);
    }
}
