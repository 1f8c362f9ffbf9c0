use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::trace;

/// Trait implemented by payload types that can be carried on the bus.
pub trait Event: Clone + Send + Sync + std::fmt::Debug + 'static {}

impl<T> Event for T where T: Clone + Send + Sync + std::fmt::Debug + 'static {}

#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus is closed")]
    Closed,
}

pub trait EventBus<E>: Send + Sync
where
    E: Event,
{
    /// Publishes to current subscribers and returns how many received it.
    ///
    /// Publishing with nobody listening is not an error: page events fire
    /// whether or not a watcher is attached.
    fn publish(&self, event: E) -> usize;
    fn subscribe(&self) -> broadcast::Receiver<E>;
    fn subscriber_count(&self) -> usize;
}

/// In-memory fan-out bus backed by a tokio broadcast channel.
pub struct InMemoryBus<E>
where
    E: Event,
{
    sender: broadcast::Sender<E>,
}

impl<E> InMemoryBus<E>
where
    E: Event,
{
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }
}

impl<E> EventBus<E> for InMemoryBus<E>
where
    E: Event,
{
    fn publish(&self, event: E) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(dropped)) => {
                trace!(?dropped, "event published without subscribers");
                0
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }

    fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Awaits the next event, skipping over any the receiver lagged past.
pub async fn recv_lossy<E>(rx: &mut broadcast::Receiver<E>) -> Result<E, BusError>
where
    E: Event,
{
    loop {
        match rx.recv().await {
            Ok(event) => return Ok(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                trace!(skipped, "receiver lagged; continuing");
            }
            Err(broadcast::error::RecvError::Closed) => return Err(BusError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscribers_is_silent() {
        let bus = InMemoryBus::<u32>::new(4);
        assert_eq!(bus.publish(7), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let bus = InMemoryBus::<u32>::new(8);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        bus.publish(1);
        bus.publish(2);
        assert_eq!(recv_lossy(&mut rx).await.unwrap(), 1);
        assert_eq!(recv_lossy(&mut rx).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn lagged_receiver_skips_ahead() {
        let bus = InMemoryBus::<u32>::new(2);
        let mut rx = bus.subscribe();
        for n in 0..5 {
            bus.publish(n);
        }
        assert_eq!(recv_lossy(&mut rx).await.unwrap(), 3);
    }
}
