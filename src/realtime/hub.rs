//! 服务端事件广播
//!
//! Fan-out over a tokio broadcast channel: delivery is at-most-once, nothing
//! is replayed to late subscribers and a lagging subscriber skips what it
//! missed.

use tokio::sync::broadcast;

use crate::dto::realtime_dto::ServerEvent;

pub const DEFAULT_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct RealtimeHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// 没有订阅者时事件直接丢弃
    pub fn publish(&self, event: ServerEvent) {
        match self.sender.send(event) {
            Ok(receivers) => tracing::debug!("realtime publish - receivers:{}", receivers),
            Err(_) => tracing::debug!("realtime publish - no subscribers"),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::rank_dto::RankBoard;

    #[tokio::test]
    async fn late_subscribers_see_only_new_events() {
        let hub = RealtimeHub::default();
        hub.publish(ServerEvent::RankingUpdate(RankBoard::default()));

        let mut rx = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);
        assert!(rx.try_recv().is_err());

        let board = RankBoard { ranks: vec![], total: 4 };
        hub.publish(ServerEvent::RankingUpdate(board.clone()));
        assert_eq!(rx.recv().await.unwrap(), ServerEvent::RankingUpdate(board));
    }
}
