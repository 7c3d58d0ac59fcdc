use tokio::sync::broadcast;

use crate::modules::chat::ChatEvent;

/// 进程内事件总线
///
/// 发布聊天领域事件，没有订阅者时事件直接丢弃
pub struct EventBus {
    sender: broadcast::Sender<ChatEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    pub fn publish(&self, event: ChatEvent) {
        tracing::debug!("[EventBus] Publishing event: {}", event.event_type());
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
