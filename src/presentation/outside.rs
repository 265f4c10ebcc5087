use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::trace;

/// A pointer interaction that landed outside every overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutsideClick;

#[derive(Default)]
struct HubState {
    next_id: u64,
    subscribers: Vec<(u64, mpsc::UnboundedSender<OutsideClick>)>,
    lock_depth: usize,
}

/// Fan-out point for outside clicks.
///
/// Overlays subscribe in nesting order. While a backdrop lock is held only
/// the innermost (most recent) subscriber hears outside clicks, so an
/// attribute editor inside a modal does not close the modal.
#[derive(Clone, Default)]
pub struct OutsideClickHub {
    state: Arc<Mutex<HubState>>,
}

impl OutsideClickHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> OutsideClickSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.push((id, sender));
        OutsideClickSubscription {
            id,
            hub: Arc::downgrade(&self.state),
            receiver,
        }
    }

    pub fn set_backdrop_lock(&self, active: bool) {
        let mut state = self.state.lock();
        state.lock_depth = if active {
            state.lock_depth + 1
        } else {
            state.lock_depth.saturating_sub(1)
        };
        trace!(depth = state.lock_depth, "backdrop lock changed");
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().lock_depth > 0
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// Delivers one outside click; returns how many subscribers got it.
    pub fn emit(&self) -> usize {
        let mut state = self.state.lock();
        state.subscribers.retain(|(_, sender)| !sender.is_closed());
        if state.lock_depth > 0 {
            return match state.subscribers.last() {
                Some((_, sender)) => usize::from(sender.send(OutsideClick).is_ok()),
                None => 0,
            };
        }
        state
            .subscribers
            .iter()
            .filter(|(_, sender)| sender.send(OutsideClick).is_ok())
            .count()
    }
}

/// Receiving end of [`OutsideClickHub::subscribe`]. Dropping it unsubscribes.
pub struct OutsideClickSubscription {
    id: u64,
    hub: Weak<Mutex<HubState>>,
    receiver: mpsc::UnboundedReceiver<OutsideClick>,
}

impl OutsideClickSubscription {
    pub async fn recv(&mut self) -> Option<OutsideClick> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<OutsideClick> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for OutsideClickSubscription {
    fn drop(&mut self) {
        if let Some(state) = self.hub.upgrade() {
            state.lock().subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlocked_clicks_reach_every_overlay() {
        let hub = OutsideClickHub::new();
        let mut modal = hub.subscribe();
        let mut editor = hub.subscribe();
        assert_eq!(hub.emit(), 2);
        assert_eq!(modal.try_recv(), Some(OutsideClick));
        assert_eq!(editor.try_recv(), Some(OutsideClick));
    }

    #[test]
    fn backdrop_lock_limits_clicks_to_innermost_overlay() {
        let hub = OutsideClickHub::new();
        let mut modal = hub.subscribe();
        let mut editor = hub.subscribe();
        hub.set_backdrop_lock(true);
        assert_eq!(hub.emit(), 1);
        assert_eq!(modal.try_recv(), None);
        assert_eq!(editor.try_recv(), Some(OutsideClick));

        hub.set_backdrop_lock(false);
        assert!(!hub.is_locked());
        assert_eq!(hub.emit(), 2);
    }

    #[test]
    fn dropping_a_subscription_unsubscribes() {
        let hub = OutsideClickHub::new();
        let first = hub.subscribe();
        let _second = hub.subscribe();
        drop(first);
        assert_eq!(hub.subscriber_count(), 1);
    }
}
