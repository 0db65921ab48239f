// src/events.rs
//! Publish/subscribe channel for notifications between decoupled panels.
//!
//! One `EventBus` is created by the application root and handed by reference
//! to every presenter that publishes or listens.

use crate::models::{Session, TradeReceipt};
use log::debug;
use tokio::sync::broadcast;

pub const DEFAULT_CAPACITY: usize = 64;

#[derive(Clone, Debug, PartialEq)]
pub enum AppEvent {
    SessionStarted(Session),
    SessionEnded,
    PortfolioUpdated { user_id: String },
    TradeExecuted(TradeReceipt),
}

#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns the number of subscribers the event reached.
    pub fn publish(&self, event: AppEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                debug!("No subscribers for {:?}", event);
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }
}
