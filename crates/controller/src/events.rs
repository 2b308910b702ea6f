//! Event intake between a view and the controller.
//!
//! A view holds an [`EventSender`] and raises events on it; the controller
//! drains the matching [`ViewEvents`] one input at a time in
//! [`crate::Controller::run`].

use shared::protocol::ViewEvent;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Location hash changed, e.g. `#/active`.
    Navigate(String),
    Event(ViewEvent),
}

impl Input {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Navigate(_) => "navigate",
            Self::Event(event) => event.name(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TriggerError {
    #[error("view event queue is full; dropped {0}")]
    QueueFull(&'static str),
    #[error("controller stopped listening; dropped {0}")]
    Disconnected(&'static str),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Input>,
}

pub struct ViewEvents {
    rx: mpsc::Receiver<Input>,
}

pub fn channel(capacity: usize) -> (EventSender, ViewEvents) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventSender { tx }, ViewEvents { rx })
}

impl EventSender {
    /// Queues an event without waiting for room in the queue.
    pub fn trigger(&self, event: ViewEvent) -> Result<(), TriggerError> {
        self.try_queue(Input::Event(event))
    }

    pub fn navigate(&self, route: impl Into<String>) -> Result<(), TriggerError> {
        self.try_queue(Input::Navigate(route.into()))
    }

    /// Queues an input, waiting while the queue is full.
    pub async fn send(&self, input: Input) -> Result<(), TriggerError> {
        let name = input.name();
        self.tx
            .send(input)
            .await
            .map_err(|_| TriggerError::Disconnected(name))?;
        debug!(event = name, "queued view event");
        Ok(())
    }

    fn try_queue(&self, input: Input) -> Result<(), TriggerError> {
        let name = input.name();
        match self.tx.try_send(input) {
            Ok(()) => {
                debug!(event = name, "queued view event");
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(TriggerError::QueueFull(name)),
            Err(TrySendError::Closed(_)) => Err(TriggerError::Disconnected(name)),
        }
    }
}

impl ViewEvents {
    pub async fn next(&mut self) -> Option<Input> {
        self.rx.recv().await
    }
}
