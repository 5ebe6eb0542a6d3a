use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use log::trace;
use tokio::sync::broadcast;

use deadmint_shared::{Address, ServerMessage};

use crate::error::RegistryError;

const DEFAULT_CAPACITY: usize = 64;

/// A new subscriber's view of a session channel
pub struct Subscription {
    /// The last published `state` message, delivered ahead of live traffic
    pub initial: Option<ServerMessage>,
    pub receiver: broadcast::Receiver<ServerMessage>,
}

struct SessionChannel {
    sender: broadcast::Sender<ServerMessage>,
    last_state: Option<ServerMessage>,
    /// A worker has published here. Unhosted channels live only as long as
    /// their subscribers.
    hosted: bool,
}

impl SessionChannel {
    fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            last_state: None,
            hosted: false,
        }
    }

    fn is_idle(&self) -> bool {
        !self.hosted && self.sender.receiver_count() == 0
    }
}

/// One push channel per session. Slow subscribers lag and skip messages;
/// the next `state` message supersedes anything they missed.
#[derive(Clone)]
pub struct FanOut {
    channels: Arc<RwLock<HashMap<Address, SessionChannel>>>,
    capacity: usize,
}

impl Default for FanOut {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl FanOut {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe(&self, session: &Address) -> Result<Subscription, RegistryError> {
        let mut channels = self.write()?;
        prune(&mut channels);
        let channel = channels
            .entry(*session)
            .or_insert_with(|| SessionChannel::new(self.capacity));
        Ok(Subscription {
            initial: channel.last_state.clone(),
            receiver: channel.sender.subscribe(),
        })
    }

    /// Delivers `message` to every current subscriber. Returns how many received it.
    pub fn publish(&self, session: &Address, message: ServerMessage) -> Result<usize, RegistryError> {
        let mut channels = self.write()?;
        let channel = channels
            .entry(*session)
            .or_insert_with(|| SessionChannel::new(self.capacity));
        channel.hosted = true;
        if matches!(message, ServerMessage::State { .. }) {
            channel.last_state = Some(message.clone());
        }
        match channel.sender.send(message) {
            Ok(delivered) => Ok(delivered),
            Err(_) => {
                trace!("No subscribers on {}", session.short());
                Ok(0)
            }
        }
    }

    /// Drops a session's channel; its subscribers see the stream close.
    pub fn remove(&self, session: &Address) -> Result<bool, RegistryError> {
        Ok(self.write()?.remove(session).is_some())
    }

    /// Live subscribers across all sessions.
    pub fn connection_count(&self) -> Result<usize, RegistryError> {
        let mut channels = self.write()?;
        prune(&mut channels);
        Ok(channels
            .values()
            .map(|channel| channel.sender.receiver_count())
            .sum())
    }

    pub fn last_state(&self, session: &Address) -> Result<Option<ServerMessage>, RegistryError> {
        let channels = self.read()?;
        Ok(channels
            .get(session)
            .and_then(|channel| channel.last_state.clone()))
    }

    pub fn channel_count(&self) -> Result<usize, RegistryError> {
        Ok(self.read()?.len())
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<Address, SessionChannel>>, RegistryError>
    {
        self.channels
            .read()
            .map_err(|_| RegistryError::LockPoisoned { table: "fan-out" })
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<Address, SessionChannel>>, RegistryError>
    {
        self.channels
            .write()
            .map_err(|_| RegistryError::LockPoisoned { table: "fan-out" })
    }
}

/// Drops channels nobody publishes to and nobody listens on.
fn prune(channels: &mut HashMap<Address, SessionChannel>) {
    let before = channels.len();
    channels.retain(|_, channel| !channel.is_idle());
    let pruned = before - channels.len();
    if pruned > 0 {
        trace!("Pruned {} idle push channel(s)", pruned);
    }
}
