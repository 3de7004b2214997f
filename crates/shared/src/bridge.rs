//! Host bridge connection lifecycle.

use thiserror::Error;

use crate::protocol::OutboundEvent;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error("bridge is not connected")]
    NotConnected,
    #[error("no host channel after {attempts} attempts")]
    Unavailable { attempts: u32 },
    #[error("failed to encode {event}: {reason}")]
    Encode { event: &'static str, reason: String },
    #[error("failed to post message: {0}")]
    Post(String),
}

/// Outbound half of a host channel.
pub trait Transport {
    fn post(&self, text: &str) -> Result<(), BridgeError>;
}

#[derive(Debug)]
pub enum Connection<T> {
    Disconnected,
    Connected(T),
}

#[derive(Debug)]
pub struct Bridge<T> {
    connection: Connection<T>,
}

impl<T> Default for Bridge<T> {
    fn default() -> Self {
        Self {
            connection: Connection::Disconnected,
        }
    }
}

impl<T: Transport> Bridge<T> {
    pub fn is_connected(&self) -> bool {
        matches!(self.connection, Connection::Connected(_))
    }

    /// Store the transport. Returns `false` if a transport was already held,
    /// in which case the new one is dropped.
    pub fn attach(&mut self, transport: T) -> bool {
        if self.is_connected() {
            return false;
        }
        self.connection = Connection::Connected(transport);
        true
    }

    /// Release the transport, returning it if one was held.
    pub fn detach(&mut self) -> Option<T> {
        match std::mem::replace(&mut self.connection, Connection::Disconnected) {
            Connection::Connected(t) => Some(t),
            Connection::Disconnected => None,
        }
    }

    pub fn emit(&self, event: &OutboundEvent) -> Result<(), BridgeError> {
        let Connection::Connected(transport) = &self.connection else {
            return Err(BridgeError::NotConnected);
        };
        let text = event.encode().map_err(|e| BridgeError::Encode {
            event: event.name(),
            reason: e.to_string(),
        })?;
        transport.post(&text)
    }
}
