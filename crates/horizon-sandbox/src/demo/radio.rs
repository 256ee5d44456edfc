//! A broadcaster and a receiver connected through a signal.

use std::sync::Arc;

use horizon_sandbox_core::{ConnectionGuard, SharedSink, Signal};

/// Arguments of a broadcast: `(channel, station name, message)`.
pub type Broadcast = (i32, String, String);

/// A radio station that broadcasts messages on its channel.
pub struct Station {
    channel: i32,
    name: String,
    broadcast: Arc<Signal<Broadcast>>,
}

impl Station {
    /// Create a station with no listeners.
    pub fn new(channel: i32, name: impl Into<String>) -> Self {
        Self {
            channel,
            name: name.into(),
            broadcast: Arc::new(Signal::new()),
        }
    }

    /// The channel the station broadcasts on.
    pub fn channel(&self) -> i32 {
        self.channel
    }

    /// The station's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The signal emitted by [`Station::send`].
    pub fn broadcast(&self) -> &Arc<Signal<Broadcast>> {
        &self.broadcast
    }

    /// Broadcast a message to every tuned radio. Returns the number of
    /// listeners reached.
    pub fn send(&self, message: impl Into<String>) -> usize {
        self.broadcast
            .emit((self.channel, self.name.clone(), message.into()))
    }
}

/// A receiver that logs what it hears.
#[derive(Clone)]
pub struct Radio {
    sink: SharedSink,
}

impl Radio {
    /// Create a radio that logs what it hears to `sink`.
    pub fn new(sink: SharedSink) -> Self {
        Self { sink }
    }

    /// Log and return `"Channel: <channel>, Name: <name> - <message>"`.
    pub fn listen(&self, channel: i32, name: &str, message: &str) -> String {
        let line = format!("Channel: {channel}, Name: {name} - {message}");
        self.sink.info(&line);
        line
    }

    /// Listen to `station` until the returned guard is dropped.
    pub fn tune(&self, station: &Station) -> ConnectionGuard<Broadcast> {
        let radio = self.clone();
        Signal::connect_scoped(station.broadcast(), move |(channel, name, message)| {
            radio.listen(*channel, name, message);
        })
    }
}
