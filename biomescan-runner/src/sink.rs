use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Where user-facing messages go. Delivery is fire-and-forget.
pub trait MessageSink: Send + Sync {
    fn send(&self, message: &str);
}

/// Prints to stdout.
pub struct ConsoleSink;

impl MessageSink for ConsoleSink {
    fn send(&self, message: &str) {
        println!("{}", message);
    }
}

/// Forwards messages to a session over an unbounded channel.
/// Messages sent after the receiver is gone are dropped.
pub struct ChannelSink {
    tx: UnboundedSender<String>,
}

impl ChannelSink {
    pub fn new() -> (Self, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl MessageSink for ChannelSink {
    fn send(&self, message: &str) {
        if self.tx.send(message.to_string()).is_err() {
            log::debug!("Dropping message for closed session: {}", message);
        }
    }
}
