use serde::{Deserialize, Serialize};

use crate::refs::ActorRef;
use crate::uri::ActorUri;

/// The message protocol understood by every actor in the crate.
///
/// The protocol is closed: a fixed enum rather than an open type registry,
/// which keeps wire encoding a plain serde derive and makes exhaustive
/// matching in `receive` implementations possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Arm the receiving relay with a forwarding target.
    Reference { target: ActorUri },
    /// Ask the receiver to produce its configured element.
    Generate,
    /// A payload travelling through a relay chain.
    Element { payload: String },
    /// Acknowledgement carrying short status text.
    Ack { text: String },
}

/// What actually sits in a mailbox: the message plus the sender identity
/// that was attached at send time.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub msg: Message,
    pub sender: ActorRef,
}

impl Envelope {
    pub fn new(msg: Message, sender: ActorRef) -> Self {
        Self { msg, sender }
    }
}
