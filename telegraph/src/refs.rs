use std::fmt;
use std::sync::Arc;

use crate::mailbox::MailboxSender;
use crate::message::{Envelope, Message};
use crate::path::ActorPath;
use crate::system::SystemCore;
use crate::uri::ActorUri;

/// Location-transparent handle to an actor.
///
/// A ref is its uri plus a route. Refs compare equal by uri alone, so a ref
/// spawned locally and one resolved from the same uri elsewhere are
/// interchangeable. Sending through a ref never blocks and never fails at
/// the call site; messages that cannot be delivered are logged and dropped.
#[derive(Clone)]
pub struct ActorRef {
    pub(crate) uri: Arc<ActorUri>,
    pub(crate) route: Route,
}

/// How a ref reaches its actor.
///
/// `Via` defers the choice of transport to send time: each `tell` asks the
/// system core whether the uri is in the local actor table or needs an
/// outbound association, so a ref created before the target exists works as
/// soon as the target does.
#[derive(Clone)]
pub(crate) enum Route {
    /// Straight into a local mailbox.
    Direct(MailboxSender),
    /// Resolved through a system core at send time.
    Via(Arc<SystemCore>),
    /// Logged and dropped.
    DeadLetters,
}

impl ActorRef {
    pub(crate) fn direct(uri: Arc<ActorUri>, mailbox: MailboxSender) -> Self {
        Self {
            uri,
            route: Route::Direct(mailbox),
        }
    }

    pub(crate) fn via(uri: Arc<ActorUri>, core: Arc<SystemCore>) -> Self {
        Self {
            uri,
            route: Route::Via(core),
        }
    }

    /// The explicit "no sender" identity. Anything sent to it goes to dead
    /// letters, and it crosses the wire as an absent sender.
    pub fn no_sender() -> Self {
        Self {
            uri: Arc::new(ActorUri::local("", ActorPath::from("/deadLetters"))),
            route: Route::DeadLetters,
        }
    }

    pub fn uri(&self) -> &ActorUri {
        &self.uri
    }

    pub fn path(&self) -> &ActorPath {
        &self.uri.path
    }

    /// Send `msg` to this actor with `sender` attached as its origin.
    ///
    /// Passing a third actor's ref as `sender` forwards on that actor's
    /// behalf: the receiver sees the original identity, not the hop in the
    /// middle. Delivery is at most once; a stopped or unreachable target
    /// means the message is dropped with a log line, never an error here.
    pub fn tell(&self, msg: Message, sender: &ActorRef) {
        match &self.route {
            Route::Direct(mailbox) => {
                if !mailbox.deliver(Envelope::new(msg, sender.clone())) {
                    tracing::debug!(to = %self.uri, "recipient stopped, message dropped");
                }
            }
            Route::Via(core) => core.deliver(&self.uri, msg, sender),
            Route::DeadLetters => {
                tracing::debug!(to = %self.uri, "message addressed to dead letters dropped");
            }
        }
    }

    /// Sender identity as it should appear on the wire.
    pub(crate) fn wire_from(&self) -> Option<ActorUri> {
        match self.route {
            Route::DeadLetters => None,
            _ => Some(self.uri.as_ref().clone()),
        }
    }
}

impl PartialEq for ActorRef {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for ActorRef {}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri)
    }
}

impl fmt::Debug for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let route = match self.route {
            Route::Direct(_) => "direct",
            Route::Via(_) => "via",
            Route::DeadLetters => "dead-letters",
        };
        write!(f, "ActorRef({}, {})", self.uri, route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_sender_swallows_messages() {
        let nobody = ActorRef::no_sender();
        nobody.tell(Message::Generate, &ActorRef::no_sender());
        assert_eq!(nobody.wire_from(), None);
    }
}
