//! Two-state relay actor: the crate's reference behavior for
//! sender-preserving forwarding.
use crate::actor::{Actor, async_trait};
use crate::context::Context;
use crate::message::Message;
use crate::refs::ActorRef;

/// A relay answers [`Message::Generate`] with its configured element and,
/// once armed with a [`Message::Reference`], forwards every incoming
/// [`Message::Element`] to the armed target.
///
/// Forwarding keeps the original sender: the target sees the element as
/// coming from whoever sent it to the relay, not from the relay itself, even
/// when that sender lives on another system.
pub struct RelayActor {
    element: String,
    state: State,
}

enum State {
    /// No forwarding target yet; elements are dropped.
    Idle,
    /// Elements go to `target`.
    Armed { target: ActorRef },
}

impl RelayActor {
    /// Relay that answers `Generate` with `element`.
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            state: State::Idle,
        }
    }
}

#[async_trait]
impl Actor for RelayActor {
    async fn receive(&mut self, ctx: &mut Context, msg: Message, sender: ActorRef) {
        match msg {
            Message::Reference { target } => {
                // Re-arming replaces the previous target; each Reference is
                // acknowledged exactly once.
                let target = ctx.system().resolve(target);
                tracing::debug!(relay = %ctx.self_ref(), target = %target, "relay armed");
                self.state = State::Armed { target };
                sender.tell(
                    Message::Ack {
                        text: "done".into(),
                    },
                    ctx.self_ref(),
                );
            }
            Message::Generate => {
                // Answered in any state; arming only gates forwarding.
                sender.tell(
                    Message::Element {
                        payload: self.element.clone(),
                    },
                    ctx.self_ref(),
                );
            }
            Message::Element { payload } => match &self.state {
                State::Armed { target } => {
                    target.tell(Message::Element { payload }, &sender);
                }
                State::Idle => {
                    tracing::debug!(relay = %ctx.self_ref(), "no forwarding target, element dropped");
                }
            },
            Message::Ack { .. } => {}
        }
    }
}

#[cfg(test)]
#[path = "./relay.test.rs"]
mod tests;
