//! Core actor trait for the runtime.
use crate::context::Context;
use crate::message::Message;
use crate::refs::ActorRef;

pub use async_trait::async_trait;

/// The behavior trait implemented by every actor.
///
/// Actors process messages one at a time in the order their mailbox received
/// them, keep private state between messages, and have their lifecycle
/// managed by the owning system.
#[async_trait]
pub trait Actor: Unpin + Sized + Send + 'static {
    /// Called when the actor is started but before it begins processing messages.
    /// Use this to perform any initialization.
    async fn started(&mut self, _ctx: &mut Context) {}

    /// Called when the actor is about to be shut down, before it stops processing.
    /// Use this to prepare for shutdown.
    async fn stopping(&mut self, _ctx: &mut Context) {}

    /// Called after the actor has been shut down. Use this for final cleanup.
    async fn stopped(&mut self, _ctx: &mut Context) {}

    /// Handle one message.
    ///
    /// `sender` is the identity attached at the original send site. Passing
    /// it along to another actor's `tell` forwards the message on the
    /// original sender's behalf; replying through it reaches that sender even
    /// when the message crossed systems to get here.
    async fn receive(&mut self, ctx: &mut Context, msg: Message, sender: ActorRef);
}
