use crate::refs::ActorRef;
use crate::system::ActorSystem;

/// Provides context and capabilities to actors during message handling.
///
/// The context gives actors access to their own ref (for use as the sender of
/// replies) and to the system that runs them (for resolving uris or spawning
/// further actors).
pub struct Context {
    self_ref: ActorRef,
    system: ActorSystem,
}

impl Context {
    pub(crate) fn new(self_ref: ActorRef, system: ActorSystem) -> Self {
        Context { self_ref, system }
    }

    /// This actor's own ref.
    pub fn self_ref(&self) -> &ActorRef {
        &self.self_ref
    }

    /// The system this actor runs on.
    pub fn system(&self) -> &ActorSystem {
        &self.system
    }
}
