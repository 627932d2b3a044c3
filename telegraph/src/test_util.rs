//! Probe actor for asserting on deliveries in tests.
use std::time::Duration;
use tokio::sync::mpsc;

use crate::actor::{Actor, async_trait};
use crate::context::Context;
use crate::message::Message;
use crate::refs::ActorRef;
use crate::system::ActorSystem;
use crate::uri::ActorUri;

/// A spawned actor that captures every `(message, sender)` pair it receives
/// and hands them to the test over a channel.
pub struct TestProbe {
    actor_ref: ActorRef,
    rx: mpsc::UnboundedReceiver<(Message, ActorRef)>,
}

struct ProbeActor {
    tx: mpsc::UnboundedSender<(Message, ActorRef)>,
}

#[async_trait]
impl Actor for ProbeActor {
    async fn receive(&mut self, _ctx: &mut Context, msg: Message, sender: ActorRef) {
        let _ = self.tx.send((msg, sender));
    }
}

impl TestProbe {
    pub fn spawn(system: &ActorSystem, name: &str) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor_ref = system
            .spawn(ProbeActor { tx }, name)
            .expect("failed to spawn test probe");
        Self { actor_ref, rx }
    }

    pub fn actor_ref(&self) -> &ActorRef {
        &self.actor_ref
    }

    pub fn uri(&self) -> ActorUri {
        self.actor_ref.uri().clone()
    }

    /// Next captured delivery, failing the test after `within`.
    pub async fn expect_msg(&mut self, within: Duration) -> (Message, ActorRef) {
        match tokio::time::timeout(within, self.rx.recv()).await {
            Ok(Some(captured)) => captured,
            Ok(None) => panic!("probe {} was stopped", self.actor_ref),
            Err(_) => panic!("no message within {:?} at probe {}", within, self.actor_ref),
        }
    }

    /// Assert that nothing arrives for `within`.
    pub async fn expect_no_msg(&mut self, within: Duration) {
        if let Ok(Some((msg, sender))) = tokio::time::timeout(within, self.rx.recv()).await {
            panic!(
                "unexpected message {:?} from {} at probe {}",
                msg, sender, self.actor_ref
            );
        }
    }
}
