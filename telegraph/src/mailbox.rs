use tokio::sync::mpsc;

use crate::message::Envelope;

/// Create a connected sender/mailbox pair.
pub fn channel() -> (MailboxSender, Mailbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MailboxSender { tx }, Mailbox { rx })
}

/// Sending half of an actor mailbox.
///
/// Delivery is synchronous and unbounded: callers enqueue and move on, the
/// receiving actor drains at its own pace. A full-queue stall can therefore
/// never propagate backwards through a relay chain.
#[derive(Clone)]
pub struct MailboxSender {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl MailboxSender {
    /// Queue an envelope. Returns false when the actor behind the mailbox
    /// is gone and the envelope was dropped.
    pub fn deliver(&self, envelope: Envelope) -> bool {
        self.tx.send(envelope).is_ok()
    }
}

/// Receiving half, owned by the actor's runtime task.
pub struct Mailbox {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl Mailbox {
    /// Next envelope, or `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::refs::ActorRef;

    #[test_log::test(tokio::test)]
    async fn test_envelopes_arrive_in_send_order() {
        let (tx, mut mailbox) = channel();
        for n in 0..3 {
            let msg = Message::Element {
                payload: format!("seq:{}", n),
            };
            assert!(tx.deliver(Envelope::new(msg, ActorRef::no_sender())));
        }

        for n in 0..3 {
            let envelope = mailbox.recv().await.expect("queued envelope");
            assert_eq!(
                envelope.msg,
                Message::Element {
                    payload: format!("seq:{}", n)
                }
            );
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_deliver_reports_closed_mailbox() {
        let (tx, mailbox) = channel();
        drop(mailbox);
        assert!(!tx.deliver(Envelope::new(Message::Generate, ActorRef::no_sender())));
    }
}
