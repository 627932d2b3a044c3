//! Location-transparent actor coordination: named actor systems behind a
//! process-wide registry, lazy references to actors on other systems, and
//! relay actors that forward messages without disturbing the original
//! sender identity. Systems talk to each other over a length-prefixed TCP
//! frame protocol.
mod actor;
mod config;
mod context;
mod id;
mod mailbox;
mod message;
mod net;
mod path;
pub mod prelude;
mod refs;
mod registry;
mod relay;
mod remote;
mod system;
#[cfg(test)]
mod test_util;
mod uri;

#[cfg(test)]
mod tests {
    //! End-to-end scenarios across two systems in one process.
    use super::prelude::*;
    use crate::test_util::TestProbe;
    use assert_matches::assert_matches;
    use std::time::Duration;
    use tokio_test::assert_ok;

    const ELEMENT: &str = "0.0:0.0:0.0:0.0";
    const RECEIVE: Duration = Duration::from_secs(3);

    #[test_log::test(tokio::test)]
    async fn test_element_relayed_across_systems_keeps_sender() {
        let registry = Registry::new();
        let local_config = SystemConfig {
            log_sent: true,
            log_received: true,
            ..SystemConfig::remote("127.0.0.1", 2727)
        };
        let local = assert_ok!(registry.create_system("LocalSystem", local_config).await);
        let remote = ActorSystem::new("RemoteSystem", SystemConfig::remote("127.0.0.1", 5050))
            .await
            .unwrap();

        let local_relay = assert_ok!(registry.create_actor(RelayActor::new(ELEMENT), "localActor"));
        remote
            .spawn(RelayActor::new(ELEMENT), "remoteActor")
            .unwrap();

        let mut element_probe = TestProbe::spawn(&local, "probe");
        let mut control_probe = TestProbe::spawn(&local, "control");

        // Arm the local relay so elements it receives flow into the probe.
        local_relay.tell(
            Message::Reference {
                target: element_probe.uri(),
            },
            control_probe.actor_ref(),
        );
        let (ack, ack_sender) = control_probe.expect_msg(RECEIVE).await;
        assert_eq!(
            ack,
            Message::Ack {
                text: "done".into()
            }
        );
        assert_eq!(ack_sender, local_relay);

        // Ask the remote relay to generate, with the local relay as sender:
        // the element comes back addressed to the relay, which forwards it.
        let remote_relay = assert_ok!(registry.remote_actor(
            "RemoteSystem",
            "127.0.0.1",
            5050,
            "/user/remoteActor"
        ));
        remote_relay.tell(Message::Generate, &local_relay);

        let (msg, sender) = element_probe.expect_msg(RECEIVE).await;
        assert_eq!(
            msg,
            Message::Element {
                payload: ELEMENT.into()
            }
        );
        // The probe sees the actor on the other system as the sender, not
        // the relay hop in between.
        let expected = ActorUri::remote(
            "RemoteSystem",
            "127.0.0.1",
            5050,
            ActorPath::user("remoteActor"),
        );
        assert_eq!(sender.uri(), &expected);

        registry.shutdown().await;
        remote.terminate().await;
    }

    #[test_log::test(tokio::test)]
    async fn test_remote_relay_armed_from_another_system() {
        let registry = Registry::new();
        let local = assert_ok!(
            registry
                .create_system("ArmLocal", SystemConfig::remote("127.0.0.1", 0))
                .await
        );
        let remote = ActorSystem::new("ArmRemote", SystemConfig::remote("127.0.0.1", 0))
            .await
            .unwrap();
        remote.spawn(RelayActor::new("armed"), "relay").unwrap();
        let remote_port = remote.bind_addr().unwrap().port;

        let mut target = TestProbe::spawn(&local, "target");
        let mut control = TestProbe::spawn(&local, "control");
        let origin = TestProbe::spawn(&local, "origin");

        // Arm the relay on the other system with a target back here.
        let relay = assert_ok!(registry.remote_actor(
            "ArmRemote",
            "127.0.0.1",
            remote_port,
            "/user/relay"
        ));
        relay.tell(
            Message::Reference {
                target: target.uri(),
            },
            control.actor_ref(),
        );
        let (ack, ack_sender) = control.expect_msg(RECEIVE).await;
        assert_eq!(
            ack,
            Message::Ack {
                text: "done".into()
            }
        );
        assert_eq!(ack_sender.uri(), relay.uri());

        // Elements pushed at the remote relay come back to the local target
        // still carrying the original origin identity.
        relay.tell(
            Message::Element {
                payload: "round trip".into(),
            },
            origin.actor_ref(),
        );
        let (msg, sender) = target.expect_msg(RECEIVE).await;
        assert_eq!(
            msg,
            Message::Element {
                payload: "round trip".into()
            }
        );
        assert_eq!(sender.uri(), origin.actor_ref().uri());

        registry.shutdown().await;
        remote.terminate().await;
    }

    #[test_log::test(tokio::test)]
    async fn test_pairwise_order_survives_the_wire() {
        let registry = Registry::new();
        let sender_sys = assert_ok!(
            registry
                .create_system("OrderSender", SystemConfig::remote("127.0.0.1", 0))
                .await
        );
        let receiver_sys = ActorSystem::new("OrderReceiver", SystemConfig::remote("127.0.0.1", 0))
            .await
            .unwrap();
        let mut sink = TestProbe::spawn(&receiver_sys, "sink");
        let port = receiver_sys.bind_addr().unwrap().port;

        let remote_sink =
            assert_ok!(registry.remote_actor("OrderReceiver", "127.0.0.1", port, "/user/sink"));
        let origin = TestProbe::spawn(&sender_sys, "origin");

        for n in 0..20 {
            remote_sink.tell(
                Message::Element {
                    payload: format!("seq:{}", n),
                },
                origin.actor_ref(),
            );
        }

        for n in 0..20 {
            let (msg, _) = sink.expect_msg(RECEIVE).await;
            assert_eq!(
                msg,
                Message::Element {
                    payload: format!("seq:{}", n)
                }
            );
        }

        registry.shutdown().await;
        receiver_sys.terminate().await;
    }

    #[test_log::test(tokio::test)]
    async fn test_unreachable_peer_stays_quiet_until_send() {
        let registry = Registry::new();
        let system = assert_ok!(
            registry
                .create_system("Lonely", SystemConfig::remote("127.0.0.1", 0))
                .await
        );

        // A port nothing listens on.
        let parked = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_port = parked.local_addr().unwrap().port();
        drop(parked);

        // Resolution is lazy: building the ref involves no network at all.
        let ghost =
            assert_ok!(registry.remote_actor("Ghost", "127.0.0.1", dead_port, "/user/ghost"));

        let mut probe = TestProbe::spawn(&system, "observer");
        ghost.tell(Message::Generate, probe.actor_ref());
        probe.expect_no_msg(Duration::from_millis(300)).await;

        // The failed dial left the system fully functional.
        let relay = system.spawn(RelayActor::new("alive"), "relay").unwrap();
        relay.tell(Message::Generate, probe.actor_ref());
        let (msg, _) = probe.expect_msg(RECEIVE).await;
        assert_matches!(msg, Message::Element { .. });

        registry.shutdown().await;
    }
}
