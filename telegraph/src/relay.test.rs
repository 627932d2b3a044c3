use super::*;
use crate::config::SystemConfig;
use crate::system::ActorSystem;
use crate::test_util::TestProbe;
use std::time::Duration;

const RECEIVE: Duration = Duration::from_secs(3);
const SILENCE: Duration = Duration::from_millis(250);

async fn fixture(name: &str) -> ActorSystem {
    ActorSystem::new(name, SystemConfig::default())
        .await
        .expect("local system")
}

#[test_log::test(tokio::test)]
async fn test_reference_arms_and_acks_exactly_once() {
    let system = fixture("RelayArm").await;
    let relay = system.spawn(RelayActor::new("elem"), "relay").unwrap();
    let mut probe = TestProbe::spawn(&system, "probe");

    relay.tell(
        Message::Reference {
            target: probe.uri(),
        },
        probe.actor_ref(),
    );

    let (ack, from) = probe.expect_msg(RECEIVE).await;
    assert_eq!(
        ack,
        Message::Ack {
            text: "done".into()
        }
    );
    assert_eq!(&from, &relay);
    probe.expect_no_msg(SILENCE).await;
    system.terminate().await;
}

#[test_log::test(tokio::test)]
async fn test_generate_is_answered_without_arming() {
    let system = fixture("RelayGen").await;
    let relay = system.spawn(RelayActor::new("0.0:0.0:0.0:0.0"), "relay").unwrap();
    let mut probe = TestProbe::spawn(&system, "probe");

    relay.tell(Message::Generate, probe.actor_ref());

    let (msg, from) = probe.expect_msg(RECEIVE).await;
    assert_eq!(
        msg,
        Message::Element {
            payload: "0.0:0.0:0.0:0.0".into()
        }
    );
    assert_eq!(&from, &relay);
    system.terminate().await;
}

#[test_log::test(tokio::test)]
async fn test_generate_is_answered_while_armed() {
    let system = fixture("RelayGenArmed").await;
    let relay = system.spawn(RelayActor::new("elem"), "relay").unwrap();
    let mut target = TestProbe::spawn(&system, "target");
    let mut asker = TestProbe::spawn(&system, "asker");

    relay.tell(
        Message::Reference {
            target: target.uri(),
        },
        asker.actor_ref(),
    );
    asker.expect_msg(RECEIVE).await;

    relay.tell(Message::Generate, asker.actor_ref());
    let (msg, _) = asker.expect_msg(RECEIVE).await;
    assert_eq!(
        msg,
        Message::Element {
            payload: "elem".into()
        }
    );
    // The element went to the asker, not the armed target.
    target.expect_no_msg(SILENCE).await;
    system.terminate().await;
}

#[test_log::test(tokio::test)]
async fn test_element_is_dropped_while_idle() {
    let system = fixture("RelayIdle").await;
    let relay = system.spawn(RelayActor::new("elem"), "relay").unwrap();
    let mut probe = TestProbe::spawn(&system, "probe");

    relay.tell(
        Message::Element {
            payload: "lost".into(),
        },
        probe.actor_ref(),
    );
    probe.expect_no_msg(SILENCE).await;
    system.terminate().await;
}

#[test_log::test(tokio::test)]
async fn test_forward_preserves_original_sender() {
    let system = fixture("RelayForward").await;
    let relay = system.spawn(RelayActor::new("elem"), "relay").unwrap();
    let mut target = TestProbe::spawn(&system, "target");
    let mut control = TestProbe::spawn(&system, "control");
    let origin = TestProbe::spawn(&system, "origin");

    relay.tell(
        Message::Reference {
            target: target.uri(),
        },
        control.actor_ref(),
    );
    control.expect_msg(RECEIVE).await;

    relay.tell(
        Message::Element {
            payload: "through".into(),
        },
        origin.actor_ref(),
    );

    let (msg, from) = target.expect_msg(RECEIVE).await;
    assert_eq!(
        msg,
        Message::Element {
            payload: "through".into()
        }
    );
    // The hop in the middle is invisible; the target sees the origin.
    assert_eq!(&from, origin.actor_ref());
    system.terminate().await;
}

#[test_log::test(tokio::test)]
async fn test_rearm_replaces_the_target() {
    let system = fixture("RelayRearm").await;
    let relay = system.spawn(RelayActor::new("elem"), "relay").unwrap();
    let mut first = TestProbe::spawn(&system, "first");
    let mut second = TestProbe::spawn(&system, "second");
    let mut control = TestProbe::spawn(&system, "control");

    relay.tell(
        Message::Reference {
            target: first.uri(),
        },
        control.actor_ref(),
    );
    control.expect_msg(RECEIVE).await;
    relay.tell(
        Message::Reference {
            target: second.uri(),
        },
        control.actor_ref(),
    );
    control.expect_msg(RECEIVE).await;

    relay.tell(
        Message::Element {
            payload: "routed".into(),
        },
        control.actor_ref(),
    );

    let (msg, _) = second.expect_msg(RECEIVE).await;
    assert_eq!(
        msg,
        Message::Element {
            payload: "routed".into()
        }
    );
    first.expect_no_msg(SILENCE).await;
    system.terminate().await;
}

#[test_log::test(tokio::test)]
async fn test_ack_is_ignored_in_any_state() {
    let system = fixture("RelayAck").await;
    let relay = system.spawn(RelayActor::new("elem"), "relay").unwrap();
    let mut probe = TestProbe::spawn(&system, "probe");

    relay.tell(
        Message::Ack {
            text: "done".into(),
        },
        probe.actor_ref(),
    );
    probe.expect_no_msg(SILENCE).await;

    // Still responsive afterwards.
    relay.tell(Message::Generate, probe.actor_ref());
    let (msg, _) = probe.expect_msg(RECEIVE).await;
    assert_eq!(
        msg,
        Message::Element {
            payload: "elem".into()
        }
    );
    system.terminate().await;
}

#[test_log::test(tokio::test)]
async fn test_relay_chain_keeps_origin_end_to_end() {
    let system = fixture("RelayChain").await;
    let head = system.spawn(RelayActor::new("head"), "head").unwrap();
    let tail = system.spawn(RelayActor::new("tail"), "tail").unwrap();
    let mut sink = TestProbe::spawn(&system, "sink");
    let mut control = TestProbe::spawn(&system, "control");
    let origin = TestProbe::spawn(&system, "origin");

    // head forwards into tail, tail forwards into the sink.
    head.tell(
        Message::Reference {
            target: tail.uri().clone(),
        },
        control.actor_ref(),
    );
    control.expect_msg(RECEIVE).await;
    tail.tell(
        Message::Reference { target: sink.uri() },
        control.actor_ref(),
    );
    control.expect_msg(RECEIVE).await;

    head.tell(
        Message::Element {
            payload: "two hops".into(),
        },
        origin.actor_ref(),
    );

    let (msg, from) = sink.expect_msg(RECEIVE).await;
    assert_eq!(
        msg,
        Message::Element {
            payload: "two hops".into()
        }
    );
    assert_eq!(&from, origin.actor_ref());
    system.terminate().await;
}
