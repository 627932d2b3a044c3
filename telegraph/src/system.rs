//! Actor system implementation providing actor lifecycle management and message routing.
//!
//! This module contains the core actor system implementation, which is responsible for:
//! - Managing actor lifecycles (spawn, stop, terminate)
//! - Routing messages to local mailboxes or out through the TCP transport
//! - Owning the cancellation tree and task tracker that make shutdown drain
//!   cleanly
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::actor::Actor;
use crate::config::SystemConfig;
use crate::context::Context;
use crate::id::Id;
use crate::mailbox::{self, Mailbox, MailboxSender};
use crate::message::{Envelope, Message};
use crate::net::{Frame, NetAddr};
use crate::path::ActorPath;
use crate::refs::ActorRef;
use crate::remote::{self, RemoteSwitch};
use crate::uri::ActorUri;

/// Errors that can occur during actor system operations
#[derive(thiserror::Error, Debug)]
pub enum SystemError {
    /// The configured listener address could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: NetAddr,
        source: std::io::Error,
    },

    /// The bind host (configured or the local hostname) did not resolve
    #[error("Failed to resolve host {host:?}: {source}")]
    UnresolvedHost {
        host: String,
        source: std::io::Error,
    },

    /// An actor already runs under the requested path
    #[error("Actor path already taken: {path}")]
    DuplicateActorPath { path: ActorPath },

    /// The system has been terminated and accepts no new actors
    #[error("Actor system has been terminated")]
    Terminated,
}

/// Lifecycle of an actor system.
///
/// `Created` only exists inside [`ActorSystem::new`] between allocating the
/// core and the transport coming up; handles returned to callers always
/// observe `Running` or `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Running,
    Terminated,
}

/// Handle to a running actor system.
///
/// Handles are cheap clones over shared state; any clone can spawn, resolve
/// and terminate. A system does not stop when handles drop, only when
/// [`ActorSystem::terminate`] is called.
#[derive(Clone)]
pub struct ActorSystem {
    core: Arc<SystemCore>,
}

/// Shared state behind every handle and every `Via`-routed ref.
pub(crate) struct SystemCore {
    pub(crate) name: String,
    pub(crate) id: Id,
    pub(crate) config: SystemConfig,
    /// Advertised listener address when the transport is enabled
    pub(crate) authority: Option<NetAddr>,
    pub(crate) actors: RwLock<HashMap<ActorPath, ActorCell>>,
    pub(crate) switch: Option<RemoteSwitch>,
    state: RwLock<Lifecycle>,
    pub(crate) cancellation: CancellationToken,
    pub(crate) tracker: TaskTracker,
}

pub(crate) struct ActorCell {
    sender: MailboxSender,
    stop: CancellationToken,
}

impl ActorSystem {
    /// Start a named system.
    ///
    /// With `config.remote` set this resolves the bind host eagerly and
    /// brings the listener up before returning, so transport failures
    /// surface here rather than on first use. Host resolution for remote
    /// refs stays lazy; only the local side is checked now.
    pub async fn new(name: impl Into<String>, config: SystemConfig) -> Result<Self, SystemError> {
        let name = name.into();
        let id = Id::new();
        let state = RwLock::new(Lifecycle::Created);
        let cancellation = CancellationToken::new();
        let tracker = TaskTracker::new();

        let mut authority = None;
        let mut listener = None;
        if config.remote {
            let host = match &config.bind_host {
                Some(host) => host.clone(),
                None => local_hostname()?,
            };
            let requested = NetAddr::new(host, config.bind_port);
            let socket =
                requested
                    .lookup()
                    .await
                    .map_err(|source| SystemError::UnresolvedHost {
                        host: requested.host.clone(),
                        source,
                    })?;
            let bound = tokio::net::TcpListener::bind(socket)
                .await
                .map_err(|source| SystemError::Bind {
                    addr: requested.clone(),
                    source,
                })?;
            let local = bound.local_addr().map_err(|source| SystemError::Bind {
                addr: requested.clone(),
                source,
            })?;
            // Advertise the configured host but the actual port, so port 0
            // configs end up with a usable authority.
            authority = Some(NetAddr::new(requested.host, local.port()));
            listener = Some(bound);
        }

        let switch = config.remote.then(|| {
            RemoteSwitch::new(
                id,
                config.log_sent,
                cancellation.child_token(),
                tracker.clone(),
            )
        });

        let core = Arc::new(SystemCore {
            name,
            id,
            config,
            authority,
            actors: RwLock::new(HashMap::new()),
            switch,
            state,
            cancellation,
            tracker,
        });

        if let Some(listener) = listener {
            let server = remote::serve(listener, core.clone(), core.cancellation.child_token());
            core.tracker.spawn(server);
        }

        *core.state.write() = Lifecycle::Running;
        tracing::info!(system = %core.name, id = %core.id, addr = ?core.authority, "actor system started");
        Ok(Self { core })
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn state(&self) -> Lifecycle {
        *self.core.state.read()
    }

    /// Address the transport listens on, when enabled. Reflects the real
    /// port even when the config asked for an ephemeral one.
    pub fn bind_addr(&self) -> Option<&NetAddr> {
        self.core.authority.as_ref()
    }

    /// Spawn an actor under `/user/<name>`.
    ///
    /// The returned ref is directly wired to the new mailbox. Messages sent
    /// to it before the actor's `started` hook finishes are queued, not lost.
    pub fn spawn<A: Actor>(&self, actor: A, name: &str) -> Result<ActorRef, SystemError> {
        if self.state() == Lifecycle::Terminated {
            return Err(SystemError::Terminated);
        }
        let path = ActorPath::user(name);

        let (sender, mailbox) = mailbox::channel();
        let stop = self.core.cancellation.child_token();
        {
            let mut actors = self.core.actors.write();
            if actors.contains_key(&path) {
                return Err(SystemError::DuplicateActorPath { path });
            }
            actors.insert(
                path.clone(),
                ActorCell {
                    sender: sender.clone(),
                    stop: stop.clone(),
                },
            );
        }

        let uri = Arc::new(ActorUri {
            system: self.core.name.clone(),
            authority: self.core.authority.clone(),
            path,
        });
        let actor_ref = ActorRef::direct(uri, sender);
        let ctx = Context::new(actor_ref.clone(), self.clone());
        tracing::debug!(system = %self.core.name, actor = %actor_ref, "actor spawned");
        self.core.tracker.spawn(run_actor(actor, mailbox, ctx, stop));
        Ok(actor_ref)
    }

    /// Stop the actor at `path`. Returns false when no actor runs there.
    ///
    /// The actor leaves the table immediately; anything still queued in its
    /// mailbox may be processed or dropped, and later sends go to dead
    /// letters.
    pub fn stop(&self, path: &ActorPath) -> bool {
        let cell = self.core.actors.write().remove(path);
        match cell {
            Some(cell) => {
                cell.stop.cancel();
                tracing::debug!(system = %self.core.name, path = %path, "actor stopped");
                true
            }
            None => false,
        }
    }

    /// Build a ref for any uri.
    ///
    /// Pure construction: no lookup, no dial, cannot fail. The transport is
    /// selected per message when the ref is used.
    pub fn resolve(&self, uri: ActorUri) -> ActorRef {
        ActorRef::via(Arc::new(uri), self.core.clone())
    }

    /// Lazy ref to an actor on another system reachable over TCP.
    pub fn remote_ref(&self, system: &str, host: &str, port: u16, path: &str) -> ActorRef {
        self.resolve(ActorUri::remote(system, host, port, ActorPath::from(path)))
    }

    /// Terminate the system: stop every actor, close the listener and all
    /// associations, and wait for the tasks to unwind.
    ///
    /// Idempotent. Meant to be called from outside the system's own actors;
    /// an actor terminating its own system would wait on itself.
    pub async fn terminate(&self) {
        {
            let mut state = self.core.state.write();
            if *state == Lifecycle::Terminated {
                return;
            }
            *state = Lifecycle::Terminated;
        }
        self.core.cancellation.cancel();
        self.core.actors.write().clear();
        self.core.tracker.close();
        self.core.tracker.wait().await;
        tracing::info!(system = %self.core.name, "actor system terminated");
    }
}

impl fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorSystem({}, {})", self.core.name, self.core.id)
    }
}

impl SystemCore {
    /// Route a message: into a local mailbox when the uri names this system,
    /// out through an association otherwise.
    pub(crate) fn deliver(&self, to: &ActorUri, msg: Message, sender: &ActorRef) {
        match &to.authority {
            Some(peer) if self.authority.as_ref() != Some(peer) => match &self.switch {
                Some(switch) => {
                    let frame = Frame::new(self.id, to.clone(), sender.wire_from(), msg);
                    switch.send(peer, frame);
                }
                None => {
                    tracing::warn!(to = %to, system = %self.name, "remote transport disabled, message dropped");
                }
            },
            _ => self.deliver_local(to, msg, sender),
        }
    }

    /// Deliver into the local actor table. Also the terminal hop for frames
    /// arriving off the wire; inbound frames are never re-routed outwards.
    pub(crate) fn deliver_local(&self, to: &ActorUri, msg: Message, sender: &ActorRef) {
        if to.system != self.name {
            tracing::debug!(to = %to, system = %self.name, "message for foreign system dropped");
            return;
        }
        let mailbox = self
            .actors
            .read()
            .get(&to.path)
            .map(|cell| cell.sender.clone());
        match mailbox {
            Some(mailbox) => {
                if !mailbox.deliver(Envelope::new(msg, sender.clone())) {
                    tracing::debug!(to = %to, "recipient stopped, message dropped");
                }
            }
            None => {
                tracing::debug!(to = %to, "no actor at path, message dropped");
            }
        }
    }
}

fn local_hostname() -> Result<String, SystemError> {
    let raw = hostname::get().map_err(|source| SystemError::UnresolvedHost {
        host: String::new(),
        source,
    })?;
    raw.into_string().map_err(|raw| SystemError::UnresolvedHost {
        host: raw.to_string_lossy().into_owned(),
        source: std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "hostname is not valid utf-8",
        ),
    })
}

#[tracing::instrument(name = "actor", skip_all, fields(path = %ctx.self_ref()))]
async fn run_actor<A: Actor>(
    mut actor: A,
    mut mailbox: Mailbox,
    mut ctx: Context,
    cancellation: CancellationToken,
) {
    actor.started(&mut ctx).await;
    loop {
        tokio::select! {
            _ = cancellation.cancelled() => {
                tracing::trace!("stopping actor loop");
                actor.stopping(&mut ctx).await;
                break;
            }
            envelope = mailbox.recv() => match envelope {
                Some(Envelope { msg, sender }) => {
                    tracing::trace!("handling message");
                    actor.receive(&mut ctx, msg, sender).await;
                }
                None => {
                    actor.stopping(&mut ctx).await;
                    break;
                }
            }
        }
    }
    actor.stopped(&mut ctx).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::async_trait;
    use crate::relay::RelayActor;
    use crate::test_util::TestProbe;
    use assert_matches::assert_matches;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Reports each lifecycle hook invocation to the test.
    struct LifecycleRecorder {
        events: mpsc::UnboundedSender<&'static str>,
    }

    #[async_trait]
    impl Actor for LifecycleRecorder {
        async fn started(&mut self, _ctx: &mut Context) {
            let _ = self.events.send("started");
        }

        async fn stopping(&mut self, _ctx: &mut Context) {
            let _ = self.events.send("stopping");
        }

        async fn stopped(&mut self, _ctx: &mut Context) {
            let _ = self.events.send("stopped");
        }

        async fn receive(&mut self, _ctx: &mut Context, _msg: Message, _sender: ActorRef) {}
    }

    #[test_log::test(tokio::test)]
    async fn test_spawn_and_tell_round_trip() {
        let system = ActorSystem::new("Solo", SystemConfig::default())
            .await
            .unwrap();
        assert_eq!(system.state(), Lifecycle::Running);
        assert_eq!(system.bind_addr(), None);

        let relay = system.spawn(RelayActor::new("ping"), "relay").unwrap();
        let mut probe = TestProbe::spawn(&system, "probe");
        relay.tell(Message::Generate, probe.actor_ref());

        let (msg, sender) = probe.expect_msg(Duration::from_secs(3)).await;
        assert_eq!(
            msg,
            Message::Element {
                payload: "ping".into()
            }
        );
        assert_eq!(&sender, &relay);
        system.terminate().await;
    }

    #[test_log::test(tokio::test)]
    async fn test_duplicate_actor_path_is_rejected() {
        let system = ActorSystem::new("Solo", SystemConfig::default())
            .await
            .unwrap();
        system.spawn(RelayActor::new("a"), "worker").unwrap();
        assert_matches!(
            system.spawn(RelayActor::new("b"), "worker"),
            Err(SystemError::DuplicateActorPath { .. })
        );
        system.terminate().await;
    }

    #[test_log::test(tokio::test)]
    async fn test_direct_and_resolved_refs_are_interchangeable() {
        let system = ActorSystem::new("Solo", SystemConfig::default())
            .await
            .unwrap();
        let mut probe = TestProbe::spawn(&system, "probe");
        let direct = probe.actor_ref().clone();
        let resolved = system.resolve(probe.uri());
        assert_eq!(direct, resolved);

        resolved.tell(Message::Generate, &ActorRef::no_sender());
        let (msg, _) = probe.expect_msg(Duration::from_secs(3)).await;
        assert_eq!(msg, Message::Generate);
        system.terminate().await;
    }

    #[test_log::test(tokio::test)]
    async fn test_stop_removes_actor_and_later_sends_drop() {
        let system = ActorSystem::new("Solo", SystemConfig::default())
            .await
            .unwrap();
        let probe = TestProbe::spawn(&system, "probe");
        let path = probe.actor_ref().path().clone();

        assert!(system.stop(&path));
        assert!(!system.stop(&path));

        // Via-routed sends now find nothing at the path and drop quietly.
        let stale = system.resolve(probe.uri());
        stale.tell(Message::Generate, &ActorRef::no_sender());

        // The path is free for a replacement.
        system.spawn(RelayActor::new("fresh"), "probe").unwrap();
        system.terminate().await;
    }

    #[test_log::test(tokio::test)]
    async fn test_bind_conflict_surfaces_bind_error() {
        let first = ActorSystem::new("First", SystemConfig::remote("127.0.0.1", 0))
            .await
            .unwrap();
        let taken = first.bind_addr().unwrap().port;

        let second = ActorSystem::new("Second", SystemConfig::remote("127.0.0.1", taken)).await;
        assert_matches!(second, Err(SystemError::Bind { .. }));
        first.terminate().await;
    }

    #[test_log::test(tokio::test)]
    async fn test_unresolvable_bind_host_surfaces_eagerly() {
        let result = ActorSystem::new("Broken", SystemConfig::remote("", 0)).await;
        assert_matches!(result, Err(SystemError::UnresolvedHost { .. }));
    }

    #[test_log::test(tokio::test)]
    async fn test_terminate_is_idempotent() {
        let system = ActorSystem::new("Solo", SystemConfig::remote("127.0.0.1", 0))
            .await
            .unwrap();
        assert_eq!(system.state(), Lifecycle::Running);
        system.terminate().await;
        assert_eq!(system.state(), Lifecycle::Terminated);
        system.terminate().await;
        assert_eq!(system.state(), Lifecycle::Terminated);

        assert_matches!(
            system.spawn(RelayActor::new("late"), "late"),
            Err(SystemError::Terminated)
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_lifecycle_hooks_run_in_order_on_stop() {
        let system = ActorSystem::new("Solo", SystemConfig::default())
            .await
            .unwrap();
        let (events, mut seen) = mpsc::unbounded_channel();
        let recorder = system.spawn(LifecycleRecorder { events }, "recorder").unwrap();

        assert!(system.stop(recorder.path()));

        // `started` always runs before the loop, so the order is fixed even
        // when the stop lands before the actor task gets scheduled.
        for expected in ["started", "stopping", "stopped"] {
            let event = tokio::time::timeout(Duration::from_secs(3), seen.recv())
                .await
                .expect("lifecycle hook within timeout")
                .expect("recorder dropped its channel");
            assert_eq!(event, expected);
        }
        system.terminate().await;
    }

    #[test_log::test(tokio::test)]
    async fn test_system_debug_names_the_instance() {
        let system = ActorSystem::new("Solo", SystemConfig::default())
            .await
            .unwrap();
        let rendered = format!("{:?}", system);
        assert!(rendered.contains("ActorSystem(Solo"), "got {}", rendered);
        system.terminate().await;
    }

    #[test_log::test(tokio::test)]
    async fn test_remote_send_without_transport_goes_to_dead_letters() {
        let system = ActorSystem::new("Landlocked", SystemConfig::default())
            .await
            .unwrap();
        let ghost = system.remote_ref("Elsewhere", "127.0.0.1", 4000, "/user/ghost");
        // No transport to dial with; the message is dropped, not an error.
        ghost.tell(Message::Generate, &ActorRef::no_sender());
        system.terminate().await;
    }
}
