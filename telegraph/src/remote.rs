//! TCP transport: outbound associations and the inbound accept loop.
//!
//! One association per peer address, owned by a single writer task, which is
//! what gives each (sender system, receiver system) pair its FIFO ordering.
//! Associations dial lazily on the first frame and are torn down on any
//! connect or write failure; the frames queued behind a failure are dropped
//! (delivery is at most once) and the next send opens a fresh association.
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::id::Id;
use crate::net::{Frame, FrameReader, FrameWriter, NetAddr};
use crate::refs::ActorRef;
use crate::system::SystemCore;

/// Outbound half of the transport, shared by everything that routes through
/// one system core.
pub(crate) struct RemoteSwitch {
    inner: Arc<SwitchInner>,
}

struct SwitchInner {
    origin: Id,
    log_sent: bool,
    peers: Mutex<HashMap<NetAddr, Association>>,
    cancellation: CancellationToken,
    tracker: TaskTracker,
}

struct Association {
    /// Distinguishes this association from any replacement under the same
    /// peer key, so a dying writer only removes its own table entry.
    id: Id,
    tx: mpsc::UnboundedSender<Frame>,
}

impl RemoteSwitch {
    pub(crate) fn new(
        origin: Id,
        log_sent: bool,
        cancellation: CancellationToken,
        tracker: TaskTracker,
    ) -> Self {
        Self {
            inner: Arc::new(SwitchInner {
                origin,
                log_sent,
                peers: Mutex::new(HashMap::new()),
                cancellation,
                tracker,
            }),
        }
    }

    /// Queue a frame for `peer`, opening an association if none is live.
    /// Never blocks; a frame queued behind a dial that later fails is lost.
    pub(crate) fn send(&self, peer: &NetAddr, frame: Frame) {
        if self.inner.log_sent {
            tracing::debug!(origin = %self.inner.origin, peer = %peer, to = %frame.to, "frame queued");
        } else {
            tracing::trace!(origin = %self.inner.origin, peer = %peer, to = %frame.to, "frame queued");
        }

        let mut peers = self.inner.peers.lock();
        let association = peers
            .entry(peer.clone())
            .or_insert_with(|| self.open(peer.clone()));
        if let Err(rejected) = association.tx.send(frame) {
            // The writer died between our lookup and the send; replace it and
            // requeue on the fresh association.
            let fresh = self.open(peer.clone());
            let _ = fresh.tx.send(rejected.0);
            peers.insert(peer.clone(), fresh);
        }
    }

    fn open(&self, peer: NetAddr) -> Association {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Id::new();
        let inner = self.inner.clone();
        self.inner.tracker.spawn(inner.run_association(id, peer, rx));
        Association { id, tx }
    }
}

impl SwitchInner {
    async fn run_association(
        self: Arc<Self>,
        id: Id,
        peer: NetAddr,
        mut rx: mpsc::UnboundedReceiver<Frame>,
    ) {
        let established_at = chrono::Utc::now();

        let stream = tokio::select! {
            _ = self.cancellation.cancelled() => {
                self.close(&id, &peer);
                return;
            }
            connected = TcpStream::connect((peer.host.as_str(), peer.port)) => match connected {
                Ok(stream) => stream,
                Err(error) => {
                    tracing::warn!(peer = %peer, %error, "failed to open association");
                    self.close(&id, &peer);
                    return;
                }
            }
        };
        let _ = stream.set_nodelay(true);
        tracing::debug!(peer = %peer, "association established");

        let mut writer = FrameWriter::new(stream);
        let mut sent: u64 = 0;
        loop {
            tokio::select! {
                _ = self.cancellation.cancelled() => break,
                frame = rx.recv() => match frame {
                    Some(frame) => {
                        if let Err(error) = writer.write_frame(&frame).await {
                            tracing::warn!(peer = %peer, %error, "association failed, dropping queued frames");
                            break;
                        }
                        sent += 1;
                    }
                    None => break,
                }
            }
        }

        let uptime = chrono::Utc::now() - established_at;
        tracing::debug!(
            peer = %peer,
            frames = sent,
            uptime_ms = uptime.num_milliseconds(),
            "association closed"
        );
        self.close(&id, &peer);
    }

    /// Remove this association's table entry, unless a replacement already
    /// took the slot.
    fn close(&self, id: &Id, peer: &NetAddr) {
        let mut peers = self.peers.lock();
        if peers.get(peer).is_some_and(|association| association.id == *id) {
            peers.remove(peer);
        }
    }
}

/// Accept loop for a bound system. Runs until the system's cancellation
/// fires; each inbound connection gets its own reader task.
pub(crate) async fn serve(
    listener: TcpListener,
    core: Arc<SystemCore>,
    cancellation: CancellationToken,
) {
    tracing::info!(system = %core.name, addr = ?core.authority, "listening for associations");
    loop {
        tokio::select! {
            _ = cancellation.cancelled() => {
                tracing::debug!(system = %core.name, "accept loop stopped");
                break;
            }
            incoming = listener.accept() => match incoming {
                Ok((stream, peer)) => {
                    tracing::debug!(system = %core.name, %peer, "inbound association accepted");
                    let connection = read_connection(stream, core.clone(), cancellation.child_token());
                    core.tracker.spawn(connection);
                }
                Err(error) => {
                    tracing::warn!(system = %core.name, %error, "failed to accept connection");
                }
            }
        }
    }
}

async fn read_connection(stream: TcpStream, core: Arc<SystemCore>, cancellation: CancellationToken) {
    let mut reader = FrameReader::new(stream);
    loop {
        tokio::select! {
            _ = cancellation.cancelled() => break,
            frame = reader.read_frame() => match frame {
                Ok(Some(frame)) => dispatch(&core, frame),
                Ok(None) => break,
                Err(error) => {
                    tracing::warn!(system = %core.name, %error, "closing association on bad frame");
                    break;
                }
            }
        }
    }
}

/// Hand an inbound frame to the local actor table, rebuilding the sender ref
/// from the wire identity so replies and forwards reach the original sender.
fn dispatch(core: &Arc<SystemCore>, frame: Frame) {
    if core.config.log_received {
        tracing::debug!(
            system = %core.name,
            origin = %frame.header.origin,
            to = %frame.to,
            from = ?frame.from,
            "frame received"
        );
    } else {
        tracing::trace!(
            system = %core.name,
            origin = %frame.header.origin,
            to = %frame.to,
            from = ?frame.from,
            "frame received"
        );
    }

    let sender = match frame.from {
        Some(uri) => ActorRef::via(Arc::new(uri), core.clone()),
        None => ActorRef::no_sender(),
    };
    core.deliver_local(&frame.to, frame.msg, &sender);
}
