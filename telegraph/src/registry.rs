//! Process-wide front door for creating, looking up and tearing down systems.
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::actor::Actor;
use crate::config::SystemConfig;
use crate::refs::ActorRef;
use crate::system::{ActorSystem, SystemError};

/// Errors that can occur going through the registry
#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    /// A system with this name is already registered (or being created)
    #[error("Actor system name already taken: {name}")]
    DuplicateSystem { name: String },

    /// No system has been created yet, so there is nothing to anchor to
    #[error("No active actor system")]
    NoActiveSystem,

    #[error("System error: {0}")]
    System(#[from] SystemError),
}

/// Coordinates the actor systems of one process.
///
/// The registry is an explicit value: construct one with [`Registry::new`]
/// and pass it by reference. The most recently created system is the active
/// one; [`Registry::create_actor`] and [`Registry::remote_actor`] anchor to
/// it. Systems created directly through [`ActorSystem::new`] are independent
/// of any registry and survive its shutdown.
pub struct Registry {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    systems: HashMap<String, Entry>,
    active: Option<String>,
}

enum Entry {
    /// Name reserved while its system is still binding.
    Pending,
    Ready(ActorSystem),
}

impl Entry {
    fn ready(&self) -> Option<&ActorSystem> {
        match self {
            Entry::Ready(system) => Some(system),
            Entry::Pending => None,
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Create a named system and register it as the active one.
    ///
    /// The name is reserved before the transport binds, so of two concurrent
    /// creations under one name exactly one wins and the other gets
    /// [`RegistryError::DuplicateSystem`]. A creation that fails to bind
    /// releases the name again.
    pub async fn create_system(
        &self,
        name: &str,
        config: SystemConfig,
    ) -> Result<ActorSystem, RegistryError> {
        {
            let mut inner = self.inner.lock();
            if inner.systems.contains_key(name) {
                return Err(RegistryError::DuplicateSystem {
                    name: name.to_string(),
                });
            }
            inner.systems.insert(name.to_string(), Entry::Pending);
        }

        match ActorSystem::new(name, config).await {
            Ok(system) => {
                let mut inner = self.inner.lock();
                inner
                    .systems
                    .insert(name.to_string(), Entry::Ready(system.clone()));
                inner.active = Some(name.to_string());
                tracing::info!(system = name, "system registered");
                Ok(system)
            }
            Err(error) => {
                self.inner.lock().systems.remove(name);
                Err(error.into())
            }
        }
    }

    /// Spawn an actor on the active system under `/user/<name>`.
    pub fn create_actor<A: Actor>(&self, actor: A, name: &str) -> Result<ActorRef, RegistryError> {
        let system = self.active_system().ok_or(RegistryError::NoActiveSystem)?;
        Ok(system.spawn(actor, name)?)
    }

    /// Lazy ref to an actor on another system, anchored to the active system
    /// which will carry its traffic. Touches no network.
    pub fn remote_actor(
        &self,
        system: &str,
        host: &str,
        port: u16,
        path: &str,
    ) -> Result<ActorRef, RegistryError> {
        let anchor = self.active_system().ok_or(RegistryError::NoActiveSystem)?;
        Ok(anchor.remote_ref(system, host, port, path))
    }

    /// Look up a registered system by name.
    pub fn system(&self, name: &str) -> Option<ActorSystem> {
        self.inner
            .lock()
            .systems
            .get(name)
            .and_then(Entry::ready)
            .cloned()
    }

    fn active_system(&self) -> Option<ActorSystem> {
        let inner = self.inner.lock();
        inner
            .active
            .as_ref()
            .and_then(|name| inner.systems.get(name))
            .and_then(Entry::ready)
            .cloned()
    }

    /// Terminate and forget every system this registry created.
    ///
    /// Idempotent; a second call finds an empty registry and does nothing.
    /// Systems created outside the registry are not touched.
    pub async fn shutdown(&self) {
        let systems: Vec<ActorSystem> = {
            let mut inner = self.inner.lock();
            inner.active = None;
            inner
                .systems
                .drain()
                .filter_map(|(_, entry)| match entry {
                    Entry::Ready(system) => Some(system),
                    Entry::Pending => None,
                })
                .collect()
        };
        futures::future::join_all(systems.iter().map(|system| system.terminate())).await;
    }
}
