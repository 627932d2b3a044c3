//! Commonly used types and traits.
//!
//! This module re-exports the user-facing surface of the crate. Import it to
//! get started with systems, registries and relays.

pub use super::actor::{
    Actor,       // Core actor trait
    async_trait, // Async trait macro
};
pub use super::config::{
    LogLevel,     // Filter level hint carried by configs
    SystemConfig, // Per-system configuration
};
pub use super::context::Context; // Actor context during message handling
pub use super::message::Message; // The closed message protocol
pub use super::net::NetAddr; // Host:port pair, resolved lazily
pub use super::path::ActorPath; // Hierarchical actor path
pub use super::refs::ActorRef; // Location-transparent actor handle
pub use super::registry::{
    Registry,      // Process-wide system registry
    RegistryError, // Errors going through the registry
};
pub use super::relay::RelayActor; // Sender-preserving relay actor
pub use super::system::{
    ActorSystem, // A named actor system
    Lifecycle,   // System lifecycle states
    SystemError, // System-level errors
};
pub use super::uri::{
    ActorUri, // Fully qualified actor address
    UriError, // Uri parse errors
};
