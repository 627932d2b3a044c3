use serde::{Deserialize, Serialize};
use std::fmt;

/// Hierarchical, location-free actor path.
/// Format: /segment/segment/...
/// Examples:
/// - /user/localActor (application actor)
/// - /user/relay/worker-3 (nested name)
///
/// A path says nothing about where the actor runs; pairing it with a system
/// name and network authority happens in [`crate::uri::ActorUri`].
#[derive(Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ActorPath {
    segments: Vec<String>,
}

impl ActorPath {
    /// Root path `/`.
    pub fn root() -> Self {
        Self { segments: Vec::new() }
    }

    /// Path for a named application actor: `/user/<name>`.
    pub fn user(name: &str) -> Self {
        Self::from(format!("/user/{}", name).as_str())
    }

    /// Last segment of the path, if any.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Lenient parse: leading slash optional, empty segments collapsed.
/// "/user/a", "user/a" and "//user//a" all name the same actor.
impl From<&str> for ActorPath {
    fn from(s: &str) -> Self {
        Self {
            segments: s
                .split('/')
                .filter(|seg| !seg.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

impl fmt::Display for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
