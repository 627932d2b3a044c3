use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::net::NetAddr;
use crate::path::ActorPath;

/// Fully qualified actor address: system name, optional network authority,
/// actor path.
/// Format: scheme://[system@host:port | system]/path
/// Examples:
/// - telegraph://LocalSystem/user/localActor (no network authority)
/// - telegraph.tcp://RemoteSystem@10.0.3.7:5050/user/remoteActor
///
/// The uri is the whole identity of a reference: two refs pointing at the
/// same uri are interchangeable no matter how or where they were created.
#[derive(Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ActorUri {
    /// Name of the owning actor system
    pub system: String,
    /// Where the owning system listens, if it is network-reachable
    pub authority: Option<NetAddr>,
    /// Path of the actor within its system
    pub path: ActorPath,
}

impl ActorUri {
    const LOCAL_SCHEME: &'static str = "telegraph";
    const TCP_SCHEME: &'static str = "telegraph.tcp";

    pub fn local(system: impl Into<String>, path: ActorPath) -> Self {
        Self {
            system: system.into(),
            authority: None,
            path,
        }
    }

    pub fn remote(
        system: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        path: ActorPath,
    ) -> Self {
        Self {
            system: system.into(),
            authority: Some(NetAddr::new(host, port)),
            path,
        }
    }

    /// True when the uri carries a network authority.
    pub fn is_network(&self) -> bool {
        self.authority.is_some()
    }
}

impl fmt::Display for ActorUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.authority {
            None => write!(f, "{}://{}{}", Self::LOCAL_SCHEME, self.system, self.path),
            Some(addr) => write!(
                f,
                "{}://{}@{}{}",
                Self::TCP_SCHEME,
                self.system,
                addr,
                self.path
            ),
        }
    }
}

impl fmt::Debug for ActorUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UriError {
    #[error("Invalid uri: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid scheme: {0}")]
    InvalidScheme(String),
    #[error("Missing system name")]
    MissingSystem,
    #[error("Missing host:port authority")]
    MissingAuthority,
}

impl FromStr for ActorUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s)?;

        match url.scheme() {
            Self::LOCAL_SCHEME => {
                // telegraph://<system>/<path>: the system name sits in the
                // host position since there is no network authority.
                let system = url.host_str().ok_or(UriError::MissingSystem)?;
                Ok(ActorUri::local(system, ActorPath::from(url.path())))
            }
            Self::TCP_SCHEME => {
                let system = url.username();
                if system.is_empty() {
                    return Err(UriError::MissingSystem);
                }
                let host = url.host_str().ok_or(UriError::MissingAuthority)?;
                let port = url.port().ok_or(UriError::MissingAuthority)?;
                Ok(ActorUri::remote(
                    system,
                    host,
                    port,
                    ActorPath::from(url.path()),
                ))
            }
            other => Err(UriError::InvalidScheme(other.to_string())),
        }
    }
}
