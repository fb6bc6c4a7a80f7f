//! Remote endpoint address.

use std::fmt;

/// URI scheme of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// `ws://`
    Plain,
    /// `wss://`, with peer certificate verification disabled.
    Secure,
}

impl Scheme {
    /// Scheme prefix without `://`.
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Plain => "ws",
            Scheme::Secure => "wss",
        }
    }
}

/// Immutable address of the remote worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    scheme: Scheme,
    host: String,
    port: u16,
}

impl Endpoint {
    /// Create an endpoint. `secure` selects `wss://`.
    pub fn new(host: impl Into<String>, port: u16, secure: bool) -> Self {
        Self {
            scheme: if secure { Scheme::Secure } else { Scheme::Plain },
            host: host.into(),
            port,
        }
    }

    #[inline]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[inline]
    pub fn is_secure(&self) -> bool {
        self.scheme == Scheme::Secure
    }

    /// Full WebSocket URI, e.g. `ws://localhost:9000`.
    pub fn uri(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme.as_str(), self.host, self.port)
    }
}
