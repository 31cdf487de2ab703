use super::error::ReadinessError;
use std::fmt;
use std::str::FromStr;

/// What sits behind a probed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    Tcp,
    Cache,
    Database,
}

impl ProbeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::Tcp => "tcp",
            ProbeKind::Cache => "cache",
            ProbeKind::Database => "database",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProbeKind {
    type Err = ReadinessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tcp" => Ok(ProbeKind::Tcp),
            "cache" | "redis" => Ok(ProbeKind::Cache),
            "database" | "db" | "mongodb" => Ok(ProbeKind::Database),
            other => Err(ReadinessError::Config(format!("unknown probe kind: {}", other))),
        }
    }
}

/// A `host:port` endpoint the gate waits for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProbeTarget {
    kind: ProbeKind,
    address: String,
}

impl ProbeTarget {
    pub fn new(kind: ProbeKind, address: impl Into<String>) -> Self {
        Self {
            kind,
            address: address.into(),
        }
    }

    pub fn tcp(address: impl Into<String>) -> Self {
        Self::new(ProbeKind::Tcp, address)
    }

    pub fn cache(address: impl Into<String>) -> Self {
        Self::new(ProbeKind::Cache, address)
    }

    pub fn database(address: impl Into<String>) -> Self {
        Self::new(ProbeKind::Database, address)
    }

    pub fn kind(&self) -> ProbeKind {
        self.kind
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.address)
    }
}

/// Parses `kind:host:port` resources; a bare `host:port` is a plain TCP target.
impl FromStr for ProbeTarget {
    type Err = ReadinessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, address) = match s.split_once(':') {
            Some((prefix, rest))
                if rest.contains(':') && prefix.chars().all(|c| c.is_ascii_alphabetic()) =>
            {
                (prefix.parse()?, rest)
            }
            _ => (ProbeKind::Tcp, s),
        };

        let port = address
            .rsplit_once(':')
            .filter(|(host, _)| !host.is_empty())
            .and_then(|(_, port)| port.parse::<u16>().ok());

        match port {
            Some(_) => Ok(Self::new(kind, address)),
            None => Err(ReadinessError::Config(format!(
                "probe target '{}' is not of the form [kind:]host:port",
                s
            ))),
        }
    }
}

/// Outcome of one probe attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub target: ProbeTarget,
    pub succeeded: bool,
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn success(target: ProbeTarget) -> Self {
        Self {
            target,
            succeeded: true,
            error: None,
        }
    }

    pub fn failure(target: ProbeTarget, error: impl Into<String>) -> Self {
        Self {
            target,
            succeeded: false,
            error: Some(error.into()),
        }
    }

    /// Placeholder held in a target's slot before its first attempt completes.
    pub fn pending(target: ProbeTarget) -> Self {
        Self::failure(target, "not probed yet")
    }
}
