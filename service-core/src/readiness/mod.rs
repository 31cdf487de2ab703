//! Startup readiness gate.
//!
//! The gate holds the application back until every dependency it was given
//! is reachable over TCP and has stayed reachable for a stabilization window,
//! then runs functional checks (cache round-trip, database connect) one after
//! another. Callers decide what to do with a failure; the gate never exits the
//! process itself.
//!
//! ```ignore
//! let gate = ReadinessGate::new(ProbeConfig::default());
//! let targets = [ProbeTarget::database("localhost:27017")];
//! gate.run(&targets, &checks).await?;
//! ```

pub mod check;
pub mod config;
pub mod error;
pub mod gate;
pub mod probe;
pub mod target;

pub use check::{CheckKind, FunctionalCheck, FunctionalChecks};
pub use config::ProbeConfig;
pub use error::ReadinessError;
pub use gate::{GateState, ReadinessGate, await_ready};
pub use probe::{Prober, TcpProber};
pub use target::{ProbeKind, ProbeResult, ProbeTarget};
