//! STG Runtime
//!
//! Execution core of the graph-reduction machine: interpreter state, the
//! eval/apply driver, primitive operations, configuration and errors.

pub mod config;
pub mod error;
pub mod machine;
pub mod primops;
pub mod state;

pub use config::{ConfigError, MachineConfig};
pub use error::{ErrorKind, HandleKind, Result, StgError};
pub use machine::{Code, Machine};
pub use primops::{PrimCall, PrimOpChain, PrimOpHandler};
pub use state::{ArrayKind, StgState};
