//! Basegate Core — shared platform contracts: credential extraction,
//! identity propagation, and operation logging.

pub mod audit;
pub mod auth;
pub mod clock;
pub mod context;

pub use audit::{NullOperationLog, OperationLog, OperationLogRecord, Outcome};
pub use auth::{Credential, ExtractionError, HeaderConvention};
pub use clock::{AuditClock, ClockSource, SystemClock, Timestamp};
pub use context::{Principal, RequestContext};
