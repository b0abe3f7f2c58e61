pub mod graph;
pub mod lookup;
pub mod session;

pub use graph::{GraphError, GraphReport, GraphService};
pub use lookup::{is_error_payload, CachedLookupService};
pub use session::{InvestigationSession, SessionRegistry};
