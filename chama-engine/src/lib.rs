//! Pure computation stages of the collection reconciliation engine.
//!
//! Everything in this crate is side-effect free: obligations, aggregation,
//! waterfall allocation, and commission can all be computed speculatively
//! (for a preview) or in parallel per member without coordination.

mod commission;
mod error;
mod meeting;
mod obligation;
mod roster;
mod waterfall;

pub use commission::{commission_for, Commission};
pub use error::{EngineError, EngineResult};
pub use meeting::aggregate;
pub use obligation::{weekly_obligation, Obligation};
pub use roster::{build_entries, RosterRow, ScheduleFault};
pub use waterfall::allocate;
