//! Event-to-state projection.
//!
//! [`Projector::apply`] folds one decoded raw event into the derived tables
//! through the caller's [`stakescan_store::UnitOfWork`]. Handlers read and
//! validate everything they need before the first write, so an event that
//! fails leaves the unit untouched and the caller may carry on with the
//! next event.

mod accounts;
mod amounts;
mod nodes;
mod redemptions;

pub mod error;
pub mod projector;

pub use error::ProjectionError;
pub use projector::{Applied, Projector};
