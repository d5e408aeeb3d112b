//! Project forecasting domain models.
//!
//! Provides the user-editable data types: tasks with their estimates and
//! actual dates, and the working-day calendar that maps day counts onto
//! real dates.
//!
//! # Domain Mappings
//!
//! | u-forecast | Software | Construction | Events |
//! |------------|----------|--------------|--------|
//! | Task | Ticket | Work package | Booking |
//! | Milestone | Release | Inspection | Opening night |
//! | Estimate | Story sizing | Crew-days | Lead time |
//! | Calendar | Team calendar | Site calendar | Venue calendar |

mod calendar;
mod estimate;
mod task;

pub use calendar::{Calendar, Holiday};
pub use estimate::{Estimate, Unit};
pub use task::{Task, TaskId, TaskKind, TaskStatus};
