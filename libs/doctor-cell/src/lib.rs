pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use services::*;
pub use services::availability::{compute_available_slots, shift_week, week_bounds};
