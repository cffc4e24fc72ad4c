//! Web layer for the fuel stop planner.
//!
//! Provides HTTP endpoints for planning trips and managing the station
//! catalog.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
