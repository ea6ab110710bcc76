// Module declarations for the homeward route-to-home core

// Session control loop and state reconciliation
pub mod core {
    pub mod reconciler;
    pub mod session;
}

// Configuration modules
pub mod config {
    pub mod constants;
    pub mod app_config;
}

// Value types and route model
pub mod models {
    pub mod route;
    pub mod decoration;
}

// Data sources and stores
pub mod data {
    pub mod coordinate;
    pub mod home_store;
    pub mod location;
}

// External services
pub mod services {
    pub mod directions;
}

// Map view boundary
pub mod render {
    pub mod map_view;
}

// Utility functions
pub mod utils {
    pub mod logging;
}

// CLI interface
pub mod cli {
    pub mod cli;
}

// Re-export commonly used types
pub use crate::core::reconciler::{MapState, MapStateReconciler, RouteTicket};
pub use crate::core::session::{MapSession, SessionHandle};
pub use crate::data::coordinate::Coordinate;
pub use crate::models::route::{Path, RouteFailure, RouteRequest, RouteResult};
