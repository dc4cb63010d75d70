//! API Module
//!
//! HTTP layer for the order service: route configuration and request
//! handlers.

mod handlers;
mod routes;

pub use handlers::AppState;
pub use routes::create_router;
