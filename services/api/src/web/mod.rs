pub mod auth;
pub mod dto;
pub mod experts;
pub mod middleware;
pub mod payments;
pub mod rest;
pub mod router;
pub mod state;
pub mod students;
pub mod tokens;

// Re-export what the binaries and integration tests wire together.
pub use router::build_router;
pub use state::AppState;
