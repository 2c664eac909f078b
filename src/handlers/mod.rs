pub mod common;
pub mod health;
pub mod stats;
pub mod work_orders;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;
