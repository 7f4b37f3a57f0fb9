//! HTTP serving layer.

pub mod handlers;
pub mod router;
pub mod server;

pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
