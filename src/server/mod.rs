mod handlers;
mod hero;
mod models;
mod state;

pub use handlers::{build_router, run_server};
pub use state::ServerState;
