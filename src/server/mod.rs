// Server module entry point
// Provides listener setup, per-connection serving and the accept loop

pub mod connection;
pub mod listener;

// Rust does not allow `loop` as a module name (keyword), so use server_loop
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_reusable_listener;
pub use server_loop::start_server_loop;
