mod commands;
mod handlers;

pub use commands::{Cli, USAGE};
pub use handlers::{handle_duplicate, run_duplicate, Outcome};
