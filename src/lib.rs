pub mod cli;
pub mod config;
pub mod duplicate;
pub mod error;
pub mod host;
pub mod logging;
pub mod path;
pub mod resolve;

pub use config::DupConfig;
pub use duplicate::{CopyStrategy, DuplicateReport, Duplicator};
pub use error::{NotedupError, Result};
pub use host::{MemoryHost, NotesHost, OsascriptHost};
pub use path::FolderPath;
pub use resolve::{resolve_folder, ResolveStrategy};
