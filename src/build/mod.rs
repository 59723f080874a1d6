mod clean;
mod core;
pub mod process;
mod watcher;

pub use clean::clean;
pub use core::{Action, BuildOptions, build_project, load_project, needs_regeneration};
pub use watcher::watch;
