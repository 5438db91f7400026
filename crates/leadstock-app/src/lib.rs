//! leadstock application: configuration, logging and terminal rendering
//! shared by the `leadstock` binary.

pub mod config;
pub mod error;
pub mod logging;
pub mod render;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use logging::init_logging;
pub use render::render;
