pub mod logging;
pub mod progress_callback;
pub mod progress_config;
