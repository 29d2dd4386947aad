pub mod error;
pub mod matching;
pub mod models;
pub mod registry;
pub mod utils;
