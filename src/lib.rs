pub mod app;
pub mod cli;
pub mod environment;
pub mod errors;
pub mod loader;
pub mod logger;
pub mod registry;
pub mod reporting;
pub mod session;
pub mod utils;
