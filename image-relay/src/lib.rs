pub mod cli;
pub mod cloudinary;
pub mod error;
pub mod intake;
pub mod load_config;
pub mod server;

pub use cli::{run, Cli};
