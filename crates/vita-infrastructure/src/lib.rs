pub mod config_loader;
pub mod env;

pub use config_loader::load_config;
pub use env::{EnvSource, MapEnv, ProcessEnv};
