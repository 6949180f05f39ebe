//! Configuration: schema, file discovery, and `${ENV_VAR}` substitution.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use loader::{clear_config_dir, discover_and_load, load_config, set_config_dir};
pub use schema::WagateConfig;
