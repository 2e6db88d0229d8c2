mod loader;

pub use loader::{CacheConfig, Config, DaemonConfig, LocalConfig, LrclibConfig, SourcesConfig};
