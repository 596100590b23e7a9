pub mod runtime;
pub mod watch;

pub use runtime::RuntimeSettings;
pub use watch::{load_config_default, load_config_from, FeedSpec, ReleaseSpec, WatchConfig};
