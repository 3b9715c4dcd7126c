pub mod config;
pub mod history;
pub mod progress;

pub use config::{ClientConfig, RetentionPolicy, ServerConfig};
pub use history::{HostHistoryEntry, HostStatus};
pub use progress::{ProgressEvent, Snapshot};
