//! cloudctl Logs - Log catalog, snapshots, archives, and live streaming

mod archive;
mod catalog;
mod filter;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
mod render;
mod session;
mod snapshot;
pub mod transport;

pub use archive::{DownloadTarget, LogArchiveFetcher};
pub use catalog::LogCatalog;
pub use filter::LogFilter;
pub use render::{log_type_colour, server_colour, LineRenderer};
pub use session::{LogStreamSession, SessionState, SessionSummary};
pub use snapshot::LogSnapshotter;
pub use transport::{
    LogConnection, LogTransport, LogstreamTransport, ReconnectPolicy, TransportEvent,
};
