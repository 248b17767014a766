pub mod cache;
pub mod client;
pub mod extract;
pub mod transport;

pub use cache::RecordCache;
pub use client::{SessionClient, SessionState};
pub use extract::RecordExtractor;
pub use transport::{HttpTransport, SessionTransport};
