// Remote store - the abstracted REST surface the orchestration layer drives

pub mod error;
pub mod http;
pub mod store;

pub use error::RemoteError;
pub use http::HttpRemoteStore;
pub use store::RemoteStore;
