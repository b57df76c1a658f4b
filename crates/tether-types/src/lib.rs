pub mod message;
pub mod event;
pub mod project;
pub mod config;
pub mod error;
pub mod session;
pub mod workspace;


pub use error::ClientError;
pub type Result<T> = std::result::Result<T, ClientError>;

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
