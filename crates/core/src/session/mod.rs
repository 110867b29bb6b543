//! Session module - current-user signal and token transport.

mod session_adapter;
mod transport;

pub use session_adapter::SessionAdapter;
pub use transport::{sync_session_to_transport, TokenTransport};
