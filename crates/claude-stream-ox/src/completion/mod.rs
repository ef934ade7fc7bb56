//! The legacy text-completion endpoint.

pub mod request;
pub mod response;
pub mod state;

pub use request::CompletionRequest;
pub use response::CompletionResponse;
pub use state::{CompletionEventKind, CompletionState};
