//! Transport-neutral request and reply shapes.

mod envelope;

pub use envelope::{InvocationRequest, Operation, decode_capabilities, decode_reply};
