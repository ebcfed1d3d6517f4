use serde_json::Value;

/// One unit of a streamed completion
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A parsed chunk object
    Chunk(Value),
    /// The backend signalled the end of the stream
    Done,
}
