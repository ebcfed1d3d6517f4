//! OpenAI-compatible chat completion types
//!
//! Requests are typed only as far as routing needs; everything else rides
//! along in passthrough maps so the forwarded body matches what the client
//! sent apart from `model`.

pub mod message;
pub mod request;
pub mod response;
pub mod stream;

pub use message::{Content, ContentPart, Message, Role};
pub use request::ChatCompletionRequest;
pub use response::{CHARS_PER_TOKEN, Usage, approx_tokens, completion_text_chars, delta_text_chars, relabel_model};
pub use stream::StreamEvent;
