pub mod errors;
pub mod http;
pub mod stream;
pub mod traits;
pub mod types;


pub use errors::EngineError;
pub use stream::{ItemSender, ItemStream, StreamChannel, StreamItem};
pub use traits::{QueryEngine, ResultHandle, ResultKind};
pub use types::{Binding, Quad, Term};
