pub mod engine;
pub mod factories;
pub mod session;

pub use engine::{Scripted, ScriptedEngine, Submission};
pub use factories::{BindingFactory, SourceFactory};
pub use session::wait_until;
