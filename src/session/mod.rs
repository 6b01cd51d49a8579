pub mod accumulator;
pub mod controller;
pub mod editor;
pub mod run;
pub mod shape;
pub mod timer;


pub use accumulator::ResultAccumulator;
pub use controller::{QuerySession, SessionSettings};
pub use editor::QueryEditor;
pub use run::{Outcome, RunSnapshot, RunState};
pub use timer::{RunTimer, format_progress};
