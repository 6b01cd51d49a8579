pub mod engine;
pub mod federation;
pub mod logging;
pub mod session;
pub mod shared;

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
pub mod test_helpers;
