mod client;
pub mod ntriples;
pub mod sparql_json;


pub use client::{HttpEngineSettings, HttpSparqlEngine, ResponseFormat, single_direct_target};
