use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub logging: LoggingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub examples: Vec<ExampleQuery>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    pub stdout_level: String,
    pub file_level: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    /// Run timer sampling interval while a query is running
    #[serde(default = "default_timer_tick_ms")]
    pub timer_tick_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timer_tick_ms: default_timer_tick_ms(),
        }
    }
}

fn default_timer_tick_ms() -> u64 {
    100
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_accept")]
    pub accept: String,
    /// Capacity of the channel between a streaming response body and the session
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept: default_accept(),
            stream_buffer: default_stream_buffer(),
        }
    }
}

fn default_user_agent() -> String {
    concat!("fed_sparql/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_accept() -> String {
    "application/sparql-results+json, application/n-triples;q=0.9".to_string()
}

fn default_stream_buffer() -> usize {
    256
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub shortname: String,
    /// "sparql" or "compound"
    #[serde(rename = "type")]
    pub kind: String,
    pub endpoint: Option<String>,
    pub sparql_endpoint: Option<String>,
    pub tpf_endpoint: Option<String>,
    /// Selected when the console starts
    #[serde(default)]
    pub selected: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExampleQuery {
    pub name: String,
    pub query: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

use std::env;

pub fn load_settings() -> Result<Settings, config::ConfigError> {
    let config_path = env::var("FEDSPARQL_CONFIG").unwrap_or_else(|_| "config".to_string());
    load_settings_from(&config_path)
}

pub fn load_settings_from(config_path: &str) -> Result<Settings, config::ConfigError> {
    let settings: Settings = config::Config::builder()
        .add_source(config::File::with_name(config_path))
        .build()?
        .try_deserialize()?;

    Ok(settings)
}
