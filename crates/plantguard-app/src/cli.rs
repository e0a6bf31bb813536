//! Command-line arguments for the PlantGuard server.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use plantguard_core::PlantGuardConfig;

const CONFIG_ENV: &str = "PLANTGUARD_CONFIG";
const PORT_ENV: &str = "PLANTGUARD_PORT";

/// PlantGuard - plant disease detection and advisory server.
#[derive(Parser, Debug)]
#[command(name = "plantguard", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Bind address.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Directory holding model.onnx and config.json.
    #[arg(short = 'm', long = "model-dir")]
    pub model_dir: Option<PathBuf>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PLANTGUARD_CONFIG env var > ./plantguard.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var(CONFIG_ENV) {
            if !p.trim().is_empty() {
                return PathBuf::from(p);
            }
        }
        PathBuf::from("plantguard.toml")
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > PLANTGUARD_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var(PORT_ENV) {
            match val.parse::<u16>() {
                Ok(p) => return p,
                Err(_) => tracing::warn!(value = %val, "Ignoring unparsable {}", PORT_ENV),
            }
        }
        config_port
    }

    /// Overlay the command-line values onto a loaded config.
    pub fn apply(&self, config: &mut PlantGuardConfig) {
        config.server.port = self.resolve_port(config.server.port);
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(ref level) = self.log_level {
            config.server.log_level = level.clone();
        }
        if let Some(ref dir) = self.model_dir {
            config.classifier.model_dir = dir.to_string_lossy().to_string();
        }
    }
}
