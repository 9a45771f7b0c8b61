/// An encoded credentials blob and the variable it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Hex(String),
    Base64(String),
}

impl CredentialSource {
    /// Hex wins when both encodings are configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        match (&config.credentials_hex, &config.credentials_base64) {
            (Some(hex), Some(_)) => {
                warn!("Both CREDENTIALS_HEX and CREDENTIALS_BASE64 are set, using CREDENTIALS_HEX");
                Some(CredentialSource::Hex(hex.clone()))
            }
            (Some(hex), None) => Some(CredentialSource::Hex(hex.clone())),
            (None, Some(b64)) => Some(CredentialSource::Base64(b64.clone())),
            (None, None) => None,
        }
    }

    pub fn var_name(&self) -> &'static str {
        match self {
            CredentialSource::Hex(_) => "CREDENTIALS_HEX",
            CredentialSource::Base64(_) => "CREDENTIALS_BASE64",
        }
    }

    /// Whitespace (line wrapping from secret stores) is ignored.
    pub fn decode(&self) -> Result<Vec<u8>, BootstrapError> {
        let decoded = match self {
            CredentialSource::Hex(blob) => hex::decode(compact(blob)).map_err(|e| e.to_string()),
            CredentialSource::Base64(blob) => {
                STANDARD.decode(compact(blob)).map_err(|e| e.to_string())
            }
        };
        decoded.map_err(|reason| BootstrapError::Decode {
            var: self.var_name(),
            reason,
        })
    }
}

fn compact(blob: &str) -> String {
    blob.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Decodes the blob and writes it to `path`, replacing any previous file.
pub fn stage_credentials(path: &Path, source: &CredentialSource) -> Result<(), BootstrapError> {
    let bytes = source.decode()?;
    let write_err = |source| BootstrapError::Write {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(write_err)?;
    file.write_all(&bytes).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;

    info!(
        "Wrote {} byte(s) of credentials from {} to {}",
        bytes.len(),
        source.var_name(),
        path.display()
    );
    Ok(())
}

/// Program and arguments used to start the application server.
pub fn server_invocation(config: &Config) -> (String, Vec<String>) {
    let mut args = config.server_args.clone();
    args.push("--bind".to_string());
    args.push(format!("0.0.0.0:{}", config.port));
    args.push("--workers".to_string());
    args.push(config.workers.to_string());
    (config.server_command.clone(), args)
}

/// Runs every startup step and returns the server's exit code.
pub async fn run(config: &Config) -> Result<i32, BootstrapError> {
    match CredentialSource::from_config(config) {
        Some(source) => stage_credentials(&config.credentials_path, &source)?,
        None => info!("No credentials configured, skipping credential staging"),
    }

    let pool = db::connect(&config.database_url)
        .await
        .map_err(BootstrapError::Migration)?;
    db::migrate(&pool).await.map_err(BootstrapError::Migration)?;
    pool.close().await;

    let (program, args) = server_invocation(config);
    info!(
        "Starting {} on port {} with {} worker(s)",
        program, config.port, config.workers
    );

    let status = Command::new(&program)
        .args(&args)
        .env("CREDENTIALS_PATH", &config.credentials_path)
        .status()
        .await
        .map_err(|source| BootstrapError::Launch {
            command: program.clone(),
            source,
        })?;

    if !status.success() {
        warn!("{} exited with {}", program, status);
    }
    Ok(status.code().unwrap_or(1))
}


use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use tokio::process::Command;
use tracing::{info, warn};
use crate::config::Config;
use crate::db;
use crate::error::BootstrapError;
