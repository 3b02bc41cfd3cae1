use std::env;
use std::net::SocketAddr;
use tracing::info;

use crate::error::{Error, Result};
use crate::project::ProjectId;

pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_DEMO_PROJECT_ID: &str = "STEzHcB1rALV";
pub const DEFAULT_EXPORT_MAX_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub demo_project_id: ProjectId,
    /// Request body limit for the export endpoint.
    pub export_max_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup("SWETRIX_VIEW_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr
            .parse()
            .map_err(|_| Error::Config(format!("SWETRIX_VIEW_ADDR '{}' is not a socket address", addr)))?;

        let demo = lookup("DEMO_PROJECT_ID").unwrap_or_else(|| DEFAULT_DEMO_PROJECT_ID.to_string());
        let demo_project_id = ProjectId::parse(&demo)
            .map_err(|_| Error::Config(format!("DEMO_PROJECT_ID '{}' is not a project id", demo)))?;

        let export_max_bytes = match lookup("EXPORT_MAX_BYTES") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("EXPORT_MAX_BYTES '{}' is not a number", raw)))?,
            None => DEFAULT_EXPORT_MAX_BYTES,
        };

        let config = Self {
            addr,
            demo_project_id,
            export_max_bytes,
        };
        info!("Loaded configuration: {:?}", config);
        Ok(config)
    }
}
