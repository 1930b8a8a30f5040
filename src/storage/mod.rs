use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio::fs;

use crate::distro::Distribution;
use crate::modconfig::{ModConfigStore, ModConfiguration, ServerConfig};

/// On-disk launcher configuration. Keys this crate does not manage are kept verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LauncherConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_server: Option<String>,
    #[serde(default)]
    pub authentication_database: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "deserialize_mod_configurations")]
    pub mod_configurations: Vec<ModConfiguration>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Keep every well-formed server entry; anything else is dropped like stale state.
fn deserialize_mod_configurations<'de, D>(deserializer: D) -> Result<Vec<ModConfiguration>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries,
        Value::Null => return Ok(Vec::new()),
        other => {
            warn!("config: discarding malformed mod configurations: {other}");
            return Ok(Vec::new());
        }
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<ModConfiguration>(entry) {
            Ok(configuration) => Some(configuration),
            Err(err) => {
                warn!("config: discarding malformed server configuration: {err}");
                None
            }
        })
        .collect())
}

pub struct ConfigStore {
    path: PathBuf,
    config: LauncherConfig,
    first_launch: bool,
}

impl ConfigStore {
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, String> {
        let path = path.into();
        let (config, first_launch) = match fs::read(&path).await {
            Ok(bytes) => {
                let config = serde_json::from_slice(&bytes)
                    .map_err(|e| format!("failed to parse launcher config: {e}"))?;
                (config, false)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("config: no file at {}, starting fresh", path.display());
                (LauncherConfig::default(), true)
            }
            Err(err) => return Err(format!("failed to read launcher config: {err}")),
        };
        Ok(Self {
            path,
            config,
            first_launch,
        })
    }

    pub async fn save(&self) -> Result<(), String> {
        let bytes = serde_json::to_vec_pretty(&self.config)
            .map_err(|e| format!("failed to serialize launcher config: {e}"))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("failed to create config dir: {e}"))?;
        }
        fs::write(&self.path, &bytes)
            .await
            .map_err(|e| format!("failed to write launcher config: {e}"))?;
        debug!("config: saved {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when no configuration file existed at load time.
    pub fn is_first_launch(&self) -> bool {
        self.first_launch
    }

    pub fn has_accounts(&self) -> bool {
        !self.config.authentication_database.is_empty()
    }

    pub fn selected_server(&self) -> Option<&str> {
        self.config.selected_server.as_deref()
    }

    pub fn set_selected_server(&mut self, server_id: Option<String>) {
        self.config.selected_server = server_id;
    }

    /// Point the selection at the main server when the current one is unset or gone.
    ///
    /// Returns true when the selection changed.
    pub fn validate_selected_server(&mut self, distribution: &Distribution) -> bool {
        let still_listed = self
            .selected_server()
            .is_some_and(|id| distribution.server(id).is_some());
        if still_listed {
            return false;
        }
        let fallback = distribution.main_server().map(|s| s.id().to_owned());
        if fallback.as_deref() == self.selected_server() {
            return false;
        }
        info!(
            "config: selected server {:?} replaced by {:?}",
            self.selected_server(),
            fallback
        );
        self.set_selected_server(fallback);
        true
    }

    pub fn mod_configurations(&self) -> &[ModConfiguration] {
        &self.config.mod_configurations
    }
}

impl ModConfigStore for ConfigStore {
    fn get_mod_configuration(&self, server_id: &str) -> Option<&ServerConfig> {
        self.config
            .mod_configurations
            .iter()
            .find(|c| c.id == server_id)
            .map(|c| &c.mods)
    }

    fn set_mod_configurations(&mut self, configurations: Vec<ModConfiguration>) {
        self.config.mod_configurations = configurations;
    }
}
