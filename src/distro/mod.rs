use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::util::versionless_id;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distribution {
    pub version: String,
    #[serde(default)]
    pub rss: Option<String>,
    #[serde(default)]
    pub servers: Vec<Server>,
}

impl Distribution {
    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub fn server(&self, id: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.id == id)
    }

    /// The server flagged as main, falling back to the first listed one.
    pub fn main_server(&self) -> Option<&Server> {
        self.servers
            .iter()
            .find(|s| s.is_main_server())
            .or_else(|| self.servers.first())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub minecraft_version: Option<String>,
    #[serde(default)]
    pub main_server: bool,
    #[serde(default)]
    pub autoconnect: bool,
    #[serde(default)]
    pub modules: Vec<Module>,
}

impl Server {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn is_main_server(&self) -> bool {
        self.main_server
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleType {
    Library,
    ForgeHosted,
    Forge,
    LiteLoader,
    ForgeMod,
    LiteMod,
    File,
    VersionManifest,
    #[serde(other)]
    Other,
}

impl ModuleType {
    /// Module kinds whose enablement is persisted in the mod configuration.
    pub fn is_trackable(self) -> bool {
        matches!(
            self,
            ModuleType::ForgeMod | ModuleType::LiteMod | ModuleType::LiteLoader
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Required {
    #[serde(default = "default_true")]
    pub value: bool,
    #[serde(default = "default_true")]
    pub def: bool,
}

impl Default for Required {
    fn default() -> Self {
        Self {
            value: true,
            def: true,
        }
    }
}

impl Required {
    pub fn is_required(self) -> bool {
        self.value
    }

    /// Factory-default enablement; only meaningful for optional modules.
    pub fn is_default(self) -> bool {
        self.def
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, rename = "MD5")]
    pub md5: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ModuleType,
    #[serde(default)]
    pub required: Required,
    #[serde(default)]
    pub artifact: Option<Artifact>,
    #[serde(default)]
    pub sub_modules: Option<Vec<Module>>,
}

impl Module {
    pub fn kind(&self) -> ModuleType {
        self.kind
    }

    pub fn required(&self) -> Required {
        self.required
    }

    pub fn versionless_id(&self) -> &str {
        versionless_id(&self.id)
    }

    pub fn has_sub_modules(&self) -> bool {
        self.sub_modules.as_ref().is_some_and(|subs| !subs.is_empty())
    }

    pub fn sub_modules(&self) -> &[Module] {
        self.sub_modules.as_deref().unwrap_or_default()
    }
}

pub async fn load_distribution(path: &Path) -> Result<Distribution, String> {
    debug!("distro: reading index from {}", path.display());
    let bytes = fs::read(path)
        .await
        .map_err(|e| format!("failed to read distribution index: {e}"))?;
    let distribution = parse_distribution(&bytes)?;
    info!(
        "distro: loaded index {} with {} server(s)",
        distribution.version,
        distribution.servers.len()
    );
    Ok(distribution)
}

pub fn parse_distribution(bytes: &[u8]) -> Result<Distribution, String> {
    serde_json::from_slice(bytes).map_err(|e| format!("failed to parse distribution index: {e}"))
}

fn default_true() -> bool {
    true
}
