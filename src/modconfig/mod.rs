use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::distro::{Distribution, Module, Server};

/// Enablement state persisted for every top-level trackable module of one server.
pub type ServerConfig = BTreeMap<String, ConfigValue>;

/// Persisted selection state for a single module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// The module has no trackable sub-modules.
    Flag(bool),
    /// The module has trackable sub-modules. `value` is only recorded for optional modules.
    Group {
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<bool>,
        mods: BTreeMap<String, ConfigValue>,
    },
}

impl ConfigValue {
    /// Decode a stored value, discarding anything that is neither a boolean nor a group.
    ///
    /// Malformed children are dropped individually so the rest of the group survives.
    pub fn from_json(raw: &Value) -> Option<Self> {
        match raw {
            Value::Bool(enabled) => Some(ConfigValue::Flag(*enabled)),
            Value::Object(obj) => {
                let mods = match obj.get("mods") {
                    None => BTreeMap::new(),
                    Some(Value::Object(children)) => decode_entries(children),
                    Some(_) => return None,
                };
                Some(ConfigValue::Group {
                    value: obj.get("value").and_then(Value::as_bool),
                    mods,
                })
            }
            _ => None,
        }
    }

    fn is_required_group(&self) -> bool {
        matches!(self, ConfigValue::Group { value: None, .. })
    }
}

/// Deserialize a [`ServerConfig`], skipping entries whose stored shape is unusable.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<ServerConfig, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    match raw.as_object() {
        Some(entries) => Ok(decode_entries(entries)),
        None => {
            if !raw.is_null() {
                warn!("config: discarding malformed mod configuration: {raw}");
            }
            Ok(ServerConfig::new())
        }
    }
}

fn decode_entries(entries: &serde_json::Map<String, Value>) -> BTreeMap<String, ConfigValue> {
    entries
        .iter()
        .filter_map(|(id, raw)| match ConfigValue::from_json(raw) {
            Some(value) => Some((id.clone(), value)),
            None => {
                warn!("config: discarding malformed mod entry {id}: {raw}");
                None
            }
        })
        .collect()
}

/// Reconciled configuration for one server, as stored by the launcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModConfiguration {
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub mods: ServerConfig,
}

/// Read/replace-all access to stored mod configurations.
pub trait ModConfigStore {
    fn get_mod_configuration(&self, server_id: &str) -> Option<&ServerConfig>;
    fn set_mod_configurations(&mut self, configurations: Vec<ModConfiguration>);
}

fn trackable(modules: &[Module]) -> impl Iterator<Item = &Module> {
    modules.iter().filter(|m| m.kind().is_trackable())
}

/// Compute the configuration a module gets when the user never touched it.
///
/// Returns `None` for required modules without trackable descendants; those are
/// never recorded.
pub fn build_default(module: &Module) -> Option<ConfigValue> {
    let required = module.required();
    if required.is_required() && !module.has_sub_modules() {
        return None;
    }

    let mods: BTreeMap<String, ConfigValue> = trackable(module.sub_modules())
        .filter_map(|sub| build_default(sub).map(|v| (sub.versionless_id().to_owned(), v)))
        .collect();

    if !mods.is_empty() {
        let value = (!required.is_required()).then(|| required.is_default());
        Some(ConfigValue::Group { value, mods })
    } else if required.is_required() {
        None
    } else {
        Some(ConfigValue::Flag(required.is_default()))
    }
}

/// Carry the user's previous choices for a module over into its fresh default shape.
pub fn merge(old: &ConfigValue, fresh: ConfigValue, fresh_is_required: bool) -> ConfigValue {
    match (old, fresh) {
        (ConfigValue::Flag(enabled), ConfigValue::Flag(_)) => ConfigValue::Flag(*enabled),
        (ConfigValue::Flag(enabled), ConfigValue::Group { mods, .. }) => ConfigValue::Group {
            value: (!fresh_is_required).then_some(*enabled),
            mods,
        },
        (ConfigValue::Group { value, .. }, ConfigValue::Flag(_)) => {
            ConfigValue::Flag(value.unwrap_or(true))
        }
        (
            ConfigValue::Group {
                value: old_value,
                mods: old_mods,
            },
            ConfigValue::Group { mods, .. },
        ) => {
            let mods = mods
                .into_iter()
                .map(|(id, fresh_child)| {
                    let merged = match old_mods.get(&id) {
                        Some(old_child) => {
                            let child_required = fresh_child.is_required_group();
                            merge(old_child, fresh_child, child_required)
                        }
                        None => fresh_child,
                    };
                    (id, merged)
                })
                .collect();
            ConfigValue::Group {
                value: (!fresh_is_required).then(|| old_value.unwrap_or(true)),
                mods,
            }
        }
    }
}

/// Produce the configuration for every trackable top-level module of `server`.
pub fn reconcile_server(server: &Server, old: Option<&ServerConfig>) -> ServerConfig {
    trackable(server.modules())
        .filter_map(|module| {
            let id = module.versionless_id();
            let fresh = build_default(module)?;
            let value = match old.and_then(|cfg| cfg.get(id)) {
                Some(previous) => merge(previous, fresh, module.required().is_required()),
                None => {
                    debug!("sync: {}: new entry for {id}", server.id());
                    fresh
                }
            };
            Some((id.to_owned(), value))
        })
        .collect()
}

/// Reconcile every server of the distribution against the stored configurations.
///
/// Servers missing from `distribution` get no entry, so replacing the store's
/// contents with the result drops them.
pub fn sync_mod_configurations<S>(distribution: &Distribution, store: &S) -> Vec<ModConfiguration>
where
    S: ModConfigStore + ?Sized,
{
    let synced: Vec<ModConfiguration> = distribution
        .servers()
        .iter()
        .map(|server| {
            let previous = store.get_mod_configuration(server.id());
            if previous.is_none() {
                debug!("sync: {}: no stored configuration", server.id());
            }
            ModConfiguration {
                id: server.id().to_owned(),
                mods: reconcile_server(server, previous),
            }
        })
        .collect();
    info!("sync: reconciled {} server configuration(s)", synced.len());
    synced
}
