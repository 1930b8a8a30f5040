use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use crate::distro::Distribution;
use crate::engine::state::{AppState, LauncherEvent, Overlay, View};
use crate::modconfig::{self, ModConfigStore, ModConfiguration};
use crate::storage::ConfigStore;

pub mod state;

pub struct SyncEngine {
    pub state: AppState,
    store: ConfigStore,
    current_view: Option<View>,
    distribution_loaded: bool,
    persist: bool,
}

impl SyncEngine {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            state: AppState::Loading,
            store,
            current_view: None,
            distribution_loaded: false,
            persist: true,
        }
    }

    /// Reconcile without writing the configuration file back.
    pub fn dry_run(mut self) -> Self {
        self.persist = false;
        self
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn current_view(&self) -> Option<View> {
        self.current_view
    }

    pub async fn handle_event(
        &mut self,
        event: LauncherEvent,
        updates: &mpsc::UnboundedSender<AppState>,
    ) {
        match event {
            LauncherEvent::DistributionIndexDone(Ok(distribution)) => {
                info!("event: DistributionIndexDone (index {})", distribution.version);
                if let Err(err) = self.sync(&distribution).await {
                    self.publish(AppState::Error(err), updates);
                    error!("sync failed: {}", self.error_summary());
                    return;
                }
                self.distribution_loaded = true;
                let view = View::initial(self.store.is_first_launch(), self.store.has_accounts());
                self.current_view = Some(view);
                self.publish(AppState::Showing(view), updates);
                info!("showing {:?}", view);
            }
            LauncherEvent::DistributionIndexDone(Err(err)) => {
                error!("event: distribution index unavailable: {err}");
                self.publish(AppState::Overlay(Overlay::fatal_startup_error()), updates);
            }
            LauncherEvent::DistributionRefreshed(distribution) => {
                info!("event: DistributionRefreshed (index {})", distribution.version);
                match self.sync(&distribution).await {
                    Ok(_) => self.distribution_loaded = true,
                    Err(err) => {
                        self.publish(AppState::Error(err), updates);
                        error!("refresh sync failed: {}", self.error_summary());
                    }
                }
            }
            LauncherEvent::CachedDistribution if !self.distribution_loaded => {
                debug!("event: cached distribution notice skipped, no index loaded");
            }
            LauncherEvent::CachedDistribution => {
                warn!("event: running from a cached distribution index");
                self.publish(AppState::Overlay(Overlay::cached_distribution()), updates);
            }
            LauncherEvent::SwitchView(view) => {
                info!("event: SwitchView {:?} -> {:?}", self.current_view, view);
                self.current_view = Some(view);
                self.publish(AppState::Showing(view), updates);
            }
        }
    }

    /// Reconcile all servers against the stored configuration and persist the result.
    pub async fn sync(&mut self, distribution: &Distribution) -> Result<Vec<ModConfiguration>, String> {
        let synced = modconfig::sync_mod_configurations(distribution, &self.store);
        self.store.set_mod_configurations(synced.clone());
        self.store.validate_selected_server(distribution);
        if self.persist {
            self.store.save().await?;
            info!("sync: saved configuration to {}", self.store.path().display());
        }
        Ok(synced)
    }

    fn publish(&mut self, state: AppState, updates: &mpsc::UnboundedSender<AppState>) {
        self.state = state.clone();
        updates.send(state).ok();
    }

    fn error_summary(&self) -> String {
        match &self.state {
            AppState::Error(msg) => msg.clone(),
            _ => "unknown error".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distro::parse_distribution;
    use crate::modconfig::ConfigValue;
    use tempfile::TempDir;

    const INDEX: &str = r#"{
        "version": "2.0",
        "servers": [
            {
                "id": "main",
                "name": "Main",
                "modules": [
                    { "id": "x:optional:1.0", "name": "Opt", "type": "ForgeMod",
                      "required": { "value": false, "def": false } },
                    { "id": "x:core:1.0", "name": "Core", "type": "ForgeMod" }
                ]
            }
        ]
    }"#;

    async fn engine_with(contents: Option<&str>) -> (SyncEngine, std::path::PathBuf, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("launcher").join("config.json");
        if let Some(contents) = contents {
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, contents).unwrap();
        }
        let store = ConfigStore::load(&path).await.unwrap();
        (SyncEngine::new(store), path, dir)
    }

    #[tokio::test]
    async fn first_launch_syncs_and_shows_welcome() {
        let (mut engine, path, _dir) = engine_with(None).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let distro = parse_distribution(INDEX.as_bytes()).unwrap();

        engine
            .handle_event(LauncherEvent::DistributionIndexDone(Ok(distro)), &tx)
            .await;

        assert_eq!(rx.try_recv().unwrap(), AppState::Showing(View::Welcome));
        assert_eq!(engine.current_view(), Some(View::Welcome));
        assert_eq!(engine.store().selected_server(), Some("main"));
        let saved: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(
            saved["modConfigurations"][0]["mods"],
            serde_json::json!({ "x:optional": false })
        );
    }

    #[tokio::test]
    async fn keeps_choices_and_drops_retired_servers() {
        let (mut engine, _, _dir) = engine_with(Some(
            r#"{
                "selectedServer": "main",
                "authenticationDatabase": { "u": {} },
                "modConfigurations": [
                    { "id": "main", "mods": { "x:optional": true, "x:gone": false } },
                    { "id": "retired", "mods": { "y:z": true } }
                ]
            }"#,
        ))
        .await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let distro = parse_distribution(INDEX.as_bytes()).unwrap();

        engine
            .handle_event(LauncherEvent::DistributionIndexDone(Ok(distro)), &tx)
            .await;

        assert_eq!(rx.try_recv().unwrap(), AppState::Showing(View::Landing));
        let store = engine.store();
        assert!(store.get_mod_configuration("retired").is_none());
        let main = store.get_mod_configuration("main").unwrap();
        assert_eq!(main.get("x:optional"), Some(&ConfigValue::Flag(true)));
        assert!(!main.contains_key("x:gone"));
        assert!(!main.contains_key("x:core"));
    }

    #[tokio::test]
    async fn no_accounts_shows_login() {
        let (mut engine, _, _dir) = engine_with(Some("{}")).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let distro = parse_distribution(INDEX.as_bytes()).unwrap();

        engine
            .handle_event(LauncherEvent::DistributionIndexDone(Ok(distro)), &tx)
            .await;
        assert_eq!(rx.try_recv().unwrap(), AppState::Showing(View::Login));
    }

    #[tokio::test]
    async fn missing_index_raises_fatal_overlay() {
        let (mut engine, path, _dir) = engine_with(None).await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        engine
            .handle_event(
                LauncherEvent::DistributionIndexDone(Err("offline".into())),
                &tx,
            )
            .await;

        assert_eq!(
            rx.try_recv().unwrap(),
            AppState::Overlay(Overlay::fatal_startup_error())
        );
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn cached_notice_needs_a_loaded_index() {
        let (mut engine, _, _dir) = engine_with(None).await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        engine
            .handle_event(
                LauncherEvent::DistributionIndexDone(Err("offline".into())),
                &tx,
            )
            .await;
        engine
            .handle_event(LauncherEvent::CachedDistribution, &tx)
            .await;
        assert_eq!(
            rx.try_recv().unwrap(),
            AppState::Overlay(Overlay::fatal_startup_error())
        );
        assert!(rx.try_recv().is_err());
        assert_eq!(engine.state, AppState::Overlay(Overlay::fatal_startup_error()));

        let distro = parse_distribution(INDEX.as_bytes()).unwrap();
        engine
            .handle_event(LauncherEvent::DistributionIndexDone(Ok(distro)), &tx)
            .await;
        engine
            .handle_event(LauncherEvent::CachedDistribution, &tx)
            .await;
        assert_eq!(rx.try_recv().unwrap(), AppState::Showing(View::Welcome));
        assert_eq!(
            rx.try_recv().unwrap(),
            AppState::Overlay(Overlay::cached_distribution())
        );
    }

    #[tokio::test]
    async fn dry_run_does_not_write() {
        let (engine, path, _dir) = engine_with(None).await;
        let mut engine = engine.dry_run();
        let distro = parse_distribution(INDEX.as_bytes()).unwrap();

        let synced = engine.sync(&distro).await.unwrap();
        assert_eq!(synced.len(), 1);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn refresh_and_view_switches_publish_state() {
        let (mut engine, _, _dir) = engine_with(None).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let distro = parse_distribution(INDEX.as_bytes()).unwrap();

        engine
            .handle_event(LauncherEvent::DistributionRefreshed(distro), &tx)
            .await;
        assert!(rx.try_recv().is_err());
        assert!(engine.store().get_mod_configuration("main").is_some());

        engine
            .handle_event(LauncherEvent::SwitchView(View::Settings), &tx)
            .await;
        assert_eq!(rx.try_recv().unwrap(), AppState::Showing(View::Settings));

        engine
            .handle_event(LauncherEvent::CachedDistribution, &tx)
            .await;
        assert_eq!(
            rx.try_recv().unwrap(),
            AppState::Overlay(Overlay::cached_distribution())
        );
    }

    #[test]
    fn initial_view_rules() {
        assert_eq!(View::initial(true, true), View::Welcome);
        assert_eq!(View::initial(false, true), View::Landing);
        assert_eq!(View::initial(false, false), View::Login);
        assert_eq!(View::Landing.container_id(), "#landingContainer");
    }
}
