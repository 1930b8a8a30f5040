use crate::distro::Distribution;

const RELEASES_URL: &str = "https://github.com/dymensia/DymensiaLauncher/releases";
const DISCORD_URL: &str = "https://discord.gg/dymensia";

// What the launcher should be showing after the last event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppState {
    Loading,
    Showing(View),
    Overlay(Overlay),
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Landing,
    Login,
    #[allow(dead_code)]
    Settings,
    Welcome,
}

impl View {
    /// Container element hosting the view.
    pub fn container_id(self) -> &'static str {
        match self {
            View::Landing => "#landingContainer",
            View::Login => "#loginContainer",
            View::Settings => "#settingsContainer",
            View::Welcome => "#welcomeContainer",
        }
    }

    /// First view shown once the distribution index is available.
    pub fn initial(first_launch: bool, has_accounts: bool) -> Self {
        if first_launch {
            View::Welcome
        } else if has_accounts {
            View::Landing
        } else {
            View::Login
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverlayAction {
    Dismiss,
    OpenExternal(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Overlay {
    pub title: String,
    pub body: String,
    pub accept_label: String,
    pub accept: OverlayAction,
    pub dismiss_label: String,
    pub dismiss: OverlayAction,
}

impl OverlayAction {
    pub fn describe(&self) -> &str {
        match self {
            OverlayAction::Dismiss => "close",
            OverlayAction::OpenExternal(url) => url,
        }
    }
}

impl Overlay {
    pub fn fatal_startup_error() -> Self {
        Self {
            title: "Fatal Error: Unable to Load Distribution Index".into(),
            body: "A connection could not be established to our servers to download the \
                   distribution index. No local copy was available to load. The distribution \
                   index is an essential file which provides the latest server information; \
                   the launcher is unable to start without it. Ensure you are connected to \
                   the internet and relaunch the application."
                .into(),
            accept_label: "Download Latest Release".into(),
            accept: OverlayAction::OpenExternal(RELEASES_URL.into()),
            dismiss_label: "Join our Discord".into(),
            dismiss: OverlayAction::OpenExternal(DISCORD_URL.into()),
        }
    }

    pub fn cached_distribution() -> Self {
        Self {
            title: "Warning: Launching from Cached Distribution".into(),
            body: "We were unable to fetch the latest server information on startup, so a \
                   previously stored version was used instead. Restart the launcher or use \
                   the refresh button on the landing screen to try again."
                .into(),
            accept_label: "Understood".into(),
            accept: OverlayAction::Dismiss,
            dismiss_label: "Join our Discord".into(),
            dismiss: OverlayAction::OpenExternal(DISCORD_URL.into()),
        }
    }
}

// Events the engine reacts to.
#[derive(Clone, Debug)]
pub enum LauncherEvent {
    DistributionIndexDone(Result<Distribution, String>),
    #[allow(dead_code)]
    DistributionRefreshed(Distribution),
    CachedDistribution,
    #[allow(dead_code)]
    SwitchView(View),
}
