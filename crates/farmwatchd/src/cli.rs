//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use farmwatch_core::View;
use farmwatch_core::model::SettingsPatch;

#[derive(Debug, Parser)]
#[command(name = "farmwatchd")]
#[command(author, version, about = "Client and watcher for the Farmwatch security device", long_about = None)]
pub struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Keep views active and log what happens until SIGINT/SIGTERM (default)
    Watch {
        /// Views to activate
        #[arg(
            long,
            value_enum,
            value_delimiter = ',',
            env = "FARMWATCH_VIEWS",
            default_value = "dashboard,live-feed,alerts"
        )]
        views: Vec<ViewArg>,
    },

    /// Poll the device once and print the reconciled system view
    Status,

    /// Arm or disarm the system
    ToggleSystem {
        #[command(flatten)]
        switch: SwitchArgs,
    },

    /// Switch the siren on or off
    ToggleSiren {
        #[command(flatten)]
        switch: SwitchArgs,
    },

    /// Load and print the alert log
    Alerts {
        /// Print at most this many alerts (0 for all)
        #[arg(short, long, default_value = "0")]
        limit: usize,
    },

    /// Wipe the alert log on the device
    ClearAlerts {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show or change the persisted settings
    Settings {
        /// Base URL of the device API
        #[arg(long)]
        api_base_url: Option<String>,

        /// Direct stream URL
        #[arg(long)]
        stream_url: Option<String>,

        /// Background image URL
        #[arg(long)]
        bg_url: Option<String>,

        /// Answer from bundled data instead of the device
        #[arg(long)]
        mock: Option<bool>,
    },

    /// Print the URL the live feed would connect to
    FeedUrl,
}

/// Explicit target state; toggles when neither is given
#[derive(Debug, Clone, Copy, clap::Args)]
pub struct SwitchArgs {
    #[arg(long, conflicts_with = "off")]
    pub on: bool,

    #[arg(long, conflicts_with = "on")]
    pub off: bool,
}

impl SwitchArgs {
    pub fn target(&self) -> Option<bool> {
        match (self.on, self.off) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewArg {
    Dashboard,
    LiveFeed,
    Alerts,
}

impl From<ViewArg> for View {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Dashboard => View::Dashboard,
            ViewArg::LiveFeed => View::LiveFeed,
            ViewArg::Alerts => View::Alerts,
        }
    }
}

/// Build a settings patch from the `settings` flags, `None` when no flag was given
pub fn settings_patch(
    api_base_url: Option<String>,
    stream_url: Option<String>,
    bg_url: Option<String>,
    mock: Option<bool>,
) -> Option<SettingsPatch> {
    let patch = SettingsPatch {
        api_base_url,
        stream_url,
        bg_url,
        mock,
    };
    (!patch.is_empty()).then_some(patch)
}
