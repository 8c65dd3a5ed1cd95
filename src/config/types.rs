use serde::{Deserialize, Serialize};

use crate::billing::{SchedulerTuning, TariffDefinition};

/// User configuration, stored as TOML at ~/.parkmeter/config.toml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the iOS shortcut that turns a reminder handoff into a
    /// system-level alert.
    pub shortcut_name: String,
    /// Reminder scheduling constants.
    pub tuning: SchedulerTuning,
    /// Extra lots layered over the built-in catalog; a lot with a built-in
    /// id replaces that lot.
    pub lots: Vec<TariffDefinition>,
}
