use super::types::Config;
use crate::billing::SchedulerTuning;

impl Default for Config {
    fn default() -> Self {
        Config {
            shortcut_name: "停车提醒".to_string(),
            tuning: SchedulerTuning::default(),
            lots: Vec::new(),
        }
    }
}
