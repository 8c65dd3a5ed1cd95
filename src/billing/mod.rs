pub mod calculator;
pub mod catalog;
pub mod reminders;
pub mod types;

pub use calculator::{calculate_fee, current_period_label, format_elapsed};
pub use catalog::{CatalogError, TariffCatalog};
pub use reminders::{
    compute_reminders, compute_reminders_with, plan_reminders, DefaultStyle, ReminderSlot,
    ReminderStyle, SchedulerTuning,
};
pub use types::{
    ReminderEvent, ReminderPolicy, SegmentSpan, TariffDefinition, TariffSegment, Yuan,
};
