use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::billing::calculator::calculate_fee;
use crate::billing::types::{ReminderEvent, TariffDefinition, Yuan};

/// Scheduling constants inherited from the original reminder strategy.
/// The values are fixed by convention; they are a value rather than
/// literals so callers can tune them from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerTuning {
    /// Reminders fire this many minutes before the threshold they warn about.
    pub early_warning_minutes: i64,
    /// A cap reminder is only sent when the cap lands this long after the
    /// last regular reminder.
    pub cap_reminder_gap_minutes: i64,
    /// How far the cap search simulates before giving up.
    pub cap_search_bound_minutes: i64,
}

impl Default for SchedulerTuning {
    fn default() -> Self {
        Self {
            early_warning_minutes: 10,
            cap_reminder_gap_minutes: 30,
            cap_search_bound_minutes: 1440,
        }
    }
}

/// One planned reminder, numbers only. Message text is layered on top by a
/// [`ReminderStyle`], so the schedule can be tested without wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderSlot {
    Regular {
        /// Minute of the stay this reminder warns about.
        target_minute: i64,
        /// Minute of the stay the reminder fires at; negative when the
        /// warning lead is longer than the target minute.
        fire_minute: i64,
        current_fee: Yuan,
        /// Fee one more interval later.
        next_fee: Yuan,
        is_final: bool,
    },
    Cap {
        /// First minute at which the fee reaches the cap.
        target_minute: i64,
        fire_minute: i64,
        cap: Yuan,
    },
}

/// Plan the full reminder schedule for a tariff, regular slots first, the
/// optional cap slot last.
pub fn plan_reminders(tariff: &TariffDefinition, tuning: &SchedulerTuning) -> Vec<ReminderSlot> {
    let policy = &tariff.reminder_policy;
    let first = i64::from(policy.first_reminder_minute);
    let interval = i64::from(policy.interval_minutes);
    let max = i64::from(policy.max_reminders);

    let mut slots = Vec::new();

    for i in 0..max {
        let target_minute = first + i * interval;
        slots.push(ReminderSlot::Regular {
            target_minute,
            fire_minute: target_minute - tuning.early_warning_minutes,
            current_fee: calculate_fee(tariff, target_minute),
            next_fee: calculate_fee(tariff, target_minute + interval),
            is_final: i == max - 1,
        });
    }

    if let Some(cap) = tariff.fee_cap {
        if let Some(capping_minute) =
            find_capping_minute(tariff, cap, tuning.cap_search_bound_minutes)
        {
            let last_regular_minute = first + (max - 1) * interval;
            if capping_minute > last_regular_minute + tuning.cap_reminder_gap_minutes {
                slots.push(ReminderSlot::Cap {
                    target_minute: capping_minute,
                    fire_minute: capping_minute - tuning.early_warning_minutes,
                    cap,
                });
            }
        }
    }

    slots
}

/// First whole minute at which the fee reaches the cap, if any within the
/// search bound.
fn find_capping_minute(tariff: &TariffDefinition, cap: Yuan, bound: i64) -> Option<i64> {
    (1..=bound).find(|&minute| calculate_fee(tariff, minute) >= cap)
}

/// Turns a planned slot into notification wording.
pub trait ReminderStyle {
    fn regular(&self, target_minute: i64, current_fee: Yuan, next_fee: Yuan) -> String;
    fn final_notice(&self, target_minute: i64, current_fee: Yuan) -> String;
    fn cap_notice(&self, cap: Yuan) -> String;
}

/// Message wording carried over from the original notification text.
pub struct DefaultStyle;

impl ReminderStyle for DefaultStyle {
    fn regular(&self, target_minute: i64, current_fee: Yuan, next_fee: Yuan) -> String {
        format!(
            "已停{}小时，当前费用{}元，再停1小时会变成{}元",
            target_minute / 60,
            current_fee,
            next_fee
        )
    }

    fn final_notice(&self, target_minute: i64, current_fee: Yuan) -> String {
        format!(
            "已停{}小时，当前费用{}元。⚠️ 这是最后一次提醒，之后不会再打扰你。",
            target_minute / 60,
            current_fee
        )
    }

    fn cap_notice(&self, cap: Yuan) -> String {
        format!(
            "快到{}元封顶了，之后停多久都是{}元，可以放心继续停",
            cap, cap
        )
    }
}

/// Compute the reminder events for a session started at `effective_start`,
/// with default tuning and wording.
pub fn compute_reminders(
    tariff: &TariffDefinition,
    effective_start: DateTime<Utc>,
) -> Vec<ReminderEvent> {
    compute_reminders_with(
        tariff,
        effective_start,
        &SchedulerTuning::default(),
        &DefaultStyle,
    )
}

/// Compute the reminder events for a session started at `effective_start`.
///
/// The sequence is recomputed whole every time; when the effective start
/// time changes, callers drop any previously dispatched schedule and index
/// into the fresh one.
pub fn compute_reminders_with(
    tariff: &TariffDefinition,
    effective_start: DateTime<Utc>,
    tuning: &SchedulerTuning,
    style: &dyn ReminderStyle,
) -> Vec<ReminderEvent> {
    plan_reminders(tariff, tuning)
        .into_iter()
        .map(|slot| match slot {
            ReminderSlot::Regular {
                target_minute,
                fire_minute,
                current_fee,
                next_fee,
                is_final,
            } => ReminderEvent {
                fire_time: effective_start + Duration::minutes(fire_minute),
                message: if is_final {
                    style.final_notice(target_minute, current_fee)
                } else {
                    style.regular(target_minute, current_fee, next_fee)
                },
                is_final,
                is_cap_reminder: false,
            },
            ReminderSlot::Cap {
                fire_minute, cap, ..
            } => ReminderEvent {
                fire_time: effective_start + Duration::minutes(fire_minute),
                message: style.cap_notice(cap),
                is_final: false,
                is_cap_reminder: true,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::types::{ReminderPolicy, SegmentSpan, TariffSegment};
    use chrono::TimeZone;

    fn lot(
        segments: Vec<TariffSegment>,
        fee_cap: Option<Yuan>,
        policy: ReminderPolicy,
    ) -> TariffDefinition {
        TariffDefinition {
            id: 1,
            name: "测试".to_string(),
            description: String::new(),
            segments,
            fee_cap,
            reminder_policy: policy,
        }
    }

    fn free(minutes: u32) -> TariffSegment {
        TariffSegment::Free {
            span: SegmentSpan::Minutes(minutes),
            label: "免费时段".to_string(),
        }
    }

    fn hourly(amount: Yuan) -> TariffSegment {
        TariffSegment::Periodic {
            period_minutes: 60,
            amount,
            label: format!("{}元/小时", amount),
        }
    }

    /// 30 min free, 3/hour, capped at 15, reminders at 90/150/210.
    fn hourly_lot() -> TariffDefinition {
        lot(
            vec![free(30), hourly(3)],
            Some(15),
            ReminderPolicy {
                first_reminder_minute: 90,
                interval_minutes: 60,
                max_reminders: 3,
            },
        )
    }

    /// 30 min free then one-time 10, single reminder warning about minute 20.
    fn one_shot_lot() -> TariffDefinition {
        lot(
            vec![
                free(30),
                TariffSegment::Flat {
                    span: SegmentSpan::Unbounded,
                    amount: 10,
                    label: String::new(),
                },
            ],
            Some(10),
            ReminderPolicy {
                first_reminder_minute: 20,
                interval_minutes: 60,
                max_reminders: 1,
            },
        )
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_plan_regular_slots() {
        let slots = plan_reminders(&hourly_lot(), &SchedulerTuning::default());
        assert_eq!(slots.len(), 4);

        assert_eq!(
            slots[0],
            ReminderSlot::Regular {
                target_minute: 90,
                fire_minute: 80,
                current_fee: 3,
                next_fee: 6,
                is_final: false,
            }
        );
        assert_eq!(
            slots[2],
            ReminderSlot::Regular {
                target_minute: 210,
                fire_minute: 200,
                current_fee: 9,
                next_fee: 12,
                is_final: true,
            }
        );
    }

    #[test]
    fn test_plan_cap_slot() {
        // Fee reaches 15 at minute 271 (4 full hours past the free span,
        // plus one minute into the fifth).
        let slots = plan_reminders(&hourly_lot(), &SchedulerTuning::default());
        assert_eq!(
            slots[3],
            ReminderSlot::Cap {
                target_minute: 271,
                fire_minute: 261,
                cap: 15,
            }
        );
    }

    #[test]
    fn test_cap_too_close_to_last_regular_is_skipped() {
        // Cap lands at minute 31, well before the only regular reminder
        // threshold plus the gap.
        let slots = plan_reminders(&one_shot_lot(), &SchedulerTuning::default());
        assert_eq!(slots.len(), 1);
        assert!(matches!(slots[0], ReminderSlot::Regular { .. }));
    }

    #[test]
    fn test_cap_never_reached_within_bound() {
        // 1/hour capped at 100 would need ~100 hours; the 24h search bound
        // gives up and no cap slot is planned.
        let tariff = lot(
            vec![free(30), hourly(1)],
            Some(100),
            hourly_lot().reminder_policy,
        );
        let slots = plan_reminders(&tariff, &SchedulerTuning::default());
        assert_eq!(slots.len(), 3);
        assert!(slots
            .iter()
            .all(|slot| matches!(slot, ReminderSlot::Regular { .. })));
    }

    #[test]
    fn test_zero_regular_reminders_still_allows_cap() {
        let mut tariff = one_shot_lot();
        tariff.reminder_policy.max_reminders = 0;
        let slots = plan_reminders(&tariff, &SchedulerTuning::default());
        assert_eq!(slots.len(), 1);
        assert_eq!(
            slots[0],
            ReminderSlot::Cap {
                target_minute: 31,
                fire_minute: 21,
                cap: 10,
            }
        );
    }

    #[test]
    fn test_compute_reminders_fire_times() {
        let events = compute_reminders(&hourly_lot(), start());
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].fire_time, start() + Duration::minutes(80));
        assert_eq!(events[1].fire_time, start() + Duration::minutes(140));
        assert_eq!(events[2].fire_time, start() + Duration::minutes(200));
        assert_eq!(events[3].fire_time, start() + Duration::minutes(261));

        for pair in events.windows(2) {
            assert!(pair[0].fire_time < pair[1].fire_time);
        }
    }

    #[test]
    fn test_compute_reminders_flags_and_wording() {
        let events = compute_reminders(&hourly_lot(), start());

        assert_eq!(events[0].message, "已停1小时，当前费用3元，再停1小时会变成6元");
        assert!(!events[0].is_final);

        assert!(events[2].is_final);
        assert!(events[2].message.contains("最后一次提醒"));

        assert!(events[3].is_cap_reminder);
        assert!(!events[3].is_final);
        assert_eq!(
            events[3].message,
            "快到15元封顶了，之后停多久都是15元，可以放心继续停"
        );
    }

    #[test]
    fn test_single_reminder_is_final() {
        let events = compute_reminders(&one_shot_lot(), start());
        assert_eq!(events.len(), 1);
        assert!(events[0].is_final);
        // Warns about minute 20, fires ten minutes earlier.
        assert_eq!(events[0].fire_time, start() + Duration::minutes(10));
        assert_eq!(events[0].message, "已停0小时，当前费用0元。⚠️ 这是最后一次提醒，之后不会再打扰你。");
    }

    #[test]
    fn test_fire_before_start_is_not_clamped() {
        let mut tariff = one_shot_lot();
        tariff.reminder_policy.first_reminder_minute = 5;
        let events = compute_reminders(&tariff, start());
        assert_eq!(events[0].fire_time, start() - Duration::minutes(5));
    }

    #[test]
    fn test_custom_tuning() {
        let tuning = SchedulerTuning {
            early_warning_minutes: 0,
            ..SchedulerTuning::default()
        };
        let slots = plan_reminders(&hourly_lot(), &tuning);
        assert_eq!(
            slots[0],
            ReminderSlot::Regular {
                target_minute: 90,
                fire_minute: 90,
                current_fee: 3,
                next_fee: 6,
                is_final: false,
            }
        );
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let tariff = hourly_lot();
        assert_eq!(
            compute_reminders(&tariff, start()),
            compute_reminders(&tariff, start())
        );
    }
}
