use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whole-yuan amount; every lot in the catalog prices in integer yuan.
pub type Yuan = u64;

/// Length of one pricing phase on the tariff timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentSpan {
    /// A fixed number of minutes.
    Minutes(u32),
    /// Runs until the car leaves. Only valid as the last segment of a tariff.
    Unbounded,
}

impl SegmentSpan {
    pub fn minutes(&self) -> Option<u32> {
        match self {
            SegmentSpan::Minutes(minutes) => Some(*minutes),
            SegmentSpan::Unbounded => None,
        }
    }

    /// Time left over after this span has been occupied.
    pub fn consume(&self, remaining: i64) -> i64 {
        match self {
            SegmentSpan::Minutes(minutes) => remaining - i64::from(*minutes),
            SegmentSpan::Unbounded => 0,
        }
    }
}

/// One phase of a tariff's pricing timeline, in order of occupation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TariffSegment {
    /// No charge for this phase.
    Free {
        span: SegmentSpan,
        #[serde(default)]
        label: String,
    },
    /// One fixed charge for occupying any portion of this phase.
    Flat {
        span: SegmentSpan,
        amount: Yuan,
        #[serde(default)]
        label: String,
    },
    /// Charged per period, partial periods rounded up. Bills all remaining
    /// time, so it is always the last phase of a tariff.
    Periodic {
        period_minutes: u32,
        amount: Yuan,
        #[serde(default)]
        label: String,
    },
}

impl TariffSegment {
    pub fn label(&self) -> &str {
        match self {
            TariffSegment::Free { label, .. }
            | TariffSegment::Flat { label, .. }
            | TariffSegment::Periodic { label, .. } => label,
        }
    }

    /// Minutes this segment occupies on the status timeline, `None` when it
    /// runs to the end of the stay. A periodic segment occupies one period;
    /// the fee walk and the period-status walk must agree on this.
    pub fn phase_minutes(&self) -> Option<u32> {
        match self {
            TariffSegment::Free { span, .. } | TariffSegment::Flat { span, .. } => span.minutes(),
            TariffSegment::Periodic { period_minutes, .. } => Some(*period_minutes),
        }
    }
}

/// When and how often a lot wants the driver nudged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPolicy {
    /// Minute of the stay the first reminder warns about.
    pub first_reminder_minute: u32,
    /// Gap between consecutive reminder thresholds.
    pub interval_minutes: u32,
    /// Regular reminders only; the cap reminder is extra.
    pub max_reminders: u32,
}

/// Complete pricing definition for one parking lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffDefinition {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub segments: Vec<TariffSegment>,
    /// Total fee never exceeds this when set.
    #[serde(default)]
    pub fee_cap: Option<Yuan>,
    pub reminder_policy: ReminderPolicy,
}

impl TariffDefinition {
    /// Human-readable rule listing, one line per phase plus the cap.
    pub fn rule_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        for segment in &self.segments {
            match segment {
                TariffSegment::Free { span, .. } => match span.minutes() {
                    Some(minutes) => lines.push(format!("前{}分钟：免费", minutes)),
                    None => lines.push("之后：免费".to_string()),
                },
                TariffSegment::Flat { span, amount, .. } => match span.minutes() {
                    Some(minutes) => {
                        lines.push(format!("接下来{}分钟：{}元（固定）", minutes, amount))
                    }
                    None => lines.push(format!("之后：{}元（一次性）", amount)),
                },
                TariffSegment::Periodic {
                    period_minutes,
                    amount,
                    ..
                } => {
                    let unit = if *period_minutes == 60 {
                        "小时".to_string()
                    } else {
                        format!("{}分钟", period_minutes)
                    };
                    lines.push(format!("之后：{}元/{}", amount, unit));
                }
            }
        }

        if let Some(cap) = self.fee_cap {
            lines.push(format!("封顶价格：{}元", cap));
        }

        lines
    }
}

/// A scheduled nudge, produced fresh on every recomputation. Never stored by
/// the engine; the session layer tracks how many it has already dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderEvent {
    pub fire_time: DateTime<Utc>,
    pub message: String,
    /// Last regular reminder; no further regular nudges follow.
    pub is_final: bool,
    /// Warns that the fee cap is about to be reached.
    pub is_cap_reminder: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_shot_lot() -> TariffDefinition {
        TariffDefinition {
            id: 42,
            name: "测试停车场".to_string(),
            description: "前30分钟免费，超出后10元/车".to_string(),
            segments: vec![
                TariffSegment::Free {
                    span: SegmentSpan::Minutes(30),
                    label: "免费时段".to_string(),
                },
                TariffSegment::Flat {
                    span: SegmentSpan::Unbounded,
                    amount: 10,
                    label: "10元/车（一次性）".to_string(),
                },
            ],
            fee_cap: Some(10),
            reminder_policy: ReminderPolicy {
                first_reminder_minute: 20,
                interval_minutes: 60,
                max_reminders: 1,
            },
        }
    }

    #[test]
    fn test_span_consume() {
        assert_eq!(SegmentSpan::Minutes(30).consume(45), 15);
        assert_eq!(SegmentSpan::Minutes(30).consume(30), 0);
        assert_eq!(SegmentSpan::Minutes(30).consume(10), -20);
        assert_eq!(SegmentSpan::Unbounded.consume(9999), 0);
    }

    #[test]
    fn test_phase_minutes() {
        let lot = one_shot_lot();
        assert_eq!(lot.segments[0].phase_minutes(), Some(30));
        assert_eq!(lot.segments[1].phase_minutes(), None);

        let periodic = TariffSegment::Periodic {
            period_minutes: 60,
            amount: 3,
            label: String::new(),
        };
        assert_eq!(periodic.phase_minutes(), Some(60));
    }

    #[test]
    fn test_rule_lines() {
        let lines = one_shot_lot().rule_lines();
        assert_eq!(
            lines,
            vec![
                "前30分钟：免费".to_string(),
                "之后：10元（一次性）".to_string(),
                "封顶价格：10元".to_string(),
            ]
        );
    }

    #[test]
    fn test_rule_lines_periodic_units() {
        let mut lot = one_shot_lot();
        lot.fee_cap = None;
        lot.segments[1] = TariffSegment::Periodic {
            period_minutes: 30,
            amount: 3,
            label: String::new(),
        };
        assert_eq!(lot.rule_lines()[1], "之后：3元/30分钟");

        lot.segments[1] = TariffSegment::Periodic {
            period_minutes: 60,
            amount: 3,
            label: String::new(),
        };
        assert_eq!(lot.rule_lines()[1], "之后：3元/小时");
    }
}
