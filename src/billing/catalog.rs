use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::billing::types::{ReminderPolicy, SegmentSpan, TariffDefinition, TariffSegment, Yuan};

/// Error types for catalog construction
#[derive(Debug)]
pub enum CatalogError {
    EmptySegments { lot_id: u32 },
    UnboundedNotLast { lot_id: u32 },
    PeriodicNotLast { lot_id: u32 },
    ZeroSpan { lot_id: u32 },
    ZeroReminderMinute { lot_id: u32 },
    DuplicateLotId(u32),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::EmptySegments { lot_id } => {
                write!(f, "Lot {} has no pricing segments", lot_id)
            }
            CatalogError::UnboundedNotLast { lot_id } => {
                write!(f, "Lot {} has an unbounded segment before the last", lot_id)
            }
            CatalogError::PeriodicNotLast { lot_id } => {
                write!(
                    f,
                    "Lot {} has a periodic segment before the last; a periodic segment bills all remaining time",
                    lot_id
                )
            }
            CatalogError::ZeroSpan { lot_id } => {
                write!(f, "Lot {} has a zero-length segment", lot_id)
            }
            CatalogError::ZeroReminderMinute { lot_id } => {
                write!(
                    f,
                    "Lot {} has a reminder policy with a zero first-reminder minute or interval",
                    lot_id
                )
            }
            CatalogError::DuplicateLotId(lot_id) => {
                write!(f, "Duplicate lot id: {}", lot_id)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// Immutable, validated set of parking lot tariffs. Composed once by the
/// caller and passed wherever fees or reminders are computed.
#[derive(Debug, Clone)]
pub struct TariffCatalog {
    lots: Vec<TariffDefinition>,
}

impl TariffCatalog {
    /// Build a catalog, rejecting malformed definitions up front so fee
    /// computation never has to.
    pub fn new(lots: Vec<TariffDefinition>) -> Result<Self, CatalogError> {
        let mut seen_ids = HashSet::new();
        for lot in &lots {
            validate_definition(lot)?;
            if !seen_ids.insert(lot.id) {
                return Err(CatalogError::DuplicateLotId(lot.id));
            }
        }
        Ok(Self { lots })
    }

    /// The built-in lots.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_LOTS.clone()).expect("built-in catalog must validate")
    }

    pub fn by_id(&self, id: u32) -> Option<&TariffDefinition> {
        self.lots.iter().find(|lot| lot.id == id)
    }

    pub fn lots(&self) -> &[TariffDefinition] {
        &self.lots
    }

    pub fn into_lots(self) -> Vec<TariffDefinition> {
        self.lots
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }
}

fn validate_definition(lot: &TariffDefinition) -> Result<(), CatalogError> {
    if lot.segments.is_empty() {
        return Err(CatalogError::EmptySegments { lot_id: lot.id });
    }

    let last = lot.segments.len() - 1;
    for (index, segment) in lot.segments.iter().enumerate() {
        match segment.phase_minutes() {
            Some(0) => return Err(CatalogError::ZeroSpan { lot_id: lot.id }),
            Some(_) => {}
            None => {}
        }
        if index < last {
            match segment {
                TariffSegment::Periodic { .. } => {
                    return Err(CatalogError::PeriodicNotLast { lot_id: lot.id })
                }
                TariffSegment::Free { span, .. } | TariffSegment::Flat { span, .. } => {
                    if span.minutes().is_none() {
                        return Err(CatalogError::UnboundedNotLast { lot_id: lot.id });
                    }
                }
            }
        }
    }

    let policy = &lot.reminder_policy;
    if policy.first_reminder_minute == 0 || policy.interval_minutes == 0 {
        return Err(CatalogError::ZeroReminderMinute { lot_id: lot.id });
    }

    Ok(())
}

fn free(minutes: u32) -> TariffSegment {
    TariffSegment::Free {
        span: SegmentSpan::Minutes(minutes),
        label: "免费时段".to_string(),
    }
}

fn flat(minutes: u32, amount: Yuan, label: &str) -> TariffSegment {
    TariffSegment::Flat {
        span: SegmentSpan::Minutes(minutes),
        amount,
        label: label.to_string(),
    }
}

fn flat_once(amount: Yuan, label: &str) -> TariffSegment {
    TariffSegment::Flat {
        span: SegmentSpan::Unbounded,
        amount,
        label: label.to_string(),
    }
}

fn periodic(period_minutes: u32, amount: Yuan, label: &str) -> TariffSegment {
    TariffSegment::Periodic {
        period_minutes,
        amount,
        label: label.to_string(),
    }
}

fn policy(first_reminder_minute: u32, interval_minutes: u32, max_reminders: u32) -> ReminderPolicy {
    ReminderPolicy {
        first_reminder_minute,
        interval_minutes,
        max_reminders,
    }
}

fn lot(
    id: u32,
    name: &str,
    description: &str,
    segments: Vec<TariffSegment>,
    fee_cap: Option<Yuan>,
    reminder_policy: ReminderPolicy,
) -> TariffDefinition {
    TariffDefinition {
        id,
        name: name.to_string(),
        description: description.to_string(),
        segments,
        fee_cap,
        reminder_policy,
    }
}

/// The 14 Ningbo lots this tool was written for.
static BUILTIN_LOTS: Lazy<Vec<TariffDefinition>> = Lazy::new(|| {
    vec![
        lot(
            1,
            "金融硅谷",
            "前30分钟免费，3元/小时，15元封顶",
            vec![free(30), periodic(60, 3, "3元/小时")],
            Some(15),
            policy(90, 60, 3),
        ),
        lot(
            2,
            "文化广场",
            "前1小时免费，3元/小时，20元封顶",
            vec![free(60), periodic(60, 3, "3元/小时")],
            Some(20),
            policy(120, 60, 3),
        ),
        lot(
            3,
            "市民广场地下停车场",
            "前1小时免费，1-2小时3元，超出后2元/小时",
            vec![
                free(60),
                flat(60, 3, "1-2小时固定3元"),
                periodic(60, 2, "2元/小时"),
            ],
            None,
            policy(120, 60, 3),
        ),
        lot(
            4,
            "阪急地下停车场",
            "前30分钟免费，3元/30分钟",
            vec![free(30), periodic(30, 3, "3元/30分钟")],
            None,
            policy(60, 60, 3),
        ),
        lot(
            5,
            "宏泰广场地下停车场",
            "前1小时免费，1-3小时5元，超出后5元/小时，45元封顶",
            vec![
                free(60),
                flat(120, 5, "1-3小时固定5元"),
                periodic(60, 5, "5元/小时"),
            ],
            Some(45),
            policy(180, 60, 3),
        ),
        lot(
            6,
            "和义大道地下停车场",
            "前30分钟免费，30分钟-2小时5元，超出后4元/小时，25元封顶",
            vec![
                free(30),
                flat(90, 5, "30分钟-2小时固定5元"),
                periodic(60, 4, "4元/小时"),
            ],
            Some(25),
            policy(120, 60, 3),
        ),
        lot(
            7,
            "江北来福士广场",
            "前30分钟免费，5元/小时，50元封顶",
            vec![free(30), periodic(60, 5, "5元/小时")],
            Some(50),
            policy(90, 60, 3),
        ),
        lot(
            8,
            "绿地缤纷城",
            "前30分钟免费，30分钟-2小时5元，超出后5元/小时，50元封顶",
            vec![
                free(30),
                flat(90, 5, "30分钟-2小时固定5元"),
                periodic(60, 5, "5元/小时"),
            ],
            Some(50),
            policy(120, 60, 3),
        ),
        lot(
            9,
            "钻石商业广场停车场",
            "前30分钟免费，30分钟-2小时5元，超出后2元/小时，30元封顶",
            vec![
                free(30),
                flat(90, 5, "30分钟-2小时固定5元"),
                periodic(60, 2, "2元/小时"),
            ],
            Some(30),
            policy(120, 60, 3),
        ),
        lot(
            10,
            "老外滩美术馆",
            "前30分钟免费，30分钟-2小时3元，超出后2元/小时，12元封顶",
            vec![
                free(30),
                flat(90, 3, "30分钟-2小时固定3元"),
                periodic(60, 2, "2元/小时"),
            ],
            Some(12),
            policy(120, 60, 3),
        ),
        lot(
            11,
            "1844和义艺术中心停车场",
            "前15分钟免费，15分钟-1小时5元，超出后5元/小时，60元封顶",
            vec![
                free(15),
                flat(45, 5, "15分钟-1小时固定5元"),
                periodic(60, 5, "5元/小时"),
            ],
            Some(60),
            policy(60, 60, 3),
        ),
        lot(
            12,
            "宁波银泰大厦地面停车场",
            "前30分钟免费，30分钟-1小时5元，超出后5元/小时，30元封顶",
            vec![
                free(30),
                flat(30, 5, "30分钟-1小时固定5元"),
                periodic(60, 5, "5元/小时"),
            ],
            Some(30),
            policy(60, 60, 3),
        ),
        lot(
            13,
            "东钱湖十里四香（钱湖秘境）停车场",
            "前30分钟免费，超出后10元/车（一次性）",
            vec![free(30), flat_once(10, "10元/车（一次性）")],
            Some(10),
            policy(20, 60, 1),
        ),
        lot(
            14,
            "东钱湖韩岭老街停车场",
            "前30分钟免费，30分钟-2小时5元，超出后3元/小时，20元封顶",
            vec![
                free(30),
                flat(90, 5, "30分钟-2小时固定5元"),
                periodic(60, 3, "3元/小时"),
            ],
            Some(20),
            policy(120, 60, 3),
        ),
    ]
});
