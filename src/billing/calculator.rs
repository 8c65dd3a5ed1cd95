use crate::billing::types::{TariffDefinition, TariffSegment, Yuan};

/// Generic status text for phases without a label of their own.
pub const IN_PROGRESS: &str = "计费中";

/// Calculate the parking fee for a stay of `elapsed_minutes`.
///
/// Walks the tariff's segments in order, consuming elapsed time phase by
/// phase. A periodic segment bills all remaining time (partial periods
/// rounded up), so nothing after it is ever reached. Negative elapsed time
/// counts as zero.
pub fn calculate_fee(tariff: &TariffDefinition, elapsed_minutes: i64) -> Yuan {
    let mut remaining = elapsed_minutes.max(0);
    let mut total: Yuan = 0;

    for segment in &tariff.segments {
        if remaining <= 0 {
            break;
        }

        match segment {
            TariffSegment::Free { span, .. } => {
                remaining = span.consume(remaining);
            }
            TariffSegment::Flat { span, amount, .. } => {
                total += *amount;
                remaining = span.consume(remaining);
            }
            TariffSegment::Periodic {
                period_minutes,
                amount,
                ..
            } => {
                let period = i64::from(*period_minutes).max(1);
                let periods = (remaining + period - 1) / period;
                total += periods as Yuan * *amount;
                remaining = 0;
            }
        }
    }

    match tariff.fee_cap {
        Some(cap) if total > cap => cap,
        _ => total,
    }
}

/// Describe the pricing phase a stay of `elapsed_minutes` is currently in.
///
/// Shares traversal semantics with [`calculate_fee`]: phases accumulate in
/// segment order, a periodic segment counting as one period. Past all finite
/// phases the status is either "capped" (fee has reached the cap) or the
/// generic in-progress text.
pub fn current_period_label(tariff: &TariffDefinition, elapsed_minutes: i64) -> String {
    let elapsed = elapsed_minutes.max(0);
    let mut accumulated: i64 = 0;

    for segment in &tariff.segments {
        match segment.phase_minutes() {
            Some(minutes) => {
                accumulated += i64::from(minutes);
                if elapsed < accumulated {
                    return label_or_default(segment);
                }
            }
            None => return label_or_default(segment),
        }
    }

    if let Some(cap) = tariff.fee_cap {
        if calculate_fee(tariff, elapsed) >= cap {
            return format!("已封顶（{}元）", cap);
        }
    }

    IN_PROGRESS.to_string()
}

fn label_or_default(segment: &TariffSegment) -> String {
    let label = segment.label();
    if label.is_empty() {
        IN_PROGRESS.to_string()
    } else {
        label.to_string()
    }
}

/// Format elapsed minutes in human-readable form
pub fn format_elapsed(minutes: i64) -> String {
    let minutes = minutes.max(0);
    let hours = minutes / 60;
    let mins = minutes % 60;

    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}
