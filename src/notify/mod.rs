use chrono::Local;

use crate::billing::ReminderEvent;

/// Downstream alert channel. Delivery is best-effort: nothing comes back to
/// confirm the user was actually alerted.
pub trait NotificationSink {
    fn dispatch(&self, reminder: &ReminderEvent);
}

/// Hands a reminder to an iOS shortcut via the `shortcuts://` URL scheme.
/// The shortcut splits the input on `|` and creates a system reminder from
/// the two halves.
pub struct ShortcutsSink {
    shortcut_name: String,
}

impl ShortcutsSink {
    pub fn new(shortcut_name: impl Into<String>) -> Self {
        Self {
            shortcut_name: shortcut_name.into(),
        }
    }

    /// The `HH:MM|message` input the shortcut expects, fire time in local
    /// wall-clock form.
    pub fn payload(&self, reminder: &ReminderEvent) -> String {
        let time = reminder.fire_time.with_timezone(&Local).format("%H:%M");

        let mut message = reminder.message.clone();
        if reminder.is_final {
            message.push_str("\n💚 这是最后一次提醒，之后不会再打扰你。");
        }
        if reminder.is_cap_reminder {
            message.push_str("\n⭐ 封顶提醒：可以放心继续停车！");
        }

        format!("{}|{}", time, message)
    }

    pub fn handoff_url(&self, reminder: &ReminderEvent) -> String {
        format!(
            "shortcuts://run-shortcut?name={}&input={}",
            percent_encode(&self.shortcut_name),
            percent_encode(&self.payload(reminder))
        )
    }
}

impl NotificationSink for ShortcutsSink {
    fn dispatch(&self, reminder: &ReminderEvent) {
        println!("{}", self.handoff_url(reminder));
    }
}

/// `encodeURIComponent`-compatible escaping for shortcut URLs.
pub fn percent_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn reminder(is_final: bool, is_cap_reminder: bool) -> ReminderEvent {
        ReminderEvent {
            fire_time: Utc.with_ymd_and_hms(2024, 5, 1, 9, 20, 0).unwrap(),
            message: "已停1小时，当前费用3元，再停1小时会变成6元".to_string(),
            is_final,
            is_cap_reminder,
        }
    }

    #[test]
    fn test_percent_encode_passthrough() {
        assert_eq!(percent_encode("abc-DEF_123.~*'()"), "abc-DEF_123.~*'()");
    }

    #[test]
    fn test_percent_encode_reserved_and_utf8() {
        assert_eq!(percent_encode("a b|c"), "a%20b%7Cc");
        assert_eq!(percent_encode("停"), "%E5%81%9C");
        assert_eq!(percent_encode("09:20"), "09%3A20");
    }

    #[test]
    fn test_payload_structure() {
        let sink = ShortcutsSink::new("停车提醒");
        let payload = sink.payload(&reminder(false, false));

        let (time, message) = payload.split_once('|').unwrap();
        assert_eq!(time.len(), 5);
        assert!(time.contains(':'));
        assert_eq!(message, "已停1小时，当前费用3元，再停1小时会变成6元");
    }

    #[test]
    fn test_payload_suffixes() {
        let sink = ShortcutsSink::new("停车提醒");

        let final_payload = sink.payload(&reminder(true, false));
        assert!(final_payload.ends_with("💚 这是最后一次提醒，之后不会再打扰你。"));

        let cap_payload = sink.payload(&reminder(false, true));
        assert!(cap_payload.ends_with("⭐ 封顶提醒：可以放心继续停车！"));
    }

    #[test]
    fn test_handoff_url_is_fully_encoded() {
        let sink = ShortcutsSink::new("停车提醒");
        let url = sink.handoff_url(&reminder(false, false));

        assert!(url.starts_with("shortcuts://run-shortcut?name="));
        assert!(url.contains("&input="));

        let query = url.split_once('?').unwrap().1;
        assert!(!query.contains('|'));
        assert!(query.chars().all(|c| c.is_ascii()));
    }
}
