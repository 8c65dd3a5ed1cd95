use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::debug_println;

/// One active parking stay. The billing engine only ever reads this; it is
/// plain input that produces fresh fee values and reminder lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingSession {
    pub lot_id: u32,
    pub start_time: DateTime<Utc>,
    /// User-corrected start time; overrides `start_time` for every
    /// computation when set.
    #[serde(default)]
    pub adjusted_start_time: Option<DateTime<Utc>>,
    /// Index into the freshly computed reminder sequence: how many have
    /// already been handed to the notification sink.
    #[serde(default)]
    pub reminders_sent: u32,
}

impl ParkingSession {
    pub fn begin(lot_id: u32, start_time: DateTime<Utc>) -> Self {
        Self {
            lot_id,
            start_time,
            adjusted_start_time: None,
            reminders_sent: 0,
        }
    }

    /// The start time every computation uses.
    pub fn effective_start_time(&self) -> DateTime<Utc> {
        self.adjusted_start_time.unwrap_or(self.start_time)
    }

    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.effective_start_time()).num_minutes()
    }
}

/// Error types for session state operations
#[derive(Debug)]
pub enum SessionError {
    InvalidTimeFormat,
    HourOutOfRange,
    TimeOutOfRange,
    FutureTime,
    FileAccess(std::io::Error),
    CorruptedState(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidTimeFormat => {
                write!(
                    f,
                    "Invalid time format. Expected: hour (0-23), HH:MM, or ISO timestamp"
                )
            }
            SessionError::HourOutOfRange => write!(f, "Hour must be between 0 and 23"),
            SessionError::TimeOutOfRange => write!(f, "Time values out of range"),
            SessionError::FutureTime => write!(f, "Cannot set future time"),
            SessionError::FileAccess(e) => {
                write!(f, "Failed to access session state file: {}", e)
            }
            SessionError::CorruptedState(msg) => {
                write!(f, "Session state file is corrupted: {}", msg)
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<std::io::Error> for SessionError {
    fn from(error: std::io::Error) -> Self {
        SessionError::FileAccess(error)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(error: serde_json::Error) -> Self {
        SessionError::CorruptedState(format!("JSON error: {}", error))
    }
}

/// Persists the active session between CLI invocations.
pub struct SessionStore {
    state_path: PathBuf,
}

impl SessionStore {
    /// Create a SessionStore with the default state path
    pub fn new() -> Result<Self, SessionError> {
        let state_dir = dirs::home_dir()
            .ok_or_else(|| {
                SessionError::FileAccess(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Could not find home directory",
                ))
            })?
            .join(".parkmeter");

        Ok(Self {
            state_path: state_dir.join("session.json"),
        })
    }

    /// Create a SessionStore with a custom state path (for testing)
    pub fn with_path(state_path: PathBuf) -> Self {
        Self { state_path }
    }

    fn ensure_state_dir(&self) -> Result<(), SessionError> {
        if let Some(parent) = self.state_path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Load the active session, `None` when nothing is parked.
    pub fn load(&self) -> Result<Option<ParkingSession>, SessionError> {
        if !self.state_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.state_path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let session = serde_json::from_str(&content).map_err(|e| {
            SessionError::CorruptedState(format!("JSON parsing failed: {}", e))
        })?;
        debug_println!("Loaded session from {:?}", self.state_path);

        Ok(Some(session))
    }

    pub fn save(&self, session: &ParkingSession) -> Result<(), SessionError> {
        self.ensure_state_dir()?;

        let content = serde_json::to_string_pretty(session)?;
        fs::write(&self.state_path, content)?;
        debug_println!("Saved session to {:?}", self.state_path);

        Ok(())
    }

    /// Remove the state file; `Ok(false)` when there was none.
    pub fn clear(&self) -> Result<bool, SessionError> {
        if self.state_path.exists() {
            fs::remove_file(&self.state_path)?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn state_path(&self) -> &PathBuf {
        &self.state_path
    }
}

/// Parse a corrected start time (input interpreted as local time).
///
/// Accepts a bare hour (0-23), HH:MM, or an ISO timestamp. The hour and
/// HH:MM forms apply to the calendar day the session started on, so a
/// correction made after midnight still lands on the right day. Future
/// times are rejected.
pub fn parse_time_input(
    input: &str,
    start_time: DateTime<Utc>,
) -> Result<DateTime<Utc>, SessionError> {
    let start_date = start_time.with_timezone(&Local).date_naive();

    // Try parsing as a single number (0-23 hour)
    if let Ok(hour) = input.parse::<u32>() {
        if hour <= 23 {
            return local_on(start_date, hour, 0);
        }
        return Err(SessionError::HourOutOfRange);
    }

    // Try parsing as HH:MM format
    if let Some((hour_str, minute_str)) = input.split_once(':') {
        let hour: u32 = hour_str
            .parse()
            .map_err(|_| SessionError::InvalidTimeFormat)?;
        let minute: u32 = minute_str
            .parse()
            .map_err(|_| SessionError::InvalidTimeFormat)?;

        if hour <= 23 && minute <= 59 {
            return local_on(start_date, hour, minute);
        }
        return Err(SessionError::TimeOutOfRange);
    }

    // Try parsing as ISO timestamp (interpreted as given timezone)
    match DateTime::parse_from_rfc3339(input) {
        Ok(dt) => {
            let utc = dt.with_timezone(&Utc);
            if utc > Utc::now() {
                return Err(SessionError::FutureTime);
            }
            Ok(utc)
        }
        Err(_) => Err(SessionError::InvalidTimeFormat),
    }
}

fn local_on(date: NaiveDate, hour: u32, minute: u32) -> Result<DateTime<Utc>, SessionError> {
    let local_time = date
        .and_hms_opt(hour, minute, 0)
        .ok_or(SessionError::TimeOutOfRange)?
        .and_local_timezone(Local)
        .single()
        .ok_or(SessionError::TimeOutOfRange)?;

    if local_time > Local::now() {
        return Err(SessionError::FutureTime);
    }

    Ok(local_time.with_timezone(&Utc))
}
