use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::availability::{parse_weekday, weekday_name};
use super::booking::{BookingRecord, BookingState, PatientType};

/// A suggested button: what the caller shows and what it sends back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub label: String,
    pub action_token: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, action_token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action_token: action_token.into(),
        }
    }
}

/// Lower-cases and joins whitespace runs with `_`.
pub fn slugify(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentTiming {
    NextAvailable,
    NextWeek,
    AfterTwoWeeks,
    NextMonth,
}

impl AppointmentTiming {
    pub const ALL: [AppointmentTiming; 4] = [
        AppointmentTiming::NextAvailable,
        AppointmentTiming::NextWeek,
        AppointmentTiming::AfterTwoWeeks,
        AppointmentTiming::NextMonth,
    ];

    /// The stored answer value.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentTiming::NextAvailable => "next available",
            AppointmentTiming::NextWeek => "next week",
            AppointmentTiming::AfterTwoWeeks => "after 2 weeks",
            AppointmentTiming::NextMonth => "next month",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AppointmentTiming::NextAvailable => "Next Available",
            AppointmentTiming::NextWeek => "Next Week",
            AppointmentTiming::AfterTwoWeeks => "After 2 Weeks",
            AppointmentTiming::NextMonth => "Next Month",
        }
    }

    fn token_suffix(&self) -> &'static str {
        match self {
            AppointmentTiming::NextAvailable => "next_available",
            AppointmentTiming::NextWeek => "next_week",
            AppointmentTiming::AfterTwoWeeks => "after_2_weeks",
            AppointmentTiming::NextMonth => "next_month",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s || t.token_suffix() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
}

impl TimeOfDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning (AM)",
            TimeOfDay::Afternoon => "Afternoon (PM)",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Some(TimeOfDay::Morning),
            "afternoon" => Some(TimeOfDay::Afternoon),
            _ => None,
        }
    }
}

/// A button click. Catalogue-backed variants carry the slug of the label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickAction {
    PatientType(PatientType),
    Timing(AppointmentTiming),
    Day(Weekday),
    Time(TimeOfDay),
    Location(String),
    Pain(u8),
    Procedure(String),
    Insurance(String),
    ConfirmBooking,
    EditBooking,
}

impl QuickAction {
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim().to_lowercase();
        match token.as_str() {
            "new_patient" => return Some(QuickAction::PatientType(PatientType::New)),
            "existing_patient" => return Some(QuickAction::PatientType(PatientType::Existing)),
            "confirm_booking" => return Some(QuickAction::ConfirmBooking),
            "edit_booking" => return Some(QuickAction::EditBooking),
            _ => {}
        }

        let (prefix, rest) = token.split_once('_')?;
        if rest.is_empty() {
            return None;
        }
        match prefix {
            "timing" => AppointmentTiming::parse(rest).map(QuickAction::Timing),
            "day" => parse_weekday(rest).map(QuickAction::Day),
            "time" => TimeOfDay::parse(rest).map(QuickAction::Time),
            "pain" => rest
                .parse::<u8>()
                .ok()
                .filter(|p| (1..=10).contains(p))
                .map(QuickAction::Pain),
            "location" => Some(QuickAction::Location(rest.to_string())),
            "procedure" => Some(QuickAction::Procedure(rest.to_string())),
            "insurance" => Some(QuickAction::Insurance(rest.to_string())),
            _ => None,
        }
    }

    pub fn token(&self) -> String {
        match self {
            QuickAction::PatientType(PatientType::New) => "new_patient".to_string(),
            QuickAction::PatientType(PatientType::Existing) => "existing_patient".to_string(),
            QuickAction::Timing(t) => format!("timing_{}", t.token_suffix()),
            QuickAction::Day(d) => format!("day_{}", weekday_name(*d).to_lowercase()),
            QuickAction::Time(t) => format!("time_{}", t.as_str()),
            QuickAction::Location(slug) => format!("location_{slug}"),
            QuickAction::Pain(p) => format!("pain_{p}"),
            QuickAction::Procedure(slug) => format!("procedure_{slug}"),
            QuickAction::Insurance(slug) => format!("insurance_{slug}"),
            QuickAction::ConfirmBooking => "confirm_booking".to_string(),
            QuickAction::EditBooking => "edit_booking".to_string(),
        }
    }

    /// The only state in which this action is authoritative.
    pub fn state(&self) -> BookingState {
        match self {
            QuickAction::PatientType(_) => BookingState::PatientTypeSelected,
            QuickAction::Timing(_) => BookingState::CollectingAppointmentTiming,
            QuickAction::Day(_) => BookingState::CollectingDayOfWeek,
            QuickAction::Time(_) => BookingState::CollectingTimeOfDay,
            QuickAction::Location(_) => BookingState::CollectingLocation,
            QuickAction::Pain(_) => BookingState::CollectingPainLevel,
            QuickAction::Procedure(_) => BookingState::CollectingProcedure,
            QuickAction::Insurance(_) => BookingState::CollectingInsurance,
            QuickAction::ConfirmBooking | QuickAction::EditBooking => BookingState::Confirmation,
        }
    }

    /// Readable text for a catalogue slug whose entry no longer exists.
    pub fn fallback_text(&self) -> Option<String> {
        match self {
            QuickAction::Location(slug)
            | QuickAction::Procedure(slug)
            | QuickAction::Insurance(slug) => Some(slug.replace('_', " ")),
            _ => None,
        }
    }
}

/// One caller message or button click, already normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Turn {
    pub raw_text: String,
    pub action: Option<QuickAction>,
}

impl Turn {
    pub fn text(text: impl Into<String>) -> Self {
        let raw_text = text.into();
        let action = detect_action(&raw_text);
        Self { raw_text, action }
    }

    pub fn action(token: &str) -> Self {
        Self {
            raw_text: String::new(),
            action: QuickAction::parse(token),
        }
    }

    /// An explicit token wins; otherwise the text is scanned for one.
    pub fn new(raw_text: Option<String>, token: Option<&str>) -> Self {
        let raw_text = raw_text.unwrap_or_default();
        let action = token
            .filter(|t| !t.trim().is_empty())
            .and_then(QuickAction::parse)
            .or_else(|| detect_action(&raw_text));
        Self { raw_text, action }
    }

    pub fn trimmed(&self) -> &str {
        self.raw_text.trim()
    }
}

fn detect_action(text: &str) -> Option<QuickAction> {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    if lower.contains("new patient") || lower.contains("new_patient") {
        return Some(QuickAction::PatientType(PatientType::New));
    }
    if lower.contains("existing patient") || lower.contains("existing_patient") {
        return Some(QuickAction::PatientType(PatientType::Existing));
    }
    if lower.contains(char::is_whitespace) {
        return None;
    }
    QuickAction::parse(&lower)
}

/// Incoming request body. Every key also has the legacy spelling, and the
/// same keys may arrive nested under `context`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TurnRequest {
    #[serde(alias = "bookingState")]
    pub current_state: Option<String>,
    #[serde(alias = "bookingData")]
    pub answers: Option<serde_json::Value>,
    #[serde(alias = "message")]
    pub raw_text: Option<String>,
    #[serde(alias = "action", alias = "userAction")]
    pub action_token: Option<String>,
    #[serde(alias = "config")]
    pub tenant_config: Option<serde_json::Value>,
    pub context: Option<Box<TurnRequest>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub response_text: String,
    pub suggested_choices: Vec<Choice>,
    pub next_state: BookingState,
    /// Serialized answers blob to send back with the next turn.
    pub answers: String,
    pub is_terminal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_record: Option<BookingRecord>,
}
