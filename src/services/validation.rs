use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, Weekday};
use regex::Regex;

use crate::models::availability::{parse_weekday, weekday_name};
use crate::models::booking::REQUIRED_FIELDS;
use crate::models::{AppointmentTiming, BookingAnswers, Field, PatientType, TimeOfDay};
use crate::services::catalogue::CatalogueList;
use crate::services::spelling::{self, SpellField};

/// Why a turn's free text was not accepted. `Missing` and `Invalid` are
/// re-prompted with different wording.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no input given")]
    Missing,
    #[error("{0}")]
    Invalid(String),
}

pub type Validated<T> = Result<T, ValidationError>;

fn invalid<T>(hint: impl Into<String>) -> Validated<T> {
    Err(ValidationError::Invalid(hint.into()))
}

fn present(input: &str) -> Validated<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Missing)
    } else {
        Ok(trimmed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName {
    pub first: String,
    pub last: String,
}

fn is_name_char(c: char) -> bool {
    c.is_alphabetic() || c.is_whitespace() || c == '-' || c == '\''
}

fn name_parts(input: &str, whose: &str) -> Validated<Vec<String>> {
    let trimmed = present(input)?;
    if !trimmed.chars().all(is_name_char) {
        return invalid(
            "I need a valid name. Please use only letters, spaces, hyphens, and apostrophes.",
        );
    }
    let parts: Vec<String> = trimmed
        .split_whitespace()
        .filter(|p| p.chars().any(char::is_alphabetic))
        .map(str::to_string)
        .collect();
    if parts.len() < 2 {
        return invalid(format!(
            "I need both {whose} first name and last name. Could you please provide the full name?"
        ));
    }
    Ok(parts)
}

/// Spell-corrects the given name and capitalizes every part.
pub fn validate_full_name(input: &str) -> Validated<PersonName> {
    let parts = name_parts(input, "your")?;
    let corrected = spelling::correct(&parts.join(" "), SpellField::Name);
    let mut words = corrected.split(' ');
    let first = words.next().unwrap_or_default().to_string();
    let last = words.collect::<Vec<_>>().join(" ");
    Ok(PersonName { first, last })
}

/// Same rules as the patient's name, without spell correction.
pub fn validate_policy_holder(input: &str) -> Validated<String> {
    let parts = name_parts(input, "the policy holder's")?;
    Ok(parts
        .iter()
        .map(|p| spelling::capitalize_name_part(p))
        .collect::<Vec<_>>()
        .join(" "))
}

fn date_layouts() -> &'static [(Regex, &'static str)] {
    static LAYOUTS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    LAYOUTS.get_or_init(|| {
        [
            (r"^\d{1,2}/\d{1,2}/\d{4}$", "%m/%d/%Y"),
            (r"^\d{1,2}-\d{1,2}-\d{4}$", "%m-%d-%Y"),
            (r"^\d{4}-\d{1,2}-\d{1,2}$", "%Y-%m-%d"),
            (r"^\d{8}$", "%m%d%Y"),
        ]
        .into_iter()
        .filter_map(|(pattern, format)| Regex::new(pattern).ok().map(|re| (re, format)))
        .collect()
    })
}

/// Accepts several layouts and normalizes to `MM/DD/YYYY`.
pub fn validate_date_of_birth(input: &str, today: NaiveDate) -> Validated<String> {
    const HINT: &str =
        "I need a valid date of birth. Please enter it in MM/DD/YYYY format (e.g., 12/25/1980).";
    let trimmed = present(input)?;
    let Some((_, format)) = date_layouts().iter().find(|(re, _)| re.is_match(trimmed)) else {
        return invalid(HINT);
    };
    let date = match NaiveDate::parse_from_str(trimmed, format) {
        Ok(d) => d,
        Err(_) => return invalid(HINT),
    };
    if date.year() < 1900 || date.year() > today.year() || date > today {
        return invalid(format!(
            "That date doesn't look right. Please enter a date of birth between 1900 and {}.",
            today.year()
        ));
    }
    Ok(date.format("%m/%d/%Y").to_string())
}

/// 10 to 15 digits once everything else is stripped. Stored as typed,
/// or as bare digits when the number came wrapped in words.
pub fn validate_phone(input: &str) -> Validated<String> {
    let trimmed = present(input)?;
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if !(10..=15).contains(&digits.len()) {
        return invalid(
            "I need a valid phone number. Please enter at least 10 digits (e.g., 555-123-4567 or 5551234567).",
        );
    }
    if trimmed.chars().any(char::is_alphabetic) {
        return Ok(digits);
    }
    Ok(trimmed.to_string())
}

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

pub fn validate_email(input: &str) -> Validated<String> {
    let trimmed = present(input)?;
    if trimmed.len() > 254 {
        return invalid("That email address is too long. Please check it and try again.");
    }
    if !email_pattern().is_some_and(|re| re.is_match(trimmed)) {
        return invalid(
            "I need a valid email address. Please enter it in the format example@domain.com.",
        );
    }
    Ok(trimmed.to_string())
}

const TIMING_PHRASES: &[(&str, AppointmentTiming)] = &[
    ("next available", AppointmentTiming::NextAvailable),
    ("asap", AppointmentTiming::NextAvailable),
    ("as soon as possible", AppointmentTiming::NextAvailable),
    ("soon", AppointmentTiming::NextAvailable),
    ("next week", AppointmentTiming::NextWeek),
    ("after 2 weeks", AppointmentTiming::AfterTwoWeeks),
    ("two weeks", AppointmentTiming::AfterTwoWeeks),
    ("2 weeks", AppointmentTiming::AfterTwoWeeks),
    ("next month", AppointmentTiming::NextMonth),
    ("later", AppointmentTiming::NextMonth),
];

pub fn validate_timing(input: &str) -> Validated<AppointmentTiming> {
    let lower = present(input)?.to_lowercase();
    TIMING_PHRASES
        .iter()
        .find(|(phrase, _)| lower.contains(phrase))
        .map(|(_, timing)| *timing)
        .ok_or_else(|| {
            ValidationError::Invalid(
                "Could you please let me know when you'd like to schedule your appointment? For example: next available, next week, after 2 weeks, or next month.".to_string(),
            )
        })
}

/// The day must be one of the offered days.
pub fn validate_day(input: &str, offered: &[Weekday]) -> Validated<Weekday> {
    let trimmed = present(input)?;
    let day = trimmed
        .split(|c: char| !c.is_alphabetic())
        .find_map(parse_weekday);
    match day {
        Some(d) if offered.contains(&d) => Ok(d),
        Some(d) => invalid(format!(
            "Sorry, we aren't open on {}. Please choose one of: {}.",
            weekday_name(d),
            offered
                .iter()
                .map(|d| weekday_name(*d))
                .collect::<Vec<_>>()
                .join(", ")
        )),
        None => invalid("Could you please tell me which day of the week works best for you?"),
    }
}

pub fn validate_time_of_day(input: &str) -> Validated<TimeOfDay> {
    let lower = present(input)?.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if words.iter().any(|w| matches!(*w, "morning" | "am" | "early")) {
        return Ok(TimeOfDay::Morning);
    }
    if words
        .iter()
        .any(|w| matches!(*w, "afternoon" | "pm" | "evening" | "late"))
    {
        return Ok(TimeOfDay::Afternoon);
    }
    invalid("Could you please let me know whether mornings or afternoons work best for you?")
}

/// Takes the first number in the text.
pub fn validate_pain_level(input: &str) -> Validated<u8> {
    const HINT: &str = "I need to know how you're feeling on a scale of 1 to 10. Could you please provide a number between 1 and 10?";
    let trimmed = present(input)?;
    let number: String = trimmed
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    match number.parse::<u8>() {
        Ok(level) if (1..=10).contains(&level) => Ok(level),
        _ => invalid(HINT),
    }
}

fn is_free_text_char(c: char) -> bool {
    c.is_alphanumeric() || c.is_whitespace() || ",.-'/()!?:;&".contains(c)
}

pub fn validate_symptoms(input: &str) -> Validated<String> {
    let trimmed = present(input)?;
    if trimmed.chars().count() < 3 {
        return invalid("Could you please give me a little more detail about your symptoms?");
    }
    if trimmed.chars().count() > 500 {
        return invalid("Could you please provide a shorter description of your symptoms?");
    }
    if !trimmed.chars().all(is_free_text_char) {
        return invalid(
            "Please describe your symptoms using letters, numbers, and basic punctuation.",
        );
    }
    Ok(spelling::correct(trimmed, SpellField::Symptoms))
}

/// Exact match first, then case-insensitive containment in either direction.
/// Containment needs at least three characters on the contained side.
pub fn match_catalogue<'a>(input: &str, entries: &'a [String]) -> Option<&'a str> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    if let Some(exact) = entries.iter().find(|e| e.to_lowercase() == needle) {
        return Some(exact);
    }
    entries
        .iter()
        .find(|e| {
            let entry = e.to_lowercase();
            (needle.chars().count() >= 3 && entry.contains(&needle))
                || (entry.chars().count() >= 3 && needle.contains(&entry))
        })
        .map(String::as_str)
}

/// Free-text choice for a catalogue-backed field. A tenant-supplied
/// catalogue is authoritative unless the caller says "other"; the generic
/// default list is only a suggestion.
pub fn validate_catalogue_choice(
    input: &str,
    catalogue: &CatalogueList,
    field: SpellField,
    noun: &str,
) -> Validated<String> {
    let trimmed = present(input)?;
    let corrected = spelling::correct(trimmed, field);

    if let Some(entry) = match_catalogue(&corrected, &catalogue.entries)
        .or_else(|| match_catalogue(trimmed, &catalogue.entries))
    {
        return Ok(entry.to_string());
    }

    if trimmed.to_lowercase().contains("other") {
        return Ok(corrected);
    }

    if catalogue.is_authoritative() {
        return invalid(format!(
            "Please select from our available {noun}: {}",
            catalogue.entries.join(", ")
        ));
    }

    if trimmed.chars().count() < 2 || !trimmed.chars().all(is_free_text_char) {
        return invalid(format!(
            "I need a valid {noun} name. Please use letters, spaces, and basic punctuation."
        ));
    }
    Ok(corrected)
}

pub fn validate_policy_number(input: &str) -> Validated<String> {
    let trimmed = present(input)?;
    let len = trimmed.chars().count();
    if !(3..=20).contains(&len)
        || !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return invalid(
            "I need a valid policy number. Please enter 3 to 20 letters, numbers, or hyphens.",
        );
    }
    Ok(trimmed.to_string())
}

pub fn validate_group_number(input: &str) -> Validated<String> {
    let trimmed = present(input)?;
    let len = trimmed.chars().count();
    if !(2..=15).contains(&len)
        || !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || " -_.,/#".contains(c))
    {
        return invalid(
            "I need a valid group number. It can be numbers, letters, or a mix (2 to 15 characters).",
        );
    }
    Ok(trimmed.to_string())
}

/// Optional: empty input is accepted as "nothing to add".
pub fn validate_additional_info(input: &str) -> Validated<String> {
    let trimmed = input.trim();
    if trimmed.chars().count() > 1000 {
        return invalid(
            "That's a bit too long for me. Could you please shorten your additional information?",
        );
    }
    Ok(trimmed.to_string())
}

/// Re-checks answers that came back from the caller. Returns the first
/// required field, in flow order, that is absent or that its validator
/// would reject; a non-empty note that is too long counts as well.
pub fn first_unusable(
    answers: &BookingAnswers,
    today: NaiveDate,
    offered_days: &[Weekday],
) -> Option<Field> {
    let usable = |field: Field| -> bool {
        let Some(value) = answers.get(field) else {
            return false;
        };
        match field {
            Field::PatientType => PatientType::parse(value).is_some(),
            Field::FirstName | Field::LastName => match answers.full_name() {
                Some(name) => validate_policy_holder(&name).is_ok(),
                None => false,
            },
            Field::DateOfBirth => validate_date_of_birth(value, today).is_ok(),
            Field::Phone => validate_phone(value).is_ok(),
            Field::Email => validate_email(value).is_ok(),
            Field::AppointmentTiming => AppointmentTiming::parse(value).is_some(),
            Field::DayOfWeek => parse_weekday(value).is_some_and(|d| offered_days.contains(&d)),
            Field::TimeOfDay => TimeOfDay::parse(value).is_some(),
            Field::PainLevel => answers.pain_level().is_some(),
            Field::Symptoms => validate_symptoms(value).is_ok(),
            Field::PolicyHolder => validate_policy_holder(value).is_ok(),
            Field::PolicyNumber => validate_policy_number(value).is_ok(),
            Field::GroupNumber => validate_group_number(value).is_ok(),
            Field::AdditionalInfo => validate_additional_info(value).is_ok(),
            Field::Location | Field::Procedure | Field::Insurance | Field::BusinessHours => true,
        }
    };

    REQUIRED_FIELDS
        .iter()
        .copied()
        .find(|field| !usable(*field))
        .or_else(|| {
            let note_ok = answers.get(Field::AdditionalInfo).is_none()
                || usable(Field::AdditionalInfo);
            (!note_ok).then_some(Field::AdditionalInfo)
        })
}
