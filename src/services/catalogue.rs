use chrono::Weekday;

use crate::models::availability::{weekday_name, STANDARD_WEEKDAYS};
use crate::models::turn::slugify;
use crate::models::{
    AppointmentTiming, BookingState, BusinessHours, Choice, Location, NamedEntry, QuickAction,
    TenantConfig, TimeOfDay,
};

pub const DEFAULT_LOCATIONS: &[&str] = &["Main Office", "Telehealth Visit"];

pub const DEFAULT_SERVICES: &[&str] = &[
    "General Consultation",
    "Specialized Treatment",
    "Diagnostic Services",
    "Preventive Care",
    "Follow-up Care",
];

pub const DEFAULT_INSURERS: &[&str] = &[
    "Aetna",
    "Blue Cross Blue Shield",
    "Cigna",
    "UnitedHealth",
    "Humana",
    "Kaiser Permanente",
    "Anthem",
    "Molina Healthcare",
];

pub const DEFAULT_HOURS: &str = "9:00 AM - 5:00 PM";

/// Where a list of choices came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogueSource {
    Tenant,
    Profile,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueList {
    pub entries: Vec<String>,
    pub source: CatalogueSource,
}

impl CatalogueList {
    /// First non-empty of explicit, secondary, hardcoded default.
    fn resolve(explicit: Vec<String>, secondary: Vec<String>, defaults: &[&str]) -> Self {
        let explicit = dedup(explicit);
        if !explicit.is_empty() {
            return Self {
                entries: explicit,
                source: CatalogueSource::Tenant,
            };
        }
        let secondary = dedup(secondary);
        if !secondary.is_empty() {
            return Self {
                entries: secondary,
                source: CatalogueSource::Profile,
            };
        }
        Self {
            entries: defaults.iter().map(|s| s.to_string()).collect(),
            source: CatalogueSource::Default,
        }
    }

    /// Tenant data restricts free-text answers; the generic list doesn't.
    pub fn is_authoritative(&self) -> bool {
        self.source != CatalogueSource::Default
    }

    pub fn choices(&self, prefix: &str) -> Vec<Choice> {
        self.entries
            .iter()
            .map(|e| Choice::new(e.clone(), format!("{prefix}_{}", slugify(e))))
            .collect()
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| slugify(e) == slug)
            .map(String::as_str)
    }
}

fn dedup(entries: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for entry in entries {
        let key = entry.trim().to_lowercase();
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(entry.trim().to_string());
    }
    out
}

fn labels(entries: &[NamedEntry]) -> Vec<String> {
    entries
        .iter()
        .filter_map(NamedEntry::label)
        .map(str::to_string)
        .collect()
}

fn location_labels(locations: &[Location]) -> Vec<String> {
    locations
        .iter()
        .filter_map(Location::label)
        .map(str::to_string)
        .collect()
}

/// Valid choices for every choice-offering step, resolved once per turn.
#[derive(Debug, Clone)]
pub struct Catalogue {
    pub locations: CatalogueList,
    pub services: CatalogueList,
    pub insurers: CatalogueList,
    pub hours: BusinessHours,
}

impl Catalogue {
    pub fn resolve(tenant: &TenantConfig) -> Self {
        let profile = tenant.profile.clone().unwrap_or_default();

        let locations = CatalogueList::resolve(
            location_labels(&tenant.locations),
            location_labels(&profile.locations),
            DEFAULT_LOCATIONS,
        );
        let services = CatalogueList::resolve(
            labels(&tenant.services),
            labels(&profile.services),
            DEFAULT_SERVICES,
        );
        let insurers = CatalogueList::resolve(
            labels(&tenant.insurance_providers),
            labels(&profile.insurance_providers),
            DEFAULT_INSURERS,
        );

        let source_locations = if tenant.locations.is_empty() {
            &profile.locations
        } else {
            &tenant.locations
        };
        let mut hours = BusinessHours::default();
        for location in source_locations {
            hours.merge(BusinessHours::from_lines(location.hour_lines()));
        }

        tracing::debug!(
            locations = ?locations.source,
            services = ?services.source,
            insurers = ?insurers.source,
            hours = %hours.to_human_readable(),
            "resolved catalogue"
        );

        Self {
            locations,
            services,
            insurers,
            hours,
        }
    }

    /// Open days across all locations, or Monday to Friday when no
    /// location publishes usable hours.
    pub fn available_days(&self) -> Vec<Weekday> {
        let days = self.hours.open_days();
        if days.is_empty() {
            STANDARD_WEEKDAYS.to_vec()
        } else {
            days
        }
    }

    pub fn hours_for_day(&self, day: Weekday) -> String {
        self.hours
            .hours_for(day)
            .unwrap_or(DEFAULT_HOURS)
            .to_string()
    }

    /// Suggested buttons shown while in `state`. Every choice-offering
    /// state yields at least one.
    pub fn choices_for(&self, state: BookingState) -> Vec<Choice> {
        match state {
            BookingState::Initial | BookingState::PatientTypeSelected => vec![
                Choice::new("New Patient", "new_patient"),
                Choice::new("Existing Patient", "existing_patient"),
            ],
            BookingState::CollectingAppointmentTiming => AppointmentTiming::ALL
                .iter()
                .map(|t| Choice::new(t.label(), QuickAction::Timing(*t).token()))
                .collect(),
            BookingState::CollectingDayOfWeek => self
                .available_days()
                .into_iter()
                .map(|d| Choice::new(weekday_name(d), QuickAction::Day(d).token()))
                .collect(),
            BookingState::CollectingTimeOfDay => [TimeOfDay::Morning, TimeOfDay::Afternoon]
                .iter()
                .map(|t| Choice::new(t.label(), QuickAction::Time(*t).token()))
                .collect(),
            BookingState::CollectingLocation => self.locations.choices("location"),
            BookingState::CollectingPainLevel => (1..=10u8)
                .map(|p| Choice::new(p.to_string(), QuickAction::Pain(p).token()))
                .collect(),
            BookingState::CollectingProcedure => self.services.choices("procedure"),
            BookingState::CollectingInsurance => self.insurers.choices("insurance"),
            BookingState::Confirmation => vec![
                Choice::new("Yes, that's correct", "confirm_booking"),
                Choice::new("No, I need to make changes", "edit_booking"),
            ],
            _ => Vec::new(),
        }
    }
}
