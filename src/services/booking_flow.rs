//! The booking state machine.
//!
//! Each state maps to one entry of [`FLOW`]. Collecting states pair a
//! capture function with their successor: the capture either stores the
//! (corrected) answer and the flow advances, or rejects the turn and the
//! same state is prompted again with the same choices. Nothing here
//! performs I/O; the caller supplies today's date and the phrase picker.

use chrono::NaiveDate;

use crate::models::availability::weekday_name;
use crate::models::{
    BookingAnswers, BookingState, Choice, Field, PatientType, QuickAction, TenantConfig, Turn,
    TurnResponse,
};
use crate::services::catalogue::{Catalogue, CatalogueList};
use crate::services::composer::{self, PhrasePicker};
use crate::services::context::{self, NormalizedTurn};
use crate::services::spelling::SpellField;
use crate::services::validation::{self, Validated, ValidationError};

/// Read-only inputs shared by every handler during one turn.
pub struct FlowContext<'a> {
    pub tenant: &'a TenantConfig,
    pub catalogue: &'a Catalogue,
    pub picker: &'a dyn PhrasePicker,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub response: String,
    pub choices: Vec<Choice>,
    pub next_state: BookingState,
    pub answers: BookingAnswers,
}

type Capture = fn(&FlowContext<'_>, &Turn, &mut BookingAnswers) -> Validated<()>;

#[derive(Clone, Copy)]
enum Handler {
    Greet,
    Collect { capture: Capture, next: BookingState },
    Confirm,
    Done,
}

const FLOW: [(BookingState, Handler); 20] = [
    (BookingState::Initial, Handler::Greet),
    (
        BookingState::PatientTypeSelected,
        Handler::Collect {
            capture: capture_patient_type,
            next: BookingState::CollectingName,
        },
    ),
    (
        BookingState::CollectingName,
        Handler::Collect {
            capture: capture_name,
            next: BookingState::CollectingDob,
        },
    ),
    (
        BookingState::CollectingDob,
        Handler::Collect {
            capture: capture_dob,
            next: BookingState::CollectingPhone,
        },
    ),
    (
        BookingState::CollectingPhone,
        Handler::Collect {
            capture: capture_phone,
            next: BookingState::CollectingEmail,
        },
    ),
    (
        BookingState::CollectingEmail,
        Handler::Collect {
            capture: capture_email,
            next: BookingState::CollectingAppointmentTiming,
        },
    ),
    (
        BookingState::CollectingAppointmentTiming,
        Handler::Collect {
            capture: capture_timing,
            next: BookingState::CollectingDayOfWeek,
        },
    ),
    (
        BookingState::CollectingDayOfWeek,
        Handler::Collect {
            capture: capture_day,
            next: BookingState::CollectingTimeOfDay,
        },
    ),
    (
        BookingState::CollectingTimeOfDay,
        Handler::Collect {
            capture: capture_time_of_day,
            next: BookingState::CollectingLocation,
        },
    ),
    (
        BookingState::CollectingLocation,
        Handler::Collect {
            capture: capture_location,
            next: BookingState::CollectingPainLevel,
        },
    ),
    (
        BookingState::CollectingPainLevel,
        Handler::Collect {
            capture: capture_pain_level,
            next: BookingState::CollectingSymptoms,
        },
    ),
    (
        BookingState::CollectingSymptoms,
        Handler::Collect {
            capture: capture_symptoms,
            next: BookingState::CollectingProcedure,
        },
    ),
    (
        BookingState::CollectingProcedure,
        Handler::Collect {
            capture: capture_procedure,
            next: BookingState::CollectingInsurance,
        },
    ),
    (
        BookingState::CollectingInsurance,
        Handler::Collect {
            capture: capture_insurance,
            next: BookingState::CollectingPolicyHolder,
        },
    ),
    (
        BookingState::CollectingPolicyHolder,
        Handler::Collect {
            capture: capture_policy_holder,
            next: BookingState::CollectingPolicyNumber,
        },
    ),
    (
        BookingState::CollectingPolicyNumber,
        Handler::Collect {
            capture: capture_policy_number,
            next: BookingState::CollectingGroupNumber,
        },
    ),
    (
        BookingState::CollectingGroupNumber,
        Handler::Collect {
            capture: capture_group_number,
            next: BookingState::CollectingAdditionalInfo,
        },
    ),
    (
        BookingState::CollectingAdditionalInfo,
        Handler::Collect {
            capture: capture_additional_info,
            next: BookingState::Confirmation,
        },
    ),
    (BookingState::Confirmation, Handler::Confirm),
    (BookingState::Complete, Handler::Done),
];

fn handler_for(state: BookingState) -> Handler {
    FLOW.iter()
        .find(|(s, _)| *s == state)
        .map(|(_, handler)| *handler)
        .unwrap_or(Handler::Greet)
}

/// Maps (state, turn, answers) to the outgoing message and the next state.
/// Total: every input yields either progress or a same-state re-prompt.
pub fn transition(
    ctx: &FlowContext<'_>,
    state: BookingState,
    turn: &Turn,
    answers: &BookingAnswers,
) -> Transition {
    let turn = &scoped(state, turn);
    match handler_for(state) {
        Handler::Greet => greet(ctx, turn, answers),
        Handler::Collect { capture, next } => {
            let mut updated = answers.clone();
            match capture(ctx, turn, &mut updated) {
                Ok(()) => arrive(ctx, next, updated),
                Err(err) => reprompt(ctx, state, answers, &err),
            }
        }
        Handler::Confirm => confirm(ctx, turn, answers),
        Handler::Done => Transition {
            response: composer::missing_prompt(BookingState::Complete).to_string(),
            choices: Vec::new(),
            next_state: BookingState::Complete,
            answers: answers.clone(),
        },
    }
}

/// A quick action only counts in the state that offered it; a patient-type
/// click is also taken on the greeting.
fn scoped(state: BookingState, turn: &Turn) -> Turn {
    let action = turn.action.clone().filter(|action| {
        action.state() == state
            || (state == BookingState::Initial && matches!(action, QuickAction::PatientType(_)))
    });
    Turn {
        raw_text: turn.raw_text.clone(),
        action,
    }
}

fn prompt_vars<'a>(
    ctx: &'a FlowContext<'_>,
    answers: &'a BookingAnswers,
) -> Vec<(&'static str, &'a str)> {
    vec![
        ("company", ctx.tenant.company_name()),
        ("agent", ctx.tenant.agent_name()),
        ("firstName", answers.get(Field::FirstName).unwrap_or("")),
        ("day", answers.get(Field::DayOfWeek).unwrap_or("")),
        ("hours", answers.get(Field::BusinessHours).unwrap_or("")),
        ("timeOfDay", answers.get(Field::TimeOfDay).unwrap_or("")),
        ("location", answers.get(Field::Location).unwrap_or("")),
    ]
}

/// Enter `state`: its prompt (or the summary) plus freshly resolved choices.
fn arrive(ctx: &FlowContext<'_>, state: BookingState, answers: BookingAnswers) -> Transition {
    let response = if state == BookingState::Confirmation {
        composer::render_summary(&answers)
    } else {
        composer::compose_prompt(ctx.picker, state, &prompt_vars(ctx, &answers))
    };
    Transition {
        response,
        choices: ctx.catalogue.choices_for(state),
        next_state: state,
        answers,
    }
}

fn reprompt(
    ctx: &FlowContext<'_>,
    state: BookingState,
    answers: &BookingAnswers,
    err: &ValidationError,
) -> Transition {
    tracing::info!(state = state.as_str(), reason = %err, "input rejected, re-prompting");
    let response = match err {
        ValidationError::Missing => composer::missing_prompt(state).to_string(),
        ValidationError::Invalid(hint) => hint.clone(),
    };
    Transition {
        response,
        choices: ctx.catalogue.choices_for(state),
        next_state: state,
        answers: answers.clone(),
    }
}

/// A patient-type click on the very first turn skips the greeting.
fn greet(ctx: &FlowContext<'_>, turn: &Turn, answers: &BookingAnswers) -> Transition {
    if let Some(QuickAction::PatientType(patient_type)) = &turn.action {
        let mut updated = answers.clone();
        updated.set(Field::PatientType, patient_type.as_str());
        return arrive(ctx, BookingState::CollectingName, updated);
    }
    arrive(ctx, BookingState::PatientTypeSelected, answers.clone())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Accept,
    Edit,
    Unclear,
}

const DECLINE_WORDS: &[&str] = &[
    "no", "nope", "not", "change", "changes", "edit", "wrong", "incorrect", "fix",
];
const ACCEPT_WORDS: &[&str] = &[
    "yes", "y", "yeah", "yep", "correct", "confirm", "confirmed", "right", "ok", "okay", "sure",
    "perfect", "good",
];

fn confirmation_decision(turn: &Turn) -> Decision {
    match &turn.action {
        Some(QuickAction::ConfirmBooking) => return Decision::Accept,
        Some(QuickAction::EditBooking) => return Decision::Edit,
        _ => {}
    }
    let lower = turn.trimmed().to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !(c.is_alphabetic() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect();
    if words.iter().any(|w| DECLINE_WORDS.contains(w)) {
        Decision::Edit
    } else if words.iter().any(|w| ACCEPT_WORDS.contains(w)) {
        Decision::Accept
    } else {
        Decision::Unclear
    }
}

fn confirm(ctx: &FlowContext<'_>, turn: &Turn, answers: &BookingAnswers) -> Transition {
    match confirmation_decision(turn) {
        Decision::Accept => match validation::first_unusable(
            answers,
            ctx.today,
            &ctx.catalogue.available_days(),
        ) {
            Some(missing) => {
                let state = missing.collecting_state();
                tracing::warn!(
                    field = missing.key(),
                    next_state = state.as_str(),
                    "confirmation with missing or invalid answers"
                );
                let mut next = arrive(ctx, state, answers.clone());
                next.response = format!(
                    "I'm still missing a few details before I can book this. {}",
                    next.response
                );
                next
            }
            None => arrive(ctx, BookingState::Complete, answers.clone()),
        },
        Decision::Edit => {
            let mut next = arrive(ctx, BookingState::CollectingAdditionalInfo, answers.clone());
            next.response = format!("No problem. {}", next.response);
            next
        }
        Decision::Unclear => arrive(ctx, BookingState::Confirmation, answers.clone()),
    }
}

fn parse_patient_type(text: &str) -> Validated<PatientType> {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return Err(ValidationError::Missing);
    }
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .collect();
    if words.iter().any(|w| matches!(*w, "new" | "first")) {
        return Ok(PatientType::New);
    }
    if words
        .iter()
        .any(|w| matches!(*w, "existing" | "returning" | "current"))
    {
        return Ok(PatientType::Existing);
    }
    Err(ValidationError::Invalid(
        "Sorry, I didn't quite get that. Are you a new patient or an existing patient?".to_string(),
    ))
}

fn capture_patient_type(
    _ctx: &FlowContext<'_>,
    turn: &Turn,
    answers: &mut BookingAnswers,
) -> Validated<()> {
    let patient_type = match &turn.action {
        Some(QuickAction::PatientType(pt)) => *pt,
        _ => parse_patient_type(turn.trimmed())?,
    };
    answers.set(Field::PatientType, patient_type.as_str());
    Ok(())
}

fn capture_name(_ctx: &FlowContext<'_>, turn: &Turn, answers: &mut BookingAnswers) -> Validated<()> {
    let name = validation::validate_full_name(turn.trimmed())?;
    answers.set(Field::FirstName, name.first);
    answers.set(Field::LastName, name.last);
    Ok(())
}

fn capture_dob(ctx: &FlowContext<'_>, turn: &Turn, answers: &mut BookingAnswers) -> Validated<()> {
    let dob = validation::validate_date_of_birth(turn.trimmed(), ctx.today)?;
    answers.set(Field::DateOfBirth, dob);
    Ok(())
}

fn capture_phone(_ctx: &FlowContext<'_>, turn: &Turn, answers: &mut BookingAnswers) -> Validated<()> {
    answers.set(Field::Phone, validation::validate_phone(turn.trimmed())?);
    Ok(())
}

fn capture_email(_ctx: &FlowContext<'_>, turn: &Turn, answers: &mut BookingAnswers) -> Validated<()> {
    answers.set(Field::Email, validation::validate_email(turn.trimmed())?);
    Ok(())
}

fn capture_timing(_ctx: &FlowContext<'_>, turn: &Turn, answers: &mut BookingAnswers) -> Validated<()> {
    let timing = match &turn.action {
        Some(QuickAction::Timing(timing)) => *timing,
        _ => validation::validate_timing(turn.trimmed())?,
    };
    answers.set(Field::AppointmentTiming, timing.as_str());
    Ok(())
}

/// Clicked days still have to be open days.
fn capture_day(ctx: &FlowContext<'_>, turn: &Turn, answers: &mut BookingAnswers) -> Validated<()> {
    let offered = ctx.catalogue.available_days();
    let day = match &turn.action {
        Some(QuickAction::Day(day)) => validation::validate_day(weekday_name(*day), &offered)?,
        _ => validation::validate_day(turn.trimmed(), &offered)?,
    };
    answers.set(Field::DayOfWeek, weekday_name(day));
    answers.set(Field::BusinessHours, ctx.catalogue.hours_for_day(day));
    Ok(())
}

fn capture_time_of_day(
    _ctx: &FlowContext<'_>,
    turn: &Turn,
    answers: &mut BookingAnswers,
) -> Validated<()> {
    let time = match &turn.action {
        Some(QuickAction::Time(time)) => *time,
        _ => validation::validate_time_of_day(turn.trimmed())?,
    };
    answers.set(Field::TimeOfDay, time.as_str());
    Ok(())
}

/// A clicked slug resolves to its catalogue label. A slug that no longer
/// names an entry is validated as if its words had been typed.
fn catalogue_answer(
    list: &CatalogueList,
    slug: Option<&str>,
    turn: &Turn,
    field: SpellField,
    noun: &str,
) -> Validated<String> {
    if let Some(entry) = slug.and_then(|s| list.find_by_slug(s)) {
        return Ok(entry.to_string());
    }
    let text = match slug {
        Some(_) => turn
            .action
            .as_ref()
            .and_then(QuickAction::fallback_text)
            .unwrap_or_default(),
        None => turn.trimmed().to_string(),
    };
    validation::validate_catalogue_choice(&text, list, field, noun)
}

fn capture_location(ctx: &FlowContext<'_>, turn: &Turn, answers: &mut BookingAnswers) -> Validated<()> {
    let slug = match &turn.action {
        Some(QuickAction::Location(slug)) => Some(slug.as_str()),
        _ => None,
    };
    let location = catalogue_answer(
        &ctx.catalogue.locations,
        slug,
        turn,
        SpellField::Location,
        "locations",
    )?;
    answers.set(Field::Location, location);
    Ok(())
}

fn capture_pain_level(
    _ctx: &FlowContext<'_>,
    turn: &Turn,
    answers: &mut BookingAnswers,
) -> Validated<()> {
    let level = match &turn.action {
        Some(QuickAction::Pain(level)) => *level,
        _ => validation::validate_pain_level(turn.trimmed())?,
    };
    answers.set(Field::PainLevel, level.to_string());
    Ok(())
}

fn capture_symptoms(
    _ctx: &FlowContext<'_>,
    turn: &Turn,
    answers: &mut BookingAnswers,
) -> Validated<()> {
    answers.set(Field::Symptoms, validation::validate_symptoms(turn.trimmed())?);
    Ok(())
}

fn capture_procedure(ctx: &FlowContext<'_>, turn: &Turn, answers: &mut BookingAnswers) -> Validated<()> {
    let slug = match &turn.action {
        Some(QuickAction::Procedure(slug)) => Some(slug.as_str()),
        _ => None,
    };
    let procedure = catalogue_answer(
        &ctx.catalogue.services,
        slug,
        turn,
        SpellField::Procedure,
        "services",
    )?;
    answers.set(Field::Procedure, procedure);
    Ok(())
}

fn capture_insurance(ctx: &FlowContext<'_>, turn: &Turn, answers: &mut BookingAnswers) -> Validated<()> {
    let slug = match &turn.action {
        Some(QuickAction::Insurance(slug)) => Some(slug.as_str()),
        _ => None,
    };
    let insurer = catalogue_answer(
        &ctx.catalogue.insurers,
        slug,
        turn,
        SpellField::Insurance,
        "insurance providers",
    )?;
    answers.set(Field::Insurance, insurer);
    Ok(())
}

fn capture_policy_holder(
    _ctx: &FlowContext<'_>,
    turn: &Turn,
    answers: &mut BookingAnswers,
) -> Validated<()> {
    answers.set(
        Field::PolicyHolder,
        validation::validate_policy_holder(turn.trimmed())?,
    );
    Ok(())
}

fn capture_policy_number(
    _ctx: &FlowContext<'_>,
    turn: &Turn,
    answers: &mut BookingAnswers,
) -> Validated<()> {
    answers.set(
        Field::PolicyNumber,
        validation::validate_policy_number(turn.trimmed())?,
    );
    Ok(())
}

fn capture_group_number(
    _ctx: &FlowContext<'_>,
    turn: &Turn,
    answers: &mut BookingAnswers,
) -> Validated<()> {
    answers.set(
        Field::GroupNumber,
        validation::validate_group_number(turn.trimmed())?,
    );
    Ok(())
}

/// Empty input clears any earlier note.
fn capture_additional_info(
    _ctx: &FlowContext<'_>,
    turn: &Turn,
    answers: &mut BookingAnswers,
) -> Validated<()> {
    let info = validation::validate_additional_info(turn.trimmed())?;
    answers.additional_info = (!info.is_empty()).then_some(info);
    Ok(())
}

/// Result of one full turn, ready to encode.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub response: TurnResponse,
    pub answers: BookingAnswers,
    pub tenant: TenantConfig,
    /// True only on the turn that moved Confirmation to Complete.
    pub completed: bool,
}

pub fn process_turn(
    normalized: NormalizedTurn,
    picker: &dyn PhrasePicker,
    today: NaiveDate,
) -> TurnOutcome {
    let NormalizedTurn {
        state,
        answers,
        turn,
        tenant,
        recovery,
    } = normalized;

    let catalogue = Catalogue::resolve(&tenant);
    let ctx = FlowContext {
        tenant: &tenant,
        catalogue: &catalogue,
        picker,
        today,
    };
    let mut result = transition(&ctx, state, &turn, &answers);
    if recovery.is_some() {
        result.response = format!("Let's start fresh. {}", result.response);
    }

    let action = turn
        .action
        .as_ref()
        .map(QuickAction::token)
        .unwrap_or_else(|| "none".to_string());
    tracing::info!(
        state = state.as_str(),
        next_state = result.next_state.as_str(),
        action = %action,
        "booking turn"
    );

    let completed =
        state == BookingState::Confirmation && result.next_state == BookingState::Complete;
    let response = TurnResponse {
        response_text: result.response,
        suggested_choices: result.choices,
        next_state: result.next_state,
        answers: context::pack_answers(&result.answers),
        is_terminal: result.next_state.is_terminal(),
        booking_record: None,
    };

    TurnOutcome {
        response,
        answers: result.answers,
        tenant,
        completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TurnRequest;
    use crate::services::composer::FixedPicker;
    use crate::services::context::normalize;
    use serde_json::{json, Value};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn tenant(value: Value) -> TenantConfig {
        serde_json::from_value(value).unwrap()
    }

    fn acme() -> TenantConfig {
        tenant(acme_json())
    }

    fn acme_json() -> Value {
        json!({
            "companyName": "Acme Spine",
            "agentName": "Ava",
            "locations": [{
                "name": "Downtown",
                "hours": ["Monday: 9:00 AM – 5:00 PM", "Sunday: Closed"]
            }],
            "services": ["Physical Therapy", "Chiropractic Care"],
            "insuranceProviders": ["Aetna", "Blue Cross Blue Shield"]
        })
    }

    fn step(
        tenant: &TenantConfig,
        state: BookingState,
        turn: Turn,
        answers: &BookingAnswers,
    ) -> Transition {
        let catalogue = Catalogue::resolve(tenant);
        let picker = FixedPicker(0);
        let ctx = FlowContext {
            tenant,
            catalogue: &catalogue,
            picker: &picker,
            today: today(),
        };
        transition(&ctx, state, &turn, answers)
    }

    fn sample_turns() -> Vec<Turn> {
        vec![
            Turn::default(),
            Turn::text("   "),
            Turn::text("¯\\_(ツ)_/¯"),
            Turn::text("Jane Doe"),
            Turn::text("4"),
            Turn::action("new_patient"),
            Turn::action("day_sunday"),
            Turn::action("time_morning"),
            Turn::action("location_nowhere"),
            Turn::action("procedure_physical_therapy"),
            Turn::action("insurance_aetna"),
            Turn::action("confirm_booking"),
            Turn::action("edit_booking"),
            Turn::action("pain_7"),
        ]
    }

    #[test]
    fn test_transition_is_total_and_rejections_keep_answers() {
        let tenants = [TenantConfig::default(), acme()];
        let mut answers = BookingAnswers::default();
        answers.set(Field::FirstName, "Jane");
        for tenant in &tenants {
            for state in BookingState::ALL {
                for turn in sample_turns() {
                    let t = step(tenant, state, turn.clone(), &answers);
                    assert!(BookingState::ALL.contains(&t.next_state));
                    assert!(!t.response.is_empty(), "{state:?} {turn:?}");
                    if t.next_state == state {
                        assert_eq!(t.answers, answers, "{state:?} {turn:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_invalid_twice_same_reprompt() {
        let answers = BookingAnswers::default();
        let first = step(&acme(), BookingState::CollectingPhone, Turn::text("555-123"), &answers);
        let second = step(&acme(), BookingState::CollectingPhone, Turn::text("555-123"), &answers);
        assert_eq!(first.next_state, BookingState::CollectingPhone);
        assert_eq!(first.response, second.response);
        assert_eq!(first.answers, answers);
        assert_eq!(second.answers, answers);
    }

    #[test]
    fn test_missing_and_invalid_are_worded_differently() {
        let answers = BookingAnswers::default();
        let missing = step(&acme(), BookingState::CollectingEmail, Turn::text(""), &answers);
        let invalid = step(&acme(), BookingState::CollectingEmail, Turn::text("nope"), &answers);
        assert_eq!(missing.next_state, BookingState::CollectingEmail);
        assert_eq!(invalid.next_state, BookingState::CollectingEmail);
        assert_ne!(missing.response, invalid.response);
    }

    #[test]
    fn test_name_is_corrected_and_advances() {
        let t = step(
            &acme(),
            BookingState::CollectingName,
            Turn::text("jogn smith"),
            &BookingAnswers::default(),
        );
        assert_eq!(t.next_state, BookingState::CollectingDob);
        assert_eq!(t.answers.full_name().as_deref(), Some("John Smith"));
        assert!(t.response.contains("John"));
    }

    #[test]
    fn test_dob_rules() {
        let answers = BookingAnswers::default();
        let bad = step(&acme(), BookingState::CollectingDob, Turn::text("13/40/2020"), &answers);
        assert_eq!(bad.next_state, BookingState::CollectingDob);
        let good = step(&acme(), BookingState::CollectingDob, Turn::text("03/15/1985"), &answers);
        assert_eq!(good.next_state, BookingState::CollectingPhone);
        assert_eq!(good.answers.get(Field::DateOfBirth), Some("03/15/1985"));
    }

    #[test]
    fn test_phone_rules() {
        let answers = BookingAnswers::default();
        let bad = step(&acme(), BookingState::CollectingPhone, Turn::text("555-123"), &answers);
        assert_eq!(bad.next_state, BookingState::CollectingPhone);
        let good = step(&acme(), BookingState::CollectingPhone, Turn::text("5551234567"), &answers);
        assert_eq!(good.next_state, BookingState::CollectingEmail);
    }

    #[test]
    fn test_location_choices_never_empty_without_locations() {
        let t = step(
            &TenantConfig::default(),
            BookingState::CollectingTimeOfDay,
            Turn::action("time_afternoon"),
            &BookingAnswers::default(),
        );
        assert_eq!(t.next_state, BookingState::CollectingLocation);
        assert!(!t.choices.is_empty());
    }

    #[test]
    fn test_day_choices_follow_business_hours() {
        let t = step(
            &acme(),
            BookingState::CollectingAppointmentTiming,
            Turn::action("timing_next_week"),
            &BookingAnswers::default(),
        );
        assert_eq!(t.next_state, BookingState::CollectingDayOfWeek);
        assert_eq!(t.choices, vec![Choice::new("Monday", "day_monday")]);
    }

    #[test]
    fn test_day_click_must_be_offered() {
        let answers = BookingAnswers::default();
        let closed = step(&acme(), BookingState::CollectingDayOfWeek, Turn::action("day_sunday"), &answers);
        assert_eq!(closed.next_state, BookingState::CollectingDayOfWeek);
        assert_eq!(closed.choices, vec![Choice::new("Monday", "day_monday")]);

        let open = step(&acme(), BookingState::CollectingDayOfWeek, Turn::action("day_monday"), &answers);
        assert_eq!(open.next_state, BookingState::CollectingTimeOfDay);
        assert_eq!(open.answers.get(Field::DayOfWeek), Some("Monday"));
        assert_eq!(open.answers.get(Field::BusinessHours), Some("9:00 AM – 5:00 PM"));
        assert!(open.response.contains("9:00 AM – 5:00 PM"));
    }

    #[test]
    fn test_token_for_another_state_is_not_authoritative() {
        let t = step(
            &acme(),
            BookingState::CollectingName,
            Turn::action("day_monday"),
            &BookingAnswers::default(),
        );
        assert_eq!(t.next_state, BookingState::CollectingName);
        assert_eq!(t.response, composer::missing_prompt(BookingState::CollectingName));
    }

    #[test]
    fn test_catalogue_token_stores_label() {
        let t = step(
            &acme(),
            BookingState::CollectingProcedure,
            Turn::action("procedure_physical_therapy"),
            &BookingAnswers::default(),
        );
        assert_eq!(t.next_state, BookingState::CollectingInsurance);
        assert_eq!(t.answers.get(Field::Procedure), Some("Physical Therapy"));
        assert_eq!(t.choices.len(), 2);
    }

    #[test]
    fn test_authoritative_catalogue_rejects_unknown_text() {
        let t = step(
            &acme(),
            BookingState::CollectingInsurance,
            Turn::text("Oscar"),
            &BookingAnswers::default(),
        );
        assert_eq!(t.next_state, BookingState::CollectingInsurance);
        assert!(t.response.contains("Aetna, Blue Cross Blue Shield"));

        let partial = step(
            &acme(),
            BookingState::CollectingInsurance,
            Turn::text("blue cross"),
            &BookingAnswers::default(),
        );
        assert_eq!(partial.answers.get(Field::Insurance), Some("Blue Cross Blue Shield"));
    }

    #[test]
    fn test_initial_greets_or_takes_patient_type() {
        let answers = BookingAnswers::default();
        let greet = step(&acme(), BookingState::Initial, Turn::default(), &answers);
        assert_eq!(greet.next_state, BookingState::PatientTypeSelected);
        assert!(greet.response.contains("Acme Spine"));
        assert!(greet.response.contains("Ava"));
        assert_eq!(greet.choices.len(), 2);

        let clicked = step(&acme(), BookingState::Initial, Turn::action("existing_patient"), &answers);
        assert_eq!(clicked.next_state, BookingState::CollectingName);
        assert_eq!(clicked.answers.get(Field::PatientType), Some("existing"));
    }

    #[test]
    fn test_confirmation_branches() {
        let mut answers = BookingAnswers::default();
        answers.set(Field::FirstName, "Jane");

        let edit = step(&acme(), BookingState::Confirmation, Turn::action("edit_booking"), &answers);
        assert_eq!(edit.next_state, BookingState::CollectingAdditionalInfo);

        let unclear = step(&acme(), BookingState::Confirmation, Turn::text("hmm"), &answers);
        assert_eq!(unclear.next_state, BookingState::Confirmation);
        assert!(unclear.response.contains("Is this information correct?"));

        // forged blob: confirming with gaps goes back to the first gap
        let forged = step(&acme(), BookingState::Confirmation, Turn::text("yes"), &answers);
        assert_eq!(forged.next_state, BookingState::PatientTypeSelected);
    }

    fn valid_answers() -> BookingAnswers {
        let mut a = BookingAnswers::default();
        for (field, value) in [
            (Field::PatientType, "new"),
            (Field::FirstName, "Jane"),
            (Field::LastName, "Doe"),
            (Field::DateOfBirth, "03/15/1985"),
            (Field::Phone, "5551234567"),
            (Field::Email, "jane@x.com"),
            (Field::AppointmentTiming, "next week"),
            (Field::DayOfWeek, "Monday"),
            (Field::TimeOfDay, "morning"),
            (Field::Location, "Downtown"),
            (Field::PainLevel, "4"),
            (Field::Symptoms, "lower back pain"),
            (Field::Procedure, "Physical Therapy"),
            (Field::Insurance, "Aetna"),
            (Field::PolicyHolder, "Jane Doe"),
            (Field::PolicyNumber, "XYZ123456"),
            (Field::GroupNumber, "GRP-01"),
        ] {
            a.set(field, value);
        }
        a
    }

    #[test]
    fn test_confirming_rechecks_every_answer() {
        let confirm = |answers: &BookingAnswers| {
            step(&acme(), BookingState::Confirmation, Turn::action("confirm_booking"), answers)
        };
        assert_eq!(confirm(&valid_answers()).next_state, BookingState::Complete);

        let cases = [
            (Field::Email, "not-an-email", BookingState::CollectingEmail),
            (Field::Phone, "abc", BookingState::CollectingPhone),
            (Field::DateOfBirth, "yesterday", BookingState::CollectingDob),
            (Field::DayOfWeek, "Funday", BookingState::CollectingDayOfWeek),
            // a real weekday the practice is closed on
            (Field::DayOfWeek, "Sunday", BookingState::CollectingDayOfWeek),
            (Field::AppointmentTiming, "someday", BookingState::CollectingAppointmentTiming),
            (Field::TimeOfDay, "midnight", BookingState::CollectingTimeOfDay),
            (Field::PolicyNumber, "x", BookingState::CollectingPolicyNumber),
            (Field::GroupNumber, "<script>", BookingState::CollectingGroupNumber),
            (Field::LastName, "D0e", BookingState::CollectingName),
        ];
        for (field, value, expected) in cases {
            let mut answers = valid_answers();
            answers.set(field, value);
            let t = confirm(&answers);
            assert_eq!(t.next_state, expected, "{} = {value}", field.key());
            assert!(t.response.starts_with("I'm still missing a few details"));
        }

        let mut answers = valid_answers();
        answers.set(Field::AdditionalInfo, "x".repeat(1001));
        assert_eq!(confirm(&answers).next_state, BookingState::CollectingAdditionalInfo);
    }

    #[test]
    fn test_forged_blob_never_completes() {
        let mut blob = serde_json::to_value(valid_answers()).unwrap();
        blob["email"] = json!("not-an-email");
        let request: TurnRequest = serde_json::from_value(json!({
            "currentState": "confirmation",
            "answers": blob.to_string(),
            "actionToken": "confirm_booking",
            "tenantConfig": acme_json(),
        }))
        .unwrap();
        let outcome = process_turn(
            normalize(request, &TenantConfig::default()),
            &FixedPicker(0),
            today(),
        );
        assert_eq!(outcome.response.next_state, BookingState::CollectingEmail);
        assert!(!outcome.completed);
    }

    #[test]
    fn test_token_from_another_state_is_ignored() {
        let turn = Turn::new(Some("lower back pain".to_string()), Some("day_monday"));
        let t = step(&acme(), BookingState::CollectingSymptoms, turn, &BookingAnswers::default());
        assert_eq!(t.next_state, BookingState::CollectingProcedure);
        assert_eq!(t.answers.get(Field::Symptoms), Some("lower back pain"));
        assert_eq!(t.answers.get(Field::DayOfWeek), None);

        let stray = step(
            &acme(),
            BookingState::CollectingTimeOfDay,
            Turn::action("confirm_booking"),
            &BookingAnswers::default(),
        );
        assert_eq!(stray.next_state, BookingState::CollectingTimeOfDay);
    }

    #[test]
    fn test_complete_is_terminal() {
        let t = step(
            &acme(),
            BookingState::Complete,
            Turn::text("hello again"),
            &BookingAnswers::default(),
        );
        assert_eq!(t.next_state, BookingState::Complete);
        assert!(t.choices.is_empty());
    }

    #[test]
    fn test_additional_info_empty_is_not_stored() {
        let mut answers = BookingAnswers::default();
        answers.set(Field::AdditionalInfo, "old note");
        let t = step(&acme(), BookingState::CollectingAdditionalInfo, Turn::text(""), &answers);
        assert_eq!(t.next_state, BookingState::Confirmation);
        assert_eq!(t.answers.additional_info, None);
    }

    struct Session {
        state: BookingState,
        answers: String,
        tenant: Value,
    }

    impl Session {
        fn send(&mut self, text: Option<&str>, token: Option<&str>) -> TurnOutcome {
            let request: TurnRequest = serde_json::from_value(json!({
                "currentState": self.state.as_str(),
                "answers": self.answers,
                "rawText": text,
                "actionToken": token,
                "tenantConfig": self.tenant,
            }))
            .unwrap();
            let outcome = process_turn(
                normalize(request, &TenantConfig::default()),
                &FixedPicker(0),
                today(),
            );
            self.state = outcome.response.next_state;
            self.answers = outcome.response.answers.clone();
            outcome
        }
    }

    #[test]
    fn test_end_to_end_booking() {
        let mut session = Session {
            state: BookingState::Initial,
            answers: String::new(),
            tenant: json!({
                "companyName": "Acme Spine",
                "locations": [{"name": "Downtown", "hours": ["Monday: 9:00 AM – 5:00 PM", "Sunday: Closed"]}],
                "services": ["Physical Therapy"],
                "insuranceProviders": ["Aetna"]
            }),
        };

        let script: [(Option<&str>, Option<&str>, BookingState); 19] = [
            (None, None, BookingState::PatientTypeSelected),
            (None, Some("new_patient"), BookingState::CollectingName),
            (Some("Jane Doe"), None, BookingState::CollectingDob),
            (Some("03/15/1985"), None, BookingState::CollectingPhone),
            (Some("5551234567"), None, BookingState::CollectingEmail),
            (Some("jane@x.com"), None, BookingState::CollectingAppointmentTiming),
            (None, Some("timing_next_week"), BookingState::CollectingDayOfWeek),
            (None, Some("day_monday"), BookingState::CollectingTimeOfDay),
            (None, Some("time_morning"), BookingState::CollectingLocation),
            (None, Some("location_downtown"), BookingState::CollectingPainLevel),
            (Some("4"), None, BookingState::CollectingSymptoms),
            (Some("lower back pain"), None, BookingState::CollectingProcedure),
            (None, Some("procedure_physical_therapy"), BookingState::CollectingInsurance),
            (None, Some("insurance_aetna"), BookingState::CollectingPolicyHolder),
            (Some("Jane Doe"), None, BookingState::CollectingPolicyNumber),
            (Some("XYZ123456"), None, BookingState::CollectingGroupNumber),
            (Some("GRP-01"), None, BookingState::CollectingAdditionalInfo),
            (Some(""), None, BookingState::Confirmation),
            (None, Some("confirm_booking"), BookingState::Complete),
        ];

        for (i, (text, token, expected)) in script.into_iter().enumerate() {
            let outcome = session.send(text, token);
            assert_eq!(outcome.response.next_state, expected, "step {i}");
            if expected == BookingState::Confirmation {
                assert!(!outcome.response.response_text.contains("Not provided"));
                assert!(outcome.answers.first_missing().is_none());
            }
            if expected == BookingState::Complete {
                assert!(outcome.completed);
                assert!(outcome.response.is_terminal);
                assert!(outcome.response.response_text.contains("Jane"));
            } else {
                assert!(!outcome.completed);
            }
        }

        let again = session.send(Some("thanks"), None);
        assert_eq!(again.response.next_state, BookingState::Complete);
        assert!(!again.completed);
    }

    #[test]
    fn test_malformed_blob_starts_fresh() {
        let request: TurnRequest = serde_json::from_value(json!({
            "currentState": "collecting_email",
            "answers": "{{{{",
            "rawText": "jane@x.com"
        }))
        .unwrap();
        let outcome = process_turn(
            normalize(request, &TenantConfig::default()),
            &FixedPicker(0),
            today(),
        );
        assert_eq!(outcome.response.next_state, BookingState::PatientTypeSelected);
        assert!(outcome.response.response_text.starts_with("Let's start fresh."));
        assert_eq!(outcome.response.answers, "{}");
    }
}
