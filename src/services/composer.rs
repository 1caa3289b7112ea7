//! Outgoing message text: per-state prompt templates, `{token}`
//! substitution and the confirmation summary.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

use crate::models::{BookingAnswers, BookingState, Field, PatientType};

pub const NOT_PROVIDED: &str = "Not provided";

/// Chooses one of `count` pre-authored phrasings. Purely cosmetic.
pub trait PhrasePicker: Send + Sync {
    fn pick(&self, count: usize) -> usize;
}

pub struct RandomPicker;

impl PhrasePicker for RandomPicker {
    fn pick(&self, count: usize) -> usize {
        if count <= 1 {
            return 0;
        }
        rand::thread_rng().gen_range(0..count)
    }
}

#[derive(Default)]
pub struct RoundRobinPicker {
    next: AtomicUsize,
}

impl PhrasePicker for RoundRobinPicker {
    fn pick(&self, count: usize) -> usize {
        if count == 0 {
            return 0;
        }
        self.next.fetch_add(1, Ordering::Relaxed) % count
    }
}

/// Always the same phrasing; used by tests.
pub struct FixedPicker(pub usize);

impl PhrasePicker for FixedPicker {
    fn pick(&self, count: usize) -> usize {
        if count == 0 {
            return 0;
        }
        self.0 % count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseStrategy {
    Random,
    RoundRobin,
    First,
}

impl PhraseStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "random" => Some(PhraseStrategy::Random),
            "round_robin" | "round-robin" => Some(PhraseStrategy::RoundRobin),
            "first" | "fixed" => Some(PhraseStrategy::First),
            _ => None,
        }
    }

    pub fn picker(&self) -> Box<dyn PhrasePicker> {
        match self {
            PhraseStrategy::Random => Box::new(RandomPicker),
            PhraseStrategy::RoundRobin => Box::new(RoundRobinPicker::default()),
            PhraseStrategy::First => Box::new(FixedPicker(0)),
        }
    }
}

/// Replaces `{name}` placeholders. A placeholder with no value, or an empty
/// one, is left in the text as written.
pub fn format_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let key = &after[..close];
        let value = vars
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .filter(|v| !v.trim().is_empty());
        match value {
            Some(value) => out.push_str(value),
            None => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

/// Phrasings used when the conversation arrives at `state`.
pub fn prompt_templates(state: BookingState) -> &'static [&'static str] {
    match state {
        BookingState::Initial | BookingState::PatientTypeSelected => &[
            "Hi! I'm {agent}, and I'll help you book an appointment with {company}. Are you a new patient or an existing patient?",
            "Welcome to {company}! I'm {agent}. To get started, are you a new or an existing patient?",
            "Hello, this is {agent} from {company}. Have you visited us before, or are you a new patient?",
        ],
        BookingState::CollectingName => &[
            "Great! Let's get you scheduled. What is your full name (first and last)?",
            "Perfect. Could you tell me your first and last name?",
            "Thanks! To begin, what's your full name?",
        ],
        BookingState::CollectingDob => &[
            "Nice to meet you, {firstName}! What is your date of birth? (MM/DD/YYYY)",
            "Thanks, {firstName}. Could you share your date of birth in MM/DD/YYYY format?",
        ],
        BookingState::CollectingPhone => &[
            "Got it. What's the best phone number to reach you?",
            "Thank you. Which phone number should we use to contact you?",
        ],
        BookingState::CollectingEmail => &[
            "And what's your email address?",
            "Great. Where should we send your appointment details? Please share your email address.",
        ],
        BookingState::CollectingAppointmentTiming => &[
            "When would you like to come in?",
            "How soon would you like your appointment?",
        ],
        BookingState::CollectingDayOfWeek => &[
            "Which day of the week works best for you?",
            "What day would you prefer for your visit?",
        ],
        BookingState::CollectingTimeOfDay => &[
            "On {day} we're open {hours}. Do you prefer a morning or an afternoon appointment?",
            "{day} works. Our hours that day are {hours}. Would morning or afternoon suit you better?",
        ],
        BookingState::CollectingLocation => &[
            "Which of our locations would you like to visit?",
            "Where would you like to be seen? Please pick a location.",
        ],
        BookingState::CollectingPainLevel => &[
            "On a scale of 1 to 10, how would you rate your pain or discomfort right now?",
            "How are you feeling? Please rate your pain from 1 (mild) to 10 (severe).",
        ],
        BookingState::CollectingSymptoms => &[
            "Could you briefly describe your symptoms?",
            "Thanks for sharing. What symptoms are you experiencing?",
        ],
        BookingState::CollectingProcedure => &[
            "What type of service are you looking for?",
            "Which service or procedure would you like to book?",
        ],
        BookingState::CollectingInsurance => &[
            "Who is your insurance provider?",
            "Which insurance company are you covered by?",
        ],
        BookingState::CollectingPolicyHolder => &[
            "What is the full name of the primary policy holder?",
            "Who is the policy holder on this insurance plan? Please give their first and last name.",
        ],
        BookingState::CollectingPolicyNumber => &[
            "What is the policy number (member ID) on the insurance card?",
            "Please enter the policy number from your insurance card.",
        ],
        BookingState::CollectingGroupNumber => &[
            "And the group number?",
            "What is the group number on the insurance card?",
        ],
        BookingState::CollectingAdditionalInfo => &[
            "Is there anything else you'd like us to know before your visit? Feel free to leave this blank.",
            "Any other notes for our team? You can send an empty message to skip.",
        ],
        BookingState::Confirmation => &["Is this information correct?"],
        BookingState::Complete => &[
            "You're all set, {firstName}! {company} has received your appointment request for {day} ({timeOfDay}). We'll be in touch shortly to confirm.",
            "Thank you, {firstName}! Your request for a {timeOfDay} appointment on {day} has been sent to {company}. Watch your email for a confirmation.",
        ],
    }
}

/// Re-prompt for a state whose answer was left empty.
pub fn missing_prompt(state: BookingState) -> &'static str {
    match state {
        BookingState::Initial | BookingState::PatientTypeSelected => {
            "Please let me know if you are a new patient or an existing patient."
        }
        BookingState::CollectingName => "I didn't catch your name. What is your first and last name?",
        BookingState::CollectingDob => "I still need your date of birth. Please enter it as MM/DD/YYYY.",
        BookingState::CollectingPhone => "I didn't get a phone number. What number can we reach you at?",
        BookingState::CollectingEmail => "I still need your email address to send you the details.",
        BookingState::CollectingAppointmentTiming => {
            "Please choose when you'd like your appointment: next available, next week, after 2 weeks, or next month."
        }
        BookingState::CollectingDayOfWeek => "Please pick a day of the week for your appointment.",
        BookingState::CollectingTimeOfDay => "Please choose morning or afternoon.",
        BookingState::CollectingLocation => "Please choose one of our locations.",
        BookingState::CollectingPainLevel => "Please rate your pain with a number from 1 to 10.",
        BookingState::CollectingSymptoms => "Please tell me a little about your symptoms.",
        BookingState::CollectingProcedure => "Please choose the service you're interested in.",
        BookingState::CollectingInsurance => "Please tell me who your insurance provider is.",
        BookingState::CollectingPolicyHolder => "I still need the policy holder's first and last name.",
        BookingState::CollectingPolicyNumber => "I still need the policy number from the insurance card.",
        BookingState::CollectingGroupNumber => "I still need the group number from the insurance card.",
        BookingState::CollectingAdditionalInfo => {
            "Anything else you'd like us to know? You can leave this blank."
        }
        BookingState::Confirmation => "Is this information correct?",
        BookingState::Complete => "Your appointment request has already been submitted.",
    }
}

/// Picks and fills one phrasing for `state`.
pub fn compose_prompt(
    picker: &dyn PhrasePicker,
    state: BookingState,
    vars: &[(&str, &str)],
) -> String {
    let templates = prompt_templates(state);
    let idx = picker.pick(templates.len()).min(templates.len().saturating_sub(1));
    templates
        .get(idx)
        .map(|t| format_template(t, vars))
        .unwrap_or_default()
}

fn shown(value: Option<&str>) -> &str {
    value.unwrap_or(NOT_PROVIDED)
}

fn patient_type_label(answers: &BookingAnswers) -> &str {
    match answers.get(Field::PatientType).and_then(PatientType::parse) {
        Some(PatientType::New) => "New patient",
        Some(PatientType::Existing) => "Existing patient",
        None => shown(answers.get(Field::PatientType)),
    }
}

/// Six fixed sections; every field appears, unanswered ones as
/// "Not provided".
pub fn render_summary(answers: &BookingAnswers) -> String {
    let name = answers.full_name();
    let day = match (answers.get(Field::DayOfWeek), answers.get(Field::BusinessHours)) {
        (Some(day), Some(hours)) => format!("{day} ({hours})"),
        (Some(day), None) => day.to_string(),
        (None, _) => NOT_PROVIDED.to_string(),
    };
    let pain = answers
        .get(Field::PainLevel)
        .map(|p| format!("{p}/10"))
        .unwrap_or_else(|| NOT_PROVIDED.to_string());
    let additional = answers
        .get(Field::AdditionalInfo)
        .unwrap_or("No additional information provided");

    let mut out = String::from("Here's a summary of your appointment request:\n\n");

    out.push_str("**Personal Information**\n");
    out.push_str(&format!("- Patient type: {}\n", patient_type_label(answers)));
    out.push_str(&format!("- Name: {}\n", shown(name.as_deref())));
    out.push_str(&format!("- Date of birth: {}\n\n", shown(answers.get(Field::DateOfBirth))));

    out.push_str("**Contact Details**\n");
    out.push_str(&format!("- Phone: {}\n", shown(answers.get(Field::Phone))));
    out.push_str(&format!("- Email: {}\n\n", shown(answers.get(Field::Email))));

    out.push_str("**Appointment Preferences**\n");
    out.push_str(&format!("- Timing: {}\n", shown(answers.get(Field::AppointmentTiming))));
    out.push_str(&format!("- Day: {day}\n"));
    out.push_str(&format!("- Time of day: {}\n", shown(answers.get(Field::TimeOfDay))));
    out.push_str(&format!("- Location: {}\n\n", shown(answers.get(Field::Location))));

    out.push_str("**Medical Information**\n");
    out.push_str(&format!("- Pain level: {pain}\n"));
    out.push_str(&format!("- Symptoms: {}\n", shown(answers.get(Field::Symptoms))));
    out.push_str(&format!("- Service: {}\n\n", shown(answers.get(Field::Procedure))));

    out.push_str("**Insurance Information**\n");
    out.push_str(&format!("- Provider: {}\n", shown(answers.get(Field::Insurance))));
    out.push_str(&format!("- Policy holder: {}\n", shown(answers.get(Field::PolicyHolder))));
    out.push_str(&format!("- Policy number: {}\n", shown(answers.get(Field::PolicyNumber))));
    out.push_str(&format!("- Group number: {}\n\n", shown(answers.get(Field::GroupNumber))));

    out.push_str("**Additional Information**\n");
    out.push_str(&format!("- {additional}\n\n"));

    out.push_str("Is this information correct?");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_template_substitutes_known_tokens() {
        let out = format_template("Hi {name}, welcome to {company}.", &[("name", "Jane"), ("company", "Acme")]);
        assert_eq!(out, "Hi Jane, welcome to Acme.");
    }

    #[test]
    fn test_format_template_leaves_unresolved_tokens() {
        let out = format_template("Hi {name}, see you {day}.", &[("name", "")]);
        assert_eq!(out, "Hi {name}, see you {day}.");
    }

    #[test]
    fn test_format_template_unclosed_brace() {
        assert_eq!(format_template("odd { text", &[]), "odd { text");
    }

    #[test]
    fn test_round_robin_cycles() {
        let picker = RoundRobinPicker::default();
        let picks: Vec<_> = (0..4).map(|_| picker.pick(3)).collect();
        assert_eq!(picks, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_random_picker_stays_in_range() {
        let picker = RandomPicker;
        for _ in 0..50 {
            assert!(picker.pick(3) < 3);
        }
        assert_eq!(picker.pick(0), 0);
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(PhraseStrategy::parse("round_robin"), Some(PhraseStrategy::RoundRobin));
        assert_eq!(PhraseStrategy::parse("FIRST"), Some(PhraseStrategy::First));
        assert_eq!(PhraseStrategy::parse("shuffle"), None);
    }

    #[test]
    fn test_every_state_has_templates() {
        for state in BookingState::ALL {
            assert!(!prompt_templates(state).is_empty(), "{state:?}");
            assert!(!missing_prompt(state).is_empty());
        }
    }

    #[test]
    fn test_compose_prompt_is_deterministic_with_fixed_picker() {
        let picker = FixedPicker(1);
        let a = compose_prompt(&picker, BookingState::CollectingDob, &[("firstName", "Jane")]);
        let b = compose_prompt(&picker, BookingState::CollectingDob, &[("firstName", "Jane")]);
        assert_eq!(a, b);
        assert!(a.contains("Jane"));
    }

    #[test]
    fn test_summary_marks_missing_fields() {
        let mut answers = BookingAnswers::default();
        answers.set(Field::FirstName, "Jane");
        answers.set(Field::LastName, "Doe");
        let summary = render_summary(&answers);
        assert!(summary.contains("- Name: Jane Doe"));
        assert!(summary.contains("- Email: Not provided"));
        assert!(summary.contains("- Pain level: Not provided"));
        for section in [
            "**Personal Information**",
            "**Contact Details**",
            "**Appointment Preferences**",
            "**Medical Information**",
            "**Insurance Information**",
            "**Additional Information**",
        ] {
            assert!(summary.contains(section), "{section}");
        }
        assert!(summary.ends_with("Is this information correct?"));
    }

    #[test]
    fn test_summary_section_order_is_fixed() {
        let summary = render_summary(&BookingAnswers::default());
        let personal = summary.find("Personal Information").unwrap();
        let contact = summary.find("Contact Details").unwrap();
        let insurance = summary.find("Insurance Information").unwrap();
        assert!(personal < contact && contact < insurance);
    }

    #[test]
    fn test_summary_shows_day_with_hours() {
        let mut answers = BookingAnswers::default();
        answers.set(Field::DayOfWeek, "Monday");
        answers.set(Field::BusinessHours, "9:00 AM – 5:00 PM");
        answers.set(Field::PatientType, "existing");
        let summary = render_summary(&answers);
        assert!(summary.contains("- Day: Monday (9:00 AM – 5:00 PM)"));
        assert!(summary.contains("- Patient type: Existing patient"));
        assert!(summary.contains("No additional information provided"));
    }
}
