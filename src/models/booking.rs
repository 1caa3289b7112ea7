use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Every stage of the intake conversation, in flow order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingState {
    Initial,
    PatientTypeSelected,
    CollectingName,
    CollectingDob,
    CollectingPhone,
    CollectingEmail,
    CollectingAppointmentTiming,
    CollectingDayOfWeek,
    CollectingTimeOfDay,
    CollectingLocation,
    CollectingPainLevel,
    CollectingSymptoms,
    CollectingProcedure,
    CollectingInsurance,
    CollectingPolicyHolder,
    CollectingPolicyNumber,
    CollectingGroupNumber,
    CollectingAdditionalInfo,
    Confirmation,
    Complete,
}

impl BookingState {
    pub const ALL: [BookingState; 20] = [
        BookingState::Initial,
        BookingState::PatientTypeSelected,
        BookingState::CollectingName,
        BookingState::CollectingDob,
        BookingState::CollectingPhone,
        BookingState::CollectingEmail,
        BookingState::CollectingAppointmentTiming,
        BookingState::CollectingDayOfWeek,
        BookingState::CollectingTimeOfDay,
        BookingState::CollectingLocation,
        BookingState::CollectingPainLevel,
        BookingState::CollectingSymptoms,
        BookingState::CollectingProcedure,
        BookingState::CollectingInsurance,
        BookingState::CollectingPolicyHolder,
        BookingState::CollectingPolicyNumber,
        BookingState::CollectingGroupNumber,
        BookingState::CollectingAdditionalInfo,
        BookingState::Confirmation,
        BookingState::Complete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingState::Initial => "initial",
            BookingState::PatientTypeSelected => "patient_type_selected",
            BookingState::CollectingName => "collecting_name",
            BookingState::CollectingDob => "collecting_dob",
            BookingState::CollectingPhone => "collecting_phone",
            BookingState::CollectingEmail => "collecting_email",
            BookingState::CollectingAppointmentTiming => "collecting_appointment_timing",
            BookingState::CollectingDayOfWeek => "collecting_day_of_week",
            BookingState::CollectingTimeOfDay => "collecting_time_of_day",
            BookingState::CollectingLocation => "collecting_location",
            BookingState::CollectingPainLevel => "collecting_pain_level",
            BookingState::CollectingSymptoms => "collecting_symptoms",
            BookingState::CollectingProcedure => "collecting_procedure",
            BookingState::CollectingInsurance => "collecting_insurance",
            BookingState::CollectingPolicyHolder => "collecting_policy_holder",
            BookingState::CollectingPolicyNumber => "collecting_policy_number",
            BookingState::CollectingGroupNumber => "collecting_group_number",
            BookingState::CollectingAdditionalInfo => "collecting_additional_info",
            BookingState::Confirmation => "confirmation",
            BookingState::Complete => "complete",
        }
    }

    /// Unlike the stored answers, an unknown state string is reported to the
    /// caller so the reset can be logged.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.iter().copied().find(|state| state.as_str() == s)
    }

    pub fn is_terminal(&self) -> bool {
        *self == BookingState::Complete
    }
}

/// Keys of the answers blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PatientType,
    FirstName,
    LastName,
    DateOfBirth,
    Phone,
    Email,
    AppointmentTiming,
    DayOfWeek,
    BusinessHours,
    TimeOfDay,
    Location,
    PainLevel,
    Symptoms,
    Procedure,
    Insurance,
    PolicyHolder,
    PolicyNumber,
    GroupNumber,
    AdditionalInfo,
}

impl Field {
    /// The step that collects this field.
    pub fn collecting_state(&self) -> BookingState {
        match self {
            Field::PatientType => BookingState::PatientTypeSelected,
            Field::FirstName | Field::LastName => BookingState::CollectingName,
            Field::DateOfBirth => BookingState::CollectingDob,
            Field::Phone => BookingState::CollectingPhone,
            Field::Email => BookingState::CollectingEmail,
            Field::AppointmentTiming => BookingState::CollectingAppointmentTiming,
            Field::DayOfWeek | Field::BusinessHours => BookingState::CollectingDayOfWeek,
            Field::TimeOfDay => BookingState::CollectingTimeOfDay,
            Field::Location => BookingState::CollectingLocation,
            Field::PainLevel => BookingState::CollectingPainLevel,
            Field::Symptoms => BookingState::CollectingSymptoms,
            Field::Procedure => BookingState::CollectingProcedure,
            Field::Insurance => BookingState::CollectingInsurance,
            Field::PolicyHolder => BookingState::CollectingPolicyHolder,
            Field::PolicyNumber => BookingState::CollectingPolicyNumber,
            Field::GroupNumber => BookingState::CollectingGroupNumber,
            Field::AdditionalInfo => BookingState::CollectingAdditionalInfo,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Field::PatientType => "patientType",
            Field::FirstName => "firstName",
            Field::LastName => "lastName",
            Field::DateOfBirth => "dateOfBirth",
            Field::Phone => "phone",
            Field::Email => "email",
            Field::AppointmentTiming => "appointmentTiming",
            Field::DayOfWeek => "dayOfWeek",
            Field::BusinessHours => "businessHours",
            Field::TimeOfDay => "timeOfDay",
            Field::Location => "location",
            Field::PainLevel => "painLevel",
            Field::Symptoms => "symptoms",
            Field::Procedure => "procedure",
            Field::Insurance => "insurance",
            Field::PolicyHolder => "policyHolder",
            Field::PolicyNumber => "policyNumber",
            Field::GroupNumber => "groupNumber",
            Field::AdditionalInfo => "additionalInfo",
        }
    }
}

/// The answer set round-tripped through the caller between turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingAnswers {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_timing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pain_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_holder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

impl BookingAnswers {
    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::PatientType => &self.patient_type,
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::DateOfBirth => &self.date_of_birth,
            Field::Phone => &self.phone,
            Field::Email => &self.email,
            Field::AppointmentTiming => &self.appointment_timing,
            Field::DayOfWeek => &self.day_of_week,
            Field::BusinessHours => &self.business_hours,
            Field::TimeOfDay => &self.time_of_day,
            Field::Location => &self.location,
            Field::PainLevel => &self.pain_level,
            Field::Symptoms => &self.symptoms,
            Field::Procedure => &self.procedure,
            Field::Insurance => &self.insurance,
            Field::PolicyHolder => &self.policy_holder,
            Field::PolicyNumber => &self.policy_number,
            Field::GroupNumber => &self.group_number,
            Field::AdditionalInfo => &self.additional_info,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::PatientType => &mut self.patient_type,
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::DateOfBirth => &mut self.date_of_birth,
            Field::Phone => &mut self.phone,
            Field::Email => &mut self.email,
            Field::AppointmentTiming => &mut self.appointment_timing,
            Field::DayOfWeek => &mut self.day_of_week,
            Field::BusinessHours => &mut self.business_hours,
            Field::TimeOfDay => &mut self.time_of_day,
            Field::Location => &mut self.location,
            Field::PainLevel => &mut self.pain_level,
            Field::Symptoms => &mut self.symptoms,
            Field::Procedure => &mut self.procedure,
            Field::Insurance => &mut self.insurance,
            Field::PolicyHolder => &mut self.policy_holder,
            Field::PolicyNumber => &mut self.policy_number,
            Field::GroupNumber => &mut self.group_number,
            Field::AdditionalInfo => &mut self.additional_info,
        }
    }

    /// Blank strings count as unanswered.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field)
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    pub fn pain_level(&self) -> Option<u8> {
        self.get(Field::PainLevel)
            .and_then(|p| p.parse::<u8>().ok())
            .filter(|p| (1..=10).contains(p))
    }

    /// First required field that is unanswered or unusable, in flow order.
    pub fn first_missing(&self) -> Option<Field> {
        REQUIRED_FIELDS.iter().copied().find(|field| match field {
            Field::PatientType => self.get(*field).and_then(PatientType::parse).is_none(),
            Field::PainLevel => self.pain_level().is_none(),
            _ => self.get(*field).is_none(),
        })
    }

    pub fn full_name(&self) -> Option<String> {
        match (self.get(Field::FirstName), self.get(Field::LastName)) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(one), None) | (None, Some(one)) => Some(one.to_string()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PatientType {
    New,
    Existing,
}

impl PatientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientType::New => "new",
            PatientType::Existing => "existing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "new" => Some(PatientType::New),
            "existing" => Some(PatientType::Existing),
            _ => None,
        }
    }
}

/// The fully validated answer set handed to the calendar collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: String,
    pub company_name: String,
    pub patient_type: PatientType,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub phone: String,
    pub email: String,
    pub appointment_timing: String,
    pub day_of_week: String,
    pub business_hours: Option<String>,
    pub time_of_day: String,
    pub location: String,
    pub pain_level: u8,
    pub symptoms: String,
    pub procedure: String,
    pub insurance: String,
    pub policy_holder: String,
    pub policy_number: String,
    pub group_number: String,
    pub additional_info: Option<String>,
    pub tentative_slot: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

/// Fields that must be present before a booking can be handed off, in the
/// order the flow collects them.
pub const REQUIRED_FIELDS: [Field; 17] = [
    Field::PatientType,
    Field::FirstName,
    Field::LastName,
    Field::DateOfBirth,
    Field::Phone,
    Field::Email,
    Field::AppointmentTiming,
    Field::DayOfWeek,
    Field::TimeOfDay,
    Field::Location,
    Field::PainLevel,
    Field::Symptoms,
    Field::Procedure,
    Field::Insurance,
    Field::PolicyHolder,
    Field::PolicyNumber,
    Field::GroupNumber,
];

impl BookingRecord {
    /// Returns the first missing required field when the answers are
    /// incomplete.
    pub fn from_answers(
        answers: &BookingAnswers,
        company_name: &str,
        created_at: NaiveDateTime,
    ) -> Result<Self, Field> {
        if let Some(missing) = answers.first_missing() {
            return Err(missing);
        }

        let text = |field: Field| answers.get(field).unwrap_or_default().to_string();
        let patient_type =
            PatientType::parse(&text(Field::PatientType)).ok_or(Field::PatientType)?;
        let pain_level = answers.pain_level().ok_or(Field::PainLevel)?;

        Ok(BookingRecord {
            id: uuid::Uuid::new_v4().to_string(),
            company_name: company_name.to_string(),
            patient_type,
            first_name: text(Field::FirstName),
            last_name: text(Field::LastName),
            date_of_birth: text(Field::DateOfBirth),
            phone: text(Field::Phone),
            email: text(Field::Email),
            appointment_timing: text(Field::AppointmentTiming),
            day_of_week: text(Field::DayOfWeek),
            business_hours: answers.get(Field::BusinessHours).map(str::to_string),
            time_of_day: text(Field::TimeOfDay),
            location: text(Field::Location),
            pain_level,
            symptoms: text(Field::Symptoms),
            procedure: text(Field::Procedure),
            insurance: text(Field::Insurance),
            policy_holder: text(Field::PolicyHolder),
            policy_number: text(Field::PolicyNumber),
            group_number: text(Field::GroupNumber),
            additional_info: answers.get(Field::AdditionalInfo).map(str::to_string),
            tentative_slot: None,
            created_at,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
