pub mod availability;
pub mod booking;
pub mod tenant;
pub mod turn;

pub use availability::BusinessHours;
pub use booking::{BookingAnswers, BookingRecord, BookingState, Field, PatientType};
pub use tenant::{Location, NamedEntry, TenantConfig, TenantProfile};
pub use turn::{AppointmentTiming, Choice, QuickAction, TimeOfDay, Turn, TurnRequest, TurnResponse};
