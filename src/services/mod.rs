pub mod booking_flow;
pub mod calendar;
pub mod catalogue;
pub mod composer;
pub mod context;
pub mod handoff;
pub mod scheduling;
pub mod spelling;
pub mod validation;
