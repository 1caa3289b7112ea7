use chrono::Weekday;

/// Canonical weekday order used whenever days are offered as choices.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub const STANDARD_WEEKDAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayHours {
    pub day: Weekday,
    pub hours: String,
}

/// Opening hours parsed from free-text lines such as
/// `"Monday: 9:00 AM – 5:00 PM"`. Closed days are dropped at parse time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessHours {
    pub entries: Vec<DayHours>,
}

impl BusinessHours {
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let entries = lines
            .iter()
            .filter_map(|line| parse_line(line.as_ref()))
            .collect();
        Self { entries }
    }

    /// Appends another location's hours; earlier entries keep priority.
    pub fn merge(&mut self, other: BusinessHours) {
        self.entries.extend(other.entries);
    }

    /// Distinct open days in Monday-first order.
    pub fn open_days(&self) -> Vec<Weekday> {
        WEEK.iter()
            .copied()
            .filter(|d| self.entries.iter().any(|e| e.day == *d))
            .collect()
    }

    pub fn hours_for(&self, day: Weekday) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.day == day)
            .map(|e| e.hours.as_str())
    }

    pub fn to_human_readable(&self) -> String {
        self.open_days()
            .into_iter()
            .filter_map(|d| {
                self.hours_for(d)
                    .map(|h| format!("{}: {h}", short_name(d)))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn parse_line(line: &str) -> Option<DayHours> {
    let (day, hours) = line.trim().split_once(':')?;
    let lower = line.to_lowercase();
    if lower.contains("closed") || lower.contains("unavailable") {
        return None;
    }
    let day = parse_weekday(day)?;
    let hours = hours.trim();
    if hours.is_empty() {
        return None;
    }
    Some(DayHours {
        day,
        hours: hours.to_string(),
    })
}

/// Accepts full names and three-letter abbreviations, any case.
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    match s.trim().to_lowercase().as_str() {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thur" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn short_name(day: Weekday) -> &'static str {
    &weekday_name(day)[..3]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_drops_closed_days() {
        let hours = BusinessHours::from_lines(&["Monday: 9:00 AM – 5:00 PM", "Sunday: Closed"]);
        assert_eq!(hours.open_days(), vec![Weekday::Mon]);
        assert_eq!(hours.hours_for(Weekday::Mon), Some("9:00 AM – 5:00 PM"));
    }

    #[test]
    fn test_parse_drops_unavailable_and_garbage() {
        let hours = BusinessHours::from_lines(&[
            "Tuesday: Unavailable",
            "not a schedule line",
            "Funday: 9:00 AM – 5:00 PM",
            "Wednesday:",
        ]);
        assert!(hours.open_days().is_empty());
    }

    #[test]
    fn test_open_days_sorted_by_week_not_alphabet() {
        let hours = BusinessHours::from_lines(&[
            "Wednesday: 8:00 AM – 4:00 PM",
            "Friday: 8:00 AM – 12:00 PM",
            "Monday: 9:00 AM – 5:00 PM",
        ]);
        assert_eq!(
            hours.open_days(),
            vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]
        );
    }

    #[test]
    fn test_merge_deduplicates_and_keeps_first_hours() {
        let mut hours = BusinessHours::from_lines(&["Monday: 9:00 AM – 5:00 PM"]);
        hours.merge(BusinessHours::from_lines(&[
            "Monday: 7:00 AM – 3:00 PM",
            "Saturday: 10:00 AM – 2:00 PM",
        ]));
        assert_eq!(hours.open_days(), vec![Weekday::Mon, Weekday::Sat]);
        assert_eq!(hours.hours_for(Weekday::Mon), Some("9:00 AM – 5:00 PM"));
    }

    #[test]
    fn test_parse_weekday_forms() {
        assert_eq!(parse_weekday("THURSDAY"), Some(Weekday::Thu));
        assert_eq!(parse_weekday("sat"), Some(Weekday::Sat));
        assert_eq!(parse_weekday("someday"), None);
    }

    #[test]
    fn test_to_human_readable() {
        let hours = BusinessHours::from_lines(&[
            "Friday: 10:00 AM – 4:00 PM",
            "Monday: 9:00 AM – 5:00 PM",
        ]);
        assert_eq!(
            hours.to_human_readable(),
            "Mon: 9:00 AM – 5:00 PM, Fri: 10:00 AM – 4:00 PM"
        );
    }

    #[test]
    fn test_to_human_readable_empty() {
        assert_eq!(BusinessHours::default().to_human_readable(), "");
    }
}
