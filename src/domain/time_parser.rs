use chrono::NaiveTime;

/// Parses a time of day written either as 24-hour `HH:MM` (seconds are
/// tolerated) or as 12-hour `hh:mm AM/PM`. Anything else, including empty
/// input, yields `None`.
pub fn parse_time_of_day(value: Option<&str>) -> Option<NaiveTime> {
    let raw = value.map(str::trim).filter(|raw| !raw.is_empty())?;
    parse_twenty_four_hour(raw).or_else(|| parse_twelve_hour(raw))
}

fn parse_twenty_four_hour(raw: &str) -> Option<NaiveTime> {
    let mut parts = raw.split(':');
    let hour = parse_clock_field(parts.next()?)?;
    let minute = parse_clock_field(parts.next()?)?;
    let second = match parts.next() {
        Some(second) => parse_clock_field(second)?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, second)
}

fn parse_twelve_hour(raw: &str) -> Option<NaiveTime> {
    let upper = raw.to_ascii_uppercase();
    let (clock, afternoon) = if let Some(clock) = upper.strip_suffix("AM") {
        (clock, false)
    } else if let Some(clock) = upper.strip_suffix("PM") {
        (clock, true)
    } else {
        return None;
    };

    let (hour, minute) = clock.trim_end().split_once(':')?;
    let hour = parse_clock_field(hour)?;
    let minute = parse_clock_field(minute)?;
    if !(1..=12).contains(&hour) {
        return None;
    }

    let hour = match (hour, afternoon) {
        (12, false) => 0,
        (12, true) => 12,
        (hour, false) => hour,
        (hour, true) => hour + 12,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn parse_clock_field(value: &str) -> Option<u32> {
    if value.is_empty() || value.len() > 2 || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hm(hour: u32, minute: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(hour, minute, 0)
    }

    #[test]
    fn parses_twenty_four_hour_times() {
        assert_eq!(parse_time_of_day(Some("14:30")), hm(14, 30));
        assert_eq!(parse_time_of_day(Some("00:00")), hm(0, 0));
        assert_eq!(parse_time_of_day(Some("9:05")), hm(9, 5));
        assert_eq!(parse_time_of_day(Some("23:59:00")), hm(23, 59));
    }

    #[test]
    fn parses_twelve_hour_times() {
        assert_eq!(parse_time_of_day(Some("2:30 PM")), hm(14, 30));
        assert_eq!(parse_time_of_day(Some("02:30 pm")), hm(14, 30));
        assert_eq!(parse_time_of_day(Some("12:15 AM")), hm(0, 15));
        assert_eq!(parse_time_of_day(Some("12:00 PM")), hm(12, 0));
        assert_eq!(parse_time_of_day(Some("7:45AM")), hm(7, 45));
    }

    #[test]
    fn empty_and_missing_values_are_none() {
        assert_eq!(parse_time_of_day(None), None);
        assert_eq!(parse_time_of_day(Some("")), None);
        assert_eq!(parse_time_of_day(Some("   ")), None);
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_time_of_day(Some("garbage")), None);
        assert_eq!(parse_time_of_day(Some("25:00")), None);
        assert_eq!(parse_time_of_day(Some("12:60")), None);
        assert_eq!(parse_time_of_day(Some("13:00 PM")), None);
        assert_eq!(parse_time_of_day(Some("+1:30")), None);
        assert_eq!(parse_time_of_day(Some("1:2:3:4")), None);
    }

    proptest! {
        #[test]
        fn never_panics_on_arbitrary_input(raw in ".*") {
            let _ = parse_time_of_day(Some(&raw));
        }

        #[test]
        fn formatted_times_round_trip(hour in 0u32..24, minute in 0u32..60) {
            let formatted = format!("{hour:02}:{minute:02}");
            prop_assert_eq!(parse_time_of_day(Some(&formatted)), hm(hour, minute));
        }
    }
}
