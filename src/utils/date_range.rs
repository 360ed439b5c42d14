use chrono::{Datelike, NaiveDate, Weekday};

pub fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Expands an inclusive `[from, to]` range into its calendar days, skipping
/// Saturdays and Sundays unless `include_weekends` is set.
///
/// This is the one range expansion in the codebase: the computed list view,
/// the range-apply recorder, and both exports all walk days through here so
/// the weekend policy cannot drift between paths.
pub fn expand_range(from: NaiveDate, to: NaiveDate, include_weekends: bool) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = from;
    while day <= to {
        if include_weekends || !is_weekend(day) {
            days.push(day);
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn weekdays_only_by_default() {
        // 2024-03-04 is a Monday; the 9th/10th are the weekend.
        let days = expand_range(d("2024-03-04"), d("2024-03-10"), false);
        assert_eq!(
            days,
            vec![
                d("2024-03-04"),
                d("2024-03-05"),
                d("2024-03-06"),
                d("2024-03-07"),
                d("2024-03-08"),
            ]
        );
        assert!(days.iter().all(|day| !is_weekend(*day)));
    }

    #[test]
    fn include_weekends_keeps_every_day() {
        let days = expand_range(d("2024-03-04"), d("2024-03-10"), true);
        assert_eq!(days.len(), 7);
        assert_eq!(days.first(), Some(&d("2024-03-04")));
        assert_eq!(days.last(), Some(&d("2024-03-10")));
        assert_eq!(days.iter().filter(|day| is_weekend(**day)).count(), 2);
    }

    #[test]
    fn range_is_inclusive_on_both_ends() {
        let days = expand_range(d("2024-03-05"), d("2024-03-05"), false);
        assert_eq!(days, vec![d("2024-03-05")]);
    }

    #[test]
    fn weekend_only_range_expands_to_nothing() {
        let days = expand_range(d("2024-03-09"), d("2024-03-10"), false);
        assert!(days.is_empty());
    }

    #[test]
    fn inverted_range_expands_to_nothing() {
        let days = expand_range(d("2024-03-10"), d("2024-03-04"), true);
        assert!(days.is_empty());
    }
}
