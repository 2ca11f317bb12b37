//! Week to sprint mapping

use chrono::{Days, NaiveDate};

use crate::domain::Sprint;

/// Maps grid weeks onto sprint codes
///
/// Week 1 starts on the first listed sprint's start date; each week is
/// seven days.
#[derive(Debug, Clone)]
pub struct SprintCalendar<'a> {
    sprints: &'a [Sprint],
    week0: Option<NaiveDate>,
}

impl<'a> SprintCalendar<'a> {
    pub fn new(sprints: &'a [Sprint]) -> Self {
        Self {
            sprints,
            week0: sprints.first().map(|s| s.start),
        }
    }

    /// Start date of a 0-based week
    pub fn week_start(&self, week: usize) -> Option<NaiveDate> {
        self.week0?.checked_add_days(Days::new(7 * week as u64))
    }

    /// Sprint containing the start of a 0-based week
    pub fn sprint_for_week(&self, week: usize) -> Option<&'a str> {
        let date = self.week_start(week)?;
        self.sprints
            .iter()
            .find(|s| s.start <= date && date <= s.end)
            .map(|s| s.code.as_str())
    }

    /// Distinct sprint codes covering 1-based weeks `start..=end`
    pub fn sprints_between(&self, start: Option<u32>, end: Option<u32>) -> Vec<String> {
        let (Some(start), Some(end)) = (start, end) else {
            return Vec::new();
        };
        let mut codes: Vec<String> = Vec::new();
        for week in start.saturating_sub(1)..end {
            if let Some(code) = self.sprint_for_week(week as usize) {
                if !codes.iter().any(|c| c == code) {
                    codes.push(code.to_string());
                }
            }
        }
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn sprints() -> Vec<Sprint> {
        vec![
            Sprint::new("Q1S1", date(1, 6), date(1, 19)),
            Sprint::new("Q1S2", date(1, 20), date(2, 2)),
        ]
    }

    #[test]
    fn test_week_mapping() {
        let sprints = sprints();
        let calendar = SprintCalendar::new(&sprints);

        assert_eq!(calendar.week_start(2), Some(date(1, 20)));
        assert_eq!(calendar.sprint_for_week(0), Some("Q1S1"));
        assert_eq!(calendar.sprint_for_week(1), Some("Q1S1"));
        assert_eq!(calendar.sprint_for_week(2), Some("Q1S2"));
        assert_eq!(calendar.sprint_for_week(4), None);
    }

    #[test]
    fn test_sprints_between() {
        let sprints = sprints();
        let calendar = SprintCalendar::new(&sprints);

        assert_eq!(calendar.sprints_between(Some(1), Some(3)), vec!["Q1S1", "Q1S2"]);
        assert_eq!(calendar.sprints_between(Some(1), Some(2)), vec!["Q1S1"]);
        assert!(calendar.sprints_between(None, Some(2)).is_empty());
    }

    #[test]
    fn test_no_sprints() {
        let calendar = SprintCalendar::new(&[]);
        assert_eq!(calendar.week_start(0), None);
        assert!(calendar.sprints_between(Some(1), Some(4)).is_empty());
    }
}
