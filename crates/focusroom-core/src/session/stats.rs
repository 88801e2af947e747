//! Aggregates over logged sessions.
//!
//! All functions take `today` explicitly; only completed Work sessions count.
//! Weeks run Sunday through Saturday.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::Session;

/// Minutes per day for one Sunday–Saturday week, all seven days present.
pub type WeeklyBreakdown = BTreeMap<NaiveDate, u32>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub today_count: u32,
    pub today_minutes: u32,
    pub week_minutes: u32,
    pub streak_days: u32,
}

/// First (Sunday) and last (Saturday) day of the week containing `day`.
pub fn week_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = i64::from(day.weekday().num_days_from_sunday());
    let start = day - Duration::days(offset);
    (start, start + Duration::days(6))
}

fn qualifying(sessions: &[Session]) -> impl Iterator<Item = &Session> {
    sessions.iter().filter(|s| s.counts_as_work())
}

pub fn day_total(sessions: &[Session], day: NaiveDate) -> u32 {
    qualifying(sessions)
        .filter(|s| s.date == day)
        .map(|s| s.duration_minutes)
        .sum()
}

pub fn day_count(sessions: &[Session], day: NaiveDate) -> u32 {
    qualifying(sessions).filter(|s| s.date == day).count() as u32
}

/// Minutes within `start..=end`.
pub fn range_total(sessions: &[Session], start: NaiveDate, end: NaiveDate) -> u32 {
    qualifying(sessions)
        .filter(|s| s.date >= start && s.date <= end)
        .map(|s| s.duration_minutes)
        .sum()
}

pub fn week_total(sessions: &[Session], today: NaiveDate) -> u32 {
    let (start, end) = week_bounds(today);
    range_total(sessions, start, end)
}

pub fn weekly_by_day(sessions: &[Session], today: NaiveDate) -> WeeklyBreakdown {
    let (start, _) = week_bounds(today);
    let mut days: WeeklyBreakdown = (0..7).map(|i| (start + Duration::days(i), 0)).collect();
    for s in qualifying(sessions) {
        if let Some(total) = days.get_mut(&s.date) {
            *total += s.duration_minutes;
        }
    }
    days
}

/// Consecutive days with at least one Work session, ending today.
///
/// A day with nothing logged yet does not break the streak until it is over,
/// so counting starts from yesterday when today is still empty.
pub fn streak(sessions: &[Session], today: NaiveDate) -> u32 {
    let active: BTreeSet<NaiveDate> = qualifying(sessions).map(|s| s.date).collect();

    let mut day = if active.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };
    let mut run = 0;
    while active.contains(&day) {
        run += 1;
        day -= Duration::days(1);
    }
    run
}

pub fn summarize(sessions: &[Session], today: NaiveDate) -> SessionStats {
    SessionStats {
        today_count: day_count(sessions, today),
        today_minutes: day_total(sessions, today),
        week_minutes: week_total(sessions, today),
        streak_days: streak(sessions, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionKind;
    use chrono::Utc;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn work(date: NaiveDate, minutes: u32) -> Session {
        Session::completed(SessionKind::Work, minutes, date, Utc::now())
    }

    #[test]
    fn week_runs_sunday_to_saturday() {
        // 2026-10-14 is a Wednesday.
        let (start, end) = week_bounds(day(2026, 10, 14));
        assert_eq!(start, day(2026, 10, 11));
        assert_eq!(end, day(2026, 10, 17));

        // A Sunday starts its own week.
        assert_eq!(week_bounds(day(2026, 10, 11)).0, day(2026, 10, 11));
        // A Saturday ends it.
        assert_eq!(week_bounds(day(2026, 10, 17)).0, day(2026, 10, 11));
    }

    #[test]
    fn breaks_and_incomplete_sessions_do_not_count() {
        let today = day(2026, 10, 14);
        let mut unfinished = work(today, 25);
        unfinished.completed = false;
        let sessions = vec![
            work(today, 25),
            Session::completed(SessionKind::Break, 5, today, Utc::now()),
            unfinished,
        ];
        assert_eq!(day_total(&sessions, today), 25);
        assert_eq!(day_count(&sessions, today), 1);
    }

    #[test]
    fn week_total_ignores_previous_week() {
        let today = day(2026, 10, 14);
        let sessions = vec![
            work(day(2026, 10, 10), 50), // previous Saturday
            work(day(2026, 10, 11), 25),
            work(today, 30),
        ];
        assert_eq!(week_total(&sessions, today), 55);
    }

    #[test]
    fn weekly_by_day_fills_all_seven_days() {
        let today = day(2026, 10, 14);
        let sessions = vec![work(today, 25), work(today, 25), work(day(2026, 10, 12), 10)];
        let by_day = weekly_by_day(&sessions, today);
        assert_eq!(by_day.len(), 7);
        assert_eq!(by_day[&today], 50);
        assert_eq!(by_day[&day(2026, 10, 12)], 10);
        assert_eq!(by_day[&day(2026, 10, 17)], 0);
    }

    #[test]
    fn streak_counts_back_from_today() {
        let today = day(2026, 10, 14);
        let sessions = vec![
            work(today, 25),
            work(day(2026, 10, 13), 25),
            work(day(2026, 10, 12), 25),
            work(day(2026, 10, 10), 25),
        ];
        assert_eq!(streak(&sessions, today), 3);
    }

    #[test]
    fn empty_today_keeps_yesterdays_streak() {
        let today = day(2026, 10, 14);
        let sessions = vec![work(day(2026, 10, 13), 25), work(day(2026, 10, 12), 25)];
        assert_eq!(streak(&sessions, today), 2);
        assert_eq!(streak(&sessions, day(2026, 10, 15)), 0);
    }

    #[test]
    fn summarize_combines_aggregates() {
        let today = day(2026, 10, 14);
        let sessions = vec![work(today, 25), work(day(2026, 10, 13), 30)];
        let stats = summarize(&sessions, today);
        assert_eq!(
            stats,
            SessionStats {
                today_count: 1,
                today_minutes: 25,
                week_minutes: 55,
                streak_days: 2,
            }
        );
    }
}
