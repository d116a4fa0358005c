use crate::application::commands::{parse_rfc3339_input, AppState};
use crate::domain::models::{TimerMode, TimerSession};
use crate::domain::streak::{StreakState, StreakTransition};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::timer_repository::{
    focus_sessions_since, focus_totals, insert_session, load_streak, save_streak,
};
use chrono::{Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

const STATS_WINDOW_DAYS: u64 = 7;

/// Body posted by the browser timer when a session ends.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSessionRequest {
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub mode: String,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordedSession {
    pub session: TimerSession,
    pub streak: StreakState,
    #[serde(skip)]
    pub transition: Option<StreakTransition>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub minutes: u64,
    pub sessions: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TimerStats {
    pub streak: u32,
    pub longest_streak: u32,
    pub last_focus_date: Option<NaiveDate>,
    pub today_minutes: u64,
    pub week_minutes: u64,
    pub week_sessions: u32,
    pub month_minutes: u64,
    pub month_sessions: u32,
    pub total_sessions: u64,
    pub total_focus_minutes: u64,
    pub average_session_minutes: u64,
    pub daily_stats: Vec<DailyStat>,
}

pub fn record_session_impl(
    state: &AppState,
    user_id: i64,
    request: RecordSessionRequest,
) -> Result<RecordedSession, InfraError> {
    let mode = TimerMode::parse(&request.mode).ok_or_else(|| {
        InfraError::validation("mode", "must be focus, short_break or long_break")
    })?;
    let duration_minutes = u32::try_from(request.duration)
        .map_err(|_| InfraError::validation("duration", "must be a positive number of minutes"))?;
    let mut session = TimerSession {
        id: 0,
        user_id,
        start_time: parse_rfc3339_input(&request.start_time, "startTime")?,
        end_time: parse_rfc3339_input(&request.end_time, "endTime")?,
        duration_minutes,
        mode,
        completed: request.completed.unwrap_or(true),
    };
    session
        .validate()
        .map_err(|message| InfraError::validation("session", message))?;

    let session_date = state.local_date(session.end_time);
    let recorded = state.database().write(|connection| {
        session.id = insert_session(connection, &session)?;
        let mut streak = load_streak(connection, user_id)?;
        let transition = if session.is_focus() {
            let transition = streak.record(session_date);
            if transition.changed_state() {
                save_streak(connection, user_id, &streak)?;
            }
            Some(transition)
        } else {
            None
        };
        Ok(RecordedSession {
            session,
            streak,
            transition,
        })
    })?;

    if recorded.transition == Some(StreakTransition::Backdated) {
        state.log_warn(
            "record_session",
            &format!(
                "ignored backdated focus session_id={} dated {session_date}",
                recorded.session.id
            ),
        );
    }
    state.log_info(
        "record_session",
        &format!(
            "recorded session_id={} mode={} streak={}",
            recorded.session.id,
            recorded.session.mode.as_str(),
            recorded.streak.current_streak
        ),
    );
    Ok(recorded)
}

pub fn stats_impl(state: &AppState, user_id: i64) -> Result<TimerStats, InfraError> {
    stats_as_of(state, user_id, state.today())
}

/// Focus statistics as seen on `today` in the configured timezone.
pub fn stats_as_of(state: &AppState, user_id: i64, today: NaiveDate) -> Result<TimerStats, InfraError> {
    let week_start = today
        .checked_sub_days(Days::new(STATS_WINDOW_DAYS - 1))
        .unwrap_or(today);
    let month_start = today.with_day(1).unwrap_or(today);
    let window_start = week_start.min(month_start);
    let fetch_from = window_start
        .checked_sub_days(Days::new(1))
        .unwrap_or(window_start)
        .and_time(NaiveTime::MIN);

    let (streak, totals, recent) = state.database().read(|connection| {
        Ok((
            load_streak(connection, user_id)?,
            focus_totals(connection, user_id)?,
            focus_sessions_since(connection, user_id, Utc.from_utc_datetime(&fetch_from))?,
        ))
    })?;

    let mut daily_stats = week_start
        .iter_days()
        .take(STATS_WINDOW_DAYS as usize)
        .map(|date| DailyStat {
            date,
            minutes: 0,
            sessions: 0,
        })
        .collect::<Vec<_>>();
    let mut month_minutes = 0u64;
    let mut month_sessions = 0u32;

    for (end_time, minutes) in recent {
        let date = state.local_date(end_time);
        if date > today {
            continue;
        }
        if date >= month_start {
            month_minutes += u64::from(minutes);
            month_sessions += 1;
        }
        if let Some(day) = daily_stats.iter_mut().find(|day| day.date == date) {
            day.minutes += u64::from(minutes);
            day.sessions += 1;
        }
    }

    let total_sessions = u64::try_from(totals.sessions).unwrap_or_default();
    let total_focus_minutes = u64::try_from(totals.minutes).unwrap_or_default();
    let average_session_minutes = if total_sessions == 0 {
        0
    } else {
        (total_focus_minutes + total_sessions / 2) / total_sessions
    };

    Ok(TimerStats {
        streak: streak.current_as_of(today),
        longest_streak: streak.longest_streak,
        last_focus_date: streak.last_focus_date,
        today_minutes: daily_stats.last().map(|day| day.minutes).unwrap_or_default(),
        week_minutes: daily_stats.iter().map(|day| day.minutes).sum(),
        week_sessions: daily_stats.iter().map(|day| day.sessions).sum(),
        month_minutes,
        month_sessions,
        total_sessions,
        total_focus_minutes,
        average_session_minutes,
        daily_stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::test_support::{create_user, TempWorkspace};

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid date")
    }

    /// A session of `minutes` ending at `end` (RFC3339).
    fn session(end: &str, minutes: i64, mode: &str) -> RecordSessionRequest {
        let end_time = chrono::DateTime::parse_from_rfc3339(end).expect("valid end");
        let start_time = end_time - chrono::Duration::minutes(minutes);
        RecordSessionRequest {
            start_time: start_time.to_rfc3339(),
            end_time: end_time.to_rfc3339(),
            duration: minutes,
            mode: mode.to_string(),
            completed: None,
        }
    }

    #[test]
    fn focus_sessions_build_a_streak() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let user = create_user(&state, "a@gmail.com");

        let first = record_session_impl(&state, user, session("2026-03-01T02:00:00Z", 25, "focus"))
            .expect("first");
        assert_eq!(first.transition, Some(StreakTransition::Started));
        assert_eq!(first.streak.current_streak, 1);

        let same_day = record_session_impl(&state, user, session("2026-03-01T05:00:00Z", 25, "focus"))
            .expect("same day");
        assert_eq!(same_day.transition, Some(StreakTransition::SameDay));
        assert_eq!(same_day.streak.current_streak, 1);

        let next_day = record_session_impl(&state, user, session("2026-03-02T02:00:00Z", 25, "focus"))
            .expect("next day");
        assert_eq!(next_day.streak.current_streak, 2);
        assert_eq!(next_day.streak.longest_streak, 2);
        assert!(next_day.session.completed);
    }

    #[test]
    fn session_date_uses_configured_timezone() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let user = create_user(&state, "a@gmail.com");

        let recorded = record_session_impl(&state, user, session("2026-03-01T20:00:00Z", 25, "focus"))
            .expect("record");
        assert_eq!(recorded.streak.last_focus_date, Some(date("2026-03-02")));
    }

    #[test]
    fn breaks_do_not_touch_the_streak() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let user = create_user(&state, "a@gmail.com");

        let recorded = record_session_impl(&state, user, session("2026-03-01T02:00:00Z", 5, "shortBreak"))
            .expect("break");
        assert_eq!(recorded.session.mode, TimerMode::ShortBreak);
        assert_eq!(recorded.transition, None);
        assert_eq!(recorded.streak, StreakState::default());
    }

    #[test]
    fn backdated_focus_session_is_stored_but_ignored_by_streak() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let user = create_user(&state, "a@gmail.com");

        record_session_impl(&state, user, session("2026-03-05T02:00:00Z", 25, "focus")).expect("latest");
        let backdated = record_session_impl(&state, user, session("2026-03-03T02:00:00Z", 25, "focus"))
            .expect("backdated");
        assert_eq!(backdated.transition, Some(StreakTransition::Backdated));
        assert_eq!(backdated.streak.last_focus_date, Some(date("2026-03-05")));
        assert_eq!(backdated.streak.current_streak, 1);

        let stats = stats_as_of(&state, user, date("2026-03-05")).expect("stats");
        assert_eq!(stats.total_sessions, 2);
    }

    #[test]
    fn invalid_sessions_are_rejected() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let user = create_user(&state, "a@gmail.com");

        let zero = session("2026-03-01T02:00:00Z", 0, "focus");
        assert!(matches!(
            record_session_impl(&state, user, zero),
            Err(InfraError::Validation { .. })
        ));
        let too_long = session("2026-03-01T02:00:00Z", 1441, "focus");
        assert!(record_session_impl(&state, user, too_long).is_err());
        let negative = RecordSessionRequest {
            duration: -5,
            ..session("2026-03-01T02:00:00Z", 5, "focus")
        };
        assert!(record_session_impl(&state, user, negative).is_err());
        let reversed = RecordSessionRequest {
            start_time: "2026-03-01T03:00:00Z".to_string(),
            ..session("2026-03-01T02:00:00Z", 25, "focus")
        };
        assert!(record_session_impl(&state, user, reversed).is_err());
        assert!(record_session_impl(&state, user, session("2026-03-01T02:00:00Z", 25, "nap")).is_err());

        let stats = stats_as_of(&state, user, date("2026-03-01")).expect("stats");
        assert_eq!(stats.total_sessions, 0);
    }

    #[test]
    fn stats_aggregate_recent_focus_sessions() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let user = create_user(&state, "a@gmail.com");

        record_session_impl(&state, user, session("2026-02-27T02:00:00Z", 50, "focus")).expect("feb 27");
        record_session_impl(&state, user, session("2026-03-01T02:00:00Z", 25, "focus")).expect("mar 1");
        record_session_impl(&state, user, session("2026-03-03T02:00:00Z", 25, "focus")).expect("mar 3 a");
        record_session_impl(&state, user, session("2026-03-03T04:00:00Z", 30, "focus")).expect("mar 3 b");
        record_session_impl(&state, user, session("2026-03-03T05:00:00Z", 5, "short_break")).expect("break");
        record_session_impl(&state, user, session("2026-01-10T02:00:00Z", 40, "focus")).expect("old");

        let stats = stats_as_of(&state, user, date("2026-03-03")).expect("stats");
        assert_eq!(stats.today_minutes, 55);
        assert_eq!(stats.week_minutes, 130);
        assert_eq!(stats.week_sessions, 4);
        assert_eq!(stats.month_minutes, 80);
        assert_eq!(stats.month_sessions, 3);
        assert_eq!(stats.total_sessions, 5);
        assert_eq!(stats.total_focus_minutes, 170);
        assert_eq!(stats.average_session_minutes, 34);
        assert_eq!(stats.streak, 1);
        assert_eq!(stats.last_focus_date, Some(date("2026-03-03")));

        assert_eq!(stats.daily_stats.len(), 7);
        assert_eq!(stats.daily_stats[0].date, date("2026-02-25"));
        assert_eq!(stats.daily_stats[2].minutes, 50);
        assert_eq!(stats.daily_stats[6].date, date("2026-03-03"));
        assert_eq!(stats.daily_stats[6].sessions, 2);
    }

    #[test]
    fn lapsed_streak_reads_as_zero_in_stats() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let user = create_user(&state, "a@gmail.com");

        record_session_impl(&state, user, session("2026-03-01T02:00:00Z", 25, "focus")).expect("record");
        let stats = stats_as_of(&state, user, date("2026-03-05")).expect("stats");
        assert_eq!(stats.streak, 0);
        assert_eq!(stats.longest_streak, 1);
        assert_eq!(stats.today_minutes, 0);
    }
}
