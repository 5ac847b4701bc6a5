use crate::domain::models::{PriorityTier, Reason, Recommendation, Session, SessionMode, Task};
use crate::time_utils;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

const NO_DEADLINE_HOURS: f64 = 9999.0;

/// Ranks active tasks by deadline pressure, priority, invested focus time and
/// staleness. Stateless apart from its output limits.
#[derive(Clone, Debug)]
pub struct RecommendationEngine {
    limit: usize,
    max_reasons: usize,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationEngine {
    pub fn new() -> Self {
        Self {
            limit: 3,
            max_reasons: 3,
        }
    }

    pub fn recommend(
        &self,
        now: DateTime<Utc>,
        range: &str,
        tasks: &[Task],
        sessions: &[Session],
    ) -> Vec<Recommendation> {
        let window_days = time_utils::parse_range_days(Some(range));
        let ledger = FocusLedger::collect(sessions, now, window_days);

        let mut scored: Vec<Recommendation> = tasks
            .iter()
            .filter(|task| task.is_active())
            .map(|task| self.score_task(task, &ledger, now))
            .collect();

        // sort_by is stable: equal scores keep input order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(self.limit);
        scored
    }

    fn score_task(&self, task: &Task, ledger: &FocusLedger, now: DateTime<Utc>) -> Recommendation {
        let tier = task.priority_tier();
        let priority = tier.profile();
        let deadline = DeadlineOutlook::assess(time_utils::parse_iso(task.deadline.as_deref()), now);
        let focus_minutes = ledger.minutes_for(task.id);
        let (investment, investment_reason) = investment_boost(focus_minutes);
        let (staleness, staleness_reason) = staleness_boost(ledger.last_focus_for(task.id), now);

        let raw_score = (deadline.score + priority.score + investment + staleness) * priority.weight;

        let reasons: Vec<Reason> = [
            priority.reason,
            deadline.reason,
            investment_reason,
            staleness_reason,
        ]
        .into_iter()
        .flatten()
        .collect();

        Recommendation {
            task_id: task.id,
            title: task.title.clone(),
            priority: task.display_priority().to_string(),
            deadline: task.deadline.clone(),
            score: round_score(raw_score),
            reasons: dedup_reasons(reasons, self.max_reasons),
            suggested_pomodoros: suggested_pomodoros(focus_minutes, tier, &deadline),
        }
    }
}

/// Focus minutes and latest focus start per task, limited to the range window.
/// Minutes are summed in `i128` so no realistic session list can overflow.
#[derive(Debug, Default)]
pub struct FocusLedger {
    minutes: HashMap<i64, i128>,
    last_focus: HashMap<i64, DateTime<Utc>>,
}

impl FocusLedger {
    pub fn collect(sessions: &[Session], now: DateTime<Utc>, window_days: i64) -> Self {
        let mut ledger = FocusLedger::default();

        for session in sessions {
            if session.mode() != SessionMode::Focus {
                continue;
            }
            let Some(task_id) = session.task_id else {
                continue;
            };
            let Some(started_at) = time_utils::parse_iso(session.started_at.as_deref()) else {
                continue;
            };
            if time_utils::whole_days_between(now, started_at) > window_days {
                continue;
            }

            *ledger.minutes.entry(task_id).or_insert(0) += i128::from(session.minutes);
            ledger
                .last_focus
                .entry(task_id)
                .and_modify(|latest| {
                    if started_at > *latest {
                        *latest = started_at;
                    }
                })
                .or_insert(started_at);
        }

        ledger
    }

    pub fn minutes_for(&self, task_id: i64) -> i128 {
        self.minutes.get(&task_id).copied().unwrap_or(0)
    }

    pub fn last_focus_for(&self, task_id: i64) -> Option<DateTime<Utc>> {
        self.last_focus.get(&task_id).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DeadlineOutlook {
    score: f64,
    due_in_hours: f64,
    overdue: bool,
    reason: Option<Reason>,
}

impl DeadlineOutlook {
    fn assess(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(deadline) = deadline else {
            return Self {
                score: 0.2,
                due_in_hours: NO_DEADLINE_HOURS,
                overdue: false,
                reason: None,
            };
        };

        let due_in_hours = time_utils::fractional_hours_between(deadline, now);
        if due_in_hours < 0.0 {
            return Self {
                score: 2.2,
                due_in_hours,
                overdue: true,
                reason: Some(Reason::Overdue),
            };
        }

        let reason = if due_in_hours <= 24.0 {
            Some(Reason::DueSoon)
        } else if due_in_hours <= 72.0 {
            Some(Reason::DueInAFewDays)
        } else {
            None
        };

        Self {
            score: (2.0 - due_in_hours / 84.0).clamp(0.2, 2.0),
            due_in_hours,
            overdue: false,
            reason,
        }
    }
}

fn investment_boost(focus_minutes: i128) -> (f64, Option<Reason>) {
    if focus_minutes < 25 {
        (1.2, Some(Reason::LowFocusTime))
    } else if focus_minutes < 60 {
        (0.7, Some(Reason::NeedsMoreFocus))
    } else {
        (0.15, None)
    }
}

fn staleness_boost(last_focus: Option<DateTime<Utc>>, now: DateTime<Utc>) -> (f64, Option<Reason>) {
    let Some(last_focus) = last_focus else {
        return (0.9, Some(Reason::NotTouchedRecently));
    };

    let days_since = time_utils::fractional_days_between(now, last_focus);
    if days_since >= 7.0 {
        (0.9, Some(Reason::NotTouchedRecently))
    } else if days_since >= 3.0 {
        (0.4, None)
    } else {
        (0.0, None)
    }
}

fn suggested_pomodoros(focus_minutes: i128, tier: PriorityTier, deadline: &DeadlineOutlook) -> u32 {
    let mut count: u32 = 1;
    if focus_minutes < 25 {
        count += 2;
    }
    if tier == PriorityTier::High {
        count += 1;
    }
    if !deadline.overdue && deadline.due_in_hours <= 24.0 {
        count += 1;
    }
    if deadline.overdue {
        count += 1;
    }
    count.clamp(1, 6)
}

fn dedup_reasons(reasons: Vec<Reason>, limit: usize) -> Vec<Reason> {
    let mut unique = Vec::with_capacity(limit);
    for reason in reasons {
        if !unique.contains(&reason) {
            unique.push(reason);
        }
    }
    unique.truncate(limit);
    unique
}

/// Three-decimal rounding of the exact binary value: `1.15 * 0.85` is
/// 0.97749999... in binary and becomes 0.977.
fn round_score(raw: f64) -> f64 {
    format!("{raw:.3}").parse().unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn iso(dt: DateTime<Utc>) -> String {
        time_utils::format_utc(dt)
    }

    fn task(id: i64, priority: &str, deadline: Option<DateTime<Utc>>) -> Task {
        Task {
            id,
            title: format!("Task {id}"),
            priority: priority.to_string(),
            deadline: deadline.map(iso),
            status: "active".to_string(),
        }
    }

    fn focus(task_id: i64, minutes: i64, started_at: DateTime<Utc>) -> Session {
        Session {
            task_id: Some(task_id),
            mode: "focus".to_string(),
            minutes,
            started_at: Some(iso(started_at)),
        }
    }

    fn recommend(tasks: &[Task], sessions: &[Session]) -> Vec<Recommendation> {
        RecommendationEngine::new().recommend(now(), "7d", tasks, sessions)
    }

    #[test]
    fn overdue_high_priority_without_focus() {
        let tasks = vec![task(1, "high", Some(now() - Duration::hours(1)))];
        let out = recommend(&tasks, &[]);

        assert_eq!(out.len(), 1);
        let rec = &out[0];
        assert_eq!(
            rec.reasons,
            vec![Reason::HighPriority, Reason::Overdue, Reason::LowFocusTime]
        );
        assert_eq!(rec.suggested_pomodoros, 5);
        // (2.2 + 1.8 + 1.2 + 0.9) * 1.35
        assert_eq!(rec.score, 8.235);
    }

    #[test]
    fn well_invested_low_priority_task() {
        let tasks = vec![task(7, "low", None)];
        let sessions = vec![
            focus(7, 50, now() - Duration::days(1)),
            focus(7, 40, now() - Duration::days(2)),
        ];
        let out = recommend(&tasks, &sessions);

        let rec = &out[0];
        // (0.2 + 0.8 + 0.15 + 0.0) * 0.85
        assert_eq!(rec.score, 0.977);
        assert!(rec.reasons.is_empty());
        assert_eq!(rec.suggested_pomodoros, 1);
        assert_eq!(rec.priority, "low");
        assert_eq!(rec.deadline, None);
    }

    #[test]
    fn completed_tasks_are_never_recommended() {
        let mut done = task(1, "high", Some(now() - Duration::hours(5)));
        done.status = "completed".to_string();
        let tasks = vec![done, task(2, "low", None)];

        let out = recommend(&tasks, &[]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].task_id, 2);
    }

    #[test]
    fn empty_snapshot_yields_no_recommendations() {
        assert!(recommend(&[], &[]).is_empty());
    }

    #[test]
    fn deadline_proximity_reasons() {
        let at = |hours: i64| DeadlineOutlook::assess(Some(now() + Duration::hours(hours)), now());

        assert_eq!(at(24).reason, Some(Reason::DueSoon));
        assert_eq!(at(72).reason, Some(Reason::DueInAFewDays));
        assert_eq!(at(73).reason, None);
        assert_eq!(at(0).reason, Some(Reason::DueSoon));
        assert!(!at(0).overdue);
        assert_eq!(at(0).score, 2.0);
    }

    #[test]
    fn deadline_score_is_clamped() {
        let far = DeadlineOutlook::assess(Some(now() + Duration::days(30)), now());
        assert_eq!(far.score, 0.2);

        let mid = DeadlineOutlook::assess(Some(now() + Duration::hours(42)), now());
        assert_eq!(mid.score, 1.5);

        let missing = DeadlineOutlook::assess(None, now());
        assert_eq!(missing.score, 0.2);
        assert_eq!(missing.due_in_hours, NO_DEADLINE_HOURS);
        assert!(!missing.overdue);
    }

    #[test]
    fn unparseable_deadline_counts_as_no_deadline() {
        let mut t = task(3, "medium", None);
        t.deadline = Some("next friday".to_string());
        let out = recommend(&[t], &[]);

        // (0.2 + 1.2 + 1.2 + 0.9) * 1.0
        assert_eq!(out[0].score, 3.5);
        assert_eq!(out[0].deadline.as_deref(), Some("next friday"));
        assert_eq!(out[0].suggested_pomodoros, 3);
    }

    #[test]
    fn investment_thresholds() {
        assert_eq!(investment_boost(0), (1.2, Some(Reason::LowFocusTime)));
        assert_eq!(investment_boost(24), (1.2, Some(Reason::LowFocusTime)));
        assert_eq!(investment_boost(25), (0.7, Some(Reason::NeedsMoreFocus)));
        assert_eq!(investment_boost(59), (0.7, Some(Reason::NeedsMoreFocus)));
        assert_eq!(investment_boost(60), (0.15, None));
        assert_eq!(investment_boost(-30), (1.2, Some(Reason::LowFocusTime)));
    }

    #[test]
    fn staleness_uses_fractional_days() {
        let n = now();
        assert_eq!(staleness_boost(None, n), (0.9, Some(Reason::NotTouchedRecently)));
        assert_eq!(staleness_boost(Some(n - Duration::days(7)), n).0, 0.9);
        assert_eq!(
            staleness_boost(Some(n - Duration::days(7) + Duration::seconds(1)), n).0,
            0.4
        );
        assert_eq!(staleness_boost(Some(n - Duration::days(3)), n).0, 0.4);
        assert_eq!(
            staleness_boost(Some(n - Duration::hours(71)), n),
            (0.0, None)
        );
    }

    #[test]
    fn ledger_skips_breaks_orphans_and_bad_timestamps() {
        let sessions = vec![
            focus(1, 30, now() - Duration::hours(3)),
            Session {
                mode: " BREAK ".to_string(),
                ..focus(1, 100, now())
            },
            Session {
                task_id: None,
                ..focus(1, 100, now())
            },
            Session {
                started_at: Some("yesterday".to_string()),
                ..focus(1, 100, now())
            },
            Session {
                started_at: None,
                ..focus(1, 100, now())
            },
            Session {
                mode: "Focus".to_string(),
                ..focus(1, 5, now() - Duration::hours(1))
            },
        ];

        let ledger = FocusLedger::collect(&sessions, now(), 7);
        assert_eq!(ledger.minutes_for(1), 35);
        assert_eq!(ledger.last_focus_for(1), Some(now() - Duration::hours(1)));
        assert_eq!(ledger.minutes_for(2), 0);
        assert_eq!(ledger.last_focus_for(2), None);
    }

    #[test]
    fn ledger_window_uses_whole_day_floor() {
        let sessions = vec![
            // 7 days 23 hours ago floors to 7: inside a 7 day window
            focus(1, 10, now() - Duration::days(7) - Duration::hours(23)),
            // exactly 8 days ago: outside
            focus(2, 10, now() - Duration::days(8)),
            // future-dated sessions floor to a negative day count
            focus(3, 10, now() + Duration::hours(2)),
        ];

        let ledger = FocusLedger::collect(&sessions, now(), 7);
        assert_eq!(ledger.minutes_for(1), 10);
        assert_eq!(ledger.minutes_for(2), 0);
        assert_eq!(ledger.minutes_for(3), 10);
    }

    #[test]
    fn window_follows_the_range_descriptor() {
        let tasks = vec![task(1, "medium", None)];
        let sessions = vec![focus(1, 90, now() - Duration::days(20))];
        let engine = RecommendationEngine::new();

        let week = engine.recommend(now(), "7d", &tasks, &sessions);
        assert!(week[0].reasons.contains(&Reason::LowFocusTime));

        let month = engine.recommend(now(), "30d", &tasks, &sessions);
        assert!(!month[0].reasons.contains(&Reason::LowFocusTime));
        assert!(month[0].reasons.contains(&Reason::NotTouchedRecently));

        let garbage = engine.recommend(now(), "lots", &tasks, &sessions);
        assert_eq!(garbage, week);
    }

    #[test]
    fn negative_minutes_are_summed_as_given() {
        let sessions = vec![
            focus(1, 90, now() - Duration::hours(2)),
            focus(1, -40, now() - Duration::hours(1)),
        ];
        let ledger = FocusLedger::collect(&sessions, now(), 7);
        assert_eq!(ledger.minutes_for(1), 50);
    }

    #[test]
    fn huge_minute_totals_do_not_overflow() {
        let sessions = vec![
            focus(1, i64::MAX, now() - Duration::hours(2)),
            focus(1, 1, now() - Duration::hours(1)),
        ];
        let ledger = FocusLedger::collect(&sessions, now(), 7);
        assert_eq!(ledger.minutes_for(1), i128::from(i64::MAX) + 1);

        let out = recommend(&[task(1, "medium", None)], &sessions);
        assert!(!out[0].reasons.contains(&Reason::LowFocusTime));
        assert_eq!(out[0].suggested_pomodoros, 1);
    }

    #[test]
    fn deadline_just_past_is_overdue() {
        let deadline = time_utils::parse_iso(Some("2024-05-10T11:59:59.9995Z"));
        let outlook = DeadlineOutlook::assess(deadline, now());
        assert!(outlook.overdue);
        assert_eq!(outlook.reason, Some(Reason::Overdue));

        let mut t = task(1, "medium", None);
        t.deadline = Some("2024-05-10T11:59:59.9995Z".to_string());
        let out = recommend(&[t], &[]);
        // (2.2 + 1.2 + 1.2 + 0.9) * 1.0
        assert_eq!(out[0].score, 5.5);
        assert_eq!(out[0].reasons[0], Reason::Overdue);
    }

    #[test]
    fn deadline_just_over_a_day_is_not_due_soon() {
        let mut t = task(1, "medium", None);
        t.deadline = Some("2024-05-11T12:00:00.0005Z".to_string());
        let out = recommend(&[t], &[]);

        assert_eq!(out[0].reasons[0], Reason::DueInAFewDays);
        assert_eq!(out[0].suggested_pomodoros, 3);
    }

    #[test]
    fn pomodoro_suggestion_bounds() {
        let soon = DeadlineOutlook::assess(Some(now() + Duration::hours(2)), now());
        let late = DeadlineOutlook::assess(Some(now() - Duration::hours(2)), now());
        let none = DeadlineOutlook::assess(None, now());

        assert_eq!(suggested_pomodoros(0, PriorityTier::High, &soon), 5);
        assert_eq!(suggested_pomodoros(0, PriorityTier::High, &late), 5);
        assert_eq!(suggested_pomodoros(0, PriorityTier::Medium, &none), 3);
        assert_eq!(suggested_pomodoros(120, PriorityTier::Other, &none), 1);
        assert_eq!(suggested_pomodoros(120, PriorityTier::Medium, &soon), 2);
    }

    #[test]
    fn reasons_are_unique_and_capped() {
        let reasons = vec![
            Reason::Overdue,
            Reason::Overdue,
            Reason::LowFocusTime,
            Reason::NotTouchedRecently,
            Reason::HighPriority,
        ];
        assert_eq!(
            dedup_reasons(reasons, 3),
            vec![Reason::Overdue, Reason::LowFocusTime, Reason::NotTouchedRecently]
        );
    }

    #[test]
    fn ranking_keeps_top_three_and_is_stable() {
        let tasks = vec![
            task(1, "low", None),
            task(2, "medium", None),
            task(3, "medium", None),
            task(4, "high", Some(now() - Duration::hours(3))),
            task(5, "medium", None),
        ];
        let out = recommend(&tasks, &[]);

        let ids: Vec<i64> = out.iter().map(|r| r.task_id).collect();
        assert_eq!(ids, vec![4, 2, 3]);
        assert!(out.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }

    #[test]
    fn fewer_active_tasks_than_limit() {
        let mut archived = task(9, "high", None);
        archived.status = "done".to_string();
        let tasks = vec![task(1, "low", None), archived];

        let out = recommend(&tasks, &[]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn recommending_twice_is_identical() {
        let tasks = vec![
            task(1, "high", Some(now() + Duration::hours(30))),
            task(2, "medium", Some(now() + Duration::hours(5))),
            task(3, "low", None),
            task(4, "medium", None),
        ];
        let sessions = vec![
            focus(1, 30, now() - Duration::days(4)),
            focus(2, 70, now() - Duration::hours(6)),
        ];

        let first = recommend(&tasks, &sessions);
        let second = recommend(&tasks, &sessions);
        assert_eq!(first, second);
        for rec in &first {
            assert!(rec.reasons.len() <= 3);
            assert!((1..=6).contains(&rec.suggested_pomodoros));
        }
    }

    #[test]
    fn rounds_like_decimal_formatting() {
        assert_eq!(round_score(1.15 * 0.85), 0.977);
        assert_eq!(round_score(0.9775), 0.978);
        assert_eq!(round_score(5.014285714285715), 5.014);
        assert_eq!(round_score(3.5), 3.5);
    }
}
