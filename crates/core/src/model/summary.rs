use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::goal::{Goal, TitledCompletion};
use crate::model::ids::CompletionId;
use crate::time::WeekWindow;

/// One completion as listed under its calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedGoal {
    pub id: CompletionId,
    pub title: String,
    pub completed_at: DateTime<Utc>,
}

/// Weekly progress: completions done, completions expected, and what was done on which day.
///
/// Invariants:
/// - `completed` equals the number of entries across all days
/// - every entry sits under the local date of its `completed_at`
/// - entries within a day keep ascending `completed_at` order
/// - days with no completions are absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummary {
    completed: u32,
    total: u64,
    goals_per_day: BTreeMap<NaiveDate, Vec<CompletedGoal>>,
}

impl WeekSummary {
    /// Fold goals and joined completions into the summary for `window`.
    ///
    /// `total` sums the weekly targets of goals created on or before the end of
    /// the window and is `0` when none qualify. Completions must arrive ordered
    /// by `completed_at`; that order is kept inside each day. Rows outside the
    /// window are skipped so the per-day map never holds a foreign date.
    #[must_use]
    pub fn aggregate<I>(window: &WeekWindow, goals: &[Goal], completions: I) -> Self
    where
        I: IntoIterator<Item = TitledCompletion>,
    {
        let total = goals
            .iter()
            .filter(|goal| goal.exists_at(window.end()))
            .map(|goal| u64::from(goal.desired_weekly_frequency()))
            .sum::<u64>();

        let mut completed = 0_u32;
        let mut goals_per_day: BTreeMap<NaiveDate, Vec<CompletedGoal>> = BTreeMap::new();
        for row in completions {
            let completed_at = row.completed_at();
            if !window.contains(completed_at) {
                continue;
            }
            let day = window.policy().local_date(completed_at);
            goals_per_day.entry(day).or_default().push(CompletedGoal {
                id: row.completion.id,
                title: row.title,
                completed_at,
            });
            completed = completed.saturating_add(1);
        }

        Self {
            completed,
            total,
            goals_per_day,
        }
    }

    #[must_use]
    pub fn completed(&self) -> u32 {
        self.completed
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub fn goals_per_day(&self) -> &BTreeMap<NaiveDate, Vec<CompletedGoal>> {
        &self.goals_per_day
    }

    /// Completions for `date`, empty when nothing was done that day.
    #[must_use]
    pub fn day(&self, date: NaiveDate) -> &[CompletedGoal] {
        self.goals_per_day
            .get(&date)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::goal::GoalCompletion;
    use crate::model::ids::GoalId;
    use crate::time::{WeekPolicy, fixed_now};
    use chrono::{Duration, TimeZone};

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, d, h, m, 0).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 11, d).unwrap()
    }

    fn goal(id: u64, title: &str, freq: u32, created_at: DateTime<Utc>) -> Goal {
        Goal::new(GoalId::new(id), title, freq, created_at).unwrap()
    }

    fn done(id: u64, goal: &Goal, at: DateTime<Utc>) -> TitledCompletion {
        TitledCompletion::new(
            GoalCompletion::new(CompletionId::new(id), goal.id(), at),
            goal.title(),
        )
    }

    fn this_week() -> WeekWindow {
        WeekWindow::containing(fixed_now(), &WeekPolicy::utc()).unwrap()
    }

    #[test]
    fn goal_without_completions() {
        // Monday of the fixed week.
        let read = goal(1, "Read", 3, at(13, 9, 0));

        let summary = WeekSummary::aggregate(&this_week(), &[read], Vec::new());

        assert_eq!(summary.completed(), 0);
        assert_eq!(summary.total(), 3);
        assert!(summary.goals_per_day().is_empty());
        assert!(summary.is_empty());
    }

    #[test]
    fn same_day_completions_share_one_ordered_bucket() {
        let run = goal(1, "Run", 2, at(8, 12, 0));
        let rows = vec![done(1, &run, at(14, 10, 0)), done(2, &run, at(14, 14, 0))];

        let summary = WeekSummary::aggregate(&this_week(), &[run], rows);

        assert_eq!(summary.completed(), 2);
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.goals_per_day().len(), 1);
        let tuesday = summary.day(date(14));
        assert_eq!(tuesday.len(), 2);
        assert_eq!(tuesday[0].completed_at, at(14, 10, 0));
        assert_eq!(tuesday[1].completed_at, at(14, 14, 0));
        assert_eq!(tuesday[0].title, "Run");
    }

    #[test]
    fn goal_created_after_week_end_is_not_in_total() {
        let read = goal(1, "Read", 3, at(10, 8, 0));
        let late = goal(2, "Swim", 4, at(19, 8, 0));
        let rows = vec![done(1, &late, at(15, 7, 0))];

        let summary = WeekSummary::aggregate(&this_week(), &[read, late], rows);

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.completed(), 1);
    }

    #[test]
    fn completions_on_both_window_edges_are_included() {
        let week = this_week();
        let walk = goal(1, "Walk", 7, at(1, 0, 0));
        let rows = vec![
            done(1, &walk, week.start() - Duration::milliseconds(1)),
            done(2, &walk, week.start()),
            done(3, &walk, week.end()),
            done(4, &walk, week.end() + Duration::milliseconds(1)),
        ];

        let summary = WeekSummary::aggregate(&week, &[walk], rows);

        assert_eq!(summary.completed(), 2);
        assert_eq!(summary.day(date(12))[0].id, CompletionId::new(2));
        assert_eq!(summary.day(date(18))[0].id, CompletionId::new(3));
    }

    #[test]
    fn completed_matches_entries_and_dates_match_keys() {
        let week = this_week();
        let read = goal(1, "Read", 3, at(1, 0, 0));
        let run = goal(2, "Run", 2, at(1, 0, 0));
        let rows = vec![
            done(1, &read, at(12, 6, 0)),
            done(2, &run, at(13, 7, 0)),
            done(3, &read, at(13, 21, 0)),
            done(4, &run, at(16, 9, 30)),
            done(5, &read, at(18, 23, 59)),
        ];

        let summary = WeekSummary::aggregate(&week, &[read, run], rows);

        let listed: usize = summary.goals_per_day().values().map(Vec::len).sum();
        assert_eq!(summary.completed() as usize, listed);
        assert_eq!(summary.total(), 5);
        for (day, entries) in summary.goals_per_day() {
            for entry in entries {
                assert_eq!(week.policy().local_date(entry.completed_at), *day);
                assert!(week.contains(entry.completed_at));
            }
            assert!(
                entries
                    .windows(2)
                    .all(|pair| pair[0].completed_at <= pair[1].completed_at)
            );
        }
    }

    #[test]
    fn day_keys_follow_policy_offset() {
        // 22:13Z Tuesday is Wednesday at +02:00.
        let policy = WeekPolicy::parse_offset("+02:00").unwrap();
        let week = WeekWindow::containing(fixed_now(), &policy).unwrap();
        let read = goal(1, "Read", 1, at(1, 0, 0));

        let rows = vec![done(1, &read, fixed_now())];
        let summary = WeekSummary::aggregate(&week, &[read], rows);

        assert!(summary.day(date(14)).is_empty());
        assert_eq!(summary.day(date(15)).len(), 1);
    }

    #[test]
    fn total_does_not_wrap_on_large_targets() {
        let week = this_week();
        let big = goal(1, "Big", u32::MAX, at(1, 0, 0));
        let small = goal(2, "Small", 5, at(1, 0, 0));

        let summary = WeekSummary::aggregate(&week, &[big, small], Vec::new());

        assert_eq!(summary.total(), u64::from(u32::MAX) + 5);
    }

    #[test]
    fn no_goals_means_zero_total() {
        let summary = WeekSummary::aggregate(&this_week(), &[], Vec::new());
        assert_eq!(summary, WeekSummary::default());
        assert_eq!(summary.total(), 0);
    }

    #[test]
    fn serializes_with_camel_case_keys_and_iso_dates() {
        let run = goal(1, "Run", 2, at(8, 12, 0));
        let rows = vec![done(9, &run, at(14, 10, 0))];
        let summary = WeekSummary::aggregate(&this_week(), &[run], rows);

        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["completed"], 1);
        assert_eq!(json["total"], 2);
        let entry = &json["goalsPerDay"]["2023-11-14"][0];
        assert_eq!(entry["id"], 9);
        assert_eq!(entry["title"], "Run");
        assert_eq!(entry["completedAt"], "2023-11-14T10:00:00Z");
    }
}
