use crate::models::{
    Activity, CategoryOverview, CategoryTotal, DailyBreakdown, DailyTotal, HeatmapDay,
    HeatmapResponse, SeriesPoint,
};
use chrono::{Local, Months, NaiveDate, TimeZone};
use std::collections::HashMap;

const SERIES_LABEL_FORMAT: &str = "%b %-d";

/// Calendar day an activity falls on, as seen from `tz`.
pub fn calendar_date<Tz: TimeZone>(activity: &Activity, tz: &Tz) -> NaiveDate {
    activity.date.with_timezone(tz).date_naive()
}

pub fn breakdown_by_category(activities: &[Activity], day: Option<NaiveDate>) -> Vec<CategoryTotal> {
    breakdown_by_category_in(activities, day, &Local)
}

/// Sums `carbon_value` per category label, keeping the order in which each
/// category first appears. With `day` set only activities on that calendar
/// day are counted.
pub fn breakdown_by_category_in<Tz: TimeZone>(
    activities: &[Activity],
    day: Option<NaiveDate>,
    tz: &Tz,
) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    let selected = activities
        .iter()
        .filter(|activity| day.is_none_or(|day| calendar_date(activity, tz) == day));

    for activity in selected {
        let label = activity.category.label();
        match index.get(label) {
            Some(&slot) => totals[slot].value += activity.carbon_value,
            None => {
                index.insert(label, totals.len());
                totals.push(CategoryTotal {
                    name: label.to_string(),
                    value: activity.carbon_value,
                });
            }
        }
    }

    totals
}

pub fn category_overview(activities: &[Activity]) -> CategoryOverview {
    category_overview_at(Local::now().date_naive(), activities, &Local)
}

pub fn category_overview_at<Tz: TimeZone>(
    today: NaiveDate,
    activities: &[Activity],
    tz: &Tz,
) -> CategoryOverview {
    CategoryOverview {
        today: breakdown_by_category_in(activities, Some(today), tz),
        all_time: breakdown_by_category_in(activities, None, tz),
    }
}

pub fn breakdown_by_day(activities: &[Activity]) -> DailyBreakdown {
    breakdown_by_day_in(activities, &Local)
}

/// Groups activities per calendar day in first-seen order. The maximum
/// daily total is floored at 1 so it can always be used as a divisor.
pub fn breakdown_by_day_in<Tz: TimeZone>(activities: &[Activity], tz: &Tz) -> DailyBreakdown {
    let mut days: Vec<DailyTotal> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for activity in activities {
        let date = calendar_date(activity, tz);
        let slot = *index.entry(date).or_insert_with(|| {
            days.push(DailyTotal {
                date,
                count: 0.0,
                activities: Vec::new(),
            });
            days.len() - 1
        });
        let day = &mut days[slot];
        day.count += activity.carbon_value;
        day.activities.push(activity.clone());
    }

    let max_daily_total = days.iter().map(|day| day.count).fold(1.0, f64::max);

    DailyBreakdown {
        days,
        max_daily_total,
    }
}

/// Heatmap intensity bucket: `clamp(floor(total / max * 4) + 1, 1, 5)`.
pub fn color_index(day_total: f64, max_daily_total: f64) -> u8 {
    let bucket = (day_total / max_daily_total * 4.0).floor() + 1.0;
    if bucket.is_nan() {
        return 1;
    }
    bucket.clamp(1.0, 5.0) as u8
}

pub fn heatmap(activities: &[Activity]) -> HeatmapResponse {
    heatmap_at(Local::now().date_naive(), activities, &Local)
}

/// Heatmap covering the year up to `today`. The colour scale is relative to
/// the busiest day on record, including days outside the window.
pub fn heatmap_at<Tz: TimeZone>(today: NaiveDate, activities: &[Activity], tz: &Tz) -> HeatmapResponse {
    let start_date = today
        .checked_sub_months(Months::new(12))
        .unwrap_or(NaiveDate::MIN);
    let breakdown = breakdown_by_day_in(activities, tz);
    let max_daily_total = breakdown.max_daily_total;

    let days = breakdown
        .days
        .into_iter()
        .filter(|day| day.date >= start_date && day.date <= today)
        .map(|day| HeatmapDay {
            date: day.date,
            count: day.count,
            color_index: color_index(day.count, max_daily_total),
        })
        .collect();

    HeatmapResponse {
        start_date,
        end_date: today,
        max_daily_total,
        days,
    }
}

pub fn day_details(activities: &[Activity], date: NaiveDate) -> Option<DailyTotal> {
    day_details_in(activities, date, &Local)
}

pub fn day_details_in<Tz: TimeZone>(
    activities: &[Activity],
    date: NaiveDate,
    tz: &Tz,
) -> Option<DailyTotal> {
    breakdown_by_day_in(activities, tz)
        .days
        .into_iter()
        .find(|day| day.date == date)
}

pub fn daily_series(activities: &[Activity]) -> Vec<SeriesPoint> {
    daily_series_in(activities, &Local)
}

/// Sums per short day label ("Mar 5") in first-seen order. Points are not
/// re-sorted by date, and the same label in different years shares a point.
pub fn daily_series_in<Tz: TimeZone>(activities: &[Activity], tz: &Tz) -> Vec<SeriesPoint> {
    let mut points: Vec<SeriesPoint> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for activity in activities {
        let label = activity
            .date
            .with_timezone(tz)
            .naive_local()
            .format(SERIES_LABEL_FORMAT)
            .to_string();
        match index.get(&label) {
            Some(&slot) => points[slot].carbon_value += activity.carbon_value,
            None => {
                index.insert(label.clone(), points.len());
                points.push(SeriesPoint {
                    date: label,
                    carbon_value: activity.carbon_value,
                });
            }
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::{DateTime, Utc};

    fn at(ts: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc)
    }

    fn activity(name: &str, category: Category, value: f64, ts: &str) -> Activity {
        Activity {
            name: name.to_string(),
            category,
            carbon_value: value,
            date: at(ts),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Vec<Activity> {
        vec![
            activity("Bus", Category::Transportation, 1.5, "2026-03-24T08:00:00Z"),
            activity("Steak", Category::FoodAndDiet, 6.0, "2026-03-25T12:00:00Z"),
            activity("Heating", Category::EnergyUsage, 3.25, "2026-03-25T19:00:00Z"),
            activity("Train", Category::Transportation, 0.75, "2026-03-25T21:00:00Z"),
            activity("Compost", Category::Other("Gardening".into()), 0.5, "2026-03-23T10:00:00Z"),
        ]
    }

    fn total(activities: &[Activity]) -> f64 {
        activities.iter().map(|a| a.carbon_value).sum()
    }

    fn assert_close(left: f64, right: f64) {
        assert!((left - right).abs() < 1e-9, "{left} != {right}");
    }

    #[test]
    fn category_totals_keep_first_seen_order() {
        let totals = breakdown_by_category_in(&sample(), None, &Utc);
        let names: Vec<&str> = totals.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Transportation", "Food and Diet", "Energy Usage", "Gardening"]
        );
        assert_close(totals[0].value, 2.25);
    }

    #[test]
    fn category_totals_conserve_carbon() {
        let activities = sample();
        let totals = breakdown_by_category_in(&activities, None, &Utc);
        assert_close(totals.iter().map(|t| t.value).sum(), total(&activities));
    }

    #[test]
    fn category_filter_restricts_to_one_day() {
        let overview = category_overview_at(day(2026, 3, 25), &sample(), &Utc);
        let today: Vec<(&str, f64)> = overview
            .today
            .iter()
            .map(|t| (t.name.as_str(), t.value))
            .collect();
        assert_eq!(
            today,
            vec![("Food and Diet", 6.0), ("Energy Usage", 3.25), ("Transportation", 0.75)]
        );
        assert_eq!(overview.all_time.len(), 4);
    }

    #[test]
    fn empty_input_yields_empty_views() {
        assert!(breakdown_by_category_in(&[], None, &Utc).is_empty());
        let breakdown = breakdown_by_day_in(&[], &Utc);
        assert!(breakdown.days.is_empty());
        assert_eq!(breakdown.max_daily_total, 1.0);
        assert!(daily_series_in(&[], &Utc).is_empty());
    }

    #[test]
    fn daily_breakdown_sums_and_collects_per_date() {
        let activities = vec![
            activity("Lunch", Category::from("Food".to_string()), 3.0, "2026-03-25T12:00:00Z"),
            activity("Dinner", Category::from("Food".to_string()), 2.0, "2026-03-25T18:00:00Z"),
            activity("Lights", Category::from("Energy".to_string()), 1.0, "2026-03-26T20:00:00Z"),
        ];

        let breakdown = breakdown_by_day_in(&activities, &Utc);
        assert_eq!(breakdown.days.len(), 2);
        assert_eq!(breakdown.days[0].date, day(2026, 3, 25));
        assert_close(breakdown.days[0].count, 5.0);
        assert_eq!(breakdown.days[0].activities.len(), 2);
        assert_eq!(breakdown.days[1].date, day(2026, 3, 26));
        assert_close(breakdown.days[1].count, 1.0);
        assert_close(breakdown.max_daily_total, 5.0);
    }

    #[test]
    fn daily_totals_conserve_carbon_and_bound_max() {
        let activities = sample();
        let breakdown = breakdown_by_day_in(&activities, &Utc);
        assert_close(breakdown.days.iter().map(|d| d.count).sum(), total(&activities));
        assert!(breakdown.max_daily_total >= 1.0);
        assert!(breakdown.days.iter().all(|d| d.count <= breakdown.max_daily_total));
    }

    #[test]
    fn max_daily_total_is_floored_at_one() {
        let activities = vec![
            activity("Tea", Category::FoodAndDiet, 0.2, "2026-03-25T08:00:00Z"),
            activity("Walk", Category::Transportation, 0.0, "2026-03-26T08:00:00Z"),
        ];
        assert_eq!(breakdown_by_day_in(&activities, &Utc).max_daily_total, 1.0);
    }

    #[test]
    fn calendar_date_follows_time_zone() {
        let late = activity("Late taxi", Category::Transportation, 4.0, "2026-03-25T23:30:00Z");
        let plus_two = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(calendar_date(&late, &Utc), day(2026, 3, 25));
        assert_eq!(calendar_date(&late, &plus_two), day(2026, 3, 26));
    }

    #[test]
    fn color_index_buckets() {
        assert_eq!(color_index(0.0, 8.0), 1);
        assert_eq!(color_index(1.9, 8.0), 1);
        assert_eq!(color_index(2.0, 8.0), 2);
        assert_eq!(color_index(4.0, 8.0), 3);
        assert_eq!(color_index(7.99, 8.0), 4);
        assert_eq!(color_index(8.0, 8.0), 5);
        assert_eq!(color_index(100.0, 8.0), 5);
    }

    #[test]
    fn color_index_is_monotonic_and_bounded() {
        let max = 12.5;
        let mut previous = 0;
        for step in 0..=200 {
            let index = color_index(step as f64 * 0.1, max);
            assert!((1..=5).contains(&index));
            assert!(index >= previous);
            previous = index;
        }
    }

    #[test]
    fn heatmap_limits_days_to_last_year() {
        let activities = vec![
            activity("Flight", Category::Transportation, 200.0, "2025-01-10T09:00:00Z"),
            activity("Bus", Category::Transportation, 2.0, "2026-03-20T09:00:00Z"),
            activity("Bus", Category::Transportation, 2.0, "2026-03-25T09:00:00Z"),
        ];

        let heatmap = heatmap_at(day(2026, 3, 25), &activities, &Utc);
        assert_eq!(heatmap.start_date, day(2025, 3, 25));
        assert_eq!(heatmap.end_date, day(2026, 3, 25));
        assert_eq!(heatmap.days.len(), 2);
        assert_eq!(heatmap.max_daily_total, 200.0);
        assert!(heatmap.days.iter().all(|d| d.color_index == 1));
    }

    #[test]
    fn day_details_returns_contributing_activities() {
        let details = day_details_in(&sample(), day(2026, 3, 25), &Utc).expect("day present");
        assert_close(details.count, 10.0);
        let names: Vec<&str> = details.activities.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Steak", "Heating", "Train"]);
        assert!(day_details_in(&sample(), day(2026, 1, 1), &Utc).is_none());
    }

    #[test]
    fn series_keeps_first_seen_order() {
        let activities = vec![
            activity("B", Category::EnergyUsage, 1.0, "2026-03-25T09:00:00Z"),
            activity("A", Category::EnergyUsage, 2.0, "2026-03-05T09:00:00Z"),
            activity("C", Category::EnergyUsage, 0.5, "2026-03-25T22:00:00Z"),
        ];
        let series = daily_series_in(&activities, &Utc);
        assert_eq!(
            series,
            vec![
                SeriesPoint { date: "Mar 25".into(), carbon_value: 1.5 },
                SeriesPoint { date: "Mar 5".into(), carbon_value: 2.0 },
            ]
        );
    }

    #[test]
    fn series_merges_same_label_across_years() {
        let activities = vec![
            activity("A", Category::EnergyUsage, 1.0, "2025-03-25T09:00:00Z"),
            activity("B", Category::EnergyUsage, 2.0, "2026-03-25T09:00:00Z"),
        ];
        let series = daily_series_in(&activities, &Utc);
        assert_eq!(series.len(), 1);
        assert_close(series[0].carbon_value, 3.0);
    }

    #[test]
    fn aggregation_is_deterministic() {
        let activities = sample();
        assert_eq!(
            breakdown_by_day_in(&activities, &Utc),
            breakdown_by_day_in(&activities, &Utc)
        );
        assert_eq!(
            breakdown_by_category_in(&activities, None, &Utc),
            breakdown_by_category_in(&activities, None, &Utc)
        );
        assert_eq!(daily_series_in(&activities, &Utc), daily_series_in(&activities, &Utc));
    }
}
