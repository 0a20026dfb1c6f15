//! Chart and card aggregation over a lead snapshot.
//!
//! Everything here is a pure function of the records plus the display
//! offset. Day and hour boundaries are computed in that fixed offset, not
//! in UTC.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, FixedOffset, NaiveDate, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::lead::{LeadRecord, LeadStatus};
use crate::types::Timestamp;

/// Default number of weeks in the weekly conversion series.
pub const DEFAULT_WEEKS: usize = 8;

/// Default number of day buckets in the daily series.
pub const DEFAULT_DAILY_WINDOW: usize = 14;

/// Largest day window accepted by callers.
pub const MAX_DAILY_WINDOW: usize = 366;

/// Largest week window accepted by callers.
pub const MAX_WEEKS: usize = 104;

// ---------------------------------------------------------------------------
// Time basis
// ---------------------------------------------------------------------------

/// Which timestamp the time series bucket by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBasis {
    Created,
    #[default]
    LastActivity,
}

impl TimeBasis {
    pub fn pick(self, record: &LeadRecord) -> Option<Timestamp> {
        match self {
            TimeBasis::Created => record.created_at,
            TimeBasis::LastActivity => record.last_activity_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Series types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    /// `dd/MM`.
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyBucket {
    pub iso_year: i32,
    pub week: u32,
    /// `S<week>`.
    pub label: String,
    pub total: u64,
    pub converted: u64,
    /// Percentage with one decimal; 0 when the week has no records.
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyBucket {
    pub hour: u32,
    /// `HH:00`.
    pub label: String,
    pub count: u64,
}

/// Percentage rounded to one decimal place, 0 for an empty denominator.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let raw = part as f64 / whole as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

fn local_time(ts: Timestamp, offset: FixedOffset) -> chrono::DateTime<FixedOffset> {
    ts.with_timezone(&offset)
}

// ---------------------------------------------------------------------------
// Daily
// ---------------------------------------------------------------------------

/// Count records per calendar day, oldest first, keeping the most recent
/// `window` days that have records.
pub fn daily_series(
    records: &[LeadRecord],
    basis: TimeBasis,
    offset: FixedOffset,
    window: usize,
) -> Vec<DailyBucket> {
    let mut days: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for ts in records.iter().filter_map(|r| basis.pick(r)) {
        *days.entry(local_time(ts, offset).date_naive()).or_default() += 1;
    }

    let skip = days.len().saturating_sub(window);
    days.into_iter()
        .skip(skip)
        .map(|(date, count)| DailyBucket {
            date,
            label: date.format("%d/%m").to_string(),
            count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Weekly
// ---------------------------------------------------------------------------

/// Per ISO week totals and conversion rate for the `weeks` consecutive weeks
/// ending at the most recent week with data. Weeks without records are
/// present with zero counts.
pub fn weekly_series(
    records: &[LeadRecord],
    basis: TimeBasis,
    offset: FixedOffset,
    weeks: usize,
) -> Vec<WeeklyBucket> {
    let mut by_week: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
    for record in records {
        let Some(ts) = basis.pick(record) else {
            continue;
        };
        let entry = by_week.entry(week_start(local_time(ts, offset).date_naive())).or_default();
        entry.0 += 1;
        if record.is_closed() {
            entry.1 += 1;
        }
    }

    let Some(latest) = by_week.keys().next_back().copied() else {
        return Vec::new();
    };

    (0..weeks)
        .rev()
        .map(|back| {
            let monday = latest - Duration::weeks(back as i64);
            let (total, converted) = by_week.get(&monday).copied().unwrap_or((0, 0));
            let iso = monday.iso_week();
            WeeklyBucket {
                iso_year: iso.year(),
                week: iso.week(),
                label: format!("S{}", iso.week()),
                total,
                converted,
                conversion_rate: percentage(converted, total),
            }
        })
        .collect()
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

// ---------------------------------------------------------------------------
// Hourly
// ---------------------------------------------------------------------------

/// Activity per hour of day. Always 24 buckets.
pub fn hourly_histogram(
    records: &[LeadRecord],
    basis: TimeBasis,
    offset: FixedOffset,
) -> Vec<HourlyBucket> {
    let mut counts = [0u64; 24];
    for ts in records.iter().filter_map(|r| basis.pick(r)) {
        counts[local_time(ts, offset).hour() as usize] += 1;
    }
    counts
        .iter()
        .enumerate()
        .map(|(hour, count)| HourlyBucket {
            hour: hour as u32,
            label: format!("{hour:02}:00"),
            count: *count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Status distribution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusDistribution {
    pub closed: u64,
    pub follow_up_2: u64,
    pub follow_up_1: u64,
    pub in_progress: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSlice {
    pub status: LeadStatus,
    pub label: &'static str,
    pub count: u64,
}

impl StatusDistribution {
    pub fn from_records(records: &[LeadRecord]) -> Self {
        let mut dist = Self::default();
        for record in records {
            match record.status() {
                LeadStatus::Closed => dist.closed += 1,
                LeadStatus::FollowUp2 => dist.follow_up_2 += 1,
                LeadStatus::FollowUp1 => dist.follow_up_1 += 1,
                LeadStatus::InProgress => dist.in_progress += 1,
            }
        }
        dist
    }

    pub fn count(&self, status: LeadStatus) -> u64 {
        match status {
            LeadStatus::Closed => self.closed,
            LeadStatus::FollowUp2 => self.follow_up_2,
            LeadStatus::FollowUp1 => self.follow_up_1,
            LeadStatus::InProgress => self.in_progress,
        }
    }

    pub fn total(&self) -> u64 {
        self.closed + self.follow_up_2 + self.follow_up_1 + self.in_progress
    }

    /// Pie-chart slices with zero categories left out.
    pub fn slices(&self) -> Vec<StatusSlice> {
        LeadStatus::ALL
            .iter()
            .map(|&status| StatusSlice {
                status,
                label: status.label(),
                count: self.count(status),
            })
            .filter(|slice| slice.count > 0)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub total: u64,
    pub closed: u64,
    pub in_progress: u64,
    pub follow_up_1: u64,
    pub follow_up_2: u64,
    pub conversion_rate: f64,
}

impl MetricsSummary {
    pub fn from_records(records: &[LeadRecord]) -> Self {
        Self::from_distribution(&StatusDistribution::from_records(records))
    }

    pub fn from_distribution(dist: &StatusDistribution) -> Self {
        let total = dist.total();
        Self {
            total,
            closed: dist.closed,
            in_progress: dist.in_progress,
            follow_up_1: dist.follow_up_1,
            follow_up_2: dist.follow_up_2,
            conversion_rate: percentage(dist.closed, total),
        }
    }
}

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

/// Window parameters for [`DashboardOverview::build`].
#[derive(Debug, Clone, Copy)]
pub struct OverviewParams {
    pub basis: TimeBasis,
    pub offset: FixedOffset,
    pub days: usize,
    pub weeks: usize,
}

impl Default for OverviewParams {
    fn default() -> Self {
        Self {
            basis: TimeBasis::default(),
            offset: Utc.fix(),
            days: DEFAULT_DAILY_WINDOW,
            weeks: DEFAULT_WEEKS,
        }
    }
}

/// Everything the dashboard's cards and charts need, computed in one go.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOverview {
    pub basis: TimeBasis,
    pub metrics: MetricsSummary,
    pub daily: Vec<DailyBucket>,
    pub weekly: Vec<WeeklyBucket>,
    pub hourly: Vec<HourlyBucket>,
    pub status: Vec<StatusSlice>,
}

impl DashboardOverview {
    pub fn build(records: &[LeadRecord], params: OverviewParams) -> Self {
        let dist = StatusDistribution::from_records(records);
        Self {
            basis: params.basis,
            metrics: MetricsSummary::from_distribution(&dist),
            daily: daily_series(records, params.basis, params.offset, params.days),
            weekly: weekly_series(records, params.basis, params.offset, params.weeks),
            hourly: hourly_histogram(records, params.basis, params.offset),
            status: dist.slices(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn lead(id: i64, activity: Option<Timestamp>, closed: bool) -> LeadRecord {
        LeadRecord {
            last_activity_at: activity,
            closed: Some(closed),
            ..LeadRecord::new(id)
        }
    }

    fn mixed_batch() -> Vec<LeadRecord> {
        let mut records = Vec::new();
        for id in 0..3 {
            records.push(LeadRecord {
                closed: Some(true),
                ..LeadRecord::new(id)
            });
        }
        for id in 3..5 {
            records.push(LeadRecord {
                followup2: Some(true),
                ..LeadRecord::new(id)
            });
        }
        records.push(LeadRecord {
            followup1: Some(true),
            ..LeadRecord::new(5)
        });
        for id in 6..10 {
            records.push(LeadRecord::new(id));
        }
        records
    }

    #[test]
    fn mixed_batch_distribution() {
        let dist = StatusDistribution::from_records(&mixed_batch());
        assert_eq!(dist.closed, 3);
        assert_eq!(dist.follow_up_2, 2);
        assert_eq!(dist.follow_up_1, 1);
        assert_eq!(dist.in_progress, 4);
        assert_eq!(dist.total(), 10);
    }

    #[test]
    fn slices_omit_zero_categories() {
        let records = vec![lead(1, None, true), lead(2, None, false)];
        let slices = StatusDistribution::from_records(&records).slices();
        let statuses: Vec<_> = slices.iter().map(|s| s.status).collect();
        assert_eq!(statuses, vec![LeadStatus::Closed, LeadStatus::InProgress]);
    }

    #[test]
    fn empty_input_metrics_are_zero() {
        let metrics = MetricsSummary::from_records(&[]);
        assert_eq!(metrics.total, 0);
        assert_eq!(metrics.conversion_rate, 0.0);
        assert!(StatusDistribution::default().slices().is_empty());
    }

    #[test]
    fn metrics_conversion_rate_one_decimal() {
        let metrics = MetricsSummary::from_records(&mixed_batch());
        assert_eq!(metrics.conversion_rate, 30.0);
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
    }

    #[test]
    fn hourly_always_has_24_buckets() {
        let empty = hourly_histogram(&[], TimeBasis::LastActivity, utc());
        assert_eq!(empty.len(), 24);
        assert!(empty.iter().all(|b| b.count == 0));
        assert_eq!(empty[9].label, "09:00");

        let records = vec![
            lead(1, Some(at(2024, 3, 4, 9)), false),
            lead(2, Some(at(2024, 3, 5, 9)), false),
            lead(3, None, false),
        ];
        let hourly = hourly_histogram(&records, TimeBasis::LastActivity, utc());
        assert_eq!(hourly.len(), 24);
        assert_eq!(hourly[9].count, 2);
    }

    #[test]
    fn hourly_respects_offset() {
        let records = vec![lead(1, Some(at(2024, 3, 4, 2)), false)];
        let sao_paulo = FixedOffset::west_opt(3 * 3600).unwrap();
        let hourly = hourly_histogram(&records, TimeBasis::LastActivity, sao_paulo);
        assert_eq!(hourly[23].count, 1);
    }

    #[test]
    fn daily_sorted_and_windowed() {
        let records = vec![
            lead(1, Some(at(2024, 3, 3, 10)), false),
            lead(2, Some(at(2024, 3, 1, 10)), false),
            lead(3, Some(at(2024, 3, 3, 12)), false),
            lead(4, Some(at(2024, 3, 2, 10)), false),
            lead(5, None, false),
        ];
        let daily = daily_series(&records, TimeBasis::LastActivity, utc(), 2);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].label, "02/03");
        assert_eq!(daily[1].label, "03/03");
        assert_eq!(daily[1].count, 2);
    }

    #[test]
    fn daily_uses_selected_basis() {
        let record = LeadRecord {
            created_at: Some(at(2024, 1, 1, 8)),
            last_activity_at: Some(at(2024, 2, 1, 8)),
            ..LeadRecord::new(1)
        };
        let created = daily_series(&[record.clone()], TimeBasis::Created, utc(), 7);
        let active = daily_series(&[record], TimeBasis::LastActivity, utc(), 7);
        assert_eq!(created[0].label, "01/01");
        assert_eq!(active[0].label, "01/02");
    }

    #[test]
    fn weekly_gap_week_is_zero_percent() {
        // 2024-03-04 is a Monday (ISO week 10); week 11 is left empty.
        let records = vec![
            lead(1, Some(at(2024, 3, 4, 10)), true),
            lead(2, Some(at(2024, 3, 5, 10)), false),
            lead(3, Some(at(2024, 3, 18, 10)), true),
        ];
        let weekly = weekly_series(&records, TimeBasis::LastActivity, utc(), 3);
        let labels: Vec<_> = weekly.iter().map(|w| w.label.as_str()).collect();
        assert_eq!(labels, vec!["S10", "S11", "S12"]);
        assert_eq!(weekly[0].conversion_rate, 50.0);
        assert_eq!(weekly[1].total, 0);
        assert_eq!(weekly[1].conversion_rate, 0.0);
        assert_eq!(weekly[2].conversion_rate, 100.0);
    }

    #[test]
    fn weekly_empty_when_no_timestamps() {
        let records = vec![lead(1, None, true)];
        assert!(weekly_series(&records, TimeBasis::LastActivity, utc(), 8).is_empty());
    }

    #[test]
    fn overview_counts_records_without_timestamps() {
        let overview = DashboardOverview::build(&mixed_batch(), OverviewParams::default());
        assert_eq!(overview.metrics.total, 10);
        assert!(overview.daily.is_empty());
        assert_eq!(overview.hourly.len(), 24);
        assert_eq!(overview.status.len(), 4);
    }
}
