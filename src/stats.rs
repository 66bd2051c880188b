//! Pure statistics over fetched records.
//!
//! Nothing here talks to the network; the aggregator collects the inputs and
//! these functions reduce them. Bucketing functions take the time zone as a
//! parameter so the binary can use local time while tests stay deterministic.

use chrono::{DateTime, Datelike, Month, TimeZone, Utc, Weekday};
use std::fmt;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Bucket order for weekdays. Ties resolve to the earlier entry.
const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

/// Index of the largest bucket; the lowest index wins a tie.
/// Returns `None` when every bucket is empty.
pub fn arg_max(buckets: &[u32]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (i, &count) in buckets.iter().enumerate() {
        if count == 0 {
            continue;
        }
        match best {
            Some((_, max)) if count <= max => {}
            _ => best = Some((i, count)),
        }
    }
    best.map(|(i, _)| i)
}

pub fn most_popular_weekday<Tz: TimeZone>(timestamps: &[DateTime<Utc>], tz: &Tz) -> Option<Weekday> {
    let mut buckets = [0u32; 7];
    for ts in timestamps {
        let day = ts.with_timezone(tz).weekday();
        buckets[day.num_days_from_sunday() as usize] += 1;
    }
    arg_max(&buckets).map(|i| WEEKDAYS[i])
}

pub fn most_popular_month<Tz: TimeZone>(timestamps: &[DateTime<Utc>], tz: &Tz) -> Option<Month> {
    let mut buckets = [0u32; 12];
    for ts in timestamps {
        buckets[ts.with_timezone(tz).month0() as usize] += 1;
    }
    arg_max(&buckets).map(|i| MONTHS[i])
}

pub fn days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Mean gap between consecutive timestamps once sorted, in days.
pub fn average_gap_days(timestamps: &[DateTime<Utc>]) -> f64 {
    if timestamps.len() < 2 {
        return 0.0;
    }
    let mut sorted = timestamps.to_vec();
    sorted.sort();
    mean(sorted.windows(2).map(|pair| days_between(pair[0], pair[1])))
}

/// Arithmetic mean, `0.0` for an empty input.
pub fn mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
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

/// Everything the binary prints, in print order.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub login: String,
    pub most_popular_day: Option<Weekday>,
    pub most_popular_month: Option<Month>,
    pub avg_days_between_commits: f64,
    pub avg_open_issues: f64,
    pub avg_pull_request_days: f64,
    pub avg_collaborators: f64,
}

const PLACEHOLDER: &str = "n/a";

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let day = self.most_popular_day.map(weekday_name).unwrap_or(PLACEHOLDER);
        let month = self.most_popular_month.map(|m| m.name()).unwrap_or(PLACEHOLDER);

        writeln!(f, "Logged in as {}", self.login)?;
        writeln!(f, "Most often commits on: {day}")?;
        writeln!(f, "Most popular month: {month}")?;
        writeln!(f, "Avg time between commits: {:.2}", self.avg_days_between_commits)?;
        writeln!(f, "Avg open Issues: {:.2}", self.avg_open_issues)?;
        writeln!(f, "Avg Pr duration: {:.2}", self.avg_pull_request_days)?;
        writeln!(f, "Avg Collaborators: {:.2}", self.avg_collaborators)
    }
}
