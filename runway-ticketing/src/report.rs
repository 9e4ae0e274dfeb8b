use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use runway_core::repository::TicketRepository;
use runway_core::{CoreError, CoreResult, SaleEntry};

/// Number of earlier periods folded into the moving average
const MOVING_WINDOW_PRECEDING: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportInterval {
    Week,
    Month,
    Year,
}

impl ReportInterval {
    /// Start of the period containing `at`. Weeks start on Monday.
    pub fn period_start(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let date = at.date_naive();
        let back = match self {
            ReportInterval::Week => date.weekday().num_days_from_monday(),
            ReportInterval::Month => date.day0(),
            ReportInterval::Year => date.ordinal0(),
        };
        (date - Duration::days(i64::from(back)))
            .and_time(NaiveTime::MIN)
            .and_utc()
    }
}

impl fmt::Display for ReportInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportInterval::Week => "week",
            ReportInterval::Month => "month",
            ReportInterval::Year => "year",
        };
        f.write_str(name)
    }
}

impl FromStr for ReportInterval {
    type Err = CoreError;

    /// Accepts the names and the legacy numeric codes 1, 2 and 3
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "week" | "1" => Ok(ReportInterval::Week),
            "month" | "2" => Ok(ReportInterval::Month),
            "year" | "3" => Ok(ReportInterval::Year),
            other => Err(CoreError::validation(format!("Unsupported report interval '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRow {
    pub period: DateTime<Utc>,
    pub tickets_sold: u64,
    pub revenue: i64,
    pub average_price: f64,
    /// Mean of `tickets_sold` over this period and up to 7 before it
    pub moving_average_sold: f64,
}

/// Groups sales by period of their flight's departure, oldest first
pub fn aggregate(entries: &[SaleEntry], interval: ReportInterval) -> Vec<SalesRow> {
    let mut periods: BTreeMap<DateTime<Utc>, (u64, i64)> = BTreeMap::new();
    for entry in entries {
        let slot = periods.entry(interval.period_start(entry.departure)).or_default();
        slot.0 += 1;
        slot.1 += i64::from(entry.price);
    }

    let counts: Vec<u64> = periods.values().map(|(sold, _)| *sold).collect();

    periods
        .into_iter()
        .enumerate()
        .map(|(idx, (period, (sold, revenue)))| {
            let window = &counts[idx.saturating_sub(MOVING_WINDOW_PRECEDING)..=idx];
            SalesRow {
                period,
                tickets_sold: sold,
                revenue,
                average_price: revenue as f64 / sold as f64,
                moving_average_sold: window.iter().sum::<u64>() as f64 / window.len() as f64,
            }
        })
        .collect()
}

pub struct SalesReport {
    tickets: Arc<dyn TicketRepository>,
}

impl SalesReport {
    pub fn new(tickets: Arc<dyn TicketRepository>) -> Self {
        Self { tickets }
    }

    pub async fn build(&self, interval: ReportInterval) -> CoreResult<Vec<SalesRow>> {
        let entries = self.tickets.sale_entries().await?;
        Ok(aggregate(&entries, interval))
    }
}
