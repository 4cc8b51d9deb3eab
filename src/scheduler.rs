// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::str::FromStr;
use std::time::Duration;

use chrono::DateTime;
use chrono::Datelike;
use chrono::Days;
use chrono::FixedOffset;
use chrono::Local;
use chrono::NaiveTime;
use chrono::TimeZone;
use chrono::Utc;
use tokio::time::sleep;

use crate::bot::VerseBot;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::history::Year;

/// The calendar the schedule runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Zone {
    Utc,
    Local,
    Fixed(FixedOffset),
}

impl Zone {
    pub fn current_year(self) -> Year {
        match self {
            Zone::Utc => Utc::now().year(),
            Zone::Local => Local::now().year(),
            Zone::Fixed(offset) => Utc::now().with_timezone(&offset).year(),
        }
    }
}

impl FromStr for Zone {
    type Err = ErrorReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("utc") || s == "Z" {
            return Ok(Zone::Utc);
        }
        if s.eq_ignore_ascii_case("local") {
            return Ok(Zone::Local);
        }
        let offset = s.parse::<FixedOffset>().map_err(|_| {
            ErrorReport::new(&format!(
                "unsupported timezone: {s} (use UTC, local, or an offset like +02:00)"
            ))
        })?;
        Ok(Zone::Fixed(offset))
    }
}

/// Parses a strict `HH:MM` time of day.
pub fn parse_schedule_time(s: &str) -> Fallible<NaiveTime> {
    let invalid = || ErrorReport::new(&format!("time must be in HH:MM format: {s}"));
    let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
    if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
        return Err(invalid());
    }
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// A set of daily send times in one zone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DailySchedule {
    times: Vec<NaiveTime>,
    zone: Zone,
}

impl DailySchedule {
    pub fn new(mut times: Vec<NaiveTime>, zone: Zone) -> Fallible<Self> {
        if times.is_empty() {
            return fail("at least one schedule time is required.");
        }
        times.sort();
        times.dedup();
        Ok(Self { times, zone })
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn times(&self) -> &[NaiveTime] {
        &self.times
    }

    /// The first send instant strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.zone {
            Zone::Utc => next_in(&Utc, &self.times, now),
            Zone::Local => next_in(&Local, &self.times, now),
            Zone::Fixed(offset) => next_in(&offset, &self.times, now),
        }
    }
}

fn next_in<Tz: TimeZone>(
    tz: &Tz,
    times: &[NaiveTime],
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let today = now.with_timezone(tz).date_naive();
    // Two days ahead covers every time of day even across a DST gap.
    for days in 0..=2 {
        let date = today.checked_add_days(Days::new(days))?;
        for time in times {
            // Times that fall in a DST gap do not exist that day.
            let Some(at) = tz.from_local_datetime(&date.and_time(*time)).earliest() else {
                continue;
            };
            let at = at.with_timezone(&Utc);
            if at > now {
                return Some(at);
            }
        }
    }
    None
}

/// Sends the daily verse at every scheduled time until interrupted. A failed
/// send is logged and the loop carries on.
pub async fn run_scheduler(bot: &VerseBot, schedule: &DailySchedule) -> Fallible<()> {
    let times: Vec<String> = schedule
        .times()
        .iter()
        .map(|t| t.format("%H:%M").to_string())
        .collect();
    log::info!(
        "Scheduling daily verse at {} ({:?}).",
        times.join(", "),
        schedule.zone()
    );
    loop {
        let now = Utc::now();
        let Some(next) = schedule.next_after(now) else {
            return fail("no upcoming schedule time.");
        };
        log::info!("Next verse at {next}.");
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        tokio::select! {
            _ = sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                log::info!("Received interrupt, shutting down.");
                return Ok(());
            }
        }
        match bot.send_daily_verse().await {
            Ok(report) => log::info!(
                "Sent {} to {}/{} chats.",
                report.reference,
                report.delivered.len(),
                report.delivered.len() + report.failed.len()
            ),
            Err(e) => log::error!("Failed to send the daily verse: {e}"),
        }
    }
}
