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

use chrono::DateTime;
use chrono::Datelike;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Utc;
use serde::Serialize;

use crate::error::Fallible;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    #[cfg(test)]
    pub fn new(ts: DateTime<Utc>) -> Self {
        Self(ts)
    }

    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    /// Parses an ISO-8601 timestamp. Accepts RFC 3339, a naive date-time
    /// (read as UTC, which is what older history files contain), or a bare
    /// date.
    pub fn parse(s: &str) -> Fallible<Self> {
        let s = s.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(ts.with_timezone(&Utc)));
        }
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self(ts.and_utc()));
        }
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")?;
        Ok(Self(date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_parse_rfc3339() -> Fallible<()> {
        let ts = Timestamp::parse("2023-11-02T08:15:00+02:00")?;
        let expected = Utc.with_ymd_and_hms(2023, 11, 2, 6, 15, 0).unwrap();
        assert_eq!(ts, Timestamp::new(expected));
        Ok(())
    }

    #[test]
    fn test_parse_naive() -> Fallible<()> {
        let ts = Timestamp::parse("2023-12-31T23:59:59.123456")?;
        assert_eq!(ts.year(), 2023);
        Ok(())
    }

    #[test]
    fn test_parse_date() -> Fallible<()> {
        assert_eq!(Timestamp::parse("2021-06-01")?.year(), 2021);
        Ok(())
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn test_serialize() -> Fallible<()> {
        let ts = Timestamp::new(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
        assert_eq!(serde_json::to_string(&ts)?, "\"2024-01-01T09:00:00+00:00\"");
        Ok(())
    }
}
