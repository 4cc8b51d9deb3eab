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

use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use log::LevelFilter;
use serde::Deserialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::scheduler::DailySchedule;
use crate::scheduler::Zone;
use crate::scheduler::parse_schedule_time;

/// Read from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "dailyverse.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub telegram: TelegramSettings,
    pub schedule: ScheduleSettings,
    pub bible_api: BibleApiSettings,
    pub storage: StorageSettings,
    pub server: ServerSettings,
    /// One of DEBUG, INFO, WARNING, ERROR, CRITICAL.
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_ids: Vec<String>,
    pub api_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleSettings {
    /// Daily send times, `HH:MM`.
    pub times: Vec<String>,
    /// `UTC`, `local`, or a fixed offset such as `+02:00`.
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BibleApiSettings {
    pub enabled: bool,
    pub base_url: String,
    pub translation: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSettings {
    pub history_file: PathBuf,
    /// Replaces the built-in corpus.
    pub corpus_file: Option<PathBuf>,
    /// When set, the scheduler drops history older than this many years on
    /// startup.
    pub keep_years: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            telegram: TelegramSettings::default(),
            schedule: ScheduleSettings::default(),
            bible_api: BibleApiSettings::default(),
            storage: StorageSettings::default(),
            server: ServerSettings::default(),
            log_level: "INFO".to_string(),
        }
    }
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_ids: Vec::new(),
            api_url: "https://api.telegram.org".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            times: vec!["09:00".to_string()],
            timezone: "UTC".to_string(),
        }
    }
}

impl Default for BibleApiSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://bible-api.com".to_string(),
            translation: "kjv".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            history_file: PathBuf::from("data/verse_history.json"),
            corpus_file: None,
            keep_years: None,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from a TOML file (or the default file, if present),
    /// then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Fallible<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    pub fn load_with(path: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Fallible<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        settings.apply_env(env);
        settings.validate()?;
        Ok(settings)
    }

    fn from_file(path: &Path) -> Fallible<Self> {
        let content = read_to_string(path)
            .map_err(|e| ErrorReport::new(&format!("cannot read {}: {e}", path.display())))?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        if let Some(token) = var("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = token.trim().to_string();
        }
        let chat_id = var("TELEGRAM_CHAT_ID");
        let chat_ids = var("TELEGRAM_CHAT_IDS");
        if chat_id.is_some() || chat_ids.is_some() {
            let mut ids = Vec::new();
            ids.extend(chat_id);
            ids.extend(chat_ids.as_deref().map(split_list).unwrap_or_default());
            self.telegram.chat_ids = ids;
        }
        if let Some(times) = var("VERSE_SCHEDULE_TIMES") {
            self.schedule.times = split_list(&times);
        } else if let Some(time) = var("VERSE_SCHEDULE_TIME") {
            self.schedule.times = vec![time.trim().to_string()];
        }
        if let Some(timezone) = var("VERSE_SCHEDULE_TIMEZONE") {
            self.schedule.timezone = timezone.trim().to_string();
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.log_level = level.trim().to_string();
        }
        if let Some(path) = var("VERSE_HISTORY_FILE") {
            self.storage.history_file = PathBuf::from(path.trim());
        }
        if let Some(url) = var("BIBLE_API_URL") {
            self.bible_api.base_url = url.trim().to_string();
            self.bible_api.enabled = true;
        }
        if let Some(translation) = var("BIBLE_TRANSLATION") {
            self.bible_api.translation = translation.trim().to_string();
        }

        let mut seen = Vec::new();
        for id in self.telegram.chat_ids.drain(..) {
            let id = id.trim().to_string();
            if !id.is_empty() && !seen.contains(&id) {
                seen.push(id);
            }
        }
        self.telegram.chat_ids = seen;
    }

    fn validate(&self) -> Fallible<()> {
        self.daily_schedule()?;
        self.log_level_filter()?;
        if self.bible_api.translation.trim().is_empty() {
            return fail("bible_api.translation is empty.");
        }
        Ok(())
    }

    pub fn daily_schedule(&self) -> Fallible<DailySchedule> {
        let times = self
            .schedule
            .times
            .iter()
            .map(|time| parse_schedule_time(time))
            .collect::<Fallible<Vec<_>>>()?;
        let zone: Zone = self.schedule.timezone.parse()?;
        DailySchedule::new(times, zone)
    }

    pub fn log_level_filter(&self) -> Fallible<LevelFilter> {
        match self.log_level.trim().to_uppercase().as_str() {
            "DEBUG" => Ok(LevelFilter::Debug),
            "INFO" => Ok(LevelFilter::Info),
            "WARNING" | "WARN" => Ok(LevelFilter::Warn),
            "ERROR" | "CRITICAL" => Ok(LevelFilter::Error),
            other => fail(format!(
                "log level must be one of DEBUG, INFO, WARNING, ERROR, CRITICAL (got {other})."
            )),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.toml");
        write(&path, "")?;
        let settings = Settings::load_with(Some(&path), env_of(&[]))?;
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.log_level_filter()?, LevelFilter::Info);
        Ok(())
    }

    #[test]
    fn test_file() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("dailyverse.toml");
        write(
            &path,
            r#"
log_level = "debug"

[telegram]
bot_token = "123:abc"
chat_ids = ["-1001", "-1002"]

[schedule]
times = ["07:30", "19:00"]
timezone = "+02:00"

[storage]
history_file = "/var/lib/dailyverse/history.json"
keep_years = 3
"#,
        )?;
        let settings = Settings::load_with(Some(&path), env_of(&[]))?;
        assert_eq!(settings.telegram.chat_ids, vec!["-1001", "-1002"]);
        assert_eq!(settings.schedule.times, vec!["07:30", "19:00"]);
        assert_eq!(settings.storage.keep_years, Some(3));
        assert_eq!(settings.log_level_filter()?, LevelFilter::Debug);
        Ok(())
    }

    #[test]
    fn test_unknown_key_is_rejected() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("dailyverse.toml");
        write(&path, "[telegram]\nbot_tokn = \"x\"\n")?;
        assert!(Settings::load_with(Some(&path), env_of(&[])).is_err());
        Ok(())
    }

    #[test]
    fn test_env_overrides() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("dailyverse.toml");
        write(&path, "[telegram]\nchat_ids = [\"-1\"]\n")?;
        let env = env_of(&[
            ("TELEGRAM_BOT_TOKEN", "42:token"),
            ("TELEGRAM_CHAT_ID", "-100"),
            ("TELEGRAM_CHAT_IDS", "-200, -100, ,-300"),
            ("VERSE_SCHEDULE_TIME", "06:00"),
            ("VERSE_SCHEDULE_TIMEZONE", "local"),
            ("LOG_LEVEL", "warning"),
            ("BIBLE_API_URL", "http://localhost:9999"),
        ]);
        let settings = Settings::load_with(Some(&path), env)?;
        assert_eq!(settings.telegram.bot_token, "42:token");
        assert_eq!(settings.telegram.chat_ids, vec!["-100", "-200", "-300"]);
        assert_eq!(settings.schedule.times, vec!["06:00"]);
        assert_eq!(settings.schedule.timezone, "local");
        assert!(settings.bible_api.enabled);
        assert_eq!(settings.log_level_filter()?, LevelFilter::Warn);
        Ok(())
    }

    #[test]
    fn test_schedule_times_win_over_single_time() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("dailyverse.toml");
        write(&path, "")?;
        let env = env_of(&[
            ("VERSE_SCHEDULE_TIME", "06:00"),
            ("VERSE_SCHEDULE_TIMES", "08:00,20:00"),
        ]);
        let settings = Settings::load_with(Some(&path), env)?;
        assert_eq!(settings.schedule.times, vec!["08:00", "20:00"]);
        Ok(())
    }

    #[test]
    fn test_invalid_time() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("dailyverse.toml");
        write(&path, "")?;
        let env = env_of(&[("VERSE_SCHEDULE_TIME", "25:00")]);
        assert!(Settings::load_with(Some(&path), env).is_err());
        Ok(())
    }

    #[test]
    fn test_invalid_log_level() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("dailyverse.toml");
        write(&path, "")?;
        let env = env_of(&[("LOG_LEVEL", "chatty")]);
        assert!(Settings::load_with(Some(&path), env).is_err());
        Ok(())
    }

    #[test]
    fn test_invalid_timezone() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("dailyverse.toml");
        write(&path, "[schedule]\ntimezone = \"Mars/Olympus\"\n")?;
        assert!(Settings::load_with(Some(&path), env_of(&[])).is_err());
        Ok(())
    }
}
