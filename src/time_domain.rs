//! The `time_domain` section: which time representations data may use.

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};

const TIMEZONE_PATTERN: &str = r"^UTC([+-])(1[0-4]|0\d):([0-5]\d)$";

fn default_true() -> bool {
    true
}

/// Allowed time representations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeDomainConfig {
    /// Data may be indexed by year.
    #[serde(default = "default_true", rename = "year")]
    pub year_allowed: bool,
    /// Data may be indexed by datetime.
    #[serde(default, rename = "datetime")]
    pub datetime_allowed: bool,
    /// Required UTC offset of datetime values, e.g. `UTC+01:00`.
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Default for TimeDomainConfig {
    fn default() -> Self {
        Self {
            year_allowed: true,
            datetime_allowed: false,
            timezone: None,
        }
    }
}

impl TimeDomainConfig {
    /// Both year and datetime values may appear in the same data.
    pub fn mixed_allowed(&self) -> bool {
        self.year_allowed && self.datetime_allowed
    }

    /// Check the timezone format and the timezone/datetime rule.
    pub fn validate(&self) -> Result<()> {
        let Some(timezone) = &self.timezone else {
            return Ok(());
        };

        if !Regex::new(TIMEZONE_PATTERN)?.is_match(timezone) {
            return Err(Error::TimeDomain {
                message: format!(
                    "invalid timezone '{}', expected the form 'UTC+01:00'",
                    timezone
                ),
            });
        }
        if !self.datetime_allowed {
            return Err(Error::TimeDomain {
                message: "'timezone' is set but 'datetime' is not allowed".to_string(),
            });
        }
        Ok(())
    }
}
