//! Source of "today" for due-date checks and creation stamps.

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Which calendar decides the current date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodayZone {
    #[default]
    Local,
    Utc,
}

pub trait Clock {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    zone: TodayZone,
}

impl SystemClock {
    pub fn new(zone: TodayZone) -> Self {
        Self { zone }
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        match self.zone {
            TodayZone::Local => Local::now().date_naive(),
            TodayZone::Utc => Utc::now().date_naive(),
        }
    }
}

/// Clock pinned to one date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
