use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One of the four teaching periods of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "09:00 AM - 10:30 AM")]
    First,
    #[serde(rename = "11:00 AM - 12:30 PM")]
    Second,
    #[serde(rename = "02:00 PM - 03:30 PM")]
    Third,
    #[serde(rename = "04:00 PM - 05:30 PM")]
    Fourth,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [
        TimeRange::First,
        TimeRange::Second,
        TimeRange::Third,
        TimeRange::Fourth,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TimeRange::First => "09:00 AM - 10:30 AM",
            TimeRange::Second => "11:00 AM - 12:30 PM",
            TimeRange::Third => "02:00 PM - 03:30 PM",
            TimeRange::Fourth => "04:00 PM - 05:30 PM",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub day: Day,
    pub time: TimeRange,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day, self.time)
    }
}

/// The fixed weekly grid of placement targets, day-major.
#[derive(Debug, Clone)]
pub struct SlotGrid {
    slots: Vec<Slot>,
}

impl SlotGrid {
    /// Maximum number of classes a student may hold on one day.
    pub const DAILY_CAP: usize = 4;

    pub fn new() -> Self {
        let slots = Day::ALL
            .iter()
            .flat_map(|&day| TimeRange::ALL.iter().map(move |&time| Slot { day, time }))
            .collect();
        Self { slots }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Most courses a single student can ever be placed in without a clash
    /// or a daily-cap violation.
    pub fn student_capacity(&self) -> usize {
        Day::ALL.len() * Self::DAILY_CAP.min(TimeRange::ALL.len())
    }
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self::new()
    }
}
