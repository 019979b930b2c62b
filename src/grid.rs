use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::Session;

pub const DAY_COUNT: usize = 6;
pub const SLOT_COUNT: usize = 8;

const SLOT_HOURS: [(u32, u32); SLOT_COUNT] = [
    (8, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (14, 15),
    (15, 16),
    (16, 17),
    (17, 18),
];

pub static SLOTS: Lazy<[Slot; SLOT_COUNT]> = Lazy::new(|| {
    SLOT_HOURS.map(|(start, end)| Slot {
        start: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
        end: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
    })
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    pub const ALL: [Day; DAY_COUNT] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    /// `None` for Sundays, which have no column.
    pub fn of(date: NaiveDate) -> Option<Day> {
        Self::ALL
            .get(date.weekday().num_days_from_monday() as usize)
            .copied()
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Day::Monday => "MONDAY",
            Day::Tuesday => "TUESDAY",
            Day::Wednesday => "WEDNESDAY",
            Day::Thursday => "THURSDAY",
            Day::Friday => "FRIDAY",
            Day::Saturday => "SATURDAY",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|day| day.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown day `{s}`"))
    }
}

impl Serialize for Day {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Slot {
    /// Slot starting at the given hour and minute, seconds ignored.
    pub fn starting_at(time: NaiveTime) -> Option<(usize, Slot)> {
        SLOTS.iter().copied().enumerate().find(|(_, slot)| {
            slot.start.hour() == time.hour() && slot.start.minute() == time.minute()
        })
    }

    #[must_use]
    pub fn label(&self) -> String {
        format!("{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }

    #[must_use]
    pub fn is_followed_by(&self, next: &Slot) -> bool {
        self.end == next.start
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SLOTS
            .iter()
            .find(|slot| slot.label() == s.trim())
            .copied()
            .ok_or_else(|| format!("unknown slot `{s}`"))
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// Sessions bucketed by day and slot, borrowed from the plan they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<'a> {
    cells: [[Option<&'a Session>; SLOT_COUNT]; DAY_COUNT],
}

impl<'a> Grid<'a> {
    #[must_use]
    pub fn get(&self, day: Day, slot: usize) -> Option<&'a Session> {
        self.cells[day.index()].get(slot).copied().flatten()
    }

    #[must_use]
    pub fn column(&self, day: Day) -> &[Option<&'a Session>; SLOT_COUNT] {
        &self.cells[day.index()]
    }

    pub fn sessions(&self) -> impl Iterator<Item = &'a Session> + '_ {
        self.cells.iter().flatten().filter_map(|cell| *cell)
    }
}

pub fn build_grid(sessions: &[Session]) -> Grid<'_> {
    let mut cells = [[None; SLOT_COUNT]; DAY_COUNT];

    for session in sessions {
        let Some(day) = Day::of(session.date) else {
            continue;
        };
        let Some((slot, _)) = Slot::starting_at(session.start) else {
            continue;
        };

        cells[day.index()][slot] = Some(session);
    }

    Grid { cells }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Merge {
    pub row_span: usize,
    pub hidden: bool,
}

impl Default for Merge {
    fn default() -> Self {
        Merge {
            row_span: 1,
            hidden: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    cells: [[Merge; SLOT_COUNT]; DAY_COUNT],
}

impl MergePlan {
    #[must_use]
    pub fn get(&self, day: Day, slot: usize) -> Merge {
        self.cells[day.index()].get(slot).copied().unwrap_or_default()
    }
}

pub fn build_merge_plan(grid: &Grid) -> MergePlan {
    let mut cells = [[Merge::default(); SLOT_COUNT]; DAY_COUNT];

    for day in Day::ALL {
        let column = grid.column(day);
        let merges = &mut cells[day.index()];

        let mut row = 0;
        while row < SLOT_COUNT {
            let Some(first) = column[row] else {
                row += 1;
                continue;
            };

            let mut span = 1;
            while row + span < SLOT_COUNT {
                let current = row + span - 1;
                let Some(next) = column[current + 1] else {
                    break;
                };

                if !SLOTS[current].is_followed_by(&SLOTS[current + 1])
                    || next.assignment() != first.assignment()
                {
                    break;
                }

                span += 1;
            }

            merges[row].row_span = span;
            for merge in &mut merges[row + 1..row + span] {
                merge.hidden = true;
            }

            row += span;
        }
    }

    MergePlan { cells }
}
