//! Rendering of a plan's grid as JSON, HTML or plain text.

use std::fmt::Write;

use askama::Template;
use serde::Serialize;

use crate::error::Result;
use crate::grid::{build_grid, build_merge_plan, Day, Slot, DAY_COUNT, SLOTS, SLOT_COUNT};
use crate::model::{Id, SchedulePlan, Session, Status};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellSession {
    pub id: Id,
    pub course: String,
    pub teacher: String,
    pub room: String,
    pub status: Status,
}

impl From<&Session> for CellSession {
    fn from(session: &Session) -> Self {
        CellSession {
            id: session.id,
            course: session.course_label(),
            teacher: session.teacher_label(),
            room: session.room_label(),
            status: session.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub day: Day,
    pub row_span: usize,
    pub hidden: bool,
    pub session: Option<CellSession>,
}

impl Cell {
    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.row_span > 1
    }

    #[must_use]
    pub fn css_class(&self) -> &'static str {
        match &self.session {
            None => "empty",
            Some(_) if self.is_merged() => "session merged",
            Some(session) => match session.status {
                Status::Planned => "session planned",
                Status::Done => "session done",
                Status::Cancelled => "session cancelled",
                Status::Postponed => "session postponed",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub slot: Slot,
    pub cells: Vec<Cell>,
}

/// A plan laid out for display: one row per slot, one cell per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridView {
    pub plan_id: Id,
    pub title: String,
    pub period_start: chrono::NaiveDate,
    pub period_end: chrono::NaiveDate,
    pub days: [Day; DAY_COUNT],
    pub rows: Vec<Row>,
}

impl GridView {
    pub fn of(plan: &SchedulePlan) -> Self {
        let grid = build_grid(&plan.sessions);
        let merges = build_merge_plan(&grid);

        let rows = (0..SLOT_COUNT)
            .map(|slot| Row {
                slot: SLOTS[slot],
                cells: Day::ALL
                    .into_iter()
                    .map(|day| {
                        let merge = merges.get(day, slot);
                        Cell {
                            day,
                            row_span: merge.row_span,
                            hidden: merge.hidden,
                            session: grid.get(day, slot).map(CellSession::from),
                        }
                    })
                    .collect(),
            })
            .collect();

        GridView {
            plan_id: plan.id,
            title: plan.title.clone(),
            period_start: plan.period_start,
            period_end: plan.period_end,
            days: Day::ALL,
            rows,
        }
    }

    /// Full HTML page of the grid. Hidden cells are left out so the
    /// `rowspan` of the cell above them lines up.
    pub fn to_html(&self) -> Result<String> {
        Ok(SchedulePage { view: self }.render()?)
    }

    /// One line per visible session, grouped by day.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        let _ = writeln!(
            text,
            "{} ({} → {})",
            self.title, self.period_start, self.period_end
        );

        for (index, day) in self.days.iter().enumerate() {
            let _ = writeln!(text, "{day}");

            let mut empty = true;
            for (slot, row) in self.rows.iter().enumerate() {
                let cell = &row.cells[index];
                let (Some(session), false) = (&cell.session, cell.hidden) else {
                    continue;
                };
                empty = false;

                let last = &self.rows[slot + cell.row_span - 1].slot;
                let _ = writeln!(
                    text,
                    "  {}-{}  #{} {} | {} | {} [{}]",
                    row.slot.start.format("%H:%M"),
                    last.end.format("%H:%M"),
                    session.id,
                    session.course,
                    session.teacher,
                    session.room,
                    session.status.wire_name()
                );
            }

            if empty {
                let _ = writeln!(text, "  -");
            }
        }

        text
    }
}

#[derive(Template)]
#[template(path = "schedule.html")]
struct SchedulePage<'a> {
    view: &'a GridView,
}
