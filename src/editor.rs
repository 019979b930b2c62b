use chrono::{Datelike, Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grid::{Day, Slot};
use crate::model::{Id, NewSession, SchedulePlan, Session, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Course, teacher and room picked explicitly.
    #[default]
    New,
    /// Same course, teacher and room as the day's latest session.
    DuplicatePrevious,
}

/// Form state of a session being added to a plan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Draft {
    pub day: Option<Day>,
    pub course_id: Option<Id>,
    pub teacher_id: Option<Id>,
    pub room_id: Option<Id>,
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    pub status: Status,
    pub mode: Mode,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DraftEdit {
    pub course_id: Option<Id>,
    pub teacher_id: Option<Id>,
    pub room_id: Option<Id>,
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    pub status: Option<Status>,
    pub mode: Option<Mode>,
}

impl Draft {
    /// Stages a draft for the given cell: the date is `day` within the week
    /// the plan starts in, the times are the slot bounds. A day before the
    /// plan's first day is rejected on submission.
    #[must_use]
    pub fn for_cell(plan: &SchedulePlan, day: Day, slot: Slot) -> Self {
        let monday = plan
            .period_start
            .checked_sub_days(Days::new(plan.period_start.weekday().num_days_from_monday().into()));

        Draft {
            day: Some(day),
            date: monday.and_then(|monday| monday.checked_add_days(Days::new(day.index() as u64))),
            start: Some(slot.start),
            end: Some(slot.end),
            ..Draft::default()
        }
    }

    pub fn apply(&mut self, edit: DraftEdit) {
        if edit.course_id.is_some() {
            self.course_id = edit.course_id;
        }
        if edit.teacher_id.is_some() {
            self.teacher_id = edit.teacher_id;
        }
        if edit.room_id.is_some() {
            self.room_id = edit.room_id;
        }
        if edit.date.is_some() {
            self.date = edit.date;
        }
        if edit.start.is_some() {
            self.start = edit.start;
        }
        if edit.end.is_some() {
            self.end = edit.end;
        }
        if let Some(status) = edit.status {
            self.status = status;
        }
        if let Some(mode) = edit.mode {
            self.mode = mode;
        }
    }

    /// Turns the draft into the backend payload. Overlaps with existing
    /// sessions are left for the backend to reject.
    pub fn submission(&self, plan: &SchedulePlan) -> Result<NewSession> {
        let mut course_id = self.course_id;
        let mut teacher_id = self.teacher_id;
        let mut room_id = self.room_id;
        let mut status = self.status;

        if self.mode == Mode::DuplicatePrevious {
            if let Some(previous) = self.day.and_then(|day| latest_on(plan, day)) {
                course_id = previous.course.as_ref().map(|course| course.id);
                teacher_id = previous.teacher.as_ref().map(|teacher| teacher.id);
                room_id = previous.room.as_ref().map(|room| room.id);
                status = Status::Planned;
            }
        }

        let mut missing = Vec::new();
        if course_id.is_none() {
            missing.push("course");
        }
        if teacher_id.is_none() {
            missing.push("teacher");
        }
        if room_id.is_none() {
            missing.push("room");
        }
        if self.date.is_none() {
            missing.push("date");
        }
        if self.start.is_none() {
            missing.push("start");
        }
        if self.end.is_none() {
            missing.push("end");
        }

        let (Some(cours_id), Some(professeur_id), Some(salle_id), Some(date), Some(start), Some(end)) =
            (course_id, teacher_id, room_id, self.date, self.start, self.end)
        else {
            return Err(Error::IncompleteDraft(missing));
        };

        if start >= end {
            return Err(Error::IncompleteDraft(vec!["end after start"]));
        }

        if !plan.covers(date) {
            return Err(Error::OutsidePeriod {
                date,
                start: plan.period_start,
                end: plan.period_end,
            });
        }

        Ok(NewSession {
            cours_id,
            professeur_id,
            salle_id,
            date,
            heure_debut: start,
            heure_fin: end,
            statut: status,
        })
    }
}

/// Chronologically last session falling on `day`; on equal date and start
/// the one listed last wins.
pub fn latest_on(plan: &SchedulePlan, day: Day) -> Option<&Session> {
    plan.sessions
        .iter()
        .filter(|session| Day::of(session.date) == Some(day))
        .max_by_key(|session| (session.date, session.start))
}

#[must_use]
pub fn has_sessions_on(plan: &SchedulePlan, day: Day) -> bool {
    latest_on(plan, day).is_some()
}
