use chrono::{Datelike, NaiveDate, Weekday};
use log::{debug, error, info};

use crate::auth::AuthContext;
use crate::backend::Backend;
use crate::board::{self, Action, Board};
use crate::editor::DraftEdit;
use crate::error::{Error, Result};
use crate::grid::{Day, Slot};
use crate::model::{Id, SchedulePlan};

/// Drives a [`Board`]: performs the backend requests a user action implies
/// and feeds their outcome back as actions.
pub struct Dispatcher<B> {
    backend: B,
    board: Board,
}

impl<B: Backend> Dispatcher<B> {
    pub fn new(backend: B, auth: &AuthContext) -> Self {
        Self {
            backend,
            board: Board::new(auth.is_admin()),
        }
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn dispatch(&mut self, action: Action) {
        self.board.apply(action);
    }

    pub async fn load_classes(&mut self) {
        let classes = self.backend.classes().await.map_err(|err| err.to_string());
        self.dispatch(Action::ClassesLoaded(classes));
    }

    /// Switches to `class_id` and loads its latest plan.
    pub async fn load_plan(&mut self, class_id: Id) -> Result<&SchedulePlan> {
        self.dispatch(Action::ClassSelected(class_id));
        let epoch = self.board.epoch;

        match self.backend.latest_plan(class_id).await {
            Ok(plan) => self.dispatch(Action::PlanLoaded { epoch, plan: Ok(plan) }),
            Err(err) => {
                self.dispatch(Action::PlanLoaded {
                    epoch,
                    plan: Err(err.to_string()),
                });
                return Err(err);
            }
        }

        self.board.plan.as_ref().ok_or(Error::NoPlan)
    }

    /// Switches to `class_id` and loads its latest plan and reference lists.
    /// Failures end up on the board.
    pub async fn select_class(&mut self, class_id: Id) {
        if let Err(err) = self.load_plan(class_id).await {
            debug!("Class {class_id} has no usable plan: {err}");
        }
        let epoch = self.board.epoch;

        let references = self
            .backend
            .references(class_id)
            .await
            .map_err(|err| err.to_string());
        self.dispatch(Action::ReferencesLoaded { epoch, references });
    }

    pub fn open_draft(&mut self, day: Day, slot: Slot) {
        self.dispatch(Action::DraftOpened { day, slot });
    }

    pub fn edit_draft(&mut self, edit: DraftEdit) {
        self.dispatch(Action::DraftEdited(edit));
    }

    /// Submits the open draft. The plan is swapped for the backend's answer on
    /// success and left as it was otherwise.
    pub async fn add_session(&mut self) -> Result<&SchedulePlan> {
        if !self.board.can_edit() {
            return Err(Error::Forbidden);
        }
        let Some(plan) = &self.board.plan else {
            return Err(Error::NoPlan);
        };
        let Some(draft) = &self.board.draft else {
            return Err(Error::IncompleteDraft(vec!["day", "slot"]));
        };

        let plan_id = plan.id;
        let payload = match draft.submission(plan) {
            Ok(payload) => payload,
            Err(err) => {
                self.dispatch(Action::DraftRejected(err.to_string()));
                return Err(err);
            }
        };

        let epoch = self.board.epoch;
        match self.backend.add_session(plan_id, &payload).await {
            Ok(updated) => {
                info!(
                    "Added session on {} {}-{} to plan {}",
                    payload.date, payload.heure_debut, payload.heure_fin, updated.id
                );
                self.dispatch(Action::SessionAdded {
                    epoch,
                    plan: Ok(updated),
                });
            }
            Err(err) => {
                error!("Adding session failed: {err}");
                let message = err.backend_message().unwrap_or(board::ADD_FAILED).to_string();
                self.dispatch(Action::SessionAdded {
                    epoch,
                    plan: Err(message),
                });
                return Err(err);
            }
        }

        self.board.plan.as_ref().ok_or(Error::NoPlan)
    }

    pub fn request_removal(&mut self, session_id: Id) {
        self.dispatch(Action::RemovalRequested(session_id));
    }

    pub fn decline_removal(&mut self) {
        self.dispatch(Action::RemovalDeclined);
    }

    /// Sends the pending removal, if the user asked for one.
    pub async fn confirm_removal(&mut self) -> Result<&SchedulePlan> {
        if !self.board.can_edit() {
            return Err(Error::Forbidden);
        }
        let Some(session_id) = self.board.pending_removal else {
            return self.board.plan.as_ref().ok_or(Error::NoPlan);
        };
        let Some(plan_id) = self.board.plan.as_ref().map(|plan| plan.id) else {
            return Err(Error::NoPlan);
        };

        let epoch = self.board.epoch;
        match self.backend.remove_session(plan_id, session_id).await {
            Ok(updated) => {
                info!("Removed session {session_id} from plan {}", updated.id);
                self.dispatch(Action::SessionRemoved {
                    epoch,
                    plan: Ok(updated),
                });
            }
            Err(err) => {
                error!("Removing session {session_id} failed: {err}");
                self.dispatch(Action::SessionRemoved {
                    epoch,
                    plan: Err(err.to_string()),
                });
                return Err(err);
            }
        }

        self.board.plan.as_ref().ok_or(Error::NoPlan)
    }

    /// Asks the backend to generate a weekly plan for the selected class,
    /// starting on `week_start`, which must be a Monday.
    pub async fn generate_weekly(&mut self, week_start: NaiveDate) -> Result<&SchedulePlan> {
        if !self.board.can_edit() {
            return Err(Error::Forbidden);
        }
        let Some(class_id) = self.board.selected_class else {
            return Err(Error::NoPlan);
        };

        let epoch = self.board.epoch;
        if week_start.weekday() != Weekday::Mon {
            let err = Error::NotMonday(week_start);
            self.dispatch(Action::PlanGenerated {
                epoch,
                plan: Err(err.to_string()),
            });
            return Err(err);
        }

        match self.backend.generate_weekly(class_id, week_start).await {
            Ok(plan) => {
                info!("Generated plan {} for class {class_id}", plan.id);
                self.dispatch(Action::PlanGenerated { epoch, plan: Ok(plan) });
            }
            Err(err) => {
                self.dispatch(Action::PlanGenerated {
                    epoch,
                    plan: Err(err.to_string()),
                });
                return Err(err);
            }
        }

        self.board.plan.as_ref().ok_or(Error::NoPlan)
    }
}
