//! State of the schedule page and the transitions between its states.
//!
//! [`Board::apply`] never talks to the network: it only records outcomes.
//! Every load result carries the epoch it was requested under, and results
//! from an epoch older than the board's are discarded, so switching class
//! while a request is in flight cannot resurrect the previous class's plan.

use log::{debug, warn};

use crate::editor::{Draft, DraftEdit};
use crate::grid::{Day, Slot};
use crate::model::{Class, Id, References, SchedulePlan};

pub const NO_PLAN: &str = "Aucun emploi du temps trouvé pour cette classe";
pub const CLASSES_FAILED: &str = "Erreur lors du chargement des classes";
pub const REFERENCES_FAILED: &str = "Erreur lors du chargement des références";
pub const ADDED: &str = "Séance ajoutée avec succès";
pub const ADD_FAILED: &str = "Erreur lors de l'ajout de la séance";
pub const REMOVED: &str = "Séance supprimée avec succès";
pub const REMOVE_FAILED: &str = "Erreur lors de la suppression de la séance";
pub const GENERATED: &str = "EDT généré !";
pub const ADMIN_ONLY: &str = "Seuls les administrateurs peuvent modifier l'emploi du temps";

pub type Epoch = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ClassesLoaded(Result<Vec<Class>, String>),
    ClassSelected(Id),
    PlanLoaded {
        epoch: Epoch,
        plan: Result<Option<SchedulePlan>, String>,
    },
    PlanGenerated {
        epoch: Epoch,
        plan: Result<SchedulePlan, String>,
    },
    ReferencesLoaded {
        epoch: Epoch,
        references: Result<References, String>,
    },
    DraftOpened {
        day: Day,
        slot: Slot,
    },
    DraftEdited(DraftEdit),
    DraftRejected(String),
    DraftClosed,
    SessionAdded {
        epoch: Epoch,
        plan: Result<SchedulePlan, String>,
    },
    RemovalRequested(Id),
    RemovalDeclined,
    SessionRemoved {
        epoch: Epoch,
        plan: Result<SchedulePlan, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    pub classes: Vec<Class>,
    pub selected_class: Option<Id>,
    pub epoch: Epoch,
    pub plan: Option<SchedulePlan>,
    pub references: References,
    pub loading: bool,
    pub message: Option<String>,
    pub error: Option<String>,
    pub draft: Option<Draft>,
    pub pending_removal: Option<Id>,
    can_edit: bool,
}

impl Board {
    #[must_use]
    pub fn new(can_edit: bool) -> Self {
        Board {
            can_edit,
            ..Board::default()
        }
    }

    #[must_use]
    pub fn can_edit(&self) -> bool {
        self.can_edit
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::ClassesLoaded(Ok(classes)) => self.classes = classes,
            Action::ClassesLoaded(Err(err)) => {
                warn!("Loading classes failed: {err}");
                self.classes.clear();
                self.error = Some(CLASSES_FAILED.to_string());
            }

            Action::ClassSelected(class_id) => {
                self.epoch += 1;
                self.selected_class = Some(class_id);
                self.plan = None;
                self.references = References::default();
                self.draft = None;
                self.pending_removal = None;
                self.message = None;
                self.error = None;
                self.loading = true;
            }

            Action::PlanLoaded { epoch, .. }
            | Action::PlanGenerated { epoch, .. }
            | Action::ReferencesLoaded { epoch, .. }
            | Action::SessionAdded { epoch, .. }
            | Action::SessionRemoved { epoch, .. }
                if epoch != self.epoch =>
            {
                debug!("Dropping result of epoch {epoch}, board is at {}", self.epoch);
            }

            Action::PlanLoaded { plan, .. } => {
                self.loading = false;
                match plan {
                    Ok(Some(plan)) => {
                        self.plan = Some(plan);
                        self.message = None;
                    }
                    Ok(None) => {
                        self.plan = None;
                        self.message = Some(NO_PLAN.to_string());
                    }
                    Err(err) => {
                        warn!("Loading plan failed: {err}");
                        self.plan = None;
                        self.error = Some(NO_PLAN.to_string());
                    }
                }
            }

            Action::PlanGenerated { plan, .. } => {
                self.loading = false;
                match plan {
                    Ok(plan) => {
                        self.plan = Some(plan);
                        self.message = Some(GENERATED.to_string());
                    }
                    Err(err) => self.error = Some(err),
                }
            }

            Action::ReferencesLoaded { references, .. } => match references {
                Ok(references) => self.references = references,
                Err(err) => {
                    warn!("Loading references failed: {err}");
                    self.references = References::default();
                    self.error = Some(REFERENCES_FAILED.to_string());
                }
            },

            Action::DraftOpened { day, slot } => {
                if !self.can_edit {
                    self.error = Some(ADMIN_ONLY.to_string());
                    return;
                }
                let Some(plan) = &self.plan else {
                    return;
                };
                self.draft = Some(Draft::for_cell(plan, day, slot));
            }

            Action::DraftEdited(edit) => {
                if let Some(draft) = &mut self.draft {
                    draft.apply(edit);
                }
            }

            Action::DraftRejected(err) => self.error = Some(err),

            Action::DraftClosed => self.draft = None,

            Action::SessionAdded { plan, .. } => match plan {
                Ok(plan) => {
                    self.plan = Some(plan);
                    self.draft = None;
                    self.error = None;
                    self.message = Some(ADDED.to_string());
                }
                Err(err) => self.error = Some(err),
            },

            Action::RemovalRequested(session_id) => {
                if !self.can_edit {
                    self.error = Some(ADMIN_ONLY.to_string());
                    return;
                }
                self.pending_removal = Some(session_id);
            }

            Action::RemovalDeclined => self.pending_removal = None,

            Action::SessionRemoved { plan, .. } => {
                self.pending_removal = None;
                match plan {
                    Ok(plan) => {
                        self.plan = Some(plan);
                        self.error = None;
                        self.message = Some(REMOVED.to_string());
                    }
                    Err(_) => self.error = Some(REMOVE_FAILED.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::grid::SLOTS;

    fn plan(id: Id) -> SchedulePlan {
        SchedulePlan {
            id,
            title: format!("plan {id}"),
            period_start: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 9, 7).unwrap(),
            sessions: Vec::new(),
        }
    }

    fn loaded(class_id: Id) -> Board {
        let mut board = Board::new(true);
        board.apply(Action::ClassSelected(class_id));
        board.apply(Action::PlanLoaded {
            epoch: board.epoch,
            plan: Ok(Some(plan(class_id))),
        });
        board
    }

    #[test]
    fn stale_plan_is_ignored() {
        let mut board = Board::new(true);
        board.apply(Action::ClassSelected(1));
        let first = board.epoch;
        board.apply(Action::ClassSelected(2));

        board.apply(Action::PlanLoaded {
            epoch: first,
            plan: Ok(Some(plan(1))),
        });
        assert_eq!(board.plan, None);
        assert!(board.loading);

        board.apply(Action::PlanLoaded {
            epoch: board.epoch,
            plan: Ok(Some(plan(2))),
        });
        assert_eq!(board.plan.as_ref().map(|p| p.id), Some(2));
        assert!(!board.loading);
    }

    #[test]
    fn missing_plan_is_a_message_not_an_error() {
        let mut board = Board::new(false);
        board.apply(Action::ClassSelected(3));
        board.apply(Action::PlanLoaded {
            epoch: board.epoch,
            plan: Ok(None),
        });

        assert_eq!(board.message.as_deref(), Some(NO_PLAN));
        assert_eq!(board.error, None);
    }

    #[test]
    fn failed_class_list_degrades_to_empty() {
        let mut board = loaded(1);
        board.apply(Action::ClassesLoaded(Ok(vec![Class {
            id: 1,
            nom: "L3".into(),
            niveau: None,
        }])));
        board.apply(Action::ClassesLoaded(Err("timeout".into())));

        assert!(board.classes.is_empty());
        assert_eq!(board.error.as_deref(), Some(CLASSES_FAILED));
    }

    #[test]
    fn failed_references_are_reported() {
        let mut board = loaded(1);
        board.apply(Action::ReferencesLoaded {
            epoch: board.epoch,
            references: Err("timeout".into()),
        });

        assert_eq!(board.references, References::default());
        assert_eq!(board.error.as_deref(), Some(REFERENCES_FAILED));
        assert_eq!(board.message, None);
        assert!(board.plan.is_some());
    }

    #[test]
    fn failed_add_keeps_the_plan() {
        let mut board = loaded(1);
        board.apply(Action::DraftOpened {
            day: Day::Monday,
            slot: SLOTS[0],
        });
        let before = board.plan.clone();

        board.apply(Action::SessionAdded {
            epoch: board.epoch,
            plan: Err("Conflit de salle".into()),
        });

        assert_eq!(board.plan, before);
        assert!(board.draft.is_some());
        assert_eq!(board.error.as_deref(), Some("Conflit de salle"));
    }

    #[test]
    fn successful_add_replaces_the_plan() {
        let mut board = loaded(1);
        board.apply(Action::DraftOpened {
            day: Day::Monday,
            slot: SLOTS[0],
        });
        board.apply(Action::SessionAdded {
            epoch: board.epoch,
            plan: Ok(plan(42)),
        });

        assert_eq!(board.plan.as_ref().map(|p| p.id), Some(42));
        assert_eq!(board.draft, None);
        assert_eq!(board.message.as_deref(), Some(ADDED));
    }

    #[test]
    fn removal_waits_for_confirmation() {
        let mut board = loaded(1);
        board.apply(Action::RemovalRequested(8));
        assert_eq!(board.pending_removal, Some(8));

        board.apply(Action::RemovalDeclined);
        assert_eq!(board.pending_removal, None);

        board.apply(Action::RemovalRequested(8));
        board.apply(Action::SessionRemoved {
            epoch: board.epoch,
            plan: Err("500".into()),
        });
        assert_eq!(board.pending_removal, None);
        assert_eq!(board.plan.as_ref().map(|p| p.id), Some(1));
        assert_eq!(board.error.as_deref(), Some(REMOVE_FAILED));
    }

    #[test]
    fn readers_cannot_edit() {
        let mut board = Board::new(false);
        board.apply(Action::ClassSelected(1));
        board.apply(Action::PlanLoaded {
            epoch: board.epoch,
            plan: Ok(Some(plan(1))),
        });

        board.apply(Action::DraftOpened {
            day: Day::Friday,
            slot: SLOTS[1],
        });
        board.apply(Action::RemovalRequested(3));

        assert_eq!(board.draft, None);
        assert_eq!(board.pending_removal, None);
        assert_eq!(board.error.as_deref(), Some(ADMIN_ONLY));
    }
}
