#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use edt_proxy::auth::{AuthContext, Credentials, User, ADMIN_ROLE};
use edt_proxy::backend::Backend;
use edt_proxy::error::{Error, Result};
use edt_proxy::model::{
    Class, ClassRef, Course, Id, NewSession, Room, SchedulePlan, Session, Status, Teacher,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn admin() -> AuthContext {
    AuthContext::in_memory(Credentials {
        token: "admin-token".into(),
        user: User {
            username: "admin".into(),
            role: ADMIN_ROLE.into(),
        },
    })
}

pub fn teacher() -> AuthContext {
    AuthContext::in_memory(Credentials {
        token: "prof-token".into(),
        user: User {
            username: "prof".into(),
            role: "ROLE_PROFESSEUR".into(),
        },
    })
}

pub fn course(id: Id, code: &str, class_id: Id) -> Course {
    Course {
        id,
        code: Some(code.into()),
        title: None,
        classes: vec![ClassRef { id: class_id }],
    }
}

pub fn prof(id: Id, last: &str) -> Teacher {
    Teacher {
        id,
        last_name: Some(last.into()),
        first_name: None,
    }
}

pub fn room(id: Id, code: &str) -> Room {
    Room {
        id,
        code: Some(code.into()),
        name: None,
        capacity: None,
    }
}

pub fn session(id: Id, day: NaiveDate, start: u32, end: u32, refs: (Id, Id, Id)) -> Session {
    Session {
        id,
        date: day,
        start: time(start, 0),
        end: time(end, 0),
        status: Status::Planned,
        course: Some(course(refs.0, &format!("C{}", refs.0), 1)),
        teacher: Some(prof(refs.1, &format!("Prof{}", refs.1))),
        room: Some(room(refs.2, &format!("R{}", refs.2))),
    }
}

/// Plan of class 1 for the week of Monday 2024-09-02, holding one session
/// on Monday 08:00-09:00.
pub fn plan() -> SchedulePlan {
    SchedulePlan {
        id: 10,
        title: "EDT L3 Info".into(),
        period_start: date(2024, 9, 2),
        period_end: date(2024, 9, 7),
        sessions: vec![session(100, date(2024, 9, 2), 8, 9, (7, 3, 5))],
    }
}

#[derive(Default)]
struct State {
    plans: HashMap<Id, SchedulePlan>,
    next_id: Id,
    calls: Vec<String>,
}

/// Backend living in memory. Records every call it receives, and rejects
/// additions with a conflict message while `refuse_writes` is set.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
    pub refuse_writes: bool,
}

impl MemoryBackend {
    pub fn with_plan(class_id: Id, plan: SchedulePlan) -> Self {
        let backend = Self::default();
        {
            let mut state = backend.state.lock().unwrap();
            state.plans.insert(class_id, plan);
            state.next_id = 1000;
        }
        backend
    }

    pub fn refusing_writes(mut self) -> Self {
        self.refuse_writes = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn plan_mut<T>(&self, plan_id: Id, f: impl FnOnce(&mut SchedulePlan, Id) -> T) -> Result<T> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let next_id = state.next_id;

        let plan = state
            .plans
            .values_mut()
            .find(|plan| plan.id == plan_id)
            .ok_or(Error::Status {
                status: 404,
                message: Some("Emploi du temps introuvable".into()),
            })?;
        Ok(f(plan, next_id))
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn classes(&self) -> Result<Vec<Class>> {
        self.record("classes".into());
        Ok(vec![
            Class {
                id: 1,
                nom: "L3 Info".into(),
                niveau: Some("L3".into()),
            },
            Class {
                id: 2,
                nom: "M1 Info".into(),
                niveau: None,
            },
        ])
    }

    async fn latest_plan(&self, class_id: Id) -> Result<Option<SchedulePlan>> {
        self.record(format!("latest_plan {class_id}"));
        Ok(self.state.lock().unwrap().plans.get(&class_id).cloned())
    }

    async fn courses_for_class(&self, class_id: Id) -> Result<Vec<Course>> {
        self.record(format!("courses {class_id}"));
        Ok(vec![course(7, "ALGO", class_id), course(8, "PHY", class_id)])
    }

    async fn teachers(&self) -> Result<Vec<Teacher>> {
        self.record("teachers".into());
        Ok(vec![prof(3, "Durand"), prof(4, "Martin")])
    }

    async fn rooms(&self) -> Result<Vec<Room>> {
        self.record("rooms".into());
        Ok(vec![room(5, "A101"), room(6, "B202")])
    }

    async fn add_session(&self, plan_id: Id, new: &NewSession) -> Result<SchedulePlan> {
        self.record(format!("add_session {plan_id}"));

        if self.refuse_writes {
            return Err(Error::Status {
                status: 409,
                message: Some("Conflit de salle".into()),
            });
        }

        self.plan_mut(plan_id, |plan, id| {
            plan.sessions.push(Session {
                id,
                date: new.date,
                start: new.heure_debut,
                end: new.heure_fin,
                status: new.statut,
                course: Some(course(new.cours_id, &format!("C{}", new.cours_id), 1)),
                teacher: Some(prof(new.professeur_id, &format!("Prof{}", new.professeur_id))),
                room: Some(room(new.salle_id, &format!("R{}", new.salle_id))),
            });
            plan.clone()
        })
    }

    async fn remove_session(&self, plan_id: Id, session_id: Id) -> Result<SchedulePlan> {
        self.record(format!("remove_session {plan_id} {session_id}"));

        if self.refuse_writes {
            return Err(Error::Status {
                status: 500,
                message: None,
            });
        }

        self.plan_mut(plan_id, |plan, _| {
            plan.sessions.retain(|session| session.id != session_id);
            plan.clone()
        })
    }

    async fn generate_weekly(&self, class_id: Id, week_start: NaiveDate) -> Result<SchedulePlan> {
        self.record(format!("generate_weekly {class_id} {week_start}"));

        let plan = SchedulePlan {
            id: 20 + class_id,
            title: format!("EDT {class_id} semaine du {week_start}"),
            period_start: week_start,
            period_end: week_start + chrono::Duration::days(5),
            sessions: Vec::new(),
        };
        self.state
            .lock()
            .unwrap()
            .plans
            .insert(class_id, plan.clone());
        Ok(plan)
    }
}
