use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type Id = i64;

fn serialize_naive_time<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    let formatted_time = format!("{:02}:{:02}:00", time.hour(), time.minute());
    serializer.serialize_str(&formatted_time)
}

/// The backend sends `HH:MM:SS`, hand-edited payloads sometimes only `HH:MM`.
fn deserialize_naive_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(&raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
        .map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "PLANIFIEE")]
    Planned,
    #[serde(rename = "EFFECTUEE")]
    Done,
    #[serde(rename = "ANNULEE")]
    Cancelled,
    #[serde(rename = "REPORTEE")]
    Postponed,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Planned,
        Status::Done,
        Status::Cancelled,
        Status::Postponed,
    ];

    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            Status::Planned => "PLANIFIEE",
            Status::Done => "EFFECTUEE",
            Status::Cancelled => "ANNULEE",
            Status::Postponed => "REPORTEE",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.wire_name().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRef {
    pub id: Id,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: Id,
    pub nom: String,
    #[serde(default)]
    pub niveau: Option<String>,
}

impl Class {
    #[must_use]
    pub fn label(&self) -> String {
        match &self.niveau {
            Some(niveau) => format!("{} - {}", self.nom, niveau),
            None => self.nom.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, rename = "intitule", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<ClassRef>,
}

impl Course {
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.title.as_deref().or(self.code.as_deref())
    }

    #[must_use]
    pub fn is_taught_to(&self, class_id: Id) -> bool {
        self.classes.iter().any(|class| class.id == class_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: Id,
    #[serde(default, rename = "nom")]
    pub last_name: Option<String>,
    #[serde(default, rename = "prenom")]
    pub first_name: Option<String>,
}

impl Teacher {
    #[must_use]
    pub fn name(&self) -> String {
        [self.last_name.as_deref(), self.first_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, rename = "nom", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "capacite", skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

impl Room {
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.code.as_deref().or(self.name.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Id,
    pub date: NaiveDate,
    #[serde(
        rename = "heureDebut",
        serialize_with = "serialize_naive_time",
        deserialize_with = "deserialize_naive_time"
    )]
    pub start: NaiveTime,
    #[serde(
        rename = "heureFin",
        serialize_with = "serialize_naive_time",
        deserialize_with = "deserialize_naive_time"
    )]
    pub end: NaiveTime,
    #[serde(rename = "statut", default)]
    pub status: Status,
    #[serde(rename = "cours", default)]
    pub course: Option<Course>,
    #[serde(rename = "professeur", default)]
    pub teacher: Option<Teacher>,
    #[serde(rename = "salle", default)]
    pub room: Option<Room>,
}

impl Session {
    #[must_use]
    pub fn course_label(&self) -> String {
        self.course
            .as_ref()
            .and_then(Course::label)
            .unwrap_or("Non défini")
            .to_string()
    }

    #[must_use]
    pub fn teacher_label(&self) -> String {
        match &self.teacher {
            Some(teacher) => teacher.name(),
            None => "Non assigné".to_string(),
        }
    }

    #[must_use]
    pub fn room_label(&self) -> String {
        self.room
            .as_ref()
            .and_then(Room::label)
            .unwrap_or("Non assignée")
            .to_string()
    }

    /// Course, teacher and room ids. Two sessions with equal assignments
    /// are considered the same block, absent references included.
    #[must_use]
    pub fn assignment(&self) -> (Option<Id>, Option<Id>, Option<Id>) {
        (
            self.course.as_ref().map(|course| course.id),
            self.teacher.as_ref().map(|teacher| teacher.id),
            self.room.as_ref().map(|room| room.id),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePlan {
    pub id: Id,
    #[serde(rename = "intitule", default)]
    pub title: String,
    #[serde(rename = "dateDebut")]
    pub period_start: NaiveDate,
    #[serde(rename = "dateFin")]
    pub period_end: NaiveDate,
    #[serde(rename = "seances", default)]
    pub sessions: Vec<Session>,
}

impl SchedulePlan {
    #[must_use]
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.period_start <= date && date <= self.period_end
    }
}

/// Body of `POST /api/emploi-du-temps/{planId}/seances`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub cours_id: Id,
    pub professeur_id: Id,
    pub salle_id: Id,
    pub date: NaiveDate,
    #[serde(
        serialize_with = "serialize_naive_time",
        deserialize_with = "deserialize_naive_time"
    )]
    pub heure_debut: NaiveTime,
    #[serde(
        serialize_with = "serialize_naive_time",
        deserialize_with = "deserialize_naive_time"
    )]
    pub heure_fin: NaiveTime,
    pub statut: Status,
}

/// Reference lists an editor picks course, teacher and room from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct References {
    pub courses: Vec<Course>,
    pub teachers: Vec<Teacher>,
    pub rooms: Vec<Room>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"{
        "id": 4,
        "intitule": "Semaine 1",
        "dateDebut": "2024-09-02",
        "dateFin": "2024-09-07",
        "seances": [
            {
                "id": 10,
                "date": "2024-09-02",
                "heureDebut": "08:00:00",
                "heureFin": "09:00",
                "statut": "REPORTEE",
                "cours": {"id": 7, "code": "MATH", "intitule": "Analyse"},
                "professeur": {"id": 3, "nom": "Curie", "prenom": "Marie"},
                "salle": null
            }
        ]
    }"#;

    #[test]
    fn decodes_backend_plan() {
        let plan: SchedulePlan = serde_json::from_str(PLAN).unwrap();
        let session = &plan.sessions[0];

        assert_eq!(plan.title, "Semaine 1");
        assert_eq!(session.start, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(session.end, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(session.status, Status::Postponed);
        assert_eq!(session.course_label(), "Analyse");
        assert_eq!(session.teacher_label(), "Curie Marie");
        assert_eq!(session.room_label(), "Non assignée");
        assert_eq!(session.assignment(), (Some(7), Some(3), None));
    }

    #[test]
    fn new_session_uses_backend_field_names() {
        let payload = NewSession {
            cours_id: 7,
            professeur_id: 3,
            salle_id: 5,
            date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            heure_debut: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            heure_fin: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            statut: Status::Planned,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["coursId"], 7);
        assert_eq!(json["heureDebut"], "08:00:00");
        assert_eq!(json["statut"], "PLANIFIEE");
    }

    #[test]
    fn status_names_are_case_insensitive() {
        assert_eq!(Status::from_wire_name("annulee"), Some(Status::Cancelled));
        assert_eq!(Status::from_wire_name("DONE"), None);
    }
}
