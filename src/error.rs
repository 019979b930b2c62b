use std::io;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("serveur injoignable : {0}")]
    Http(#[source] reqwest::Error),

    /// The backend answered, but not with the expected JSON.
    #[error("réponse du serveur illisible : {0}")]
    Decode(#[source] reqwest::Error),

    /// Non-success answer; `message` is the backend's own message when it sent one.
    #[error("{}", status_message(.status, .message))]
    Status { status: u16, message: Option<String> },

    #[error("Aucun emploi du temps trouvé pour cette classe")]
    NoPlan,

    #[error("champs requis manquants : {}", .0.join(", "))]
    IncompleteDraft(Vec<&'static str>),

    #[error("la date {date} est hors de la période du {start} au {end}")]
    OutsidePeriod {
        date: chrono::NaiveDate,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Classe et lundi de début requis : {0} n'est pas un lundi")]
    NotMonday(chrono::NaiveDate),

    #[error("Seuls les administrateurs peuvent modifier l'emploi du temps")]
    Forbidden,

    #[error("non connecté")]
    NotLoggedIn,

    #[error("fichier d'identifiants invalide : {0}")]
    Credentials(String),

    #[error(transparent)]
    Render(#[from] askama::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Decode(err)
        } else {
            Error::Http(err)
        }
    }
}

fn status_message(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("le serveur a répondu {status}"),
    }
}

impl Error {
    /// Message written by the backend itself, if any.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Error::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}
