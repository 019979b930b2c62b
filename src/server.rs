use std::{io, net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, signal};

use crate::auth::AuthContext;
use crate::backend::Backend;
use crate::cache::Cache;
use crate::dispatch::Dispatcher;
use crate::editor::{DraftEdit, Mode};
use crate::error::Error;
use crate::grid::{Day, Slot};
use crate::model::{Class, Id, References, Status};
use crate::view::GridView;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub auth: Arc<AuthContext>,
    pub references: Arc<Cache<Id, References>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/classes", get(handle_classes))
        .route("/classes/:class_id/schedule", get(handle_schedule))
        .route("/classes/:class_id/references", get(handle_references))
        .route("/classes/:class_id/schedule/sessions", post(handle_add_session))
        .route(
            "/classes/:class_id/schedule/sessions/:session_id",
            delete(handle_remove_session),
        )
        .fallback(|| async { (StatusCode::NOT_FOUND, "Not found") })
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening at http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NoPlan => StatusCode::NOT_FOUND,
            Error::IncompleteDraft(_) | Error::OutsidePeriod { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotLoggedIn => StatusCode::UNAUTHORIZED,
            Error::Status { status, .. } if (400..500).contains(status) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Error::Status { .. } | Error::Http(_) | Error::Decode(_) | Error::Json(_) => {
                StatusCode::BAD_GATEWAY
            }
            Error::NotMonday(_) => StatusCode::BAD_REQUEST,
            Error::Credentials(_) | Error::Io(_) | Error::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            warn!("Request failed: {self}");
        }

        (
            status,
            Json(ErrorBody {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

type Outcome<T> = Result<T, Error>;

async fn handle_classes(State(state): State<AppState>) -> Outcome<Json<Vec<Class>>> {
    Ok(Json(state.backend.classes().await?))
}

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Format {
    #[default]
    Html,
    Json,
    Ics,
}

#[derive(Deserialize)]
struct ScheduleQuery {
    #[serde(default)]
    format: Format,
}

async fn handle_schedule(
    State(state): State<AppState>,
    Path(class_id): Path<Id>,
    Query(query): Query<ScheduleQuery>,
) -> Outcome<Response> {
    let plan = state
        .backend
        .latest_plan(class_id)
        .await?
        .ok_or(Error::NoPlan)?;

    Ok(match query.format {
        Format::Html => Html(GridView::of(&plan).to_html()?).into_response(),
        Format::Json => Json(GridView::of(&plan)).into_response(),
        Format::Ics => (
            [("content-type", "text/calendar")],
            plan.to_ics().to_string(),
        )
            .into_response(),
    })
}

async fn handle_references(
    State(state): State<AppState>,
    Path(class_id): Path<Id>,
) -> Outcome<Json<References>> {
    let backend = Arc::clone(&state.backend);
    let references = state
        .references
        .get_or_try_insert(class_id, || async move { backend.references(class_id).await })
        .await?;

    Ok(Json(references.as_ref().clone()))
}

#[derive(Debug, Deserialize)]
struct AddSessionBody {
    day: Day,
    slot: Slot,
    #[serde(default)]
    mode: Mode,
    course_id: Option<Id>,
    teacher_id: Option<Id>,
    room_id: Option<Id>,
    status: Option<Status>,
}

async fn handle_add_session(
    State(state): State<AppState>,
    Path(class_id): Path<Id>,
    Json(body): Json<AddSessionBody>,
) -> Outcome<Json<GridView>> {
    state.auth.require_admin()?;

    let mut dispatcher = Dispatcher::new(Arc::clone(&state.backend), &state.auth);
    dispatcher.load_plan(class_id).await?;

    dispatcher.open_draft(body.day, body.slot);
    dispatcher.edit_draft(DraftEdit {
        course_id: body.course_id,
        teacher_id: body.teacher_id,
        room_id: body.room_id,
        status: body.status,
        mode: Some(body.mode),
        ..DraftEdit::default()
    });

    let plan = dispatcher.add_session().await?;
    Ok(Json(GridView::of(plan)))
}

#[derive(Deserialize)]
struct RemoveQuery {
    #[serde(default)]
    confirm: bool,
}

async fn handle_remove_session(
    State(state): State<AppState>,
    Path((class_id, session_id)): Path<(Id, Id)>,
    Query(query): Query<RemoveQuery>,
) -> Result<Json<GridView>, Response> {
    state.auth.require_admin().map_err(IntoResponse::into_response)?;

    if !query.confirm {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                message: "removal must be confirmed with `?confirm=true`".into(),
            }),
        )
            .into_response());
    }

    let mut dispatcher = Dispatcher::new(Arc::clone(&state.backend), &state.auth);
    dispatcher
        .load_plan(class_id)
        .await
        .map_err(IntoResponse::into_response)?;

    dispatcher.request_removal(session_id);
    let plan = dispatcher
        .confirm_removal()
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(GridView::of(plan)))
}
