use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::error::{Error, Result};
use crate::model::{Class, Course, Id, NewSession, References, Room, SchedulePlan, Teacher};

/// The REST endpoints of the absence-management backend used by the schedule.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn classes(&self) -> Result<Vec<Class>>;

    /// `Ok(None)` when the class has no plan yet.
    async fn latest_plan(&self, class_id: Id) -> Result<Option<SchedulePlan>>;

    async fn courses_for_class(&self, class_id: Id) -> Result<Vec<Course>>;

    async fn teachers(&self) -> Result<Vec<Teacher>>;

    async fn rooms(&self) -> Result<Vec<Room>>;

    async fn add_session(&self, plan_id: Id, session: &NewSession) -> Result<SchedulePlan>;

    async fn remove_session(&self, plan_id: Id, session_id: Id) -> Result<SchedulePlan>;

    async fn generate_weekly(&self, class_id: Id, week_start: NaiveDate) -> Result<SchedulePlan>;

    async fn references(&self, class_id: Id) -> Result<References> {
        let courses = self.courses_for_class(class_id).await?;
        let (teachers, rooms) = tokio::try_join!(self.teachers(), self.rooms())?;

        Ok(References {
            courses,
            teachers,
            rooms,
        })
    }
}

#[async_trait]
impl<T: Backend + ?Sized> Backend for Arc<T> {
    async fn classes(&self) -> Result<Vec<Class>> {
        (**self).classes().await
    }

    async fn latest_plan(&self, class_id: Id) -> Result<Option<SchedulePlan>> {
        (**self).latest_plan(class_id).await
    }

    async fn courses_for_class(&self, class_id: Id) -> Result<Vec<Course>> {
        (**self).courses_for_class(class_id).await
    }

    async fn teachers(&self) -> Result<Vec<Teacher>> {
        (**self).teachers().await
    }

    async fn rooms(&self) -> Result<Vec<Room>> {
        (**self).rooms().await
    }

    async fn add_session(&self, plan_id: Id, session: &NewSession) -> Result<SchedulePlan> {
        (**self).add_session(plan_id, session).await
    }

    async fn remove_session(&self, plan_id: Id, session_id: Id) -> Result<SchedulePlan> {
        (**self).remove_session(plan_id, session_id).await
    }

    async fn generate_weekly(&self, class_id: Id, week_start: NaiveDate) -> Result<SchedulePlan> {
        (**self).generate_weekly(class_id, week_start).await
    }

    async fn references(&self, class_id: Id) -> Result<References> {
        (**self).references(class_id).await
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub struct HttpBackend {
    client: Client,
    base: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new<S: Into<String>>(base: S, auth: &AuthContext) -> Self {
        Self {
            client: Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
            token: auth.token().map(str::to_string),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base);
        debug!("{method} {url}");

        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|body| body.message);

        Err(Error::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.request(Method::GET, path).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Missing or `null` lists count as empty.
    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        Ok(self.get::<Option<Vec<T>>>(path).await?.unwrap_or_default())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn classes(&self) -> Result<Vec<Class>> {
        self.get_list("/api/classes").await
    }

    async fn latest_plan(&self, class_id: Id) -> Result<Option<SchedulePlan>> {
        let path = format!("/api/emploi-du-temps/by-classe/{class_id}/latest");
        let response = self.request(Method::GET, &path).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = Self::check(response).await?.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn courses_for_class(&self, class_id: Id) -> Result<Vec<Course>> {
        let courses: Vec<Course> = self
            .get_list(&format!("/api/cours/by-classe/{class_id}"))
            .await?;

        if !courses.is_empty() {
            return Ok(courses);
        }

        // Some backends only fill `by-classe` once courses are linked.
        warn!("No course linked to class {class_id}, filtering the full course list");
        Ok(self
            .get_list::<Course>("/api/cours")
            .await?
            .into_iter()
            .filter(|course| course.is_taught_to(class_id))
            .collect())
    }

    async fn teachers(&self) -> Result<Vec<Teacher>> {
        self.get_list("/api/professeurs").await
    }

    async fn rooms(&self) -> Result<Vec<Room>> {
        self.get_list("/api/salles").await
    }

    async fn add_session(&self, plan_id: Id, session: &NewSession) -> Result<SchedulePlan> {
        let path = format!("/api/emploi-du-temps/{plan_id}/seances");
        let response = self.request(Method::POST, &path).json(session).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn remove_session(&self, plan_id: Id, session_id: Id) -> Result<SchedulePlan> {
        let path = format!("/api/emploi-du-temps/{plan_id}/seances/{session_id}");
        let response = self.request(Method::DELETE, &path).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn generate_weekly(&self, class_id: Id, week_start: NaiveDate) -> Result<SchedulePlan> {
        let path = format!(
            "/api/emploi-du-temps/generate-weekly-16?classeId={class_id}&weekStart={}",
            week_start.format("%Y-%m-%d")
        );
        self.get(&path).await
    }
}
