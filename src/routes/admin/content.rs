use anyhow::Context;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    domain::slug::generate_slug,
    models::{
        CreateEventEntity, CreatePostEntity, EventEntity, PostEntity, UpdateEventEntity,
        deserialize_some,
    },
    schema::{events, posts},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new()
        .nest(
            "/blog",
            OpenApiRouter::new()
                .routes(utoipa_axum::routes!(create_post))
                .routes(utoipa_axum::routes!(delete_post)),
        )
        .nest(
            "/events",
            OpenApiRouter::new()
                .routes(utoipa_axum::routes!(get_events, create_event))
                .routes(utoipa_axum::routes!(update_event, delete_event)),
        )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Accepts a plain date from the admin form (`2025-08-16`, taken as midnight
/// UTC) or a full RFC 3339 timestamp.
fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

fn event_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    parse_event_date(raw).ok_or_else(|| {
        AppError::BadRequest("date must look like 2025-08-16 or an RFC 3339 timestamp".into())
    })
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatePostReq {
    pub title: String,
    pub content: String,
    pub author_name: Option<String>,
    pub published: Option<bool>,
}

impl CreatePostReq {
    fn into_entity(self) -> Result<CreatePostEntity, AppError> {
        let missing: Vec<&str> = [("title", &self.title), ("content", &self.content)]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let title = self.title.trim().to_string();
        let slug = generate_slug(&title);
        if slug.is_empty() {
            return Err(AppError::BadRequest(
                "title must contain at least one letter or digit".into(),
            ));
        }

        Ok(CreatePostEntity {
            title,
            slug,
            content: self.content,
            published: self.published.unwrap_or(true),
            author_name: non_blank(self.author_name),
        })
    }
}

/// Write a blog post. Posts are published unless `published` is false.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    request_body = CreatePostReq,
    responses(
        (status = 201, description = "Created post successfully", body = StdResponse<PostEntity, String>),
        (status = 400, description = "Missing title or content", body = StdResponse<(), String>),
        (status = 409, description = "A post with this slug exists", body = StdResponse<(), String>)
    )
)]
async fn create_post(
    State(state): State<AppState>,
    Json(body): Json<CreatePostReq>,
) -> Result<impl IntoResponse, AppError> {
    let new_post = body.into_entity()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let post: PostEntity = diesel::insert_into(posts::table)
        .values(new_post)
        .returning(PostEntity::as_returning())
        .get_result(conn)
        .await?;

    info!("Post {} has been created", post.slug);

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(post),
            message: Some("Created post successfully"),
        },
    ))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Post ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted post successfully", body = StdResponse<PostEntity, String>),
        (status = 404, description = "Post not found", body = StdResponse<(), String>)
    )
)]
async fn delete_post(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let post: PostEntity = diesel::delete(posts::table.find(id))
        .returning(PostEntity::as_returning())
        .get_result(conn)
        .await?;

    info!("Post {} has been deleted", post.slug);

    Ok(StdResponse {
        data: Some(post),
        message: Some("Deleted post successfully"),
    })
}

/// Every event, hidden ones included, in date order.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Get events successfully", body = StdResponse<Vec<EventEntity>, String>)
    )
)]
async fn get_events(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let events: Vec<EventEntity> = events::table
        .order_by(events::date.asc())
        .select(EventEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get events")?;

    Ok(StdResponse {
        data: Some(events),
        message: Some("Get events successfully"),
    })
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateEventReq {
    pub title: String,
    pub description: String,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub date: String,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub is_active: Option<bool>,
}

impl CreateEventReq {
    fn into_entity(self) -> Result<CreateEventEntity, AppError> {
        let missing: Vec<&str> = [
            ("title", &self.title),
            ("description", &self.description),
            ("date", &self.date),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();
        if !missing.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        Ok(CreateEventEntity {
            date: event_date(&self.date)?,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            location: non_blank(self.location),
            image_url: non_blank(self.image_url),
            link: non_blank(self.link),
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

#[utoipa::path(
    post,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    request_body = CreateEventReq,
    responses(
        (status = 201, description = "Created event successfully", body = StdResponse<EventEntity, String>),
        (status = 400, description = "Missing fields or unreadable date", body = StdResponse<(), String>)
    )
)]
async fn create_event(
    State(state): State<AppState>,
    Json(body): Json<CreateEventReq>,
) -> Result<impl IntoResponse, AppError> {
    let new_event = body.into_entity()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let event: EventEntity = diesel::insert_into(events::table)
        .values(new_event)
        .returning(EventEntity::as_returning())
        .get_result(conn)
        .await?;

    info!("Event '{}' on {} has been created", event.title, event.date);

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(event),
            message: Some("Created event successfully"),
        },
    ))
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventReq {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub link: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl UpdateEventReq {
    fn into_changeset(self) -> Result<UpdateEventEntity, AppError> {
        let required = |field: &str, value: Option<String>| match value {
            Some(value) if value.trim().is_empty() => Err(AppError::BadRequest(format!(
                "{field} cannot be empty"
            ))),
            other => Ok(other.map(|value| value.trim().to_string())),
        };

        let changes = UpdateEventEntity {
            title: required("title", self.title)?,
            description: required("description", self.description)?,
            date: self.date.as_deref().map(event_date).transpose()?,
            location: self.location.map(non_blank),
            image_url: self.image_url.map(non_blank),
            link: self.link.map(non_blank),
            is_active: self.is_active,
        };
        if changes.is_noop() {
            return Err(AppError::BadRequest("No changes supplied".into()));
        }
        Ok(changes)
    }
}

#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Event ID to update")
    ),
    request_body = UpdateEventReq,
    responses(
        (status = 200, description = "Updated event successfully", body = StdResponse<EventEntity, String>),
        (status = 400, description = "Empty or invalid changes", body = StdResponse<(), String>),
        (status = 404, description = "Event not found", body = StdResponse<(), String>)
    )
)]
async fn update_event(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<UpdateEventReq>,
) -> Result<impl IntoResponse, AppError> {
    let changes = body.into_changeset()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let event: EventEntity = diesel::update(events::table.find(id))
        .set((&changes, events::updated_at.eq(diesel::dsl::now)))
        .returning(EventEntity::as_returning())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(event),
        message: Some("Updated event successfully"),
    })
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Event ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted event successfully", body = StdResponse<EventEntity, String>),
        (status = 404, description = "Event not found", body = StdResponse<(), String>)
    )
)]
async fn delete_event(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let event: EventEntity = diesel::delete(events::table.find(id))
        .returning(EventEntity::as_returning())
        .get_result(conn)
        .await?;

    info!("Event '{}' has been deleted", event.title);

    Ok(StdResponse {
        data: Some(event),
        message: Some("Deleted event successfully"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bad_request(result: Result<impl std::fmt::Debug, AppError>) -> String {
        match result {
            Err(AppError::BadRequest(message)) => message,
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_event_date() {
        let midnight = Utc.with_ymd_and_hms(2025, 8, 16, 0, 0, 0).unwrap();
        assert_eq!(parse_event_date("2025-08-16"), Some(midnight));
        assert_eq!(
            parse_event_date("2025-08-16T05:30:00+05:30"),
            Some(midnight)
        );
        assert_eq!(parse_event_date("16/08/2025"), None);
        assert_eq!(parse_event_date("2025-02-30"), None);
    }

    #[test]
    fn test_create_post_slugs_title_and_publishes() {
        let post = CreatePostReq {
            title: " Radhashtami & Jhulan Utsav ".into(),
            content: "Celebrations at the temple".into(),
            author_name: Some("  ".into()),
            published: None,
        }
        .into_entity()
        .expect("valid");

        assert_eq!(
            post,
            CreatePostEntity {
                title: "Radhashtami & Jhulan Utsav".into(),
                slug: "radhashtami-and-jhulan-utsav".into(),
                content: "Celebrations at the temple".into(),
                published: true,
                author_name: None,
            }
        );
    }

    #[test]
    fn test_create_post_reports_missing_fields() {
        assert_eq!(
            bad_request(CreatePostReq::default().into_entity()),
            "Missing required fields: title, content"
        );
    }

    #[test]
    fn test_create_event_from_admin_form() {
        let body: CreateEventReq = serde_json::from_str(
            r#"{"title":"Holi Utsav","description":"Phoolon ki Holi","date":"2026-03-03",
                "location":"Radha Vallabh Mandir","imageUrl":"","link":null,"isActive":true}"#,
        )
        .expect("valid json");

        let event = body.into_entity().expect("valid");
        assert_eq!(event.date, Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap());
        assert_eq!(event.location.as_deref(), Some("Radha Vallabh Mandir"));
        assert_eq!(event.image_url, None);
        assert_eq!(event.link, None);
        assert!(event.is_active);
    }

    #[test]
    fn test_create_event_rejects_missing_and_bad_date() {
        assert_eq!(
            bad_request(CreateEventReq::default().into_entity()),
            "Missing required fields: title, description, date"
        );

        let message = bad_request(
            CreateEventReq {
                title: "Kartik Deepotsav".into(),
                description: "Lamps along the Yamuna".into(),
                date: "next Tuesday".into(),
                ..Default::default()
            }
            .into_entity(),
        );
        assert!(message.starts_with("date must look like"));
    }

    #[test]
    fn test_update_event_changeset() {
        let body: UpdateEventReq =
            serde_json::from_str(r#"{"link":null,"isActive":false}"#).expect("valid");
        let changes = body.into_changeset().expect("valid");
        assert_eq!(changes.link, Some(None));
        assert_eq!(changes.is_active, Some(false));
        assert_eq!(changes.title, None);

        let empty: UpdateEventReq = serde_json::from_str("{}").expect("valid");
        assert_eq!(bad_request(empty.into_changeset()), "No changes supplied");

        let blank: UpdateEventReq = serde_json::from_str(r#"{"title":" "}"#).expect("valid");
        assert_eq!(bad_request(blank.into_changeset()), "title cannot be empty");
    }
}
