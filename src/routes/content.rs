use anyhow::Context;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    models::{EventEntity, PostEntity},
    schema::{events, posts},
};

/// Public blog and temple events listings.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new()
        .nest(
            "/blog",
            OpenApiRouter::new()
                .routes(utoipa_axum::routes!(get_posts))
                .routes(utoipa_axum::routes!(get_post_by_slug)),
        )
        .nest(
            "/events",
            OpenApiRouter::new().routes(utoipa_axum::routes!(get_events)),
        )
}

/// Published posts, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Content"],
    responses(
        (status = 200, description = "Get posts successfully", body = StdResponse<Vec<PostEntity>, String>)
    )
)]
async fn get_posts(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let posts: Vec<PostEntity> = posts::table
        .filter(posts::published.eq(true))
        .order_by(posts::created_at.desc())
        .select(PostEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get posts")?;

    Ok(StdResponse {
        data: Some(posts),
        message: Some("Get posts successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/{slug}",
    tags = ["Content"],
    params(
        ("slug" = String, Path, description = "Post slug")
    ),
    responses(
        (status = 200, description = "Get post successfully", body = StdResponse<PostEntity, String>),
        (status = 404, description = "Post not found or unpublished", body = StdResponse<(), String>)
    )
)]
async fn get_post_by_slug(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let post: PostEntity = posts::table
        .filter(posts::slug.eq(&slug))
        .filter(posts::published.eq(true))
        .select(PostEntity::as_select())
        .first(conn)
        .await?;

    Ok(StdResponse {
        data: Some(post),
        message: Some("Get post successfully"),
    })
}

/// Active events in date order.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Content"],
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
        .filter(events::is_active.eq(true))
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
