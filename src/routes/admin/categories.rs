use anyhow::Context;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
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
    models::{CategoryEntity, CreateCategoryEntity, UpdateCategoryEntity, deserialize_some},
    schema::{categories, products},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/categories",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_category))
            .routes(utoipa_axum::routes!(update_category, delete_category)),
    )
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCategoryReq {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryReq {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub image: Option<Option<String>>,
}

fn category_name(name: &str) -> Result<(String, String), AppError> {
    let name = name.trim();
    let slug = generate_slug(name);
    if name.is_empty() {
        return Err(AppError::BadRequest("Missing required fields: name".into()));
    }
    if slug.is_empty() {
        return Err(AppError::BadRequest(
            "name must contain at least one letter or digit".into(),
        ));
    }
    Ok((name.to_string(), slug))
}

/// Create a category. The slug is derived from the name.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    request_body = CreateCategoryReq,
    responses(
        (status = 201, description = "Created category successfully", body = StdResponse<CategoryEntity, String>),
        (status = 400, description = "Missing name", body = StdResponse<(), String>),
        (status = 409, description = "A category with this slug exists", body = StdResponse<(), String>)
    )
)]
async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<CreateCategoryReq>,
) -> Result<impl IntoResponse, AppError> {
    let (name, slug) = category_name(&body.name)?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let category: CategoryEntity = diesel::insert_into(categories::table)
        .values(CreateCategoryEntity {
            name,
            slug,
            description: body.description,
            image: body.image,
        })
        .returning(CategoryEntity::as_returning())
        .get_result(conn)
        .await?;

    info!("Category {} has been created", category.slug);

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(category),
            message: Some("Created category successfully"),
        },
    ))
}

/// Rename or describe a category. Renaming regenerates the slug.
#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Category ID to update")
    ),
    request_body = UpdateCategoryReq,
    responses(
        (status = 200, description = "Updated category successfully", body = StdResponse<CategoryEntity, String>),
        (status = 404, description = "Category not found", body = StdResponse<(), String>),
        (status = 409, description = "A category with this slug exists", body = StdResponse<(), String>)
    )
)]
async fn update_category(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<UpdateCategoryReq>,
) -> Result<impl IntoResponse, AppError> {
    let (name, slug) = match body.name.as_deref().map(category_name).transpose()? {
        Some((name, slug)) => (Some(name), Some(slug)),
        None => (None, None),
    };

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let changes = UpdateCategoryEntity {
        name,
        slug,
        description: body.description,
        image: body.image,
    };

    let category: CategoryEntity = diesel::update(categories::table.find(id))
        .set((&changes, categories::updated_at.eq(diesel::dsl::now)))
        .returning(CategoryEntity::as_returning())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(category),
        message: Some("Updated category successfully"),
    })
}

/// Delete an empty category.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Category ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted category successfully", body = StdResponse<CategoryEntity, String>),
        (status = 404, description = "Category not found", body = StdResponse<(), String>),
        (status = 409, description = "Category still has products", body = StdResponse<(), String>)
    )
)]
async fn delete_category(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let product_count: i64 = products::table
        .filter(products::category_id.eq(id))
        .count()
        .get_result(conn)
        .await
        .context("Failed to count products in category")?;
    if product_count > 0 {
        return Err(AppError::Conflict(format!(
            "Category still has {product_count} products"
        )));
    }

    let category: CategoryEntity = diesel::delete(categories::table.find(id))
        .returning(CategoryEntity::as_returning())
        .get_result(conn)
        .await?;

    info!("Category {} has been deleted", category.slug);

    Ok(StdResponse {
        data: Some(category),
        message: Some("Deleted category successfully"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_name() {
        assert_eq!(
            category_name(" Idols & Murtis ").expect("valid"),
            ("Idols & Murtis".to_string(), "idols-and-murtis".to_string())
        );
        assert!(matches!(category_name("  "), Err(AppError::BadRequest(_))));
        assert!(matches!(category_name("!!"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_update_category_req_distinguishes_null() {
        let body: UpdateCategoryReq =
            serde_json::from_str(r#"{"image":null}"#).expect("valid");
        assert_eq!(body.image, Some(None));
        assert_eq!(body.description, None);
        assert_eq!(body.name, None);
    }
}
