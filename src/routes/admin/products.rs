use anyhow::Context;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use diesel::{BoolExpressionMethods, ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
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
        CategoryEntity, CreateProductEntity, ProductEntity, UpdateProductEntity, deserialize_some,
    },
    routes::catalog::{ProductFilter, ProductRes, list_products},
    schema::{categories, products},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/products",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_products, create_product))
            .routes(utoipa_axum::routes!(
                get_product,
                update_product,
                delete_product
            )),
    )
}

/// List products including inactive ones unless `includeInactive=false`.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(ProductFilter),
    responses(
        (status = 200, description = "Get products successfully", body = StdResponse<Vec<ProductRes>, String>)
    )
)]
async fn get_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let products = list_products(
        conn,
        ProductFilter {
            include_inactive: Some(filter.include_inactive.unwrap_or(true)),
            ..filter
        },
    )
    .await?;

    Ok(StdResponse {
        data: Some(products),
        message: Some("Get products successfully"),
    })
}

/// Fetch one product regardless of whether it is active.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Product ID to fetch")
    ),
    responses(
        (status = 200, description = "Get product successfully", body = StdResponse<ProductRes, String>),
        (status = 404, description = "Product not found", body = StdResponse<(), String>)
    )
)]
async fn get_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let product = load_product(conn, id).await?;

    Ok(StdResponse {
        data: Some(product),
        message: Some("Get product successfully"),
    })
}

/// Missing fields deserialize as empty so that the handler can report all of them.
#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateProductReq {
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
    pub compare_at_price: Option<f64>,
    pub images: Vec<String>,
    pub category_id: Option<Uuid>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub featured: Option<bool>,
}

impl CreateProductReq {
    fn into_entity(self) -> Result<CreateProductEntity, AppError> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        if self.price.is_none() {
            missing.push("price");
        }
        if self.category_id.is_none() {
            missing.push("categoryId");
        }

        let missing_fields =
            || AppError::BadRequest(format!("Missing required fields: {}", missing.join(", ")));
        let (Some(price), Some(category_id)) = (self.price, self.category_id) else {
            return Err(missing_fields());
        };
        if !missing.is_empty() {
            return Err(missing_fields());
        }

        validate_amounts(Some(price), self.compare_at_price, self.stock)?;

        let name = self.name.trim().to_string();
        Ok(CreateProductEntity {
            slug: slug_for(&name)?,
            name,
            description: self.description.trim().to_string(),
            price,
            compare_at_price: self.compare_at_price,
            images: self.images,
            category_id,
            stock: self.stock.unwrap_or(0),
            is_active: self.is_active.unwrap_or(true),
            featured: self.featured.unwrap_or(false),
        })
    }
}

/// Create a product. The slug is derived from the name.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    request_body = CreateProductReq,
    responses(
        (status = 201, description = "Created product successfully", body = StdResponse<ProductRes, String>),
        (status = 400, description = "Missing fields, unknown category or duplicate name", body = StdResponse<(), String>)
    )
)]
async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<CreateProductReq>,
) -> Result<impl IntoResponse, AppError> {
    let new_product = body.into_entity()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    ensure_category_exists(conn, new_product.category_id).await?;
    ensure_slug_free(conn, &new_product.slug, None).await?;

    let product: ProductEntity = diesel::insert_into(products::table)
        .values(new_product)
        .returning(ProductEntity::as_returning())
        .get_result(conn)
        .await?;

    info!("Product {} ({}) has been created", product.name, product.id);
    let product = load_product(conn, product.id).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(product),
            message: Some("Created product successfully"),
        },
    ))
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductReq {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    /// `null` removes the sale price.
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<f64>)]
    pub compare_at_price: Option<Option<f64>>,
    pub images: Option<Vec<String>>,
    pub category_id: Option<Uuid>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub featured: Option<bool>,
}

impl UpdateProductReq {
    fn into_changeset(self) -> Result<UpdateProductEntity, AppError> {
        validate_amounts(self.price, self.compare_at_price.flatten(), self.stock)?;

        let name = self.name.map(|name| name.trim().to_string());
        let slug = name.as_deref().map(slug_for).transpose()?;

        let description = match self.description {
            Some(description) if description.trim().is_empty() => {
                return Err(AppError::BadRequest("description cannot be blank".into()));
            }
            other => other.map(|d| d.trim().to_string()),
        };

        Ok(UpdateProductEntity {
            name,
            slug,
            description,
            price: self.price,
            compare_at_price: self.compare_at_price,
            images: self.images,
            category_id: self.category_id,
            stock: self.stock,
            is_active: self.is_active,
            featured: self.featured,
        })
    }
}

/// Partially update a product. Renaming regenerates the slug.
#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Product ID to update")
    ),
    request_body = UpdateProductReq,
    responses(
        (status = 200, description = "Updated product successfully", body = StdResponse<ProductRes, String>),
        (status = 400, description = "Invalid values or duplicate name", body = StdResponse<(), String>),
        (status = 404, description = "Product not found", body = StdResponse<(), String>)
    )
)]
async fn update_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<UpdateProductReq>,
) -> Result<impl IntoResponse, AppError> {
    let changes = body.into_changeset()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    if let Some(category_id) = changes.category_id {
        ensure_category_exists(conn, category_id).await?;
    }
    if let Some(slug) = &changes.slug {
        ensure_slug_free(conn, slug, Some(id)).await?;
    }

    let product: ProductEntity = diesel::update(products::table.find(id))
        .set((&changes, products::updated_at.eq(diesel::dsl::now)))
        .returning(ProductEntity::as_returning())
        .get_result(conn)
        .await?;

    info!("Product {} ({}) has been updated", product.name, product.id);
    let product = load_product(conn, product.id).await?;

    Ok(StdResponse {
        data: Some(product),
        message: Some("Updated product successfully"),
    })
}

/// Delete a product that no order refers to.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Product ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted product successfully", body = StdResponse<ProductEntity, String>),
        (status = 404, description = "Product not found", body = StdResponse<(), String>),
        (status = 409, description = "Product appears in existing orders", body = StdResponse<(), String>)
    )
)]
async fn delete_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let product: ProductEntity = diesel::delete(products::table.find(id))
        .returning(ProductEntity::as_returning())
        .get_result(conn)
        .await
        .map_err(|err| match AppError::from(err) {
            AppError::Conflict(_) => AppError::Conflict(
                "Product appears in existing orders; deactivate it instead".into(),
            ),
            other => other,
        })?;

    info!("Product {} ({}) has been deleted", product.name, product.id);

    Ok(StdResponse {
        data: Some(product),
        message: Some("Deleted product successfully"),
    })
}

async fn load_product(conn: &mut AsyncPgConnection, id: Uuid) -> Result<ProductRes, AppError> {
    let product: (ProductEntity, CategoryEntity) = products::table
        .inner_join(categories::table)
        .filter(products::id.eq(id))
        .select((ProductEntity::as_select(), CategoryEntity::as_select()))
        .first(conn)
        .await?;

    Ok(ProductRes::from(product))
}

async fn ensure_category_exists(
    conn: &mut AsyncPgConnection,
    category_id: Uuid,
) -> Result<(), AppError> {
    let exists: bool = diesel::select(diesel::dsl::exists(categories::table.find(category_id)))
        .get_result(conn)
        .await
        .context("Failed to check category")?;

    if !exists {
        return Err(AppError::BadRequest(format!(
            "Category {category_id} does not exist"
        )));
    }
    Ok(())
}

async fn ensure_slug_free(
    conn: &mut AsyncPgConnection,
    slug: &str,
    except: Option<Uuid>,
) -> Result<(), AppError> {
    let taken: bool = diesel::select(diesel::dsl::exists(
        products::table.filter(
            products::slug
                .eq(slug)
                .and(products::id.ne(except.unwrap_or_else(Uuid::nil))),
        ),
    ))
    .get_result(conn)
    .await
    .context("Failed to check product slug")?;

    if taken {
        return Err(AppError::BadRequest(format!(
            "A product with the slug '{slug}' already exists"
        )));
    }
    Ok(())
}

fn slug_for(name: &str) -> Result<String, AppError> {
    let slug = generate_slug(name);
    if slug.is_empty() {
        return Err(AppError::BadRequest(
            "name must contain at least one letter or digit".into(),
        ));
    }
    Ok(slug)
}

fn validate_amounts(
    price: Option<f64>,
    compare_at_price: Option<f64>,
    stock: Option<i32>,
) -> Result<(), AppError> {
    if price.is_some_and(|price| !(price.is_finite() && price > 0.0)) {
        return Err(AppError::BadRequest("price must be greater than 0".into()));
    }
    if compare_at_price.is_some_and(|compare_at| !(compare_at.is_finite() && compare_at > 0.0)) {
        return Err(AppError::BadRequest(
            "compareAtPrice must be greater than 0".into(),
        ));
    }
    if stock.is_some_and(|stock| stock < 0) {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }
    Ok(())
}
