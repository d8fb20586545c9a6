use std::collections::HashMap;

use anyhow::Context;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use diesel::{BoolExpressionMethods, ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    domain::money::discount_percent,
    models::{CategoryEntity, ProductEntity},
    schema::{categories, products},
};

/// Public, read-only catalog routes.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new()
        .nest(
            "/products",
            OpenApiRouter::new()
                .routes(utoipa_axum::routes!(get_products))
                .routes(utoipa_axum::routes!(get_product))
                .routes(utoipa_axum::routes!(get_product_by_slug)),
        )
        .nest(
            "/categories",
            OpenApiRouter::new().routes(utoipa_axum::routes!(get_categories)),
        )
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRes {
    pub product: ProductEntity,
    pub category: CategoryEntity,
    /// Whole-number percentage off `compareAtPrice`, 0 when not on sale.
    pub discount_percent: i64,
}

impl From<(ProductEntity, CategoryEntity)> for ProductRes {
    fn from((product, category): (ProductEntity, CategoryEntity)) -> Self {
        Self {
            discount_percent: discount_percent(product.price, product.compare_at_price),
            product,
            category,
        }
    }
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// Only products in this category.
    pub category_id: Option<Uuid>,
    /// Only featured products when `true`.
    pub featured: Option<bool>,
    /// Include deactivated products. Ignored on the public listing.
    pub include_inactive: Option<bool>,
}

/// List active products, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Catalog"],
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
            include_inactive: None,
            ..filter
        },
    )
    .await?;

    Ok(StdResponse {
        data: Some(products),
        message: Some("Get products successfully"),
    })
}

/// Fetch one active product by ID.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Catalog"],
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

    let product: (ProductEntity, CategoryEntity) = products::table
        .inner_join(categories::table)
        .filter(products::id.eq(id).and(products::is_active.eq(true)))
        .select((ProductEntity::as_select(), CategoryEntity::as_select()))
        .first(conn)
        .await?;

    Ok(StdResponse {
        data: Some(ProductRes::from(product)),
        message: Some("Get product successfully"),
    })
}

/// Fetch one active product by its URL slug, as the product page does.
#[utoipa::path(
    get,
    path = "/slug/{slug}",
    tags = ["Catalog"],
    params(
        ("slug" = String, Path, description = "Product slug, e.g. `brass-diya`")
    ),
    responses(
        (status = 200, description = "Get product successfully", body = StdResponse<ProductRes, String>),
        (status = 404, description = "Product not found", body = StdResponse<(), String>)
    )
)]
async fn get_product_by_slug(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let product: (ProductEntity, CategoryEntity) = products::table
        .inner_join(categories::table)
        .filter(products::slug.eq(slug).and(products::is_active.eq(true)))
        .select((ProductEntity::as_select(), CategoryEntity::as_select()))
        .first(conn)
        .await?;

    Ok(StdResponse {
        data: Some(ProductRes::from(product)),
        message: Some("Get product successfully"),
    })
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRes {
    pub category: CategoryEntity,
    pub product_count: i64,
}

/// List categories by name with the number of products in each.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Catalog"],
    responses(
        (status = 200, description = "Get categories successfully", body = StdResponse<Vec<CategoryRes>, String>)
    )
)]
async fn get_categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let categories: Vec<CategoryEntity> = categories::table
        .order_by(categories::name.asc())
        .get_results(conn)
        .await
        .context("Failed to get categories")?;

    let counts: HashMap<Uuid, i64> = products::table
        .group_by(products::category_id)
        .select((products::category_id, diesel::dsl::count_star()))
        .load::<(Uuid, i64)>(conn)
        .await
        .context("Failed to count products per category")?
        .into_iter()
        .collect();

    let categories: Vec<CategoryRes> = categories
        .into_iter()
        .map(|category| CategoryRes {
            product_count: counts.get(&category.id).copied().unwrap_or(0),
            category,
        })
        .collect();

    Ok(StdResponse {
        data: Some(categories),
        message: Some("Get categories successfully"),
    })
}

/// Products joined with their category, newest first.
pub(crate) async fn list_products(
    conn: &mut AsyncPgConnection,
    filter: ProductFilter,
) -> Result<Vec<ProductRes>, AppError> {
    let mut query = products::table
        .inner_join(categories::table)
        .select((ProductEntity::as_select(), CategoryEntity::as_select()))
        .order_by(products::created_at.desc())
        .into_boxed();

    if let Some(category_id) = filter.category_id {
        query = query.filter(products::category_id.eq(category_id));
    }
    if let Some(featured) = filter.featured {
        query = query.filter(products::featured.eq(featured));
    }
    if !filter.include_inactive.unwrap_or(false) {
        query = query.filter(products::is_active.eq(true));
    }

    let rows: Vec<(ProductEntity, CategoryEntity)> = query
        .load(conn)
        .await
        .context("Failed to get products")?;

    Ok(rows.into_iter().map(ProductRes::from).collect())
}

/// Looks up products by ID for pricing. Missing IDs are simply absent.
pub(crate) async fn fetch_products(
    conn: &mut AsyncPgConnection,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, ProductEntity>, AppError> {
    let products: Vec<ProductEntity> = products::table
        .filter(products::id.eq_any(ids))
        .get_results(conn)
        .await
        .context("Failed to get products")?;

    Ok(products
        .into_iter()
        .map(|product| (product.id, product))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_product_res_derives_discount() {
        let category = CategoryEntity {
            id: Uuid::new_v4(),
            name: "Diyas".into(),
            slug: "diyas".into(),
            description: None,
            image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let product = ProductEntity {
            id: Uuid::new_v4(),
            name: "Brass Diya".into(),
            slug: "brass-diya".into(),
            description: "Hand-polished".into(),
            price: 750.0,
            compare_at_price: Some(1000.0),
            images: vec![],
            category_id: category.id,
            stock: 3,
            is_active: true,
            featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let res = ProductRes::from((product, category));
        assert_eq!(res.discount_percent, 25);

        let json = serde_json::to_value(&res).expect("serializable");
        assert_eq!(json["discountPercent"], 25);
        assert_eq!(json["product"]["compareAtPrice"], 1000.0);
        assert_eq!(json["category"]["slug"], "diyas");
    }

    #[test]
    fn test_product_filter_reads_camel_case_query() {
        let filter: ProductFilter =
            serde_json::from_str(r#"{"featured":true,"includeInactive":true}"#).expect("valid");
        assert_eq!(filter.featured, Some(true));
        assert_eq!(filter.include_inactive, Some(true));
        assert_eq!(filter.category_id, None);
    }
}
