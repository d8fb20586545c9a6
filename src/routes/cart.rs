use anyhow::Context;
use axum::{Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    domain::{
        cart::CartLine,
        checkout::{self, RequestedItem},
        pricing::PricingSummary,
    },
    routes::catalog::fetch_products,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/cart",
        OpenApiRouter::new().routes(utoipa_axum::routes!(quote_cart)),
    )
}

#[derive(Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QuoteCartReq {
    pub items: Vec<RequestedItem>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartQuoteRes {
    pub lines: Vec<CartLine>,
    pub total_items: i64,
    pub pricing: PricingSummary,
}

/// Price a cart against the current catalog without placing an order.
#[utoipa::path(
    post,
    path = "/quote",
    tags = ["Cart"],
    request_body = QuoteCartReq,
    responses(
        (status = 200, description = "Quoted cart successfully", body = StdResponse<CartQuoteRes, String>),
        (status = 400, description = "Invalid quantity or unavailable products", body = StdResponse<(), String>)
    )
)]
async fn quote_cart(
    State(state): State<AppState>,
    Json(body): Json<QuoteCartReq>,
) -> Result<impl IntoResponse, AppError> {
    let items = checkout::merge_items(&body.items)?;

    let cart = if items.is_empty() {
        Default::default()
    } else {
        let conn = &mut state
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let product_ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
        let catalog = fetch_products(conn, &product_ids).await?;
        checkout::build_cart(&items, &catalog)?
    };

    let pricing = cart.pricing();
    let total_items = cart.total_items();

    Ok(StdResponse {
        data: Some(CartQuoteRes {
            lines: cart.into_lines(),
            total_items,
            pricing,
        }),
        message: Some("Quoted cart successfully"),
    })
}
