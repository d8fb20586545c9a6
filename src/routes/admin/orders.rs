use std::collections::HashMap;

use anyhow::Context;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    domain::payment::{Actor, OrderStatus, PaymentStatus},
    models::{OrderEntity, OrderItemEntity, deserialize_some},
    routes::orders::{GetOrderRes, OrderChange, apply_order_change, load_order},
    schema::{order_items, orders},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_orders))
            .routes(utoipa_axum::routes!(get_order, update_order, delete_order)),
    )
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// Fetch all orders with their items, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(OrderFilter),
    responses(
        (status = 200, description = "Get orders successfully", body = StdResponse<Vec<GetOrderRes>, String>),
        (status = 401, description = "Missing or wrong admin token", body = StdResponse<(), String>)
    )
)]
async fn get_orders(
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut query = orders::table.order_by(orders::created_at.desc()).into_boxed();
    if let Some(status) = filter.status {
        query = query.filter(orders::status.eq(status.as_str()));
    }
    if let Some(payment_status) = filter.payment_status {
        query = query.filter(orders::payment_status.eq(payment_status.as_str()));
    }

    let orders: Vec<OrderEntity> = query
        .get_results(conn)
        .await
        .context("Failed to get orders")?;

    let order_ids: Vec<Uuid> = orders.iter().map(|order| order.id).collect();
    let items: Vec<OrderItemEntity> = order_items::table
        .filter(order_items::order_id.eq_any(&order_ids))
        .order_by(order_items::created_at.asc())
        .get_results(conn)
        .await
        .context("Failed to get order items")?;

    let mut items_by_order: HashMap<Uuid, Vec<OrderItemEntity>> = HashMap::new();
    for item in items {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    let orders: Vec<GetOrderRes> = orders
        .into_iter()
        .map(|order| GetOrderRes {
            items: items_by_order.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect();

    Ok(StdResponse {
        data: Some(orders),
        message: Some("Get orders successfully"),
    })
}

/// Fetch one order with its items.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Order ID to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<GetOrderRes, String>),
        (status = 404, description = "Order not found", body = StdResponse<(), String>)
    )
)]
async fn get_order(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order = load_order(conn, id).await?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Get order successfully"),
    })
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdminUpdateOrder {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    /// `null` clears the notes.
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}

impl AdminUpdateOrder {
    fn is_empty(&self) -> bool {
        self.status.is_none() && self.payment_status.is_none() && self.notes.is_none()
    }
}

/// Change an order's status, payment status or notes.
///
/// Moving the payment status to `paid` emails the customer.
#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Order ID to update")
    ),
    request_body = AdminUpdateOrder,
    responses(
        (status = 200, description = "Updated order successfully", body = StdResponse<OrderEntity, String>),
        (status = 400, description = "No changes supplied", body = StdResponse<(), String>),
        (status = 404, description = "Order not found", body = StdResponse<(), String>),
        (status = 409, description = "Notes changed on a paid order", body = StdResponse<(), String>)
    )
)]
async fn update_order(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<AdminUpdateOrder>,
) -> Result<impl IntoResponse, AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest("No changes supplied".into()));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let notes = body
        .notes
        .map(|notes| notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()));

    let order = apply_order_change(
        conn,
        &state,
        id,
        Actor::Admin,
        OrderChange {
            status: body.status,
            payment_status: body.payment_status,
            notes,
        },
    )
    .await?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Updated order successfully"),
    })
}

/// Delete an order and its items.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Order ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted order successfully", body = StdResponse<OrderEntity, String>),
        (status = 404, description = "Order not found", body = StdResponse<(), String>)
    )
)]
async fn delete_order(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order: OrderEntity = diesel::delete(orders::table.find(id))
        .returning(OrderEntity::as_returning())
        .get_result(conn)
        .await?;

    info!("Order #{} has been deleted", order.order_number);

    Ok(StdResponse {
        data: Some(order),
        message: Some("Deleted order successfully"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_update_order_body() {
        let body: AdminUpdateOrder =
            serde_json::from_str(r#"{"paymentStatus":"paid","notes":null}"#).expect("valid");
        assert_eq!(body.payment_status, Some(PaymentStatus::Paid));
        assert_eq!(body.notes, Some(None));
        assert!(!body.is_empty());

        let empty: AdminUpdateOrder = serde_json::from_str("{}").expect("valid");
        assert!(empty.is_empty());

        assert!(serde_json::from_str::<AdminUpdateOrder>(r#"{"total":1}"#).is_err());
        assert!(serde_json::from_str::<AdminUpdateOrder>(r#"{"status":"shipped"}"#).is_err());
    }
}
