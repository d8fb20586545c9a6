use anyhow::Context;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    domain::{
        checkout::{self, CheckoutRequest},
        order_number::generate_order_number,
        payment::{Actor, OrderStatus, PaymentEffect, PaymentStatus},
    },
    events::{OrderEvent, OrderSnapshot},
    models::{
        CreateOrderEntity, CreateOrderItemEntity, OrderEntity, OrderItemEntity, UpdateOrderEntity,
    },
    routes::catalog::fetch_products,
    schema::{order_items, orders},
};

/// Public order routes used by the storefront checkout.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_order))
            .routes(utoipa_axum::routes!(get_order))
            .routes(utoipa_axum::routes!(confirm_payment)),
    )
}

#[derive(Serialize, ToSchema)]
pub struct GetOrderRes {
    pub order: OrderEntity,
    pub items: Vec<OrderItemEntity>,
}

/// Place an order from the checkout form.
///
/// Prices come from the catalog; totals in the request, if any, are ignored.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Orders"],
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Created order successfully", body = StdResponse<GetOrderRes, String>),
        (status = 400, description = "Missing fields, empty cart or unavailable products", body = StdResponse<(), String>)
    )
)]
async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    let checkout = body.validate()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let product_ids: Vec<Uuid> = checkout.items.iter().map(|item| item.product_id).collect();
    let catalog = fetch_products(conn, &product_ids).await?;
    let cart = checkout::build_cart(&checkout.items, &catalog)?;
    let pricing = cart.pricing();
    let order_number = generate_order_number();

    let (order, items) = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let contact = checkout.contact;
                let order = diesel::insert_into(orders::table)
                    .values(CreateOrderEntity {
                        order_number,
                        customer_name: contact.name,
                        customer_email: contact.email,
                        customer_phone: contact.phone,
                        shipping_address: contact.address,
                        shipping_city: contact.city,
                        shipping_state: contact.state,
                        shipping_pincode: contact.pincode,
                        subtotal: pricing.subtotal,
                        tax: pricing.tax,
                        shipping: pricing.shipping,
                        total: pricing.grand_total,
                        notes: checkout.notes,
                        status: OrderStatus::Pending.as_str().into(),
                        payment_status: PaymentStatus::Pending.as_str().into(),
                    })
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await?;

                let new_items: Vec<CreateOrderItemEntity> = cart
                    .lines()
                    .iter()
                    .map(|line| CreateOrderItemEntity {
                        order_id: order.id,
                        product_id: line.product_id,
                        product_name: line.name.clone(),
                        quantity: line.quantity,
                        price: line.price,
                        total: line.line_total(),
                    })
                    .collect();

                let items = diesel::insert_into(order_items::table)
                    .values(new_items)
                    .returning(OrderItemEntity::as_returning())
                    .get_results(conn)
                    .await?;

                Ok::<(OrderEntity, Vec<OrderItemEntity>), AppError>((order, items))
            })
        })
        .await?;

    info!(
        "Order #{} has been created with total {}",
        order.order_number, order.total
    );
    state
        .events
        .publish(OrderEvent::OrderReceived(OrderSnapshot::from(&order)));

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(GetOrderRes { order, items }),
            message: Some("Created order successfully"),
        },
    ))
}

/// Fetch an order with its items, e.g. for the order confirmation page.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Orders"],
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

/// The only payment status a customer may set.
#[derive(Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CustomerPaymentStatus {
    PendingVerification,
}

impl From<CustomerPaymentStatus> for PaymentStatus {
    fn from(status: CustomerPaymentStatus) -> Self {
        match status {
            CustomerPaymentStatus::PendingVerification => PaymentStatus::PendingVerification,
        }
    }
}

/// Body of the "I Have Paid" button. Exactly `{"paymentStatus": "pending_verification"}`.
#[derive(Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CustomerConfirmPayment {
    pub payment_status: CustomerPaymentStatus,
}

/// Customer asserts that the QR / UPI payment was made.
#[utoipa::path(
    post,
    path = "/{id}/confirm-payment",
    tags = ["Orders"],
    params(
        ("id" = Uuid, Path, description = "Order ID the payment was made for")
    ),
    request_body = CustomerConfirmPayment,
    responses(
        (status = 200, description = "Payment confirmation received", body = StdResponse<OrderEntity, String>),
        (status = 404, description = "Order not found", body = StdResponse<(), String>),
        (status = 409, description = "Order has already been paid", body = StdResponse<(), String>)
    )
)]
async fn confirm_payment(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<CustomerConfirmPayment>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order = apply_order_change(
        conn,
        &state,
        id,
        Actor::Customer,
        OrderChange {
            payment_status: Some(body.payment_status.into()),
            ..Default::default()
        },
    )
    .await?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Payment confirmation received"),
    })
}

pub(crate) async fn load_order(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<GetOrderRes, AppError> {
    let order: OrderEntity = orders::table.find(id).get_result(conn).await?;

    let items: Vec<OrderItemEntity> = order_items::table
        .filter(order_items::order_id.eq(order.id))
        .order_by(order_items::created_at.asc())
        .get_results(conn)
        .await
        .context("Failed to get order items")?;

    Ok(GetOrderRes { order, items })
}

/// A requested change to an order's mutable fields.
#[derive(Debug, Default)]
pub(crate) struct OrderChange {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<Option<String>>,
}

/// Locks the order row, runs the payment status machine, writes the result and
/// publishes whatever notification the transition asks for.
pub(crate) async fn apply_order_change(
    conn: &mut AsyncPgConnection,
    state: &AppState,
    id: Uuid,
    actor: Actor,
    change: OrderChange,
) -> Result<OrderEntity, AppError> {
    let (order, effect) = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let current: OrderEntity = orders::table
                    .find(id)
                    .for_update()
                    .get_result(conn)
                    .await?;
                let current_payment: PaymentStatus = current
                    .payment_status
                    .parse()
                    .context("Stored payment status is invalid")?;

                let mut update = UpdateOrderEntity::default();
                let mut effect = None;

                if let Some(target) = change.payment_status {
                    let transition = current_payment
                        .transition(actor, target)
                        .inspect_err(|err| {
                            warn!(
                                "Order #{} payment status change rejected: {}",
                                current.order_number, err
                            )
                        })?;
                    if transition.is_change_from(current_payment) {
                        update.payment_status = Some(transition.next.as_str().into());
                    }
                    effect = transition.effect;
                }

                if let Some(status) = change.status {
                    if status.as_str() != current.status {
                        update.status = Some(status.as_str().into());
                    }
                }

                if let Some(notes) = change.notes {
                    if !current_payment.allows_detail_edits() {
                        return Err(AppError::Conflict(
                            "Order details cannot change once the order is paid".into(),
                        ));
                    }
                    update.notes = Some(notes);
                }

                if update.is_noop() {
                    return Ok::<(OrderEntity, Option<PaymentEffect>), AppError>((current, None));
                }

                let updated = diesel::update(orders::table.find(id))
                    .set((&update, orders::updated_at.eq(diesel::dsl::now)))
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await?;

                Ok((updated, effect))
            })
        })
        .await?;

    if let Some(effect) = effect {
        state
            .events
            .publish(OrderEvent::for_effect(effect, OrderSnapshot::from(&order)));
    }

    info!(
        "Order #{} is now {} / {}",
        order.order_number, order.status, order.payment_status
    );

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_confirm_payment_accepts_only_pending_verification() {
        let body: CustomerConfirmPayment =
            serde_json::from_str(r#"{"paymentStatus":"pending_verification"}"#)
                .expect("accepted");
        assert_eq!(
            PaymentStatus::from(body.payment_status),
            PaymentStatus::PendingVerification
        );

        for rejected in [
            r#"{"paymentStatus":"paid"}"#,
            r#"{"paymentStatus":"pending"}"#,
            r#"{"paymentStatus":"pending_verification","status":"completed"}"#,
            r#"{"paymentStatus":"pending_verification","total":1}"#,
            r#"{}"#,
        ] {
            assert!(
                serde_json::from_str::<CustomerConfirmPayment>(rejected).is_err(),
                "{rejected} should be rejected"
            );
        }
    }
}
