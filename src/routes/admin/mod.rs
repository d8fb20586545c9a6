//! Back-office routes. Everything under `/admin` requires the admin bearer token.

pub mod categories;
pub mod content;
pub mod orders;
pub mod products;
pub mod settings;
pub mod uploads;

use utoipa_axum::router::OpenApiRouter;

use crate::{app_state::AppState, middleware};

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/admin",
        OpenApiRouter::new()
            .merge(orders::routes_with_openapi())
            .merge(products::routes_with_openapi())
            .merge(categories::routes_with_openapi())
            .merge(settings::routes_with_openapi())
            .merge(content::routes_with_openapi())
            .merge(uploads::routes_with_openapi(state.config.uploads.max_bytes))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::admin_authorization,
            )),
    )
}
