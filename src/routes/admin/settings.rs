use anyhow::Context;
use axum::{Json, extract::State, response::IntoResponse};
use diesel::{ExpressionMethods, QueryDsl};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    domain::donation::{SevaOption, validate_seva_options},
    models::{
        SiteSettingsChangeset, SiteSettingsEntity, UpdateDonationSettingsEntity, deserialize_some,
    },
    routes::settings::{DonationSettingsRes, SETTINGS_ID, load_donation_settings},
    schema::{donation_settings, site_settings},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new()
        .nest(
            "/settings",
            OpenApiRouter::new().routes(utoipa_axum::routes!(update_site_settings)),
        )
        .nest(
            "/donation-settings",
            OpenApiRouter::new().routes(utoipa_axum::routes!(update_donation_settings)),
        )
}

/// Create or partially update the site settings.
#[utoipa::path(
    put,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    request_body = SiteSettingsChangeset,
    responses(
        (status = 200, description = "Updated site settings successfully", body = StdResponse<SiteSettingsEntity, String>)
    )
)]
async fn update_site_settings(
    State(state): State<AppState>,
    Json(body): Json<SiteSettingsChangeset>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let settings: SiteSettingsEntity = diesel::insert_into(site_settings::table)
        .values((site_settings::id.eq(SETTINGS_ID), &body))
        .on_conflict(site_settings::id)
        .do_update()
        .set((&body, site_settings::updated_at.eq(diesel::dsl::now)))
        .get_result(conn)
        .await
        .context("Failed to save site settings")?;

    info!("Site settings have been updated");

    Ok(StdResponse {
        data: Some(settings),
        message: Some("Updated site settings successfully"),
    })
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateDonationSettingsReq {
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub donation_page_url: Option<Option<String>>,
    pub sewa_options: Option<Vec<SevaOption>>,
    pub page_title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub page_subtitle: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub page_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub hero_image: Option<Option<String>>,
    pub is_enabled: Option<bool>,
}

impl UpdateDonationSettingsReq {
    fn into_changeset(self) -> Result<UpdateDonationSettingsEntity, AppError> {
        let mut problems = Vec::new();

        if self
            .page_title
            .as_deref()
            .is_some_and(|title| title.trim().is_empty())
        {
            problems.push("pageTitle cannot be blank".to_string());
        }
        if let Some(options) = &self.sewa_options {
            problems.extend(validate_seva_options(options));
        }
        if !problems.is_empty() {
            return Err(AppError::BadRequest(problems.join("; ")));
        }

        let sewa_options = self
            .sewa_options
            .map(serde_json::to_value)
            .transpose()
            .context("Failed to encode seva options")?;

        Ok(UpdateDonationSettingsEntity {
            donation_page_url: self.donation_page_url,
            sewa_options,
            page_title: self.page_title.map(|title| title.trim().to_string()),
            page_subtitle: self.page_subtitle,
            page_description: self.page_description,
            hero_image: self.hero_image,
            is_enabled: self.is_enabled,
        })
    }
}

/// Update the donation page configuration.
#[utoipa::path(
    put,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    request_body = UpdateDonationSettingsReq,
    responses(
        (status = 200, description = "Updated donation settings successfully", body = StdResponse<DonationSettingsRes, String>),
        (status = 400, description = "Invalid seva options", body = StdResponse<(), String>),
        (status = 404, description = "Donation settings not found", body = StdResponse<(), String>)
    )
)]
async fn update_donation_settings(
    State(state): State<AppState>,
    Json(body): Json<UpdateDonationSettingsReq>,
) -> Result<impl IntoResponse, AppError> {
    let changes = body.into_changeset()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let updated = diesel::update(donation_settings::table.find(SETTINGS_ID))
        .set((&changes, donation_settings::updated_at.eq(diesel::dsl::now)))
        .execute(conn)
        .await
        .context("Failed to save donation settings")?;
    if updated == 0 {
        return Err(AppError::NotFound);
    }

    info!("Donation settings have been updated");
    let settings = load_donation_settings(conn).await?;

    Ok(StdResponse {
        data: Some(settings),
        message: Some("Updated donation settings successfully"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_donation_settings_changeset() {
        let body: UpdateDonationSettingsReq = serde_json::from_str(
            r#"{"heroImage":null,"isEnabled":false,"sewaOptions":[{"id":"bhog-sewa","title":"Bhog Sewa","amount":1100}]}"#,
        )
        .expect("valid");
        let changes = body.into_changeset().expect("valid");

        assert_eq!(changes.hero_image, Some(None));
        assert_eq!(changes.is_enabled, Some(false));
        assert_eq!(changes.page_title, None);
        let options = changes.sewa_options.expect("options set");
        assert_eq!(options[0]["isActive"], true);
        assert_eq!(options[0]["amount"], 1100.0);
    }

    #[test]
    fn test_donation_settings_changeset_rejects_bad_options() {
        let body: UpdateDonationSettingsReq = serde_json::from_str(
            r#"{"pageTitle":" ","sewaOptions":[{"id":"x","title":"X","amount":0}]}"#,
        )
        .expect("valid");

        match body.into_changeset() {
            Err(AppError::BadRequest(message)) => assert_eq!(
                message,
                "pageTitle cannot be blank; Seva option 1 must have a positive amount"
            ),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }
}
