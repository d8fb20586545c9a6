use anyhow::Context;
use axum::{extract::State, response::IntoResponse};
use chrono::{DateTime, Utc};
use diesel::{ExpressionMethods, QueryDsl};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    domain::donation::SevaOption,
    models::{DonationSettingsEntity, SiteSettingsChangeset, SiteSettingsEntity},
    schema::{donation_settings, site_settings},
};

/// Both settings tables hold a single row with this id.
pub const SETTINGS_ID: &str = "default";

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new()
        .nest(
            "/settings",
            OpenApiRouter::new().routes(utoipa_axum::routes!(get_site_settings)),
        )
        .nest(
            "/donation-settings",
            OpenApiRouter::new().routes(utoipa_axum::routes!(get_donation_settings)),
        )
}

/// Values the home page hero starts with before anyone edits them.
pub fn default_site_settings() -> SiteSettingsChangeset {
    SiteSettingsChangeset {
        hero_title: Some("Welcome to Vrindavan Ras Desh".into()),
        hero_subtitle: Some(
            "Immerse yourself in the eternal divine love and spiritual bliss of Shri Vrindavan Dham."
                .into(),
        ),
        hero_image_url: Some(
            "https://images.unsplash.com/photo-1561583669-7c875954d72d?q=80&w=1920&auto=format&fit=crop"
                .into(),
        ),
        ..Default::default()
    }
}

/// Fetch the site-wide CMS settings, creating the defaults on first read.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Settings"],
    responses(
        (status = 200, description = "Get site settings successfully", body = StdResponse<SiteSettingsEntity, String>)
    )
)]
async fn get_site_settings(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    diesel::insert_into(site_settings::table)
        .values((site_settings::id.eq(SETTINGS_ID), default_site_settings()))
        .on_conflict_do_nothing()
        .execute(conn)
        .await
        .context("Failed to create default site settings")?;

    let settings: SiteSettingsEntity = site_settings::table
        .find(SETTINGS_ID)
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(settings),
        message: Some("Get site settings successfully"),
    })
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DonationSettingsRes {
    pub donation_page_url: Option<String>,
    pub sewa_options: Vec<SevaOption>,
    pub page_title: String,
    pub page_subtitle: Option<String>,
    pub page_description: Option<String>,
    pub hero_image: Option<String>,
    pub is_enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DonationSettingsEntity> for DonationSettingsRes {
    type Error = anyhow::Error;

    fn try_from(entity: DonationSettingsEntity) -> Result<Self, Self::Error> {
        let sewa_options: Vec<SevaOption> = serde_json::from_value(entity.sewa_options)
            .context("Stored seva options are malformed")?;

        Ok(Self {
            donation_page_url: entity.donation_page_url,
            sewa_options,
            page_title: entity.page_title,
            page_subtitle: entity.page_subtitle,
            page_description: entity.page_description,
            hero_image: entity.hero_image,
            is_enabled: entity.is_enabled,
            updated_at: entity.updated_at,
        })
    }
}

/// Fetch the donation page configuration.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Settings"],
    responses(
        (status = 200, description = "Get donation settings successfully", body = StdResponse<DonationSettingsRes, String>),
        (status = 404, description = "Donation settings not found", body = StdResponse<(), String>)
    )
)]
async fn get_donation_settings(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let settings = load_donation_settings(conn).await?;

    Ok(StdResponse {
        data: Some(settings),
        message: Some("Get donation settings successfully"),
    })
}

pub(crate) async fn load_donation_settings(
    conn: &mut AsyncPgConnection,
) -> Result<DonationSettingsRes, AppError> {
    let entity: DonationSettingsEntity = donation_settings::table
        .find(SETTINGS_ID)
        .get_result(conn)
        .await?;

    Ok(DonationSettingsRes::try_from(entity)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(sewa_options: serde_json::Value) -> DonationSettingsEntity {
        DonationSettingsEntity {
            id: SETTINGS_ID.into(),
            donation_page_url: None,
            sewa_options,
            page_title: "Support Our Seva".into(),
            page_subtitle: None,
            page_description: None,
            hero_image: None,
            is_enabled: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_donation_settings_res_decodes_stored_options() {
        let res = DonationSettingsRes::try_from(entity(json!([
            {"id": "bhog-sewa", "title": "Bhog Sewa", "description": "Offer special bhog", "amount": 1100, "icon": "🌺", "image": "", "isActive": true}
        ])))
        .expect("valid options");

        assert_eq!(res.sewa_options.len(), 1);
        assert_eq!(res.sewa_options[0].amount, 1100.0);

        let json = serde_json::to_value(&res).expect("serializable");
        assert_eq!(json["pageTitle"], "Support Our Seva");
        assert_eq!(json["sewaOptions"][0]["isActive"], true);
    }

    #[test]
    fn test_donation_settings_res_rejects_malformed_options() {
        assert!(DonationSettingsRes::try_from(entity(json!({"not": "a list"}))).is_err());
    }

    #[test]
    fn test_default_site_settings() {
        let defaults = default_site_settings();
        assert_eq!(
            defaults.hero_title.as_deref(),
            Some("Welcome to Vrindavan Ras Desh")
        );
        assert!(defaults.contact_email.is_none());
    }
}
