use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{AsChangeset, Identifiable, Insertable, Queryable},
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

// Categories

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct CategoryEntity {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::categories)]
pub struct CreateCategoryEntity {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = crate::schema::categories)]
pub struct UpdateCategoryEntity {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub image: Option<Option<String>>,
}

// Products

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct ProductEntity {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: f64,
    pub compare_at_price: Option<f64>,
    pub images: Vec<String>,
    pub category_id: Uuid,
    pub stock: i32,
    pub is_active: bool,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::products)]
pub struct CreateProductEntity {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: f64,
    pub compare_at_price: Option<f64>,
    pub images: Vec<String>,
    pub category_id: Uuid,
    pub stock: i32,
    pub is_active: bool,
    pub featured: bool,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = crate::schema::products)]
pub struct UpdateProductEntity {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub compare_at_price: Option<Option<f64>>,
    pub images: Option<Vec<String>>,
    pub category_id: Option<Uuid>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub featured: Option<bool>,
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct OrderEntity {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_pincode: String,
    pub subtotal: f64,
    pub tax: f64,
    pub shipping: f64,
    pub total: f64,
    pub notes: Option<String>,
    pub status: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderEntity {
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_pincode: String,
    pub subtotal: f64,
    pub tax: f64,
    pub shipping: f64,
    pub total: f64,
    pub notes: Option<String>,
    pub status: String,
    pub payment_status: String,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = crate::schema::orders)]
pub struct UpdateOrderEntity {
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub notes: Option<Option<String>>,
}

impl UpdateOrderEntity {
    pub fn is_noop(&self) -> bool {
        self.status.is_none() && self.payment_status.is_none() && self.notes.is_none()
    }
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct OrderItemEntity {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price: f64,
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::order_items)]
pub struct CreateOrderItemEntity {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price: f64,
    pub total: f64,
}

// Settings

#[derive(Queryable, Selectable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::site_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct SiteSettingsEntity {
    pub id: String,
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub hero_image_url: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub instagram_url: Option<String>,
    pub youtube_url: Option<String>,
    #[serde(rename = "videoUrl1")]
    pub video_url_1: Option<String>,
    #[serde(rename = "videoUrl2")]
    pub video_url_2: Option<String>,
    #[serde(rename = "videoUrl3")]
    pub video_url_3: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Both the insert and the update half of the site settings upsert.
#[derive(Insertable, AsChangeset, Deserialize, Debug, Default, ToSchema)]
#[diesel(table_name = crate::schema::site_settings)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SiteSettingsChangeset {
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub hero_image_url: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub instagram_url: Option<String>,
    pub youtube_url: Option<String>,
    #[serde(rename = "videoUrl1")]
    pub video_url_1: Option<String>,
    #[serde(rename = "videoUrl2")]
    pub video_url_2: Option<String>,
    #[serde(rename = "videoUrl3")]
    pub video_url_3: Option<String>,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::donation_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DonationSettingsEntity {
    pub id: String,
    pub donation_page_url: Option<String>,
    pub sewa_options: Value,
    pub page_title: String,
    pub page_subtitle: Option<String>,
    pub page_description: Option<String>,
    pub hero_image: Option<String>,
    pub is_enabled: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = crate::schema::donation_settings)]
pub struct UpdateDonationSettingsEntity {
    pub donation_page_url: Option<Option<String>>,
    pub sewa_options: Option<Value>,
    pub page_title: Option<String>,
    pub page_subtitle: Option<Option<String>>,
    pub page_description: Option<Option<String>>,
    pub hero_image: Option<Option<String>>,
    pub is_enabled: Option<bool>,
}

// Content

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct PostEntity {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub published: bool,
    pub author_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = crate::schema::posts)]
pub struct CreatePostEntity {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub published: bool,
    pub author_name: Option<String>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct EventEntity {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = crate::schema::events)]
pub struct CreateEventEntity {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub is_active: bool,
}

#[derive(AsChangeset, Debug, Default, PartialEq)]
#[diesel(table_name = crate::schema::events)]
pub struct UpdateEventEntity {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
    pub link: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl UpdateEventEntity {
    pub fn is_noop(&self) -> bool {
        self == &Self::default()
    }
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`)
/// when used with `#[serde(default, deserialize_with = "deserialize_some")]`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "deserialize_some")]
        compare_at_price: Option<Option<f64>>,
    }

    #[test]
    fn test_deserialize_some_distinguishes_null_from_missing() {
        let missing: Patch = serde_json::from_str("{}").expect("valid json");
        assert_eq!(missing.compare_at_price, None);

        let null: Patch = serde_json::from_str(r#"{"compare_at_price":null}"#).expect("valid json");
        assert_eq!(null.compare_at_price, Some(None));

        let set: Patch = serde_json::from_str(r#"{"compare_at_price":120.0}"#).expect("valid json");
        assert_eq!(set.compare_at_price, Some(Some(120.0)));
    }

    #[test]
    fn test_site_settings_changeset_rejects_unknown_fields() {
        let result = serde_json::from_str::<SiteSettingsChangeset>(r#"{"id":"other"}"#);
        assert!(result.is_err());

        let changes: SiteSettingsChangeset =
            serde_json::from_str(r#"{"heroTitle":"Radhe Radhe","videoUrl2":"https://v"}"#)
                .expect("valid json");
        assert_eq!(changes.hero_title.as_deref(), Some("Radhe Radhe"));
        assert_eq!(changes.video_url_2.as_deref(), Some("https://v"));
    }
}
