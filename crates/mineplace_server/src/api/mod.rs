//! HTTP handlers, grouped by resource.

use crate::error::ApiError;
use axum::extract::{FromRequest, FromRequestParts};
use mineplace_core::prelude::*;
use serde::Deserialize;

pub mod addons;
pub mod files;
pub mod likes;
pub mod users;
pub mod versions;

/// [`axum::Json`] with `{"detail": ...}` rejections.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// [`axum::extract::Path`] with `{"detail": ...}` rejections.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// [`axum::extract::Query`] with `{"detail": ...}` rejections.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Query string of every catalog listing.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    #[serde(rename = "type")]
    pub addon_type: Option<String>,
    pub user_uuid: Option<uuid::Uuid>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl CatalogParams {
    fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Rejects a non-blank search shorter than `min` characters.
    pub fn require_search_len(self, min: usize) -> Result<Self, MarketError> {
        if self.search().is_some_and(|search| search.chars().count() < min) {
            return Err(MarketError::invalid(format!(
                "search must be at least {min} characters long"
            )));
        }
        Ok(self)
    }

    /// Validates the raw parameters. `default_sort` applies when `sort_by` is absent.
    pub fn into_query(self, default_sort: SortField) -> Result<CatalogQuery, MarketError> {
        let pagination = pagination(self.page, self.per_page)?;
        let search = self.search();

        let sort_field = match self.sort_by.as_deref() {
            Some(field) => field.parse::<SortField>()?,
            None => default_sort,
        };
        let sort_order = parse_order(self.sort_order.as_deref())?;
        let addon_type = self
            .addon_type
            .as_deref()
            .map(str::parse::<AddOnType>)
            .transpose()?;

        Ok(CatalogQuery::new(pagination, search, sort_field, sort_order)?
            .with_type(addon_type)
            .with_owner(self.user_uuid))
    }
}

/// Query string of a version listing.
#[derive(Debug, Default, Deserialize)]
pub struct VersionListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort_order: Option<String>,
}

fn pagination(page: Option<u32>, per_page: Option<u32>) -> Result<Pagination, MarketError> {
    Pagination::new(
        page.unwrap_or(DEFAULT_PAGE),
        per_page.unwrap_or(DEFAULT_PER_PAGE),
    )
}

fn parse_order(raw: Option<&str>) -> Result<SortOrder, MarketError> {
    raw.map(str::parse::<SortOrder>).transpose().map(Option::unwrap_or_default)
}
