//! Catalog query parameters and relevance scoring.
//!
//! A search string is split into lower-cased terms. Every term is checked
//! against three fields with fixed weights: name (3), short description (2)
//! and description (1). A row's relevance is the sum of the weights of all
//! `(term, field)` pairs that match; rows where no term matches any field
//! are not part of the result at all.
//!
//! Case is folded with [`fold_case`] on both sides. The store keeps a folded
//! copy of every searchable column and matches terms against that copy.
//!
//! The store evaluates the same rules in SQL; [`relevance_score`] is the
//! reference used to document and test them.

use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::MarketError;
use crate::model::AddOnType;

pub const NAME_WEIGHT: i64 = 3;
pub const SHORT_DESCRIPTION_WEIGHT: i64 = 2;
pub const DESCRIPTION_WEIGHT: i64 = 1;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

/// Columns a catalog listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Name,
    PublishDate,
    UpdateDate,
    #[default]
    Downloads,
    LikesCount,
    /// Only valid together with a search string.
    Relevance,
}

impl SortField {
    pub const ALL: [SortField; 6] = [
        SortField::Name,
        SortField::PublishDate,
        SortField::UpdateDate,
        SortField::Downloads,
        SortField::LikesCount,
        SortField::Relevance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::PublishDate => "publish_date",
            SortField::UpdateDate => "update_date",
            SortField::Downloads => "downloads",
            SortField::LikesCount => "likes_count",
            SortField::Relevance => "relevance",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<_> = SortField::ALL.iter().map(|f| f.as_str()).collect();
                MarketError::invalid(format!(
                    "The field '{s}' is not sortable. Available fields: {}",
                    allowed.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(MarketError::invalid(format!(
                "The sort order '{other}' is invalid. Use 'desc' or 'asc'."
            ))),
        }
    }
}

/// Page window, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, per_page: u32) -> Result<Self, MarketError> {
        if page < 1 {
            return Err(MarketError::invalid("page must be greater than or equal to 1"));
        }
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(MarketError::invalid(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}"
            )));
        }
        Ok(Self { page, per_page })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

/// Unicode lower-casing used for every case-insensitive comparison.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Lower-cases `search` and splits it on whitespace. Returns an empty list for blank input.
pub fn search_terms(search: &str) -> Vec<String> {
    fold_case(search)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Reference implementation of the relevance rules.
///
/// Returns `None` when the row does not match any term and must be excluded.
pub fn relevance_score(
    terms: &[String],
    name: &str,
    short_description: &str,
    description: &str,
) -> Option<i64> {
    let fields = [
        (fold_case(name), NAME_WEIGHT),
        (fold_case(short_description), SHORT_DESCRIPTION_WEIGHT),
        (fold_case(description), DESCRIPTION_WEIGHT),
    ];

    let mut matched = false;
    let mut score = 0;
    for term in terms {
        for (field, weight) in &fields {
            if field.contains(term.as_str()) {
                matched = true;
                score += weight;
            }
        }
    }
    matched.then_some(score)
}

/// A validated catalog listing request.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    pub pagination: Pagination,
    pub addon_type: Option<AddOnType>,
    pub owner: Option<Uuid>,
    /// Restrict to add-ons liked by this user.
    pub liked_by: Option<Uuid>,
    terms: Vec<String>,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
}

impl CatalogQuery {
    /// Builds a query, rejecting `relevance` ordering when there is nothing to score.
    pub fn new(
        pagination: Pagination,
        search: Option<&str>,
        sort_field: SortField,
        sort_order: SortOrder,
    ) -> Result<Self, MarketError> {
        let terms = search.map(search_terms).unwrap_or_default();
        if sort_field == SortField::Relevance && terms.is_empty() {
            return Err(MarketError::invalid(
                "Sorting by relevance is only allowed with a search query.",
            ));
        }
        Ok(Self {
            pagination,
            terms,
            sort_field,
            sort_order,
            ..Default::default()
        })
    }

    pub fn with_type(mut self, addon_type: Option<AddOnType>) -> Self {
        self.addon_type = addon_type;
        self
    }

    pub fn with_owner(mut self, owner: Option<Uuid>) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_liked_by(mut self, user: Option<Uuid>) -> Self {
        self.liked_by = user;
        self
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_search(&self) -> bool {
        !self.terms.is_empty()
    }
}
