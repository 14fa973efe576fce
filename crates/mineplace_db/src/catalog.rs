//! Catalog listing queries.
//!
//! One listing query and one count query are built from the same
//! [`CatalogQuery`]; both share the filter predicates produced by
//! [`push_filters`], so `total_count` always describes the full filtered set
//! while the listing only returns the requested window.

use mineplace_core::prelude::*;
use sqlx::{QueryBuilder, Sqlite};

use crate::db::Database;

/// Searchable columns and their relevance weights.
const WEIGHTED_COLUMNS: [(&str, i64); 3] = [
    ("name", NAME_WEIGHT),
    ("short_description", SHORT_DESCRIPTION_WEIGHT),
    ("description", DESCRIPTION_WEIGHT),
];

fn sort_expression(field: SortField) -> &'static str {
    match field {
        SortField::Name => "a.name_folded",
        SortField::PublishDate => "a.publish_date",
        SortField::UpdateDate => "a.update_date",
        SortField::Downloads => "a.downloads",
        SortField::LikesCount => "likes_count",
        SortField::Relevance => "relevance_score",
    }
}

/// `instr` keeps the terms literal: `%` and `_` inside a search are not wildcards.
/// Terms are already folded, so they are compared with the folded column.
fn push_term_match<'a>(builder: &mut QueryBuilder<'a, Sqlite>, column: &str, term: &'a str) {
    builder
        .push(format_args!("instr(a.{column}_folded, "))
        .push_bind(term)
        .push(") > 0");
}

fn push_relevance<'a>(builder: &mut QueryBuilder<'a, Sqlite>, terms: &'a [String]) {
    if terms.is_empty() {
        builder.push("NULL");
        return;
    }

    builder.push("(");
    let mut first = true;
    for term in terms {
        for (column, weight) in WEIGHTED_COLUMNS {
            if !first {
                builder.push(" + ");
            }
            first = false;
            builder.push("(CASE WHEN ");
            push_term_match(builder, column, term);
            builder.push(format_args!(" THEN {weight} ELSE 0 END)"));
        }
    }
    builder.push(")");
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Sqlite>, query: &'a CatalogQuery) {
    builder.push(" WHERE 1 = 1");

    if let Some(addon_type) = query.addon_type {
        builder.push(" AND a.addon_type = ").push_bind(addon_type);
    }
    if let Some(owner) = query.owner {
        builder.push(" AND a.user_id = ").push_bind(owner);
    }
    if let Some(user) = query.liked_by {
        builder
            .push(" AND EXISTS (SELECT 1 FROM user_likes ul WHERE ul.addon_id = a.id AND ul.user_id = ")
            .push_bind(user)
            .push(")");
    }

    if query.is_search() {
        builder.push(" AND (");
        let mut first = true;
        for term in query.terms() {
            for (column, _) in WEIGHTED_COLUMNS {
                if !first {
                    builder.push(" OR ");
                }
                first = false;
                push_term_match(builder, column, term);
            }
        }
        builder.push(")");
    }
}

impl Database {
    /// Filtered, scored, sorted and paginated add-on listing.
    pub async fn list_addons(&self, query: &CatalogQuery) -> MarketResult<Page<AddOnListing>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM addons a");
        push_filters(&mut count, query);
        let total_count: i64 = count.build_query_scalar().fetch_one(self.pool()).await?;

        let mut listing = QueryBuilder::<Sqlite>::new(
            "SELECT a.*, u.username, COUNT(l.id) AS likes_count, ",
        );
        push_relevance(&mut listing, query.terms());
        listing.push(
            " AS relevance_score FROM addons a \
             JOIN users u ON u.id = a.user_id \
             LEFT JOIN user_likes l ON l.addon_id = a.id",
        );
        push_filters(&mut listing, query);
        listing.push(" GROUP BY a.id");

        // ties: newest first, then id so page windows never overlap
        listing.push(format_args!(
            " ORDER BY {} {}, a.publish_date DESC, a.id ASC",
            sort_expression(query.sort_field),
            query.sort_order.as_sql()
        ));
        listing
            .push(" LIMIT ")
            .push_bind(query.pagination.limit())
            .push(" OFFSET ")
            .push_bind(query.pagination.offset());

        let items = listing
            .build_query_as::<AddOnListing>()
            .fetch_all(self.pool())
            .await?;

        Ok(Page {
            items,
            total_count,
            page: query.pagination.page(),
            per_page: query.pagination.per_page(),
        })
    }
}
