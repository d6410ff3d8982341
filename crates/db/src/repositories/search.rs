//! Full-text search repository.
//!
//! Queries the trigger-maintained `search_vector` columns with `to_tsquery`
//! and ranks with `ts_rank`. Database failures degrade to empty results
//! with a log entry; search never surfaces an error to the caller.

use chrono::{DateTime, FixedOffset};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, DbErr, Statement};
use serde::Serialize;
use tracing::error;

use deciframe_core::code::CodedEntity;
use deciframe_core::search::{prepare_query, SearchScope};

/// One ranked search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// `problem`, `case`, or `project`.
    pub entity_type: &'static str,
    /// Numeric id.
    pub id: i32,
    /// Display code (Pnnnn / BCnnnn / PRJnnnn).
    pub code: String,
    /// Title or name.
    pub title: String,
    /// Current status.
    pub status: String,
    /// Creation time, the rank tiebreaker.
    pub created_at: DateTime<FixedOffset>,
    /// `ts_rank` score.
    pub rank: f32,
    /// Entity-specific extras (priority, case type, and the like).
    pub extra: serde_json::Value,
}

/// Indexed fraction per entity type.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SearchStats {
    /// Total problems and how many carry a vector.
    pub problems: (u64, u64),
    /// Total cases and how many carry a vector.
    pub cases: (u64, u64),
    /// Total projects and how many carry a vector.
    pub projects: (u64, u64),
}

/// Search repository.
#[derive(Debug, Clone)]
pub struct SearchRepository {
    db: DatabaseConnection,
}

const PROBLEMS_QUERY: &str = r"
SELECT id, title, status, priority, created_at,
       ts_rank(search_vector, to_tsquery('english', $1)) AS rank
FROM problems
WHERE organization_id = $2
  AND search_vector @@ to_tsquery('english', $1)
ORDER BY rank DESC, created_at DESC
LIMIT $3
";

const CASES_QUERY: &str = r"
SELECT id, title, status, case_type, created_at,
       ts_rank(search_vector, to_tsquery('english', $1)) AS rank
FROM business_cases
WHERE organization_id = $2
  AND search_vector @@ to_tsquery('english', $1)
ORDER BY rank DESC, created_at DESC
LIMIT $3
";

const PROJECTS_QUERY: &str = r"
SELECT id, name, status, priority, created_at,
       ts_rank(search_vector, to_tsquery('english', $1)) AS rank
FROM projects
WHERE organization_id = $2
  AND search_vector @@ to_tsquery('english', $1)
ORDER BY rank DESC, created_at DESC
LIMIT $3
";

const SUGGESTIONS_QUERY: &str = r"
SELECT title FROM (
    SELECT title, created_at FROM problems
    WHERE organization_id = $2 AND title ILIKE $1
    UNION ALL
    SELECT title, created_at FROM business_cases
    WHERE organization_id = $2 AND title ILIKE $1
    UNION ALL
    SELECT name AS title, created_at FROM projects
    WHERE organization_id = $2 AND name ILIKE $1
) suggestions
ORDER BY created_at DESC
LIMIT $3
";

const STATS_QUERY: &str = r"
SELECT
    (SELECT COUNT(*) FROM problems WHERE organization_id = $1) AS problems_total,
    (SELECT COUNT(*) FROM problems
        WHERE organization_id = $1 AND search_vector IS NOT NULL) AS problems_indexed,
    (SELECT COUNT(*) FROM business_cases WHERE organization_id = $1) AS cases_total,
    (SELECT COUNT(*) FROM business_cases
        WHERE organization_id = $1 AND search_vector IS NOT NULL) AS cases_indexed,
    (SELECT COUNT(*) FROM projects WHERE organization_id = $1) AS projects_total,
    (SELECT COUNT(*) FROM projects
        WHERE organization_id = $1 AND search_vector IS NOT NULL) AS projects_indexed
";

impl SearchRepository {
    /// Creates a new search repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Runs a ranked search.
    ///
    /// Empty or all-punctuation input yields an empty list. In `all` scope
    /// the cap is split across the three entity types and the merged list
    /// is re-sorted by rank.
    pub async fn search(
        &self,
        organization_id: i32,
        raw_query: &str,
        scope: SearchScope,
        limit: u64,
    ) -> Vec<SearchHit> {
        if limit == 0 {
            return Vec::new();
        }
        let Some(tsquery) = prepare_query(raw_query) else {
            return Vec::new();
        };
        let per_type = scope.per_type_limit(limit).max(1);

        let result = self
            .run_scoped(organization_id, &tsquery, scope, per_type)
            .await;
        match result {
            Ok(mut hits) => {
                hits.sort_by(|a, b| {
                    b.rank
                        .partial_cmp(&a.rank)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| b.created_at.cmp(&a.created_at))
                });
                hits.truncate(limit as usize);
                hits
            }
            Err(e) => {
                error!(error = %e, "search query failed; returning empty results");
                Vec::new()
            }
        }
    }

    /// Prefix suggestions against titles and names across all three types.
    pub async fn suggestions(
        &self,
        organization_id: i32,
        prefix: &str,
        limit: u64,
    ) -> Vec<String> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Vec::new();
        }
        let pattern = format!("{}%", prefix.replace(['%', '_'], ""));

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            SUGGESTIONS_QUERY,
            [
                pattern.into(),
                organization_id.into(),
                i64::try_from(limit).unwrap_or(10).into(),
            ],
        );
        match self.db.query_all(stmt).await {
            Ok(rows) => rows
                .iter()
                .filter_map(|row| row.try_get::<String>("", "title").ok())
                .collect(),
            Err(e) => {
                error!(error = %e, "suggestion query failed; returning empty results");
                Vec::new()
            }
        }
    }

    /// Indexed-fraction statistics per entity type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn stats(&self, organization_id: i32) -> Result<SearchStats, DbErr> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            STATS_QUERY,
            [organization_id.into()],
        );
        let Some(row) = self.db.query_one(stmt).await? else {
            return Ok(SearchStats::default());
        };

        let count = |column: &str| -> u64 {
            row.try_get::<i64>("", column)
                .ok()
                .and_then(|v| u64::try_from(v).ok())
                .unwrap_or(0)
        };
        Ok(SearchStats {
            problems: (count("problems_total"), count("problems_indexed")),
            cases: (count("cases_total"), count("cases_indexed")),
            projects: (count("projects_total"), count("projects_indexed")),
        })
    }

    async fn run_scoped(
        &self,
        organization_id: i32,
        tsquery: &str,
        scope: SearchScope,
        per_type: u64,
    ) -> Result<Vec<SearchHit>, DbErr> {
        let mut hits = Vec::new();
        if matches!(scope, SearchScope::Problems | SearchScope::All) {
            hits.extend(
                self.run_typed(organization_id, tsquery, per_type, EntityQuery::Problems)
                    .await?,
            );
        }
        if matches!(scope, SearchScope::Cases | SearchScope::All) {
            hits.extend(
                self.run_typed(organization_id, tsquery, per_type, EntityQuery::Cases)
                    .await?,
            );
        }
        if matches!(scope, SearchScope::Projects | SearchScope::All) {
            hits.extend(
                self.run_typed(organization_id, tsquery, per_type, EntityQuery::Projects)
                    .await?,
            );
        }
        Ok(hits)
    }

    async fn run_typed(
        &self,
        organization_id: i32,
        tsquery: &str,
        limit: u64,
        query: EntityQuery,
    ) -> Result<Vec<SearchHit>, DbErr> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            query.sql(),
            [
                tsquery.into(),
                organization_id.into(),
                i64::try_from(limit).unwrap_or(1).into(),
            ],
        );
        let rows = self.db.query_all(stmt).await?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i32 = row.try_get("", "id")?;
            let title: String = row.try_get("", query.title_column())?;
            let status: String = row.try_get("", "status")?;
            let created_at: DateTime<FixedOffset> = row.try_get("", "created_at")?;
            let rank: f32 = row.try_get("", "rank")?;
            let extra_value: String = row.try_get("", query.extra_column())?;

            hits.push(SearchHit {
                entity_type: query.entity_type(),
                id,
                code: query.coded().code(id),
                title,
                status,
                created_at,
                rank,
                extra: serde_json::json!({ query.extra_column(): extra_value }),
            });
        }
        Ok(hits)
    }
}

#[derive(Clone, Copy)]
enum EntityQuery {
    Problems,
    Cases,
    Projects,
}

impl EntityQuery {
    const fn sql(self) -> &'static str {
        match self {
            Self::Problems => PROBLEMS_QUERY,
            Self::Cases => CASES_QUERY,
            Self::Projects => PROJECTS_QUERY,
        }
    }

    const fn entity_type(self) -> &'static str {
        match self {
            Self::Problems => "problem",
            Self::Cases => "case",
            Self::Projects => "project",
        }
    }

    const fn coded(self) -> CodedEntity {
        match self {
            Self::Problems => CodedEntity::Problem,
            Self::Cases => CodedEntity::BusinessCase,
            Self::Projects => CodedEntity::Project,
        }
    }

    const fn title_column(self) -> &'static str {
        match self {
            Self::Projects => "name",
            _ => "title",
        }
    }

    const fn extra_column(self) -> &'static str {
        match self {
            Self::Cases => "case_type",
            _ => "priority",
        }
    }
}
