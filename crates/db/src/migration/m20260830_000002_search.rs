//! Full-text search migration.
//!
//! Adds a `search_vector` column, a before-write trigger, and a GIN index
//! to problems, business_cases, and projects. Vectors are maintained only
//! by these triggers; application code never writes them.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(PROBLEMS_SEARCH_SQL).await?;
        db.execute_unprepared(CASES_SEARCH_SQL).await?;
        db.execute_unprepared(PROJECTS_SEARCH_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SEARCH_SQL).await?;
        Ok(())
    }
}

const PROBLEMS_SEARCH_SQL: &str = r"
ALTER TABLE problems ADD COLUMN search_vector tsvector;

CREATE FUNCTION problems_search_vector_update() RETURNS trigger AS $$
BEGIN
    NEW.search_vector :=
        to_tsvector('english',
            COALESCE(NEW.title, '') || ' ' || COALESCE(NEW.description, ''));
    RETURN NEW;
END
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_problems_search_vector
    BEFORE INSERT OR UPDATE ON problems
    FOR EACH ROW EXECUTE FUNCTION problems_search_vector_update();

CREATE INDEX idx_problems_search ON problems USING GIN (search_vector);

UPDATE problems SET search_vector =
    to_tsvector('english', COALESCE(title, '') || ' ' || COALESCE(description, ''));
";

const CASES_SEARCH_SQL: &str = r"
ALTER TABLE business_cases ADD COLUMN search_vector tsvector;

CREATE FUNCTION business_cases_search_vector_update() RETURNS trigger AS $$
BEGIN
    NEW.search_vector :=
        to_tsvector('english',
            COALESCE(NEW.title, '') || ' ' ||
            COALESCE(NEW.description, '') || ' ' ||
            COALESCE(NEW.summary, '') || ' ' ||
            COALESCE(NEW.initiative_name, ''));
    RETURN NEW;
END
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_business_cases_search_vector
    BEFORE INSERT OR UPDATE ON business_cases
    FOR EACH ROW EXECUTE FUNCTION business_cases_search_vector_update();

CREATE INDEX idx_business_cases_search ON business_cases USING GIN (search_vector);

UPDATE business_cases SET search_vector =
    to_tsvector('english',
        COALESCE(title, '') || ' ' || COALESCE(description, '') || ' ' ||
        COALESCE(summary, '') || ' ' || COALESCE(initiative_name, ''));
";

const PROJECTS_SEARCH_SQL: &str = r"
ALTER TABLE projects ADD COLUMN search_vector tsvector;

CREATE FUNCTION projects_search_vector_update() RETURNS trigger AS $$
BEGIN
    NEW.search_vector :=
        to_tsvector('english',
            COALESCE(NEW.name, '') || ' ' || COALESCE(NEW.description, ''));
    RETURN NEW;
END
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_projects_search_vector
    BEFORE INSERT OR UPDATE ON projects
    FOR EACH ROW EXECUTE FUNCTION projects_search_vector_update();

CREATE INDEX idx_projects_search ON projects USING GIN (search_vector);

UPDATE projects SET search_vector =
    to_tsvector('english', COALESCE(name, '') || ' ' || COALESCE(description, ''));
";

const DROP_SEARCH_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_projects_search_vector ON projects;
DROP FUNCTION IF EXISTS projects_search_vector_update();
DROP INDEX IF EXISTS idx_projects_search;
ALTER TABLE projects DROP COLUMN IF EXISTS search_vector;

DROP TRIGGER IF EXISTS trg_business_cases_search_vector ON business_cases;
DROP FUNCTION IF EXISTS business_cases_search_vector_update();
DROP INDEX IF EXISTS idx_business_cases_search;
ALTER TABLE business_cases DROP COLUMN IF EXISTS search_vector;

DROP TRIGGER IF EXISTS trg_problems_search_vector ON problems;
DROP FUNCTION IF EXISTS problems_search_vector_update();
DROP INDEX IF EXISTS idx_problems_search;
ALTER TABLE problems DROP COLUMN IF EXISTS search_vector;
";
