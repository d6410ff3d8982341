//! Row-level security migration.
//!
//! Enables and forces RLS on every tenant-scoped table with a policy that
//! compares `organization_id` against the `app.current_organization_id`
//! session variable set per transaction by the RLS wrapper. FORCE applies
//! the policies even to table owners.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(ENABLE_RLS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DISABLE_RLS_SQL).await?;
        Ok(())
    }
}

// workflow_library is global and deliberately absent from the table list.
const ENABLE_RLS_SQL: &str = r"
-- ============================================================
-- ROW LEVEL SECURITY
-- One tenant-isolation policy per tenant-scoped table; FORCE so
-- policies apply to table owners as well.
-- ============================================================

DO $$
DECLARE
    t text;
BEGIN
    FOREACH t IN ARRAY string_to_array(
        'departments users problems business_cases epics stories ' ||
        'projects project_milestones notifications notification_settings ' ||
        'notification_templates workflow_templates report_templates ' ||
        'report_runs audit_logs delayed_jobs', ' ')
    LOOP
        EXECUTE format('ALTER TABLE %I ENABLE ROW LEVEL SECURITY', t);
        EXECUTE format('ALTER TABLE %I FORCE ROW LEVEL SECURITY', t);
        -- Isolation applies whenever a request has set the tenant context;
        -- scheduler sweeps run without one and see all tenants.
        EXECUTE format(
            'CREATE POLICY tenant_isolation ON %I
                 USING (
                     NULLIF(current_setting(''app.current_organization_id'', true), '''') IS NULL
                     OR organization_id = current_setting(''app.current_organization_id'')::integer
                 )
                 WITH CHECK (
                     NULLIF(current_setting(''app.current_organization_id'', true), '''') IS NULL
                     OR organization_id = current_setting(''app.current_organization_id'')::integer
                 )',
            t);
    END LOOP;
END
$$;
";

const DISABLE_RLS_SQL: &str = r"
DO $$
DECLARE
    t text;
BEGIN
    FOREACH t IN ARRAY string_to_array(
        'departments users problems business_cases epics stories ' ||
        'projects project_milestones notifications notification_settings ' ||
        'notification_templates workflow_templates report_templates ' ||
        'report_runs audit_logs delayed_jobs', ' ')
    LOOP
        EXECUTE format('DROP POLICY IF EXISTS tenant_isolation ON %I', t);
        EXECUTE format('ALTER TABLE %I NO FORCE ROW LEVEL SECURITY', t);
        EXECUTE format('ALTER TABLE %I DISABLE ROW LEVEL SECURITY', t);
    END LOOP;
END
$$;
";
