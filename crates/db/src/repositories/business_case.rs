//! Business case repository for database operations.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use thiserror::Error;

use deciframe_core::lifecycle::{
    roi_percent, CaseDepth, CaseStatus, CaseType, DepthRuleViolation,
};

use crate::entities::business_cases;

/// Business-case-specific failures.
#[derive(Debug, Error)]
pub enum CaseError {
    /// The case does not exist in this tenant.
    #[error("business case not found")]
    NotFound,

    /// The requested status transition is not reachable.
    #[error("cannot transition case from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// A Light case exceeded the full-depth cost threshold.
    #[error(transparent)]
    DepthRule(#[from] DepthRuleViolation),

    /// A stored or submitted enum value is not recognized.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Underlying database error.
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Input for creating a business case.
#[derive(Debug, Clone)]
pub struct CreateCaseInput {
    /// Case title; indexed for search.
    pub title: String,
    /// Description; indexed for search.
    pub description: Option<String>,
    /// Executive summary; indexed for search.
    pub summary: Option<String>,
    /// Initiative name; indexed for search.
    pub initiative_name: Option<String>,
    /// Originating problem, if reactive.
    pub problem_id: Option<i32>,
    /// Reactive or Proactive.
    pub case_type: CaseType,
    /// Light or Full elaboration.
    pub case_depth: CaseDepth,
    /// Estimated cost.
    pub cost_estimate: Option<Decimal>,
    /// Estimated benefit.
    pub benefit_estimate: Option<Decimal>,
    /// Creating user.
    pub created_by: i32,
}

/// Input for updating case fields.
#[derive(Debug, Clone, Default)]
pub struct UpdateCaseInput {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New summary.
    pub summary: Option<Option<String>>,
    /// New depth.
    pub case_depth: Option<CaseDepth>,
    /// New cost estimate.
    pub cost_estimate: Option<Option<Decimal>>,
    /// New benefit estimate.
    pub benefit_estimate: Option<Option<Decimal>>,
    /// New risk level tag.
    pub risk_level: Option<Option<String>>,
    /// Assigned business analyst.
    pub assigned_ba: Option<Option<i32>>,
}

/// Business case repository.
#[derive(Debug, Clone)]
pub struct BusinessCaseRepository {
    db: DatabaseConnection,
}

impl BusinessCaseRepository {
    /// Creates a new business case repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a case by id within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        organization_id: i32,
        id: i32,
    ) -> Result<Option<business_cases::Model>, DbErr> {
        business_cases::Entity::find_by_id(id)
            .filter(business_cases::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await
    }

    /// Lists cases for a tenant, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        organization_id: i32,
        status: Option<CaseStatus>,
        limit: u64,
    ) -> Result<Vec<business_cases::Model>, DbErr> {
        let mut query = business_cases::Entity::find()
            .filter(business_cases::Column::OrganizationId.eq(organization_id));
        if let Some(status) = status {
            query = query.filter(business_cases::Column::Status.eq(status.as_str()));
        }
        query
            .order_by_desc(business_cases::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
    }

    /// Creates a case, enforcing the depth rule and deriving ROI.
    ///
    /// `full_case_threshold` is the tenant-configured cost above which a
    /// case must be Full depth.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::DepthRule` for a Light case whose cost exceeds
    /// the threshold.
    pub async fn create(
        &self,
        organization_id: i32,
        input: CreateCaseInput,
        full_case_threshold: Decimal,
    ) -> Result<business_cases::Model, CaseError> {
        validate_depth(input.case_depth, input.cost_estimate, full_case_threshold)?;
        let roi = roi_from(input.cost_estimate, input.benefit_estimate);

        let now = chrono::Utc::now().into();
        Ok(business_cases::ActiveModel {
            organization_id: Set(organization_id),
            title: Set(input.title),
            description: Set(input.description),
            summary: Set(input.summary),
            initiative_name: Set(input.initiative_name),
            problem_id: Set(input.problem_id),
            case_type: Set(input.case_type.as_str().to_string()),
            case_depth: Set(input.case_depth.as_str().to_string()),
            status: Set(CaseStatus::Open.as_str().to_string()),
            cost_estimate: Set(input.cost_estimate),
            benefit_estimate: Set(input.benefit_estimate),
            roi: Set(roi),
            created_by: Set(input.created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?)
    }

    /// Updates case fields, re-checking the depth rule and recomputing ROI
    /// when the estimates change.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::DepthRule` when the updated combination violates
    /// the threshold.
    pub async fn update(
        &self,
        organization_id: i32,
        id: i32,
        input: UpdateCaseInput,
        full_case_threshold: Decimal,
    ) -> Result<business_cases::Model, CaseError> {
        let case = self
            .find_by_id(organization_id, id)
            .await?
            .ok_or(CaseError::NotFound)?;

        let depth = input.case_depth.unwrap_or(
            CaseDepth::parse(&case.case_depth)
                .ok_or_else(|| CaseError::InvalidValue(case.case_depth.clone()))?,
        );
        let cost = input.cost_estimate.unwrap_or(case.cost_estimate);
        let benefit = input.benefit_estimate.unwrap_or(case.benefit_estimate);
        validate_depth(depth, cost, full_case_threshold)?;

        let mut active: business_cases::ActiveModel = case.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(summary) = input.summary {
            active.summary = Set(summary);
        }
        if let Some(risk_level) = input.risk_level {
            active.risk_level = Set(risk_level);
        }
        if let Some(assigned_ba) = input.assigned_ba {
            active.assigned_ba = Set(assigned_ba);
        }
        active.case_depth = Set(depth.as_str().to_string());
        active.cost_estimate = Set(cost);
        active.benefit_estimate = Set(benefit);
        active.roi = Set(roi_from(cost, benefit));
        active.updated_at = Set(chrono::Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Transitions a case to a new status, enforcing the status machine.
    ///
    /// An Approved transition records the approver.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::InvalidTransition` for an unreachable target.
    pub async fn transition(
        &self,
        organization_id: i32,
        id: i32,
        to: CaseStatus,
        acting_user: i32,
    ) -> Result<business_cases::Model, CaseError> {
        let case = self
            .find_by_id(organization_id, id)
            .await?
            .ok_or(CaseError::NotFound)?;

        let from = CaseStatus::parse(&case.status)
            .ok_or_else(|| CaseError::InvalidValue(case.status.clone()))?;
        if !from.can_transition(to) {
            return Err(CaseError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }

        let mut active: business_cases::ActiveModel = case.into();
        active.status = Set(to.as_str().to_string());
        if to == CaseStatus::Approved {
            active.approved_by = Set(Some(acting_user));
        }
        active.updated_at = Set(chrono::Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Deletes a case.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::NotFound` for an unknown case.
    pub async fn delete(&self, organization_id: i32, id: i32) -> Result<(), CaseError> {
        let result = business_cases::Entity::delete_by_id(id)
            .filter(business_cases::Column::OrganizationId.eq(organization_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(CaseError::NotFound);
        }
        Ok(())
    }
}

fn validate_depth(
    depth: CaseDepth,
    cost: Option<Decimal>,
    threshold: Decimal,
) -> Result<(), DepthRuleViolation> {
    match cost {
        Some(cost) => depth.validate_against(cost, threshold),
        None => Ok(()),
    }
}

fn roi_from(cost: Option<Decimal>, benefit: Option<Decimal>) -> Option<Decimal> {
    match (cost, benefit) {
        (Some(cost), Some(benefit)) => roi_percent(cost, benefit),
        _ => None,
    }
}
