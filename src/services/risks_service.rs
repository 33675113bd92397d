use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    db::enums::{RiskLevel, RiskStatus},
    db::models::project::Project,
    db::models::risk::{
        CreateRiskRequest, NewRisk, Risk, RiskChangeset, RiskInfo, RiskListQuery, RiskMatrix, UpdateRiskRequest,
    },
    db::repositories::{risks::RisksRepo, users::UsersRepo},
    error::AppError,
    middleware::rbac::Permission,
    notifications::{Notifier, recipient_phone},
    services::{context::RequestContext, projects_service::{ProjectsService, ensure_member}},
    validation::risk::{validate_rating, validate_risk_title},
};

pub struct RisksService;

impl RisksService {
    pub fn list(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        project_id: Uuid,
        query: &RiskListQuery,
    ) -> Result<Vec<RiskInfo>, AppError> {
        ctx.require(Permission::ViewAll)?;
        ProjectsService::find(conn, ctx, project_id)?;
        let risks = RisksRepo::list_by_project(conn, project_id, query.status)?;
        Ok(risks
            .into_iter()
            .map(RiskInfo::from)
            .filter(|info| query.level.is_none_or(|level| info.level == level))
            .collect())
    }

    pub fn get(conn: &mut PgConnection, ctx: &RequestContext, project_id: Uuid, risk_id: Uuid) -> Result<RiskInfo, AppError> {
        ctx.require(Permission::ViewAll)?;
        ProjectsService::find(conn, ctx, project_id)?;
        Ok(find_risk(conn, project_id, risk_id)?.into())
    }

    pub fn matrix(conn: &mut PgConnection, ctx: &RequestContext, project_id: Uuid) -> Result<RiskMatrix, AppError> {
        ctx.require(Permission::ViewAll)?;
        ProjectsService::find(conn, ctx, project_id)?;
        let risks = RisksRepo::list_by_project(conn, project_id, None)?;
        Ok(RiskMatrix::from_risks(&risks))
    }

    pub fn create(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        notifier: &Notifier,
        project_id: Uuid,
        req: &CreateRiskRequest,
    ) -> Result<RiskInfo, AppError> {
        ctx.require(Permission::ManageRisks)?;
        let project = ProjectsService::find(conn, ctx, project_id)?;
        validate_risk_title(&req.title)?;
        validate_rating("probability", req.probability)?;
        validate_rating("impact", req.impact)?;
        if let Some(owner) = req.owner_id {
            ensure_member(conn, ctx, owner)?;
        }

        let risk = RisksRepo::insert(
            conn,
            &NewRisk {
                project_id,
                title: req.title.trim().to_string(),
                description: req.description.clone(),
                category: req.category.clone(),
                probability: req.probability,
                impact: req.impact,
                status: req.status.unwrap_or(RiskStatus::Identified),
                owner_id: req.owner_id,
                mitigation_plan: req.mitigation_plan.clone(),
                due_date: req.due_date,
                created_by: ctx.user_id,
            },
        )?;

        if became_critical(None, &risk) {
            alert_manager(conn, notifier, &project, &risk);
        }
        Ok(risk.into())
    }

    pub fn update(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        notifier: &Notifier,
        project_id: Uuid,
        risk_id: Uuid,
        req: &UpdateRiskRequest,
    ) -> Result<RiskInfo, AppError> {
        ctx.require(Permission::ManageRisks)?;
        let project = ProjectsService::find(conn, ctx, project_id)?;
        let before = find_risk(conn, project_id, risk_id)?;

        if let Some(title) = &req.title {
            validate_risk_title(title)?;
        }
        if let Some(p) = req.probability {
            validate_rating("probability", p)?;
        }
        if let Some(i) = req.impact {
            validate_rating("impact", i)?;
        }
        if let Some(Some(owner)) = req.owner_id {
            ensure_member(conn, ctx, owner)?;
        }

        let changes = RiskChangeset {
            title: req.title.as_ref().map(|t| t.trim().to_string()),
            description: req.description.clone(),
            category: req.category.clone(),
            probability: req.probability,
            impact: req.impact,
            status: req.status,
            owner_id: req.owner_id,
            mitigation_plan: req.mitigation_plan.clone(),
            due_date: req.due_date,
            updated_at: Some(Utc::now()),
        };
        let risk = RisksRepo::update(conn, risk_id, &changes)?;

        if became_critical(Some(&before), &risk) {
            alert_manager(conn, notifier, &project, &risk);
        }
        Ok(risk.into())
    }

    pub fn delete(conn: &mut PgConnection, ctx: &RequestContext, project_id: Uuid, risk_id: Uuid) -> Result<(), AppError> {
        ctx.require(Permission::ManageRisks)?;
        ProjectsService::find(conn, ctx, project_id)?;
        find_risk(conn, project_id, risk_id)?;
        RisksRepo::delete(conn, risk_id)?;
        Ok(())
    }
}

fn find_risk(conn: &mut PgConnection, project_id: Uuid, risk_id: Uuid) -> Result<Risk, AppError> {
    RisksRepo::find_in_project(conn, project_id, risk_id)?.ok_or_else(|| AppError::not_found("Risk"))
}

/// An open risk that is critical now but was not before (or is new).
pub fn became_critical(before: Option<&Risk>, after: &Risk) -> bool {
    let critical = |risk: &Risk| risk.status.is_open() && risk.level() == RiskLevel::Critical;
    critical(after) && !before.is_some_and(critical)
}

pub fn critical_risk_message(project: &Project, risk: &Risk) -> String {
    format!(
        "[{}] Critical risk: {} (probability {}, impact {}, score {})",
        project.code,
        risk.title,
        risk.probability,
        risk.impact,
        risk.score()
    )
}

fn alert_manager(conn: &mut PgConnection, notifier: &Notifier, project: &Project, risk: &Risk) {
    let Some(manager_id) = project.manager_id else {
        return;
    };
    let phone = recipient_phone(manager_id, UsersRepo::find_by_id(conn, manager_id));
    notifier.notify(phone, critical_risk_message(project, risk));
}
