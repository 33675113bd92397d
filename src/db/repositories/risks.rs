use diesel::prelude::*;
use uuid::Uuid;

use crate::db::enums::RiskStatus;
use crate::db::models::risk::{NewRisk, Risk, RiskChangeset};

pub struct RisksRepo;

impl RisksRepo {
    pub fn insert(conn: &mut PgConnection, new_risk: &NewRisk) -> Result<Risk, diesel::result::Error> {
        diesel::insert_into(crate::schema::risks::table)
            .values(new_risk)
            .returning(Risk::as_returning())
            .get_result(conn)
    }

    pub fn insert_many(conn: &mut PgConnection, new_risks: &[NewRisk]) -> Result<Vec<Risk>, diesel::result::Error> {
        diesel::insert_into(crate::schema::risks::table)
            .values(new_risks)
            .returning(Risk::as_returning())
            .get_results(conn)
    }

    pub fn find_in_project(
        conn: &mut PgConnection,
        project: Uuid,
        risk_id: Uuid,
    ) -> Result<Option<Risk>, diesel::result::Error> {
        use crate::schema::risks::dsl::*;
        risks
            .filter(id.eq(risk_id))
            .filter(project_id.eq(project))
            .select(Risk::as_select())
            .first(conn)
            .optional()
    }

    pub fn list_by_project(
        conn: &mut PgConnection,
        project: Uuid,
        status_filter: Option<RiskStatus>,
    ) -> Result<Vec<Risk>, diesel::result::Error> {
        use crate::schema::risks::dsl as r;
        let mut query = r::risks.filter(r::project_id.eq(project)).into_boxed();
        if let Some(s) = status_filter {
            query = query.filter(r::status.eq(s));
        }
        query
            .order(r::created_at.desc())
            .select(Risk::as_select())
            .load(conn)
    }

    pub fn list_by_organization(conn: &mut PgConnection, org: Uuid) -> Result<Vec<Risk>, diesel::result::Error> {
        use crate::schema::{projects as p, risks as r};
        r::table
            .inner_join(p::table)
            .filter(p::organization_id.eq(org))
            .select(Risk::as_select())
            .load(conn)
    }

    pub fn update(conn: &mut PgConnection, risk_id: Uuid, changes: &RiskChangeset) -> Result<Risk, diesel::result::Error> {
        use crate::schema::risks::dsl::*;
        diesel::update(risks.filter(id.eq(risk_id)))
            .set(changes)
            .returning(Risk::as_returning())
            .get_result(conn)
    }

    pub fn delete(conn: &mut PgConnection, risk_id: Uuid) -> Result<usize, diesel::result::Error> {
        use crate::schema::risks::dsl::*;
        diesel::delete(risks.filter(id.eq(risk_id))).execute(conn)
    }
}
