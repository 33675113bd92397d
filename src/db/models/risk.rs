use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::enums::{RiskLevel, RiskStatus};

#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = crate::schema::risks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Risk {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub probability: i32,
    pub impact: i32,
    pub status: RiskStatus,
    pub owner_id: Option<Uuid>,
    pub mitigation_plan: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Risk {
    pub fn score(&self) -> i32 {
        self.probability * self.impact
    }

    pub fn level(&self) -> RiskLevel {
        RiskLevel::from_score(self.score())
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::risks)]
pub struct NewRisk {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub probability: i32,
    pub impact: i32,
    pub status: RiskStatus,
    pub owner_id: Option<Uuid>,
    pub mitigation_plan: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub created_by: Uuid,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = crate::schema::risks)]
pub struct RiskChangeset {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub probability: Option<i32>,
    pub impact: Option<i32>,
    pub status: Option<RiskStatus>,
    pub owner_id: Option<Option<Uuid>>,
    pub mitigation_plan: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Risk as returned by the API, with derived score and level.
#[derive(Serialize, Debug, Clone)]
pub struct RiskInfo {
    #[serde(flatten)]
    pub risk: Risk,
    pub score: i32,
    pub level: RiskLevel,
}

impl From<Risk> for RiskInfo {
    fn from(risk: Risk) -> Self {
        let score = risk.score();
        Self {
            level: RiskLevel::from_score(score),
            score,
            risk,
        }
    }
}

#[derive(Deserialize, Serialize, Clone)]
pub struct CreateRiskRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub probability: i32,
    pub impact: i32,
    pub status: Option<RiskStatus>,
    pub owner_id: Option<Uuid>,
    pub mitigation_plan: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Deserialize, Default)]
pub struct UpdateRiskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub category: Option<Option<String>>,
    pub probability: Option<i32>,
    pub impact: Option<i32>,
    pub status: Option<RiskStatus>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub owner_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub mitigation_plan: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub due_date: Option<Option<NaiveDate>>,
}

#[derive(Deserialize)]
pub struct RiskListQuery {
    pub status: Option<RiskStatus>,
    pub level: Option<RiskLevel>,
}

/// 5×5 probability/impact matrix of open risks.
/// `cells[p - 1][i - 1]` counts risks with probability `p` and impact `i`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RiskMatrix {
    pub cells: [[u32; 5]; 5],
    pub total_open: u32,
}

impl RiskMatrix {
    pub fn from_risks<'a>(risks: impl IntoIterator<Item = &'a Risk>) -> Self {
        let mut matrix = RiskMatrix::default();
        for risk in risks {
            if !risk.status.is_open() {
                continue;
            }
            let (Ok(p), Ok(i)) = (usize::try_from(risk.probability), usize::try_from(risk.impact)) else {
                continue;
            };
            if (1..=5).contains(&p) && (1..=5).contains(&i) {
                matrix.cells[p - 1][i - 1] += 1;
                matrix.total_open += 1;
            }
        }
        matrix
    }
}
