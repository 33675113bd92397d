use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Declares an enum stored as lowercase text in Postgres.
///
/// The text value doubles as the serde representation, so the literal must
/// be the snake_case form of the variant name.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
        #[diesel(sql_type = Text)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("Unrecognized {} variant: {}", stringify!($name), other)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(bytes: <Pg as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
                let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
                s.parse::<$name>().map_err(|e| e.into())
            }
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(IsNull::No)
            }
        }
    };
}

text_enum!(
    /// Role of a user inside an organization.
    MemberRole {
        Owner => "owner",
        Admin => "admin",
        ProjectManager => "project_manager",
        Member => "member",
        Viewer => "viewer",
    }
);

text_enum!(
    /// EPC lifecycle phase of a project.
    ProjectPhase {
        Engineering => "engineering",
        Procurement => "procurement",
        Construction => "construction",
        Commissioning => "commissioning",
        Closed => "closed",
    }
);

text_enum!(ProjectStatus {
    Planned => "planned",
    Active => "active",
    OnHold => "on_hold",
    Completed => "completed",
    Cancelled => "cancelled",
});

text_enum!(
    /// Kanban column of a task. `ALL` is the board's column order.
    TaskStatus {
        Todo => "todo",
        InProgress => "in_progress",
        Review => "review",
        Blocked => "blocked",
        Done => "done",
    }
);

text_enum!(Priority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

text_enum!(DependencyType {
    FinishToStart => "finish_to_start",
    StartToStart => "start_to_start",
    FinishToFinish => "finish_to_finish",
    StartToFinish => "start_to_finish",
});

text_enum!(ResourceKind {
    Labor => "labor",
    Equipment => "equipment",
    Material => "material",
});

text_enum!(TimeEntryStatus {
    Draft => "draft",
    Submitted => "submitted",
    Approved => "approved",
    Rejected => "rejected",
});

text_enum!(RiskStatus {
    Identified => "identified",
    Assessed => "assessed",
    Mitigating => "mitigating",
    Closed => "closed",
    Occurred => "occurred",
});

text_enum!(RiskLevel {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

text_enum!(IssueSeverity {
    Minor => "minor",
    Moderate => "moderate",
    Major => "major",
    Critical => "critical",
});

text_enum!(IssueStatus {
    Open => "open",
    InProgress => "in_progress",
    Resolved => "resolved",
    Closed => "closed",
});

text_enum!(ConversationKind {
    Project => "project",
    Direct => "direct",
});

impl TimeEntryStatus {
    /// Entries the owner may still edit or delete.
    pub fn is_editable(&self) -> bool {
        matches!(self, TimeEntryStatus::Draft | TimeEntryStatus::Rejected)
    }
}

impl RiskLevel {
    /// Level for a probability × impact score on the 5×5 matrix.
    pub fn from_score(score: i32) -> Self {
        match score {
            i32::MIN..=4 => RiskLevel::Low,
            5..=9 => RiskLevel::Medium,
            10..=16 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }
}

impl RiskStatus {
    pub fn is_open(&self) -> bool {
        !matches!(self, RiskStatus::Closed)
    }
}

impl IssueStatus {
    pub fn can_transition_to(&self, next: IssueStatus) -> bool {
        use IssueStatus::*;
        matches!(
            (self, next),
            (Open, InProgress)
                | (Open, Resolved)
                | (Open, Closed)
                | (InProgress, Open)
                | (InProgress, Resolved)
                | (Resolved, Closed)
                | (Resolved, Open)
                | (Closed, Open)
        )
    }

    pub fn is_open(&self) -> bool {
        matches!(self, IssueStatus::Open | IssueStatus::InProgress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trips_through_from_str() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), *status);
        }
        assert!("doing".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn serde_matches_database_text() {
        let json = serde_json::to_string(&DependencyType::FinishToStart).unwrap();
        assert_eq!(json, "\"finish_to_start\"");
        let role: MemberRole = serde_json::from_str("\"project_manager\"").unwrap();
        assert_eq!(role, MemberRole::ProjectManager);
    }

    #[test]
    fn risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(1), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(4), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(5), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(9), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(10), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(16), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(20), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(25), RiskLevel::Critical);
    }

    #[test]
    fn issue_transitions() {
        use IssueStatus::*;
        assert!(Open.can_transition_to(InProgress));
        assert!(Resolved.can_transition_to(Open));
        assert!(Closed.can_transition_to(Open));
        assert!(!Closed.can_transition_to(Resolved));
        assert!(!InProgress.can_transition_to(Closed));
        assert!(!Open.can_transition_to(Open));
    }

    #[test]
    fn editable_time_entry_states() {
        assert!(TimeEntryStatus::Draft.is_editable());
        assert!(TimeEntryStatus::Rejected.is_editable());
        assert!(!TimeEntryStatus::Submitted.is_editable());
        assert!(!TimeEntryStatus::Approved.is_editable());
    }
}
