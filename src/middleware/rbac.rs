use serde::Serialize;

use crate::db::enums::MemberRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageOrganization,
    ManageMembers,
    ManageProjects,
    EditTasks,
    ManageResources,
    LogTime,
    ApproveTime,
    ManageRisks,
    ManageIssues,
    ManageDocuments,
    Chat,
    ImportExport,
    ViewBilling,
    ViewAll,
}

impl Permission {
    pub const ALL: [Permission; 14] = [
        Permission::ManageOrganization,
        Permission::ManageMembers,
        Permission::ManageProjects,
        Permission::EditTasks,
        Permission::ManageResources,
        Permission::LogTime,
        Permission::ApproveTime,
        Permission::ManageRisks,
        Permission::ManageIssues,
        Permission::ManageDocuments,
        Permission::Chat,
        Permission::ImportExport,
        Permission::ViewBilling,
        Permission::ViewAll,
    ];
}

/// The fixed role/permission matrix.
pub fn role_allows(role: MemberRole, permission: Permission) -> bool {
    use Permission::*;

    match role {
        MemberRole::Owner | MemberRole::Admin => true,
        MemberRole::ProjectManager => {
            !matches!(permission, ManageOrganization | ManageMembers | ViewBilling)
        }
        MemberRole::Member => matches!(
            permission,
            EditTasks | LogTime | ManageIssues | ManageDocuments | Chat | ViewAll
        ),
        MemberRole::Viewer => matches!(permission, ViewAll | Chat),
    }
}

pub fn permissions_for(role: MemberRole) -> Vec<Permission> {
    Permission::ALL
        .into_iter()
        .filter(|p| role_allows(role, *p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_and_admin_have_everything() {
        assert_eq!(permissions_for(MemberRole::Owner).len(), Permission::ALL.len());
        assert_eq!(permissions_for(MemberRole::Admin).len(), Permission::ALL.len());
    }

    #[test]
    fn project_manager_cannot_touch_org_settings() {
        let role = MemberRole::ProjectManager;
        assert!(!role_allows(role, Permission::ManageOrganization));
        assert!(!role_allows(role, Permission::ManageMembers));
        assert!(!role_allows(role, Permission::ViewBilling));
        assert!(role_allows(role, Permission::ApproveTime));
        assert!(role_allows(role, Permission::ImportExport));
    }

    #[test]
    fn member_and_viewer_are_limited() {
        assert_eq!(
            permissions_for(MemberRole::Member),
            vec![
                Permission::EditTasks,
                Permission::LogTime,
                Permission::ManageIssues,
                Permission::ManageDocuments,
                Permission::Chat,
                Permission::ViewAll,
            ]
        );
        assert_eq!(
            permissions_for(MemberRole::Viewer),
            vec![Permission::Chat, Permission::ViewAll]
        );
    }
}
