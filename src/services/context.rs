use uuid::Uuid;

use crate::{
    db::enums::MemberRole,
    error::AppError,
    middleware::rbac::{Permission, role_allows},
};

/// Caller identity scoped to one organization.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: MemberRole,
}

impl RequestContext {
    pub fn can(&self, permission: Permission) -> bool {
        role_allows(self.role, permission)
    }

    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "Role '{}' lacks the {:?} permission",
                self.role, permission
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_maps_to_forbidden() {
        let ctx = RequestContext {
            user_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            role: MemberRole::Viewer,
        };
        assert!(ctx.require(Permission::ViewAll).is_ok());
        let err = ctx.require(Permission::EditTasks).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }
}
