use bcrypt::{hash, verify};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    db::enums::MemberRole,
    db::models::api::error_codes,
    db::models::auth::{
        AuthUser, LoginRequest, LoginResponse, NewUser, NewUserCredential, OrganizationMembership, RegisterRequest,
        UpdateProfileRequest, User, UserProfile,
    },
    db::models::organization::{NewOrganization, NewOrganizationMember},
    db::repositories::{
        members::MembersRepo,
        organizations::OrganizationsRepo,
        users::{PASSWORD_CREDENTIAL, UsersRepo},
    },
    error::AppError,
    middleware::auth::AuthService,
};

/// Registration, password login and profile management.
pub struct AccountService;

impl AccountService {
    /// Creates the user, their password credential and a personal
    /// organization they own, all in one transaction.
    pub fn register(conn: &mut PgConnection, req: &RegisterRequest, bcrypt_cost: u32) -> Result<User, AppError> {
        let email = req.email.trim().to_lowercase();

        if UsersRepo::exists_by_email(conn, &email)? {
            return Err(AppError::conflict_with_code(
                "Email already exists",
                Some("email".to_string()),
                error_codes::USER_EMAIL_EXISTS,
            ));
        }
        if UsersRepo::exists_by_username(conn, &req.username)? {
            return Err(AppError::conflict_with_code(
                "Username already exists",
                Some("username".to_string()),
                error_codes::USER_USERNAME_EXISTS,
            ));
        }

        let hashed_password = hash(&req.password, bcrypt_cost)?;

        conn.transaction::<User, AppError, _>(|conn| {
            let user = UsersRepo::insert_user(
                conn,
                &NewUser {
                    email,
                    username: req.username.clone(),
                    name: req.name.trim().to_string(),
                    phone: req.phone.clone(),
                },
            )?;

            UsersRepo::insert_credential(
                conn,
                &NewUserCredential {
                    user_id: user.id,
                    credential_type: PASSWORD_CREDENTIAL.to_string(),
                    credential_hash: Some(hashed_password),
                    is_primary: true,
                },
            )?;

            let organization = OrganizationsRepo::insert(
                conn,
                &NewOrganization {
                    name: format!("{}'s Organization", user.name),
                    slug: personal_slug(&user.username, user.id),
                    default_currency: "USD".to_string(),
                },
            )?;

            MembersRepo::insert(
                conn,
                &NewOrganizationMember {
                    organization_id: organization.id,
                    user_id: user.id,
                    role: MemberRole::Owner,
                },
            )?;

            Ok(UsersRepo::set_current_organization(conn, user.id, Some(organization.id))?)
        })
    }

    /// Checks the password and account state. Unknown email and wrong
    /// password are indistinguishable to the caller.
    pub fn verify_credentials(conn: &mut PgConnection, req: &LoginRequest) -> Result<User, AppError> {
        let invalid = || {
            tracing::warn!(email = %req.email, code = error_codes::AUTH_INVALID_CREDENTIALS, "Login rejected");
            AppError::auth("Invalid email or password")
        };

        let user = UsersRepo::find_by_email(conn, &req.email)?.ok_or_else(invalid)?;
        let credential = UsersRepo::find_password_credential(conn, user.id)?.ok_or_else(invalid)?;
        let stored_hash = credential.credential_hash.as_deref().ok_or_else(invalid)?;

        if !verify(&req.password, stored_hash)? {
            return Err(invalid());
        }
        if !user.is_active {
            tracing::warn!(user_id = %user.id, code = error_codes::AUTH_ACCOUNT_DISABLED, "Login to disabled account");
            return Err(AppError::forbidden("Account is disabled"));
        }
        Ok(user)
    }

    pub fn issue_tokens(auth: &AuthService, user: User) -> Result<LoginResponse, AppError> {
        let current_organization_id = user.current_organization_id;
        let auth_user: AuthUser = user.into();
        Ok(LoginResponse {
            access_token: auth.generate_access_token(&auth_user)?,
            refresh_token: auth.generate_refresh_token(auth_user.id)?,
            token_type: "Bearer".to_string(),
            expires_in: auth.access_token_expires_in(),
            user: auth_user,
            current_organization_id,
        })
    }

    pub fn profile(conn: &mut PgConnection, user_id: Uuid) -> Result<UserProfile, AppError> {
        let user = UsersRepo::find_by_id(conn, user_id)?.ok_or_else(|| AppError::not_found("User"))?;
        let organizations = OrganizationsRepo::list_for_user(conn, user.id)?
            .into_iter()
            .map(|(organization, role)| OrganizationMembership {
                organization_id: organization.id,
                name: organization.name,
                slug: organization.slug,
                role,
            })
            .collect();

        Ok(UserProfile {
            id: user.id,
            email: user.email,
            username: user.username,
            name: user.name,
            phone: user.phone,
            current_organization_id: user.current_organization_id,
            organizations,
        })
    }

    pub fn update_profile(
        conn: &mut PgConnection,
        user_id: Uuid,
        req: &UpdateProfileRequest,
    ) -> Result<UserProfile, AppError> {
        let name = req.name.as_ref().map(|n| n.trim().to_string());
        // An empty phone string clears the number.
        let phone = req
            .phone
            .as_ref()
            .map(|p| Some(p.trim().to_string()).filter(|p| !p.is_empty()));
        UsersRepo::update_profile(conn, user_id, name, phone)?;
        Self::profile(conn, user_id)
    }

    pub fn switch_organization(
        conn: &mut PgConnection,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<UserProfile, AppError> {
        if MembersRepo::find(conn, organization_id, user_id)?.is_none() {
            return Err(AppError::not_found("Organization"));
        }
        UsersRepo::set_current_organization(conn, user_id, Some(organization_id))?;
        Self::profile(conn, user_id)
    }
}

/// Slug for a user's personal organization, unique through the user id.
fn personal_slug(username: &str, user_id: Uuid) -> String {
    let base: String = username
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let base = base.trim_matches('-');
    let suffix = &user_id.simple().to_string()[..8];
    if base.is_empty() {
        format!("org-{}", suffix)
    } else {
        format!("{}-{}", base, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::rules::validate_slug;

    #[test]
    fn personal_slug_is_valid() {
        let id = Uuid::new_v4();
        for username in ["alice", "Bob_Smith", "__", "x-"] {
            let slug = personal_slug(username, id);
            assert!(validate_slug(&slug).is_ok(), "{}", slug);
        }
        assert!(personal_slug("alice", id).starts_with("alice-"));
    }
}
