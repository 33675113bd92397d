use diesel::prelude::*;
use uuid::Uuid;

use crate::db::models::auth::{NewUser, NewUserCredential, User, UserCredential};

pub const PASSWORD_CREDENTIAL: &str = "password";

pub struct UsersRepo;

impl UsersRepo {
    pub fn find_by_email(
        conn: &mut PgConnection,
        target_email: &str,
    ) -> Result<Option<User>, diesel::result::Error> {
        use crate::schema::users::dsl::*;
        users
            .filter(email.eq(target_email.to_lowercase()))
            .select(User::as_select())
            .first(conn)
            .optional()
    }

    pub fn find_by_id(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Option<User>, diesel::result::Error> {
        use crate::schema::users::dsl::*;
        users
            .filter(id.eq(user_id))
            .select(User::as_select())
            .first(conn)
            .optional()
    }

    /// Locks the user row until the surrounding transaction ends.
    pub fn lock(conn: &mut PgConnection, user_id: Uuid) -> Result<(), diesel::result::Error> {
        use crate::schema::users::dsl::*;
        users
            .filter(id.eq(user_id))
            .select(id)
            .for_update()
            .first::<Uuid>(conn)
            .map(|_| ())
    }

    pub fn find_many(
        conn: &mut PgConnection,
        user_ids: &[Uuid],
    ) -> Result<Vec<User>, diesel::result::Error> {
        use crate::schema::users::dsl::*;
        users
            .filter(id.eq_any(user_ids))
            .select(User::as_select())
            .load(conn)
    }

    pub fn exists_by_email(
        conn: &mut PgConnection,
        target_email: &str,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::users::dsl::*;
        diesel::select(diesel::dsl::exists(
            users.filter(email.eq(target_email.to_lowercase())),
        ))
        .get_result(conn)
    }

    pub fn exists_by_username(
        conn: &mut PgConnection,
        target_username: &str,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::users::dsl::*;
        diesel::select(diesel::dsl::exists(users.filter(username.eq(target_username))))
            .get_result(conn)
    }

    pub fn insert_user(
        conn: &mut PgConnection,
        new_user: &NewUser,
    ) -> Result<User, diesel::result::Error> {
        diesel::insert_into(crate::schema::users::table)
            .values(new_user)
            .returning(User::as_returning())
            .get_result(conn)
    }

    pub fn insert_credential(
        conn: &mut PgConnection,
        new_credential: &NewUserCredential,
    ) -> Result<UserCredential, diesel::result::Error> {
        diesel::insert_into(crate::schema::user_credentials::table)
            .values(new_credential)
            .returning(UserCredential::as_returning())
            .get_result(conn)
    }

    pub fn find_password_credential(
        conn: &mut PgConnection,
        target_user_id: Uuid,
    ) -> Result<Option<UserCredential>, diesel::result::Error> {
        use crate::schema::user_credentials::dsl::*;
        user_credentials
            .filter(user_id.eq(target_user_id))
            .filter(credential_type.eq(PASSWORD_CREDENTIAL))
            .select(UserCredential::as_select())
            .first(conn)
            .optional()
    }

    pub fn update_profile(
        conn: &mut PgConnection,
        user_id: Uuid,
        new_name: Option<String>,
        new_phone: Option<Option<String>>,
    ) -> Result<User, diesel::result::Error> {
        use crate::schema::users::dsl as u;

        #[derive(AsChangeset)]
        #[diesel(table_name = crate::schema::users)]
        struct ProfileChangeset {
            name: Option<String>,
            phone: Option<Option<String>>,
            updated_at: chrono::DateTime<chrono::Utc>,
        }

        diesel::update(u::users.filter(u::id.eq(user_id)))
            .set(&ProfileChangeset {
                name: new_name,
                phone: new_phone,
                updated_at: chrono::Utc::now(),
            })
            .returning(User::as_returning())
            .get_result(conn)
    }

    pub fn set_current_organization(
        conn: &mut PgConnection,
        target_user_id: Uuid,
        organization: Option<Uuid>,
    ) -> Result<User, diesel::result::Error> {
        use crate::schema::users::dsl::*;
        diesel::update(users.filter(id.eq(target_user_id)))
            .set(current_organization_id.eq(organization))
            .returning(User::as_returning())
            .get_result(conn)
    }
}
