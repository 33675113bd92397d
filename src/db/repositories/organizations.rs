use diesel::prelude::*;
use uuid::Uuid;

use crate::db::models::organization::{NewOrganization, Organization};

pub struct OrganizationsRepo;

impl OrganizationsRepo {
    pub fn insert(
        conn: &mut PgConnection,
        new_org: &NewOrganization,
    ) -> Result<Organization, diesel::result::Error> {
        diesel::insert_into(crate::schema::organizations::table)
            .values(new_org)
            .returning(Organization::as_returning())
            .get_result(conn)
    }

    pub fn find_by_id(
        conn: &mut PgConnection,
        org_id: Uuid,
    ) -> Result<Option<Organization>, diesel::result::Error> {
        use crate::schema::organizations::dsl::*;
        organizations
            .filter(id.eq(org_id))
            .select(Organization::as_select())
            .first(conn)
            .optional()
    }

    /// Locks the organization row until the surrounding transaction ends.
    pub fn lock(conn: &mut PgConnection, org_id: Uuid) -> Result<(), diesel::result::Error> {
        use crate::schema::organizations::dsl::*;
        organizations
            .filter(id.eq(org_id))
            .select(id)
            .for_update()
            .first::<Uuid>(conn)
            .map(|_| ())
    }

    pub fn exists_slug(conn: &mut PgConnection, target_slug: &str) -> Result<bool, diesel::result::Error> {
        use crate::schema::organizations::dsl::*;
        diesel::select(diesel::dsl::exists(organizations.filter(slug.eq(target_slug)))).get_result(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        org_id: Uuid,
        new_name: Option<String>,
        new_currency: Option<String>,
    ) -> Result<Organization, diesel::result::Error> {
        use crate::schema::organizations::dsl as o;

        #[derive(AsChangeset)]
        #[diesel(table_name = crate::schema::organizations)]
        struct OrganizationChangeset {
            name: Option<String>,
            default_currency: Option<String>,
            updated_at: chrono::DateTime<chrono::Utc>,
        }

        diesel::update(o::organizations.filter(o::id.eq(org_id)))
            .set(&OrganizationChangeset {
                name: new_name,
                default_currency: new_currency,
                updated_at: chrono::Utc::now(),
            })
            .returning(Organization::as_returning())
            .get_result(conn)
    }

    pub fn delete(conn: &mut PgConnection, org_id: Uuid) -> Result<usize, diesel::result::Error> {
        use crate::schema::organizations::dsl::*;
        diesel::delete(organizations.filter(id.eq(org_id))).execute(conn)
    }

    /// Organizations the user belongs to, with their role in each.
    pub fn list_for_user(
        conn: &mut PgConnection,
        target_user_id: Uuid,
    ) -> Result<Vec<(Organization, crate::db::enums::MemberRole)>, diesel::result::Error> {
        use crate::schema::{organization_members as m, organizations as o};
        o::table
            .inner_join(m::table.on(m::organization_id.eq(o::id)))
            .filter(m::user_id.eq(target_user_id))
            .order(o::name.asc())
            .select((Organization::as_select(), m::role))
            .load(conn)
    }
}
