use diesel::prelude::*;
use uuid::Uuid;

use crate::db::enums::ResourceKind;
use crate::db::models::resource::{NewResource, Resource, ResourceChangeset};

pub struct ResourcesRepo;

impl ResourcesRepo {
    pub fn insert(conn: &mut PgConnection, new_resource: &NewResource) -> Result<Resource, diesel::result::Error> {
        diesel::insert_into(crate::schema::resources::table)
            .values(new_resource)
            .returning(Resource::as_returning())
            .get_result(conn)
    }

    pub fn find_in_organization(
        conn: &mut PgConnection,
        org: Uuid,
        resource_id: Uuid,
    ) -> Result<Option<Resource>, diesel::result::Error> {
        use crate::schema::resources::dsl::*;
        resources
            .filter(id.eq(resource_id))
            .filter(organization_id.eq(org))
            .select(Resource::as_select())
            .first(conn)
            .optional()
    }

    pub fn list(
        conn: &mut PgConnection,
        org: Uuid,
        kind_filter: Option<ResourceKind>,
        include_inactive: bool,
    ) -> Result<Vec<Resource>, diesel::result::Error> {
        use crate::schema::resources::dsl as r;
        let mut query = r::resources.filter(r::organization_id.eq(org)).into_boxed();
        if let Some(k) = kind_filter {
            query = query.filter(r::kind.eq(k));
        }
        if !include_inactive {
            query = query.filter(r::is_active.eq(true));
        }
        query.order(r::name.asc()).select(Resource::as_select()).load(conn)
    }

    pub fn find_many(conn: &mut PgConnection, ids: &[Uuid]) -> Result<Vec<Resource>, diesel::result::Error> {
        use crate::schema::resources::dsl::*;
        resources.filter(id.eq_any(ids)).select(Resource::as_select()).load(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        resource_id: Uuid,
        changes: &ResourceChangeset,
    ) -> Result<Resource, diesel::result::Error> {
        use crate::schema::resources::dsl::*;
        diesel::update(resources.filter(id.eq(resource_id)))
            .set(changes)
            .returning(Resource::as_returning())
            .get_result(conn)
    }

    pub fn delete(conn: &mut PgConnection, resource_id: Uuid) -> Result<usize, diesel::result::Error> {
        use crate::schema::resources::dsl::*;
        diesel::delete(resources.filter(id.eq(resource_id))).execute(conn)
    }
}
