use diesel::prelude::*;
use uuid::Uuid;

use crate::db::models::document::{Document, DocumentVersion, NewDocument, NewDocumentVersion};

pub struct DocumentsRepo;

impl DocumentsRepo {
    pub fn insert(conn: &mut PgConnection, new_document: &NewDocument) -> Result<Document, diesel::result::Error> {
        diesel::insert_into(crate::schema::documents::table)
            .values(new_document)
            .returning(Document::as_returning())
            .get_result(conn)
    }

    pub fn insert_version(
        conn: &mut PgConnection,
        new_version: &NewDocumentVersion,
    ) -> Result<DocumentVersion, diesel::result::Error> {
        diesel::insert_into(crate::schema::document_versions::table)
            .values(new_version)
            .returning(DocumentVersion::as_returning())
            .get_result(conn)
    }

    pub fn find_in_project(
        conn: &mut PgConnection,
        project: Uuid,
        document_id: Uuid,
    ) -> Result<Option<Document>, diesel::result::Error> {
        use crate::schema::documents::dsl::*;
        documents
            .filter(id.eq(document_id))
            .filter(project_id.eq(project))
            .select(Document::as_select())
            .first(conn)
            .optional()
    }

    pub fn find_in_organization(
        conn: &mut PgConnection,
        org: Uuid,
        document_id: Uuid,
    ) -> Result<Option<Document>, diesel::result::Error> {
        use crate::schema::{documents as d, projects as p};
        d::table
            .inner_join(p::table)
            .filter(d::id.eq(document_id))
            .filter(p::organization_id.eq(org))
            .select(Document::as_select())
            .first(conn)
            .optional()
    }

    /// Locks the document row so concurrent uploads get distinct versions.
    pub fn lock(conn: &mut PgConnection, document_id: Uuid) -> Result<Document, diesel::result::Error> {
        use crate::schema::documents::dsl::*;
        documents
            .filter(id.eq(document_id))
            .select(Document::as_select())
            .for_update()
            .first(conn)
    }

    pub fn list_by_project(
        conn: &mut PgConnection,
        project: Uuid,
        category_filter: Option<&str>,
    ) -> Result<Vec<Document>, diesel::result::Error> {
        use crate::schema::documents::dsl as d;
        let mut query = d::documents.filter(d::project_id.eq(project)).into_boxed();
        if let Some(c) = category_filter {
            query = query.filter(d::category.eq(c.to_string()));
        }
        query.order(d::title.asc()).select(Document::as_select()).load(conn)
    }

    pub fn list_versions(conn: &mut PgConnection, document: Uuid) -> Result<Vec<DocumentVersion>, diesel::result::Error> {
        use crate::schema::document_versions::dsl::*;
        document_versions
            .filter(document_id.eq(document))
            .order(version.desc())
            .select(DocumentVersion::as_select())
            .load(conn)
    }

    pub fn find_version(
        conn: &mut PgConnection,
        document: Uuid,
        number: i32,
    ) -> Result<Option<DocumentVersion>, diesel::result::Error> {
        use crate::schema::document_versions::dsl::*;
        document_versions
            .filter(document_id.eq(document))
            .filter(version.eq(number))
            .select(DocumentVersion::as_select())
            .first(conn)
            .optional()
    }

    pub fn set_current_version(
        conn: &mut PgConnection,
        document_id: Uuid,
        number: i32,
    ) -> Result<Document, diesel::result::Error> {
        use crate::schema::documents::dsl::*;
        diesel::update(documents.filter(id.eq(document_id)))
            .set((current_version.eq(number), updated_at.eq(chrono::Utc::now())))
            .returning(Document::as_returning())
            .get_result(conn)
    }

    pub fn update_metadata(
        conn: &mut PgConnection,
        document_id: Uuid,
        new_title: Option<String>,
        new_category: Option<Option<String>>,
    ) -> Result<Document, diesel::result::Error> {
        use crate::schema::documents::dsl as d;

        #[derive(AsChangeset)]
        #[diesel(table_name = crate::schema::documents)]
        struct DocumentChangeset {
            title: Option<String>,
            category: Option<Option<String>>,
            updated_at: chrono::DateTime<chrono::Utc>,
        }

        diesel::update(d::documents.filter(d::id.eq(document_id)))
            .set(&DocumentChangeset {
                title: new_title,
                category: new_category,
                updated_at: chrono::Utc::now(),
            })
            .returning(Document::as_returning())
            .get_result(conn)
    }

    pub fn delete(conn: &mut PgConnection, document_id: Uuid) -> Result<usize, diesel::result::Error> {
        use crate::schema::documents::dsl::*;
        diesel::delete(documents.filter(id.eq(document_id))).execute(conn)
    }
}
