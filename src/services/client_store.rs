//! Record façade over the `clients` table.
//!
//! Applies a parsed [`ClientQuery`] as SQL and performs single-statement
//! writes. It never validates; callers run the validator first.

use super::{StoreError, StoreResult};
use crate::models::{
    client::{Attribute, Client, ClientDraft, ClientRow},
    query::{ClientQuery, SortField},
};
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const CLIENT_COLUMNS: &str =
    "id, title, email, date_of_birth, company, image_src, image_mime, image_size";

/// Columns the search pattern is matched against.
const SEARCH_COLUMNS: [&str; 3] = ["title", "email", "company"];

#[derive(Clone)]
pub struct ClientStore {
    db: Arc<SqlitePool>,
}

impl ClientStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    pub async fn count(&self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clients")
            .fetch_one(&*self.db)
            .await?;
        Ok(count)
    }

    /// Filters are exact matches. The search term is used as a regular
    /// expression (not a literal) against title, email and company, OR-ed
    /// together and AND-ed with the filters.
    pub async fn find(&self, query: &ClientQuery) -> StoreResult<Vec<Client>> {
        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE 1 = 1"));

        for (attr, value) in &query.filters {
            builder.push(format!(" AND {} = ", attr.column()));
            builder.push_bind(value.as_str());
        }

        if let Some(pattern) = &query.search {
            builder.push(" AND (");
            for (i, column) in SEARCH_COLUMNS.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder.push(format!("(CASE WHEN {column} IS NULL THEN 0 ELSE {column} REGEXP "));
                builder.push_bind(pattern.as_str());
                builder.push(" END)");
            }
            builder.push(")");
        }

        builder.push(" ORDER BY ");
        for (i, (field, direction)) in query.sort.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(format!("{} {}", field.column(), direction.as_sql()));
        }
        // ties fall back to newest first so pages never overlap
        if !query.sort.iter().any(|(field, _)| *field == SortField::Id) {
            builder.push(format!(", {} DESC", SortField::Id.column()));
        }

        builder.push(" LIMIT ");
        builder.push_bind(i64::from(query.page.per_page));
        builder.push(" OFFSET ");
        builder.push_bind(query.page.skip() as i64);

        let rows: Vec<ClientRow> = builder.build_query_as().fetch_all(&*self.db).await?;
        Ok(rows.into_iter().map(Client::from).collect())
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;
        Ok(row.map(Client::from))
    }

    /// Delete a client and return what was removed, in one statement.
    pub async fn remove(&self, id: &str) -> StoreResult<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "DELETE FROM clients WHERE id = ? RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;

        if row.is_some() {
            debug!("removed client {}", id);
        }
        Ok(row.map(Client::from))
    }

    /// Insert when the draft has no id, otherwise overwrite the supplied
    /// attributes (and image, when given) of the existing client.
    ///
    /// Returns [`StoreError::ClientNotFound`] when updating an unknown id.
    pub async fn save(&self, draft: ClientDraft) -> StoreResult<Client> {
        match draft.id.clone() {
            None => self.insert(draft).await,
            Some(id) => self.update(&id, draft).await,
        }
    }

    async fn insert(&self, draft: ClientDraft) -> StoreResult<Client> {
        let id = Uuid::new_v4().to_string();
        let value = |attr: Attribute| draft.attributes.get(&attr).map(String::as_str);
        let image = draft.image.as_ref();

        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "INSERT INTO clients (
                id, title, email, date_of_birth, company, image_src, image_mime, image_size
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(&id)
        .bind(value(Attribute::Title))
        .bind(value(Attribute::Email))
        .bind(value(Attribute::DateOfBirth))
        .bind(value(Attribute::Company))
        .bind(image.map(|i| i.src.as_str()))
        .bind(image.and_then(|i| i.mime.as_deref()))
        .bind(image.map(|i| i.size))
        .fetch_one(&*self.db)
        .await?;

        debug!("inserted client {}", id);
        Ok(row.into())
    }

    async fn update(&self, id: &str, draft: ClientDraft) -> StoreResult<Client> {
        if draft.attributes.is_empty() && draft.image.is_none() {
            return self
                .get(id)
                .await?
                .ok_or_else(|| StoreError::ClientNotFound(id.to_string()));
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE clients SET ");
        {
            let mut set = builder.separated(", ");
            for (attr, value) in &draft.attributes {
                set.push(format!("{} = ", attr.column()));
                set.push_bind_unseparated(value.as_str());
            }
            if let Some(image) = &draft.image {
                set.push("image_src = ");
                set.push_bind_unseparated(image.src.as_str());
                set.push("image_mime = ");
                set.push_bind_unseparated(image.mime.as_deref());
                set.push("image_size = ");
                set.push_bind_unseparated(image.size);
            }
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {CLIENT_COLUMNS}"));

        let row: Option<ClientRow> = builder.build_query_as().fetch_optional(&*self.db).await?;
        let row = row.ok_or_else(|| StoreError::ClientNotFound(id.to_string()))?;
        debug!("updated client {}", id);
        Ok(row.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db,
        models::{
            client::{ClientAttributes, ImageRef},
            query::{Direction, Pagination},
        },
    };

    async fn store() -> ClientStore {
        ClientStore::new(Arc::new(db::memory().await))
    }

    fn draft(pairs: &[(Attribute, &str)]) -> ClientDraft {
        ClientDraft {
            attributes: pairs.iter().map(|(a, v)| (*a, v.to_string())).collect(),
            ..Default::default()
        }
    }

    async fn seed(store: &ClientStore, rows: &[&[(Attribute, &str)]]) -> Vec<Client> {
        let mut saved = Vec::new();
        for row in rows {
            saved.push(store.save(draft(row)).await.unwrap());
        }
        saved
    }

    fn titles(clients: &[Client]) -> Vec<&str> {
        clients.iter().map(|c| c.title.as_deref().unwrap_or("")).collect()
    }

    #[tokio::test]
    async fn insert_assigns_id_and_count_tracks_it() {
        let store = store().await;
        assert_eq!(store.count().await.unwrap(), 0);

        let saved = store
            .save(draft(&[(Attribute::Title, "Acme"), (Attribute::Email, "a@acme.io")]))
            .await
            .unwrap();
        assert!(!saved.id.is_empty());
        assert_eq!(saved.title.as_deref(), Some("Acme"));
        assert_eq!(saved.email.as_deref(), Some("a@acme.io"));
        assert_eq!(saved.company, None);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_preserves_id_and_returns_input_attributes() {
        let store = store().await;
        let created = store.save(draft(&[(Attribute::Title, "Acme")])).await.unwrap();

        let mut changes = draft(&[(Attribute::Title, "Acme Corp"), (Attribute::Company, "Acme")]);
        changes.id = Some(created.id.clone());
        let updated = store.save(changes.clone()).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.attributes(), changes.attributes);
        assert_eq!(store.get(&created.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn update_only_touches_supplied_attributes() {
        let store = store().await;
        let created = store
            .save(draft(&[(Attribute::Title, "Acme"), (Attribute::Company, "Acme Inc")]))
            .await
            .unwrap();

        let mut changes = draft(&[(Attribute::Title, "Acme 2")]);
        changes.id = Some(created.id.clone());
        let updated = store.save(changes).await.unwrap();

        assert_eq!(updated.title.as_deref(), Some("Acme 2"));
        assert_eq!(updated.company.as_deref(), Some("Acme Inc"));
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_not_found() {
        let store = store().await;
        let mut changes = draft(&[(Attribute::Title, "Ghost")]);
        changes.id = Some("missing".into());
        let err = store.save(changes).await.unwrap_err();
        assert!(matches!(err, StoreError::ClientNotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn image_reference_is_embedded_and_overwritten() {
        let store = store().await;
        let mut first = draft(&[(Attribute::Title, "Acme")]);
        first.image = Some(ImageRef {
            src: "/img/clients/a.png".into(),
            mime: Some("image/png".into()),
            size: 10,
        });
        let created = store.save(first).await.unwrap();
        assert_eq!(created.image.as_ref().map(|i| i.src.as_str()), Some("/img/clients/a.png"));

        let mut second = draft(&[(Attribute::Title, "Acme")]);
        second.id = Some(created.id.clone());
        second.image = Some(ImageRef {
            src: "/img/clients/b.jpg".into(),
            mime: None,
            size: 20,
        });
        let updated = store.save(second).await.unwrap();
        let image = updated.image.unwrap();
        assert_eq!(image.src, "/img/clients/b.jpg");
        assert_eq!(image.mime, None);
        assert_eq!(image.size, 20);
    }

    #[tokio::test]
    async fn remove_returns_record_then_get_is_absent() {
        let store = store().await;
        let created = store.save(draft(&[(Attribute::Title, "Acme")])).await.unwrap();

        let removed = store.remove(&created.id).await.unwrap();
        assert_eq!(removed, Some(created.clone()));
        assert_eq!(store.get(&created.id).await.unwrap(), None);
        assert_eq!(store.remove(&created.id).await.unwrap(), None);
        assert_eq!(store.remove("unknown").await.unwrap(), None);
    }

    #[tokio::test]
    async fn default_query_returns_newest_first() {
        let store = store().await;
        seed(
            &store,
            &[
                &[(Attribute::Title, "first")],
                &[(Attribute::Title, "second")],
                &[(Attribute::Title, "third")],
            ],
        )
        .await;

        let found = store.find(&ClientQuery::default()).await.unwrap();
        assert_eq!(titles(&found), ["third", "second", "first"]);
    }

    #[tokio::test]
    async fn filters_sort_and_pagination_combine() {
        let store = store().await;
        seed(
            &store,
            &[
                &[(Attribute::Title, "b"), (Attribute::Company, "Acme")],
                &[(Attribute::Title, "a"), (Attribute::Company, "Acme")],
                &[(Attribute::Title, "c"), (Attribute::Company, "Acme")],
                &[(Attribute::Title, "d"), (Attribute::Company, "Initech")],
            ],
        )
        .await;

        let mut query = ClientQuery {
            sort: vec![(SortField::Attribute(Attribute::Title), Direction::Asc)],
            ..Default::default()
        };
        query.filters.insert(Attribute::Company, "Acme".into());
        assert_eq!(titles(&store.find(&query).await.unwrap()), ["a", "b", "c"]);

        query.page = Pagination { page: 2, per_page: 2 };
        assert_eq!(titles(&store.find(&query).await.unwrap()), ["c"]);

        query.sort = vec![(SortField::Attribute(Attribute::Title), Direction::Desc)];
        query.page = Pagination { page: 1, per_page: 2 };
        assert_eq!(titles(&store.find(&query).await.unwrap()), ["c", "b"]);
    }

    #[tokio::test]
    async fn search_matches_title_email_or_company() {
        let store = store().await;
        seed(
            &store,
            &[
                &[(Attribute::Title, "Acme")],
                &[(Attribute::Title, "Jane"), (Attribute::Email, "jane@acme.io")],
                &[(Attribute::Title, "Bob"), (Attribute::Company, "acme labs")],
                &[(Attribute::Title, "Zed"), (Attribute::Company, "Initech")],
            ],
        )
        .await;

        let query = ClientQuery {
            search: Some("acme".into()),
            ..Default::default()
        };
        let mut found = titles(&store.find(&query).await.unwrap())
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        found.sort();
        // case-sensitive: "Acme" does not match "acme"
        assert_eq!(found, ["Bob", "Jane"]);
    }

    #[tokio::test]
    async fn search_is_a_pattern_and_combines_with_filters() {
        let store = store().await;
        seed(
            &store,
            &[
                &[(Attribute::Title, "Acme"), (Attribute::Company, "x")],
                &[(Attribute::Title, "Acne"), (Attribute::Company, "x")],
                &[(Attribute::Title, "Acme"), (Attribute::Company, "y")],
            ],
        )
        .await;

        let mut filters = ClientAttributes::new();
        filters.insert(Attribute::Company, "x".into());
        let query = ClientQuery {
            search: Some("^Ac.e$".into()),
            sort: vec![(SortField::Attribute(Attribute::Title), Direction::Asc)],
            filters,
            ..Default::default()
        };
        assert_eq!(titles(&store.find(&query).await.unwrap()), ["Acme", "Acne"]);
    }

    #[tokio::test]
    async fn equal_sort_values_page_newest_first() {
        let store = store().await;
        for company in ["c0", "c1", "c2", "c3", "c4"] {
            store
                .save(draft(&[(Attribute::Title, "Acme"), (Attribute::Company, company)]))
                .await
                .unwrap();
        }

        let mut query = ClientQuery {
            sort: vec![(SortField::Attribute(Attribute::Title), Direction::Desc)],
            page: Pagination { page: 1, per_page: 2 },
            ..Default::default()
        };
        let mut companies = Vec::new();
        for page in 1..=3 {
            query.page.page = page;
            for client in store.find(&query).await.unwrap() {
                companies.push(client.company.unwrap());
            }
        }
        assert_eq!(companies, ["c4", "c3", "c2", "c1", "c0"]);
    }
}
