use chronos_db::table::Document as DocumentTable;
use chronos_shared::{Collection, Document, Fields, Filter, Op, apply_fields, matches_all};
use sea_query::{Expr, ExprTrait, Order, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use serde_json::Value;
use sqlx::{SqlitePool, prelude::FromRow};
use time::OffsetDateTime;
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::{CHANGE_CAPACITY, DocumentStore};

#[derive(FromRow)]
struct DocumentRow {
    id: String,
    data: String,
}

#[derive(FromRow)]
struct DataRow {
    data: String,
}

/// Documents persisted as JSON text in the `document` table.
///
/// SQL narrows on collection and owner; the remaining filters run on the
/// decoded body so any field can be queried.
#[derive(Clone)]
pub struct SqliteStore {
    read_db: SqlitePool,
    write_db: SqlitePool,
    changes: broadcast::Sender<Collection>,
}

impl SqliteStore {
    pub fn new(read_db: SqlitePool, write_db: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);

        Self {
            read_db,
            write_db,
            changes,
        }
    }

    fn notify(&self, collection: Collection) {
        let _ = self.changes.send(collection);
    }
}

fn owner(fields: &Fields) -> Option<String> {
    fields.get("uid").and_then(Value::as_str).map(str::to_owned)
}

fn owner_filter(filters: &[Filter]) -> Option<&str> {
    filters
        .iter()
        .find(|f| f.field == "uid" && f.op == Op::Eq)
        .and_then(|f| f.value.as_str())
}

#[async_trait::async_trait]
impl DocumentStore for SqliteStore {
    async fn query(
        &self,
        collection: Collection,
        filters: &[Filter],
    ) -> chronos_shared::Result<Vec<Document>> {
        let mut statement = Query::select()
            .columns([DocumentTable::Id, DocumentTable::Data])
            .from(DocumentTable::Table)
            .and_where(Expr::col(DocumentTable::Collection).eq(collection.as_ref()))
            .order_by(DocumentTable::Id, Order::Asc)
            .to_owned();

        if let Some(uid) = owner_filter(filters) {
            statement.and_where(Expr::col(DocumentTable::Uid).eq(uid));
        }

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let rows = sqlx::query_as_with::<_, DocumentRow, _>(&sql, values)
            .fetch_all(&self.read_db)
            .await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let fields: Fields = serde_json::from_str(&row.data)?;
            if matches_all(filters, &fields) {
                docs.push(Document::new(row.id, fields));
            }
        }

        Ok(docs)
    }

    async fn create(
        &self,
        collection: Collection,
        fields: Fields,
    ) -> chronos_shared::Result<String> {
        let id = Ulid::new().to_string();
        let statement = Query::insert()
            .into_table(DocumentTable::Table)
            .columns([
                DocumentTable::Collection,
                DocumentTable::Id,
                DocumentTable::Uid,
                DocumentTable::Data,
                DocumentTable::CreatedAt,
            ])
            .values_panic([
                collection.to_string().into(),
                id.to_owned().into(),
                owner(&fields).into(),
                serde_json::to_string(&fields)?.into(),
                OffsetDateTime::now_utc().unix_timestamp().into(),
            ])
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        sqlx::query_with(&sql, values)
            .execute(&self.write_db)
            .await?;

        self.notify(collection);

        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> chronos_shared::Result<()> {
        let mut tx = self.write_db.begin().await?;

        let statement = Query::select()
            .column(DocumentTable::Data)
            .from(DocumentTable::Table)
            .and_where(Expr::col(DocumentTable::Collection).eq(collection.as_ref()))
            .and_where(Expr::col(DocumentTable::Id).eq(id))
            .limit(1)
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let Some(row) = sqlx::query_as_with::<_, DataRow, _>(&sql, values)
            .fetch_optional(&mut *tx)
            .await?
        else {
            chronos_shared::not_found!("{collection}/{id}");
        };

        let mut current: Fields = serde_json::from_str(&row.data)?;
        apply_fields(&mut current, &fields);

        let statement = Query::update()
            .table(DocumentTable::Table)
            .value(DocumentTable::Uid, owner(&current))
            .value(DocumentTable::Data, serde_json::to_string(&current)?)
            .value(
                DocumentTable::UpdatedAt,
                OffsetDateTime::now_utc().unix_timestamp(),
            )
            .and_where(Expr::col(DocumentTable::Collection).eq(collection.as_ref()))
            .and_where(Expr::col(DocumentTable::Id).eq(id))
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        sqlx::query_with(&sql, values).execute(&mut *tx).await?;
        tx.commit().await?;

        self.notify(collection);

        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> chronos_shared::Result<()> {
        let statement = Query::delete()
            .from_table(DocumentTable::Table)
            .and_where(Expr::col(DocumentTable::Collection).eq(collection.as_ref()))
            .and_where(Expr::col(DocumentTable::Id).eq(id))
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let res = sqlx::query_with(&sql, values)
            .execute(&self.write_db)
            .await?;

        if res.rows_affected() > 0 {
            self.notify(collection);
        }

        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<Collection> {
        self.changes.subscribe()
    }
}
