use sea_query::{ColumnDef, Index, Table, TableCreateStatement, TableDropStatement};

use crate::table::Document;

pub struct Operation;

fn create_table() -> TableCreateStatement {
    Table::create()
        .table(Document::Table)
        .col(
            ColumnDef::new(Document::Collection)
                .string()
                .not_null()
                .string_len(32),
        )
        .col(
            ColumnDef::new(Document::Id)
                .string()
                .not_null()
                .string_len(26),
        )
        .col(ColumnDef::new(Document::Uid).string().null())
        .col(ColumnDef::new(Document::Data).text().not_null())
        .col(ColumnDef::new(Document::CreatedAt).big_integer().not_null())
        .col(ColumnDef::new(Document::UpdatedAt).big_integer().null())
        .primary_key(
            Index::create()
                .col(Document::Collection)
                .col(Document::Id),
        )
        .to_owned()
}

fn drop_table() -> TableDropStatement {
    Table::drop().table(Document::Table).to_owned()
}

#[async_trait::async_trait]
impl sqlx_migrator::Operation<sqlx::Sqlite> for Operation {
    async fn up(
        &self,
        connection: &mut sqlx::SqliteConnection,
    ) -> Result<(), sqlx_migrator::Error> {
        let statement = create_table().to_string(sea_query::SqliteQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }

    async fn down(
        &self,
        connection: &mut sqlx::SqliteConnection,
    ) -> Result<(), sqlx_migrator::Error> {
        let statement = drop_table().to_string(sea_query::SqliteQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }
}
