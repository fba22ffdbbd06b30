mod document_create_table;
mod document_create_uid_idx;

use sqlx_migrator::vec_box;

pub struct Migration;

sqlx_migrator::sqlite_migration!(
    Migration,
    "chronos",
    "m0_1",
    vec_box![],
    vec_box![
        document_create_table::Operation,
        document_create_uid_idx::Operation
    ]
);
