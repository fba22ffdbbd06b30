use sea_query::Iden;

#[derive(Iden, Clone)]
pub enum Document {
    Table,
    Collection,
    Id,
    Uid,
    Data,
    CreatedAt,
    UpdatedAt,
}
