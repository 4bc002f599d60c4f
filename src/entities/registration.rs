use sea_orm::entity::prelude::*;

use super::sea_orm_active_enums::Gender;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "registration")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub gender: Gender,
    #[sea_orm(column_type = "Text")]
    pub address: String,
    pub has_children: bool,
    #[sea_orm(column_type = "Text")]
    pub qr_code: String,
    pub timestamp: DateTime,
    pub attended: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::child::Entity")]
    Child,
}

impl Related<super::child::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Child.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
