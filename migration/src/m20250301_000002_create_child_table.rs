use sea_orm_migration::{prelude::*, schema::*};

use crate::iden::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = table_auto(Child::Table)
            .col(string(Child::Id).primary_key())
            .col(string(Child::RegistrationId))
            .col(integer(Child::Position))
            .col(string(Child::Name))
            .col(string_len(Child::Gender, 10))
            .col(integer(Child::Age))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_child_registration")
                    .from(Child::Table, Child::RegistrationId)
                    .to(Registration::Table, Registration::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .to_owned();
        manager.create_table(table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_child_registration")
                    .table(Child::Table)
                    .col(Child::RegistrationId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Child::Table).to_owned())
            .await?;

        Ok(())
    }
}
