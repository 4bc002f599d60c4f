use sea_orm_migration::{prelude::*, schema::*};

use crate::iden::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Gender is stored uppercase (MALE, FEMALE, OTHER)
        let table = table_auto(Registration::Table)
            .col(string(Registration::Id).primary_key())
            .col(string(Registration::FirstName))
            .col(string(Registration::LastName))
            .col(string(Registration::Phone))
            .col(string_len(Registration::Gender, 10))
            .col(text(Registration::Address))
            .col(boolean(Registration::HasChildren).default(false))
            .col(text(Registration::QrCode))
            .col(timestamp(Registration::Timestamp))
            .col(boolean(Registration::Attended).default(false))
            .to_owned();
        manager.create_table(table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_registration_timestamp")
                    .table(Registration::Table)
                    .col(Registration::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Registration::Table).to_owned())
            .await?;

        Ok(())
    }
}
