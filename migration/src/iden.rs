use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
pub enum Registration {
    Table,
    Id,
    FirstName,
    LastName,
    Phone,
    Gender,
    Address,
    HasChildren,
    QrCode,
    Timestamp,
    Attended,
}

#[derive(DeriveIden)]
pub enum Child {
    Table,
    Id,
    RegistrationId,
    Position,
    Name,
    Gender,
    Age,
}
