//! Persistence for registrations and their children.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, LoaderTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::debug;

use super::RegistrationRecord;
use crate::entities::{child, prelude::*, registration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub total: u64,
    pub with_children: u64,
    pub attended: u64,
}

/// Stores a registration and its children in one transaction, then reads it
/// back.
pub async fn insert(
    db: &DatabaseConnection,
    record: &RegistrationRecord,
) -> Result<RegistrationRecord, DbErr> {
    let txn = db.begin().await?;

    let registration_model = registration::ActiveModel {
        id: Set(record.id.clone()),
        first_name: Set(record.first_name.clone()),
        last_name: Set(record.last_name.clone()),
        phone: Set(record.phone.clone()),
        gender: Set(record.gender),
        address: Set(record.address.clone()),
        has_children: Set(record.has_children),
        qr_code: Set(record.qr_code.clone()),
        timestamp: Set(record.created_at()),
        attended: Set(false),
    };
    debug!("Creating registration {}", record.id);
    registration_model.insert(&txn).await?;

    if !record.children.is_empty() {
        let children = record
            .children
            .iter()
            .enumerate()
            .map(|(position, c)| child::ActiveModel {
                id: Set(c.id.clone()),
                registration_id: Set(record.id.clone()),
                position: Set(position as i32),
                name: Set(c.name.clone()),
                gender: Set(c.gender),
                age: Set(c.age),
            });
        Child::insert_many(children).exec_without_returning(&txn).await?;
    }

    txn.commit().await?;

    find_by_id(db, &record.id)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("registration {}", record.id)))
}

/// All registrations, most recent first, children in submission order.
pub async fn list(db: &DatabaseConnection) -> Result<Vec<RegistrationRecord>, DbErr> {
    let registrations = Registration::find()
        .order_by_desc(registration::Column::Timestamp)
        .all(db)
        .await?;
    let children = registrations
        .load_many(
            Child::find().order_by_asc(child::Column::Position),
            db,
        )
        .await?;

    Ok(registrations
        .into_iter()
        .zip(children)
        .map(|(r, c)| RegistrationRecord::from_models(r, c))
        .collect())
}

pub async fn find_by_id(
    db: &DatabaseConnection,
    id: &str,
) -> Result<Option<RegistrationRecord>, DbErr> {
    let registration = Registration::find_by_id(id.to_string()).one(db).await?;
    with_children(db, registration).await
}

/// Looks a registration up by its stored QR value, not its id.
pub async fn find_by_qr_code(
    db: &DatabaseConnection,
    qr_code: &str,
) -> Result<Option<RegistrationRecord>, DbErr> {
    let registration = Registration::find()
        .filter(registration::Column::QrCode.eq(qr_code))
        .one(db)
        .await?;
    with_children(db, registration).await
}

async fn with_children(
    db: &DatabaseConnection,
    registration: Option<registration::Model>,
) -> Result<Option<RegistrationRecord>, DbErr> {
    let Some(registration) = registration else {
        return Ok(None);
    };
    let children = Child::find()
        .filter(child::Column::RegistrationId.eq(registration.id.clone()))
        .order_by_asc(child::Column::Position)
        .all(db)
        .await?;
    Ok(Some(RegistrationRecord::from_models(registration, children)))
}

/// Unconditional overwrite of the attendance flag. `None` when the id is
/// unknown.
pub async fn set_attended(
    db: &DatabaseConnection,
    id: &str,
    attended: bool,
) -> Result<Option<RegistrationRecord>, DbErr> {
    let Some(existing) = Registration::find_by_id(id.to_string()).one(db).await? else {
        return Ok(None);
    };

    let mut registration: registration::ActiveModel = existing.into();
    registration.attended = Set(attended);
    let updated = registration.update(db).await?;
    debug!("Registration {} attended = {}", updated.id, updated.attended);

    with_children(db, Some(updated)).await
}

pub async fn count(db: &DatabaseConnection) -> Result<u64, DbErr> {
    Registration::find().count(db).await
}

pub async fn counts(db: &DatabaseConnection) -> Result<Counts, DbErr> {
    let total = count(db).await?;
    let with_children = Registration::find()
        .filter(registration::Column::HasChildren.eq(true))
        .count(db)
        .await?;
    let attended = Registration::find()
        .filter(registration::Column::Attended.eq(true))
        .count(db)
        .await?;
    Ok(Counts {
        total,
        with_children,
        attended,
    })
}
