pub mod prelude;

pub mod child;
pub mod registration;
pub mod sea_orm_active_enums;
