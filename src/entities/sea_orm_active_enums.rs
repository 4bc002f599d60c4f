use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attendee gender. Stored uppercase, serialized lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[sea_orm(string_value = "MALE")]
    Male,
    #[sea_orm(string_value = "FEMALE")]
    Female,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

impl Gender {
    /// Maps free-form input onto a gender, falling back to `Other` for
    /// anything unrecognized.
    pub fn from_input(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum ChildGender {
    #[sea_orm(string_value = "MALE")]
    Male,
    #[sea_orm(string_value = "FEMALE")]
    Female,
}

impl ChildGender {
    /// Anything other than "male" is recorded as female.
    pub fn from_input(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("male") {
            ChildGender::Male
        } else {
            ChildGender::Female
        }
    }
}
