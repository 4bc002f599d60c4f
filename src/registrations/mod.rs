//! Registration records as the API sees them, and the rules for turning a
//! create request into one.

pub mod store;

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::entities::{
    child,
    registration,
    sea_orm_active_enums::{ChildGender, Gender},
};
use crate::error::ApiError;
use crate::qr::{PayloadChild, QrPayload};

/// Body of `POST /registrations`. Every field is optional at the wire level
/// so that missing fields surface as a validation error naming them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistration {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub has_children: Option<bool>,
    pub children: Option<Vec<CreateChild>>,
    pub qr_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreateChild {
    pub name: Option<String>,
    pub gender: Option<String>,
    /// A number or numeric text.
    pub age: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub gender: Gender,
    pub address: String,
    pub has_children: bool,
    pub children: Vec<ChildRecord>,
    pub qr_code: String,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
    pub attended: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildRecord {
    pub id: String,
    pub name: String,
    pub gender: ChildGender,
    pub age: i32,
}

fn required(value: Option<String>, name: &'static str, missing: &mut Vec<&'static str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            missing.push(name);
            String::new()
        }
    }
}

/// Leading integer of a number or text, like `parseInt`; 0 when there is none.
fn parse_age(age: Option<&Value>) -> i32 {
    match age {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            let end = s
                .char_indices()
                .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
                .map_or(s.len(), |(i, _)| i);
            s[..end].parse().unwrap_or(0)
        }
        _ => 0,
    }
}

impl CreateRegistration {
    /// Checks the required fields and builds a new, not yet stored record
    /// with a fresh id and creation time. Unknown genders become `other`.
    pub fn into_record(self) -> Result<RegistrationRecord, ApiError> {
        let mut missing = Vec::new();
        let first_name = required(self.first_name, "firstName", &mut missing);
        let last_name = required(self.last_name, "lastName", &mut missing);
        let phone = required(self.phone, "phone", &mut missing);
        let gender = required(self.gender, "gender", &mut missing);
        let address = required(self.address, "address", &mut missing);
        if !missing.is_empty() {
            return Err(ApiError::missing_fields(missing));
        }

        let children = self
            .children
            .unwrap_or_default()
            .into_iter()
            .map(|child| ChildRecord {
                id: Uuid::new_v4().to_string(),
                name: child.name.unwrap_or_default(),
                gender: ChildGender::from_input(child.gender.as_deref().unwrap_or_default()),
                age: parse_age(child.age.as_ref()),
            })
            .collect();

        Ok(RegistrationRecord {
            id: Uuid::new_v4().to_string(),
            first_name,
            last_name,
            phone,
            gender: Gender::from_input(&gender),
            address,
            has_children: self.has_children.unwrap_or(false),
            children,
            qr_code: self.qr_code.unwrap_or_default(),
            timestamp: Utc::now().timestamp_millis(),
            attended: false,
        })
    }
}

impl RegistrationRecord {
    pub fn from_models(model: registration::Model, mut children: Vec<child::Model>) -> Self {
        children.sort_by_key(|c| c.position);
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            phone: model.phone,
            gender: model.gender,
            address: model.address,
            has_children: model.has_children,
            children: children
                .into_iter()
                .map(|c| ChildRecord {
                    id: c.id,
                    name: c.name,
                    gender: c.gender,
                    age: c.age,
                })
                .collect(),
            qr_code: model.qr_code,
            timestamp: model.timestamp.and_utc().timestamp_millis(),
            attended: model.attended,
        }
    }

    pub fn created_at(&self) -> NaiveDateTime {
        chrono::DateTime::from_timestamp_millis(self.timestamp)
            .unwrap_or_default()
            .naive_utc()
    }
}

impl From<&RegistrationRecord> for QrPayload {
    fn from(record: &RegistrationRecord) -> Self {
        QrPayload {
            id: record.id.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            phone: record.phone.clone(),
            gender: record.gender,
            address: record.address.clone(),
            has_children: record.has_children,
            children: record
                .children
                .iter()
                .map(|c| PayloadChild {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    gender: c.gender,
                    age: c.age,
                })
                .collect(),
            timestamp: record.timestamp,
        }
    }
}
