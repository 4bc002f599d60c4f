//! The three-step registration wizard.
//!
//! Step 1 collects identity (names, phone, gender), step 2 the address and
//! whether children come along, step 3 the children themselves. The wizard
//! only moves forward when the current step validates; moving back is always
//! allowed and clears errors. The final step produces the body for
//! `POST /registrations`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::entities::sea_orm_active_enums::{ChildGender, Gender};
use crate::registrations::{CreateChild, CreateRegistration};

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+]?[(]?[0-9]{1,4}[)]?[-\s.]?[(]?[0-9]{1,4}[)]?[-\s.]?[0-9]{1,9}$")
        .expect("phone pattern should compile")
});

pub const MAX_CHILD_AGE: i32 = 18;

/// Loose international phone shape: optional `+`, up to two bracketed or
/// separated groups of 1-4 digits, then 1-9 digits.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Identity = 1,
    Household = 2,
    Children = 3,
}

impl Step {
    fn next(self) -> Self {
        match self {
            Step::Identity => Step::Household,
            Step::Household | Step::Children => Step::Children,
        }
    }

    fn previous(self) -> Self {
        match self {
            Step::Identity | Step::Household => Step::Identity,
            Step::Children => Step::Household,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildEntry {
    pub id: String,
    pub name: String,
    pub gender: Option<ChildGender>,
    /// Raw text as typed; parsed on validation.
    pub age: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub gender: Option<Gender>,
    pub address: String,
    has_children: bool,
    children: Vec<ChildEntry>,
}

impl FormData {
    pub fn has_children(&self) -> bool {
        self.has_children
    }

    pub fn children(&self) -> &[ChildEntry] {
        &self.children
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildErrors {
    pub name: Option<&'static str>,
    pub gender: Option<&'static str>,
    pub age: Option<&'static str>,
}

impl ChildErrors {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.gender.is_none() && self.age.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub first_name: Option<&'static str>,
    pub last_name: Option<&'static str>,
    pub phone: Option<&'static str>,
    pub gender: Option<&'static str>,
    pub address: Option<&'static str>,
    pub has_children: Option<&'static str>,
    /// Keyed by the child's position in the list.
    pub children: BTreeMap<usize, ChildErrors>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.gender.is_none()
            && self.address.is_none()
            && self.has_children.is_none()
            && self.children.is_empty()
    }

    fn merge(&mut self, other: FormErrors) {
        self.first_name = self.first_name.or(other.first_name);
        self.last_name = self.last_name.or(other.last_name);
        self.phone = self.phone.or(other.phone);
        self.gender = self.gender.or(other.gender);
        self.address = self.address.or(other.address);
        self.has_children = self.has_children.or(other.has_children);
        self.children.extend(other.children);
    }
}

pub fn validate_step(data: &FormData, step: Step) -> FormErrors {
    let mut errors = FormErrors::default();
    match step {
        Step::Identity => {
            if data.first_name.trim().is_empty() {
                errors.first_name = Some("First name is required");
            }
            if data.last_name.trim().is_empty() {
                errors.last_name = Some("Last name is required");
            }
            if data.phone.trim().is_empty() {
                errors.phone = Some("Phone is required");
            } else if !is_valid_phone(&data.phone) {
                errors.phone = Some("Phone number is not valid");
            }
            if data.gender.is_none() {
                errors.gender = Some("Select a gender");
            }
        }
        Step::Household => {
            if data.address.trim().is_empty() {
                errors.address = Some("Address is required");
            }
        }
        Step::Children if data.has_children => {
            if data.children.is_empty() {
                errors.has_children = Some("Add at least one child");
            }
            for (idx, child) in data.children.iter().enumerate() {
                let child_errors = validate_child(child);
                if !child_errors.is_empty() {
                    errors.children.insert(idx, child_errors);
                }
            }
        }
        Step::Children => {}
    }
    errors
}

fn validate_child(child: &ChildEntry) -> ChildErrors {
    let mut errors = ChildErrors::default();
    if child.name.trim().is_empty() {
        errors.name = Some("Name is required");
    }
    if child.gender.is_none() {
        errors.gender = Some("Gender is required");
    }
    match child.age.trim().parse::<i32>() {
        Ok(age) if (0..=MAX_CHILD_AGE).contains(&age) => {}
        _ => errors.age = Some("Age must be between 0 and 18"),
    }
    errors
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildField {
    Name(String),
    Gender(Option<ChildGender>),
    Age(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("the form can only be submitted from the last step")]
    NotOnFinalStep,

    #[error("the form has validation errors")]
    Invalid(FormErrors),
}

#[derive(Debug, Clone)]
pub struct RegistrationForm {
    step: Step,
    data: FormData,
    errors: FormErrors,
}

impl Default for RegistrationForm {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self {
            step: Step::Identity,
            data: FormData::default(),
            errors: FormErrors::default(),
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut FormData {
        &mut self.data
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    /// Advances when the current step validates. Returns whether it moved.
    pub fn next(&mut self) -> bool {
        self.errors = validate_step(&self.data, self.step);
        if !self.errors.is_empty() {
            return false;
        }
        self.step = self.step.next();
        true
    }

    pub fn back(&mut self) {
        self.step = self.step.previous();
        self.errors = FormErrors::default();
    }

    /// Turning the flag off discards any children already entered.
    pub fn set_has_children(&mut self, has_children: bool) {
        self.data.has_children = has_children;
        if !has_children {
            self.data.children.clear();
            self.errors.children.clear();
        }
    }

    pub fn add_child(&mut self) -> String {
        let id = Uuid::new_v4().to_string();
        self.data.children.push(ChildEntry {
            id: id.clone(),
            ..Default::default()
        });
        id
    }

    /// Errors on later children shift down with them.
    pub fn remove_child(&mut self, id: &str) {
        let Some(index) = self.data.children.iter().position(|c| c.id == id) else {
            return;
        };
        self.data.children.remove(index);
        self.errors.children = std::mem::take(&mut self.errors.children)
            .into_iter()
            .filter(|(i, _)| *i != index)
            .map(|(i, errors)| if i > index { (i - 1, errors) } else { (i, errors) })
            .collect();
    }

    pub fn update_child(&mut self, id: &str, field: ChildField) {
        let Some(child) = self.data.children.iter_mut().find(|c| c.id == id) else {
            return;
        };
        match field {
            ChildField::Name(name) => child.name = name,
            ChildField::Gender(gender) => child.gender = gender,
            ChildField::Age(age) => child.age = age,
        }
    }

    /// Re-validates every step and builds the create request.
    pub fn submit(&mut self) -> Result<CreateRegistration, SubmitError> {
        if self.step != Step::Children {
            return Err(SubmitError::NotOnFinalStep);
        }

        let mut errors = FormErrors::default();
        for step in [Step::Identity, Step::Household, Step::Children] {
            errors.merge(validate_step(&self.data, step));
        }
        self.errors = errors.clone();
        if !errors.is_empty() {
            return Err(SubmitError::Invalid(errors));
        }

        let data = &self.data;
        let gender = data.gender.unwrap_or(Gender::Other);
        Ok(CreateRegistration {
            first_name: Some(data.first_name.trim().to_string()),
            last_name: Some(data.last_name.trim().to_string()),
            phone: Some(data.phone.trim().to_string()),
            gender: Some(gender_input(gender).to_string()),
            address: Some(data.address.trim().to_string()),
            has_children: Some(data.has_children),
            children: Some(
                data.children
                    .iter()
                    .map(|child| CreateChild {
                        name: Some(child.name.trim().to_string()),
                        gender: child
                            .gender
                            .map(|g| child_gender_input(g).to_string()),
                        age: child.age.trim().parse::<i32>().ok().map(Into::into),
                    })
                    .collect(),
            ),
            qr_code: None,
        })
    }
}

fn gender_input(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "male",
        Gender::Female => "female",
        Gender::Other => "other",
    }
}

fn child_gender_input(gender: ChildGender) -> &'static str {
    match gender {
        ChildGender::Male => "male",
        ChildGender::Female => "female",
    }
}
