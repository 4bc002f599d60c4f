pub use super::child::Entity as Child;
pub use super::registration::Entity as Registration;
