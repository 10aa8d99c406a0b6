//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod occurrence;
pub mod recurring_template;

// Re-export specific types to avoid conflicts
pub use occurrence::{Column as OccurrenceColumn, Entity as Occurrence, Model as OccurrenceModel};
pub use recurring_template::{
    Column as RecurringTemplateColumn, Entity as RecurringTemplate, Model as RecurringTemplateModel,
};
