#![doc = "The `workmarket` library crate."]
#![doc = ""]
#![doc = "This crate contains the domain models, the approval workflow engine,"]
#![doc = "authentication mechanisms, routing configuration, and error handling for"]
#![doc = "the WorkMarket services-marketplace backend. It is used by the main binary"]
#![doc = "(`main.rs`) and the `create_admin` seeding binary."]

pub mod approval;
pub mod auth;
pub mod config;
pub mod error;
pub mod mailer;
pub mod models;
pub mod paths;
pub mod routes;
