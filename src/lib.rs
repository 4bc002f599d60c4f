pub mod auth;
pub mod config;
pub mod database;
pub mod entities;
pub mod error;
pub mod form;
pub mod qr;
pub mod registrations;
pub mod router;
pub mod routes;
