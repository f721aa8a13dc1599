// src/handlers.rs

pub mod auth;
pub mod dashboard;
pub mod invoices;
pub mod purchases;
pub mod stock;
pub mod suppliers;
