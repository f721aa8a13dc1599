pub mod auth;
pub mod dashboard;
pub mod invoice;
pub mod product;
pub mod purchase;
pub mod supplier;
pub mod tenancy;
