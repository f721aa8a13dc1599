pub mod auth;
pub mod dashboard_service;
pub mod invoice_service;
pub mod product_service;
pub mod purchase_service;
pub mod supplier_service;
