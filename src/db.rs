pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod invoice_repo;
pub use invoice_repo::InvoiceRepository;
pub mod purchase_repo;
pub use purchase_repo::PurchaseRepository;
pub mod supplier_repo;
pub use supplier_repo::SupplierRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
#[cfg(test)]
pub(crate) mod testing;
