// Core services
pub mod authors;
pub mod billing;
pub mod books;
pub mod inventory;
pub mod returns;
pub mod schools;
pub mod transfers;

// Re-export services for convenience
pub use authors::AuthorService;
pub use billing::BillingService;
pub use books::BookService;
pub use inventory::InventoryService;
pub use returns::ReturnService;
pub use schools::SchoolService;
pub use transfers::TransferService;
