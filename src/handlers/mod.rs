pub mod authors;
pub mod billing;
pub mod books;
pub mod inventory;
pub mod returns;
pub mod schools;
pub mod transfers;
pub mod users;

use crate::auth::AuthService;
use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub authors: Arc<crate::services::authors::AuthorService>,
    pub books: Arc<crate::services::books::BookService>,
    pub schools: Arc<crate::services::schools::SchoolService>,
    pub inventory: Arc<crate::services::inventory::InventoryService>,
    pub transfers: Arc<crate::services::transfers::TransferService>,
    pub returns: Arc<crate::services::returns::ReturnService>,
    pub billing: Arc<crate::services::billing::BillingService>,
    pub auth: Arc<AuthService>,
}

impl AppServices {
    /// Build the AppServices container from shared infrastructure
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        auth_service: Arc<AuthService>,
    ) -> Self {
        let authors = Arc::new(crate::services::authors::AuthorService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let books = Arc::new(crate::services::books::BookService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let schools = Arc::new(crate::services::schools::SchoolService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let inventory = Arc::new(crate::services::inventory::InventoryService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let transfers = Arc::new(crate::services::transfers::TransferService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let returns = Arc::new(crate::services::returns::ReturnService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let billing = Arc::new(crate::services::billing::BillingService::new(
            db_pool,
            event_sender,
        ));

        Self {
            authors,
            books,
            schools,
            inventory,
            transfers,
            returns,
            billing,
            auth: auth_service,
        }
    }
}
