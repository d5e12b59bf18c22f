//! Account module
//!
//! Single-row reads and writes of account balances, plus the read-only
//! account lookup exposed to the gateway.

pub mod models;
pub mod repository;
pub mod service;

pub use models::Account;
pub use repository::AccountRepository;
pub use service::AccountService;
