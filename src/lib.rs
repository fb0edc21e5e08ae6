pub mod amount;
pub mod csv;
pub mod ledger;
pub mod model;
pub mod service;
pub mod settlement;
pub mod store;

pub use amount::Amount;
pub use ledger::{Balances, Ledger, TripLedgers, aggregate, aggregate_raw};
pub use model::{ParticipantId, RawTransaction, Transaction, TransactionKind, TripId};
pub use service::SettlementService;
pub use settlement::{Settlement, match_balances, settle};
