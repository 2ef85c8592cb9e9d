//! Trustline Ledger — Request builders, the
//! [`Ledger`] trait and an in-process permissioned ledger.

pub mod error;
pub mod ledger;
pub mod memory;
pub mod request;

pub use error::LedgerError;
pub use ledger::{Ledger, NymRecord, Transaction, TransactionReceipt};
pub use memory::InMemoryLedger;
pub use request::{
    build_cred_def_request, build_nym_request, build_schema_request, LedgerRequest, Operation,
    SignedRequest, TxnType,
};
