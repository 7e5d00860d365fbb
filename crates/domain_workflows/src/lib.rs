//! Workflow Domain - Request money, split bills, saved beneficiaries
//!
//! Request/settlement bookkeeping layered on top of the ledger. Paying a
//! request and paying a split-bill share both reduce to exactly the same
//! transfer orchestrator call as a direct transfer; the workflow state
//! (`pending -> paid`, per-participant shares) is orthogonal bookkeeping
//! updated after the transfer commits.

pub mod request;
pub mod split;
pub mod beneficiary;
pub mod ports;
pub mod error;

pub use request::{PaymentRequest, RequestStatus, RequestWorkflow};
pub use split::{BillStatus, Participant, ShareStatus, SplitBill, SplitBillWorkflow};
pub use beneficiary::Beneficiary;
pub use ports::WorkflowStore;
pub use error::WorkflowError;
