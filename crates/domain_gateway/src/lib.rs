//! Gateway Domain - Payment provider integration
//!
//! The wallet treats the payment provider as an opaque collaborator: it
//! creates funding orders, sends signed confirmations when a customer pays,
//! executes payouts to linked bank accounts, and reports payout outcomes
//! through signed webhooks. Everything the provider sends is
//! signature-verified before it can touch a balance, and every
//! provider-initiated mutation carries a reference that makes duplicate
//! delivery a no-op.

pub mod signature;
pub mod provider;
pub mod webhook;
pub mod error;

pub use signature::{hmac_sha256_hex, verify_signature};
pub use provider::{
    DepositConfirmation, GatewayStore, LinkedPayoutAccount, PaymentGateway, PaymentProvider,
    ProviderOrder, SimulatedProvider,
};
pub use webhook::{parse_event, WebhookEvent, WebhookOutcome};
pub use error::GatewayError;
