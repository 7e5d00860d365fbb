//! Test harness builders
//!
//! Assembles the full service graph over in-memory adapters so a test can
//! say only what it cares about (accounts, PINs, limits) and get working
//! services for everything else.

use std::sync::Arc;

use core_kernel::{Money, UserId};
use domain_gateway::provider::mock::{MemoryGatewayStore, SimulatedProvider};
use domain_gateway::PaymentGateway;
use domain_ledger::ports::mock::MemoryWalletStore;
use domain_ledger::{NullNotificationSink, TransferService};
use domain_schedule::ports::mock::MemoryScheduleStore;
use domain_schedule::ScheduleRunner;
use domain_security::ports::mock::MemorySecurityStore;
use domain_security::{PinHash, PinRecord, SecurityStore, TransactionLimits};
use domain_workflows::ports::mock::MemoryWorkflowStore;
use domain_workflows::{RequestWorkflow, SplitBillWorkflow};

use crate::fixtures::TEST_PIN_COST;

/// Everything a cross-domain test needs, fully wired
pub struct WalletHarness {
    pub transfers: TransferService,
    pub runner: ScheduleRunner,
    pub requests: RequestWorkflow,
    pub splits: SplitBillWorkflow,
    pub gateway: PaymentGateway,
    pub wallet: MemoryWalletStore,
    pub security: Arc<MemorySecurityStore>,
    pub schedules: Arc<MemoryScheduleStore>,
    pub workflows: Arc<MemoryWorkflowStore>,
    pub provider: Arc<SimulatedProvider>,
}

/// Builder for [`WalletHarness`]
#[derive(Default)]
pub struct WalletHarnessBuilder {
    accounts: Vec<(UserId, Money)>,
    pins: Vec<(UserId, String)>,
    limits: Vec<(UserId, TransactionLimits)>,
    provider_secret: Option<Vec<u8>>,
}

impl WalletHarnessBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an account with the given balance
    pub fn with_account(mut self, user: UserId, balance: Money) -> Self {
        self.accounts.push((user, balance));
        self
    }

    /// Sets a transaction PIN for the user
    pub fn with_pin(mut self, user: UserId, pin: impl Into<String>) -> Self {
        self.pins.push((user, pin.into()));
        self
    }

    /// Overrides the user's transfer caps
    pub fn with_limits(mut self, user: UserId, limits: TransactionLimits) -> Self {
        self.limits.push((user, limits));
        self
    }

    /// Overrides the provider signature secret
    pub fn with_provider_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.provider_secret = Some(secret.into());
        self
    }

    /// Assembles the harness
    pub async fn build(self) -> WalletHarness {
        let wallet = MemoryWalletStore::with_accounts(&self.accounts).await;
        let security = Arc::new(MemorySecurityStore::new());
        let schedules = Arc::new(MemoryScheduleStore::new());
        let workflows = Arc::new(MemoryWorkflowStore::new());
        let provider = Arc::new(SimulatedProvider::new());

        for (user, pin) in &self.pins {
            let record = PinRecord::new(PinHash::derive(pin, TEST_PIN_COST));
            security
                .save_pin_record(*user, &record)
                .await
                .expect("mock stores do not fail");
        }
        for (user, limits) in self.limits {
            security.set_limits(user, limits).await;
        }

        let transfers = TransferService::new(
            Arc::new(wallet.clone()),
            security.clone(),
            Arc::new(NullNotificationSink),
        );
        let runner = ScheduleRunner::new(schedules.clone(), transfers.clone());
        let requests = RequestWorkflow::new(workflows.clone(), transfers.clone());
        let splits = SplitBillWorkflow::new(workflows.clone(), transfers.clone());
        let gateway = PaymentGateway::new(
            provider.clone(),
            Arc::new(MemoryGatewayStore::new()),
            transfers.clone(),
            self.provider_secret
                .unwrap_or_else(|| b"test-provider-secret".to_vec()),
        );

        WalletHarness {
            transfers,
            runner,
            requests,
            splits,
            gateway,
            wallet,
            security,
            schedules,
            workflows,
            provider,
        }
    }
}
