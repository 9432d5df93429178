//! Application state.

use std::sync::Arc;

use nocta_core::PackageCatalog;
use nocta_ledger::{
    AuditTrail, PaymentGateway, PayoutWorkflow, SummaryAggregator, TransactionProcessor,
};
use nocta_store::RocksStore;

use crate::config::ServiceConfig;
use crate::gateway::{DisabledGateway, HttpPaymentGateway};

/// Application state shared across handlers.
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Transaction processing.
    pub processor: TransactionProcessor<RocksStore>,

    /// Payout state machine.
    pub payouts: PayoutWorkflow<RocksStore>,

    /// Dashboard rollups.
    pub summaries: SummaryAggregator<RocksStore>,

    /// Privileged action log.
    pub audit: AuditTrail<RocksStore>,
}

impl AppState {
    /// Create application state, wiring the payment gateway from
    /// configuration.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        let gateway: Arc<dyn PaymentGateway> = match (&config.gateway_api_url, &config.gateway_api_key)
        {
            (Some(url), Some(key)) => {
                tracing::info!(gateway_url = %url, "Payment gateway enabled");
                Arc::new(HttpPaymentGateway::new(url, key))
            }
            _ => {
                tracing::warn!("Payment gateway not configured - purchases will be rejected");
                Arc::new(DisabledGateway)
            }
        };

        Self::with_gateway(store, config, gateway)
    }

    /// Create application state with an explicit gateway implementation.
    #[must_use]
    pub fn with_gateway(
        store: Arc<RocksStore>,
        config: ServiceConfig,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let processor = TransactionProcessor::new(
            Arc::clone(&store),
            gateway,
            PackageCatalog::default(),
        );
        let payouts = PayoutWorkflow::new(Arc::clone(&store));
        let summaries = SummaryAggregator::new(Arc::clone(&store));
        let audit = AuditTrail::new(Arc::clone(&store));

        Self {
            store,
            config,
            processor,
            payouts,
            summaries,
            audit,
        }
    }
}
