//! Builder for [`ListingPipeline`].

use std::sync::Arc;

use super::ListingPipeline;
use crate::compliance::{ComplianceBarrier, ComplianceGate};
use crate::config::PipelineConfig;
use crate::dispatch::{Dispatcher, HttpTransport};
use crate::present::{LoggingPresenter, Presenter};
use crate::relay::{DirectOpener, LoggingOpener, MessagingTransport};

/// Wires collaborators into a pipeline.
///
/// Only the configuration is required. Without a compliance gate no verdicts
/// are produced; without an HTTP transport registration reports
/// [`crate::errors::ListflowError::NotConfigured`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    gate: Option<Arc<dyn ComplianceGate>>,
    presenter: Option<Arc<dyn Presenter>>,
    transport: Option<Arc<dyn HttpTransport>>,
    relay: Option<Arc<dyn MessagingTransport>>,
    opener: Option<Arc<dyn DirectOpener>>,
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("config", &self.config)
            .field("gate", &self.gate.is_some())
            .field("presenter", &self.presenter.is_some())
            .field("transport", &self.transport.is_some())
            .field("relay", &self.relay.is_some())
            .finish_non_exhaustive()
    }
}

impl PipelineBuilder {
    /// Creates a builder around a configuration.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Sets the compliance gate.
    #[must_use]
    pub fn compliance(mut self, gate: Arc<dyn ComplianceGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Sets the presenter. Defaults to [`LoggingPresenter`].
    #[must_use]
    pub fn presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Sets the HTTP transport used by the dispatcher.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the messaging relay.
    #[must_use]
    pub fn relay(mut self, relay: Arc<dyn MessagingTransport>) -> Self {
        self.relay = Some(relay);
        self
    }

    /// Sets the direct-action fallback. Defaults to [`LoggingOpener`].
    #[must_use]
    pub fn opener(mut self, opener: Arc<dyn DirectOpener>) -> Self {
        self.opener = Some(opener);
        self
    }

    /// Builds the pipeline. The configuration is frozen from here on.
    #[must_use]
    pub fn build(self) -> ListingPipeline {
        let compliance = self
            .gate
            .map_or_else(ComplianceBarrier::unavailable, ComplianceBarrier::new);

        let dispatcher = self.transport.map(|transport| {
            let dispatcher = Dispatcher::new(&self.config.dispatch, transport);
            match &self.relay {
                Some(relay) => dispatcher.with_relay(relay.clone()),
                None => dispatcher,
            }
        });

        ListingPipeline::from_parts(
            self.config,
            compliance,
            self.presenter
                .unwrap_or_else(|| Arc::new(LoggingPresenter::default())),
            dispatcher,
            self.relay,
            self.opener.unwrap_or_else(|| Arc::new(LoggingOpener)),
        )
    }
}
