use crate::aggregate::aggregate;
use crate::error::{RaterError, Result};
use crate::fetch::Services;
use crate::links::LinkResolver;
use crate::metrics::Registry;
use crate::runner::Runner;
use crate::types::artifact::ArtifactDescriptor;
use crate::types::config::RaterConfig;
use crate::types::scoring::{ScoreReport, WeightTable};

/// Registry, weights and worker pool, validated together once at startup.
pub struct Engine {
    registry: Registry,
    weights: WeightTable,
    runner: Runner,
    links: Option<LinkResolver>,
}

impl Engine {
    pub fn new(registry: Registry, weights: WeightTable, workers: usize) -> Result<Self> {
        if let Some(key) = registry
            .keys()
            .into_iter()
            .find(|key| weights.get(key).is_none())
        {
            return Err(RaterError::MissingWeight(key.to_string()));
        }
        if registry.is_empty() {
            tracing::warn!("no metrics registered; every net score will be 0.0");
        }
        Ok(Self {
            registry,
            weights,
            runner: Runner::new(workers)?,
            links: None,
        })
    }

    /// Resolve README-declared code and dataset links before the fan-out.
    pub fn with_link_resolver(mut self, resolver: LinkResolver) -> Self {
        self.links = Some(resolver);
        self
    }

    /// Standard scorers over live HTTP/subprocess collaborators.
    pub fn from_config(cfg: &RaterConfig) -> Result<Self> {
        let services = Services::from_config(cfg)?;
        let engine = Self::new(
            Registry::standard(&services)?,
            cfg.weight_table()?,
            cfg.engine.workers,
        )?;
        if cfg.engine.resolve_links {
            Ok(engine.with_link_resolver(LinkResolver::new(services.hub, services.judge)))
        } else {
            Ok(engine)
        }
    }

    pub fn rate(&self, artifact: &ArtifactDescriptor) -> ScoreReport {
        let artifact = &self
            .links
            .as_ref()
            .map_or_else(|| artifact.clone(), |links| links.resolve(artifact));
        tracing::info!(
            name = %artifact.name,
            url = %artifact.source_url,
            metrics = self.registry.len(),
            "rating artifact"
        );
        let results = self.runner.run(&self.registry, artifact);
        let report = aggregate(results, &self.weights);
        tracing::info!(
            name = %artifact.name,
            net_score = report.net_score,
            latency_ms = report.net_latency_ms,
            "rating complete"
        );
        report
    }
}
