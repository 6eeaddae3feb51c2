//! The strategy registry.
//!
//! Strategy modules do not register themselves. Each one exposes
//! [`Candidate`]s: a name, a [`Probe`] and a constructor. The composition
//! root offers every candidate to a [`RegistryBuilder`], which probes it
//! once, builds the strategy only if the probe passes, and rejects duplicate
//! names. [`RegistryBuilder::build`] freezes the list into a [`Registry`],
//! which has no mutating methods, so nothing can register once a run starts.
//!
//! Registration order is preserved; it is the order strategies run in and
//! the tie-break order of the final ranking.

use crate::probe::{Availability, Probe};
use crate::runner::output_key;
use crate::strategy::SharedStrategy;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Strategy '{0}' is already registered")]
    DuplicateName(String),
    #[error("Strategy name must not be empty")]
    EmptyName,
    #[error("Strategy '{name}' would write the same output files as '{existing}'")]
    OutputCollision { name: String, existing: String },
}

/// A strategy that may be registered if its prerequisite is met.
pub struct Candidate {
    name: String,
    probe: Probe,
    build: Box<dyn FnOnce() -> SharedStrategy>,
}

impl Candidate {
    pub fn new(
        name: impl Into<String>,
        probe: Probe,
        build: impl FnOnce() -> SharedStrategy + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            probe,
            build: Box::new(build),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn probe(&self) -> &Probe {
        &self.probe
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("name", &self.name)
            .field("probe", &self.probe)
            .finish_non_exhaustive()
    }
}

/// What happened to a candidate offered to the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Registered,
    Unavailable(String),
    Rejected(RegistryError),
}

/// Collects strategies during startup.
#[derive(Default)]
pub struct RegistryBuilder {
    strategies: Vec<SharedStrategy>,
}

impl RegistryBuilder {
    /// Append a strategy.
    ///
    /// Names must be non-empty and unique, and must not map to the same
    /// output file name as an earlier strategy.
    pub fn register(&mut self, strategy: SharedStrategy) -> Result<(), RegistryError> {
        let name = strategy.name();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.strategies.iter().any(|s| s.name() == name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        // Case-insensitive so outputs stay distinct on case-folding filesystems
        let key = output_key(name);
        if let Some(existing) = self
            .strategies
            .iter()
            .find(|s| output_key(s.name()).eq_ignore_ascii_case(&key))
        {
            return Err(RegistryError::OutputCollision {
                name: name.to_string(),
                existing: existing.name().to_string(),
            });
        }
        self.strategies.push(strategy);
        Ok(())
    }

    /// Probe a candidate and register it if available.
    ///
    /// Unavailable and rejected candidates are logged, never fatal.
    pub fn offer(&mut self, candidate: Candidate) -> Registration {
        let Candidate { name, probe, build } = candidate;
        if let Availability::Unavailable(reason) = probe.check() {
            warn!(strategy = %name, "skipping strategy: {reason}");
            return Registration::Unavailable(reason);
        }
        match self.register(build()) {
            Ok(()) => {
                debug!(strategy = %name, "registered strategy");
                Registration::Registered
            }
            Err(e) => {
                warn!(strategy = %name, "rejecting strategy: {e}");
                Registration::Rejected(e)
            }
        }
    }

    pub fn build(self) -> Registry {
        Registry {
            strategies: self.strategies,
        }
    }
}

/// Immutable, ordered set of usable strategies.
#[derive(Clone, Default)]
pub struct Registry {
    strategies: Vec<SharedStrategy>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Offer every candidate in order and freeze the result.
    pub fn from_candidates(candidates: impl IntoIterator<Item = Candidate>) -> Self {
        let mut builder = Self::builder();
        for candidate in candidates {
            builder.offer(candidate);
        }
        builder.build()
    }

    pub fn strategies(&self) -> &[SharedStrategy] {
        &self.strategies
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
