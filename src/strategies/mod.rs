//! Concrete resize strategies and the composition root that registers them.
//!
//! | Module | Strategies | Native |
//! |---|---|---|
//! | [`native`] | `image` crate filters and fast thumbnailing | yes |
//! | [`external`] | GraphicsMagick, ImageMagick, libvips, libjpeg `djpeg` | no |
//!
//! Strategy modules only expose [`Candidate`]s. [`build_registry`] is the
//! single place that decides which candidates are offered, in which order.
//! Adding a strategy means adding a candidate here; the runner and report
//! never change.

mod calculations;
mod codec;
pub mod external;
pub mod native;
mod tool;

use crate::config::BenchConfig;
use crate::registry::{Candidate, Registry};
use std::time::Duration;
use tracing::warn;

/// Settings baked into every strategy at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategySettings {
    /// Longest thumbnail edge in pixels.
    pub max_edge: u32,
    /// JPEG quality (1-100).
    pub quality: u8,
    /// Deadline for external tools, after which they are killed.
    pub tool_timeout: Option<Duration>,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self::from_config(&BenchConfig::default())
    }
}

impl StrategySettings {
    pub fn from_config(config: &BenchConfig) -> Self {
        Self {
            max_edge: config.thumbnail.max_edge,
            quality: config.thumbnail.quality,
            tool_timeout: config.runner.timeout(),
        }
    }
}

/// Every strategy this build knows about, in registration order.
///
/// Native strategies come first so a run with no external tools installed
/// still has something to compare.
pub fn candidates(settings: &StrategySettings) -> Vec<Candidate> {
    let mut all = native::candidates(settings);
    all.extend(external::candidates(settings));
    all
}

/// Probe the selected candidates and build the registry.
///
/// Candidates filtered out by `[strategies]` are dropped before probing, so
/// a disabled tool produces no "not found" diagnostic.
pub fn build_registry(config: &BenchConfig) -> Registry {
    let all = candidates(&StrategySettings::from_config(config));
    warn_unknown_names(config, &all);
    Registry::from_candidates(
        all.into_iter()
            .filter(|c| config.strategies.allows(c.name())),
    )
}

fn warn_unknown_names(config: &BenchConfig, candidates: &[Candidate]) {
    let known = |name: &str| candidates.iter().any(|c| c.name().eq_ignore_ascii_case(name));
    let selection = &config.strategies;
    for name in selection.only.iter().chain(&selection.disabled) {
        if !known(name) {
            warn!(strategy = %name, "no such strategy");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config() {
        let mut config = BenchConfig::default();
        config.thumbnail.max_edge = 320;
        config.thumbnail.quality = 88;
        config.runner.timeout_secs = 12;

        let settings = StrategySettings::from_config(&config);
        assert_eq!(settings.max_edge, 320);
        assert_eq!(settings.quality, 88);
        assert_eq!(settings.tool_timeout, Some(Duration::from_secs(12)));
    }

    #[test]
    fn candidate_names_are_unique() {
        let all = candidates(&StrategySettings::default());
        let mut names: Vec<&str> = all.iter().map(|c| c.name()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn native_candidates_come_first() {
        let all = candidates(&StrategySettings::default());
        assert_eq!(all[0].name(), "image_nearest");
        assert_eq!(all.last().unwrap().name(), "djpeg_downsample");
    }

    #[test]
    fn registry_always_has_native_strategies() {
        let registry = build_registry(&BenchConfig::default());
        let names = registry.names();
        assert_eq!(
            names[..5],
            [
                "image_nearest",
                "image_triangle",
                "image_catmullrom",
                "image_lanczos3",
                "image_thumbnail"
            ]
        );
    }

    #[test]
    fn registry_respects_only() {
        let mut config = BenchConfig::default();
        config.strategies.only = vec!["image_lanczos3".into(), "image_nearest".into()];
        let registry = build_registry(&config);
        // Registration order, not the order listed in `only`
        assert_eq!(registry.names(), vec!["image_nearest", "image_lanczos3"]);
    }

    #[test]
    fn registry_respects_disabled() {
        let mut config = BenchConfig::default();
        config.strategies.disabled = vec!["image_nearest".into()];
        let registry = build_registry(&config);
        assert!(!registry.names().contains(&"image_nearest"));
    }
}
