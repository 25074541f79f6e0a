// src/config/flags.rs

//! Build flags: the environment-style switches that pick the operating mode,
//! the pipeline selector and timing instrumentation.
//!
//! Resolution never fails. Absent or malformed booleans read as `false` and
//! an unrecognised `BUILD_ONLY` selects every pipeline.

use std::collections::BTreeMap;

use crate::cli::CliArgs;
use crate::types::{BuildMode, TargetSelector};

pub const BUILD_ONLY: &str = "BUILD_ONLY";
pub const BUILD_SERVE: &str = "BUILD_SERVE";
pub const BUILD_WATCH: &str = "BUILD_WATCH";
pub const WITH_TIMINGS: &str = "WITH_TIMINGS";

/// Where raw flag values come from.
pub trait FlagSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads flags from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvFlags;

impl FlagSource for EnvFlags {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl FlagSource for BTreeMap<&str, &str> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).map(|v| v.to_string())
    }
}

/// CLI switches layered over a fallback source.
///
/// Boolean switches only ever turn a flag on; leaving one off defers to the
/// fallback.
pub struct LayeredFlags<'a> {
    args: &'a CliArgs,
    fallback: &'a dyn FlagSource,
}

impl<'a> LayeredFlags<'a> {
    pub fn new(args: &'a CliArgs, fallback: &'a dyn FlagSource) -> Self {
        Self { args, fallback }
    }
}

impl FlagSource for LayeredFlags<'_> {
    fn get(&self, key: &str) -> Option<String> {
        let cli = match key {
            BUILD_ONLY => self.args.only.map(|t| t.as_flag().to_string()),
            BUILD_SERVE if self.args.serve => Some("true".to_string()),
            BUILD_WATCH if self.args.watch => Some("true".to_string()),
            WITH_TIMINGS if self.args.timings => Some("true".to_string()),
            _ => None,
        };
        cli.or_else(|| self.fallback.get(key))
    }
}

/// Immutable result of flag resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildFlags {
    pub mode: BuildMode,
    pub target: TargetSelector,
    pub timed: bool,
}

impl BuildFlags {
    /// `BUILD_SERVE` wins over `BUILD_WATCH`; neither means `Release`.
    pub fn resolve(source: &dyn FlagSource) -> Self {
        let serve = flag_is_set(source, BUILD_SERVE);
        let watch = flag_is_set(source, BUILD_WATCH);

        let mode = if serve {
            BuildMode::Serve
        } else if watch {
            BuildMode::Watch
        } else {
            BuildMode::Release
        };

        Self {
            mode,
            target: TargetSelector::from_flag(source.get(BUILD_ONLY).as_deref()),
            timed: flag_is_set(source, WITH_TIMINGS),
        }
    }
}

fn flag_is_set(source: &dyn FlagSource, key: &str) -> bool {
    source.get(key).is_some_and(|v| parse_bool(&v))
}

/// Lenient boolean parsing: anything other than a truthy word is `false`.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
