mod common;
use crate::common::init_tracing;

use std::collections::BTreeMap;

use proptest::prelude::*;

use assetpipe::cli::{CliArgs, OnlyTarget};
use assetpipe::config::{BuildFlags, LayeredFlags};
use assetpipe::types::{BuildMode, PipelineKind, TargetSelector};

fn resolve(pairs: &[(&'static str, &'static str)]) -> BuildFlags {
    let env: BTreeMap<&str, &str> = pairs.iter().copied().collect();
    BuildFlags::resolve(&env)
}

#[test]
fn no_flags_means_release_of_everything() {
    init_tracing();

    let flags = resolve(&[]);
    assert_eq!(flags.mode, BuildMode::Release);
    assert_eq!(flags.target, TargetSelector::All);
    assert!(!flags.timed);
}

#[test]
fn serve_takes_precedence_over_watch() {
    init_tracing();

    let flags = resolve(&[("BUILD_WATCH", "true"), ("BUILD_SERVE", "true")]);
    assert_eq!(flags.mode, BuildMode::Serve);
    assert!(flags.mode.is_watching());
    assert!(flags.mode.live_reload());
}

#[test]
fn build_only_selects_a_single_pipeline() {
    init_tracing();

    let css = resolve(&[("BUILD_ONLY", "css")]);
    assert_eq!(css.target.pipelines(), &[PipelineKind::Style]);

    let js = resolve(&[("BUILD_ONLY", "javascript")]);
    assert_eq!(js.target.pipelines(), &[PipelineKind::Script]);

    let unknown = resolve(&[("BUILD_ONLY", "images")]);
    assert_eq!(unknown.target, TargetSelector::All);
}

#[test]
fn malformed_booleans_read_as_false() {
    init_tracing();

    let flags = resolve(&[("BUILD_WATCH", "maybe"), ("WITH_TIMINGS", "")]);
    assert_eq!(flags.mode, BuildMode::Release);
    assert!(!flags.timed);
}

#[test]
fn cli_switches_override_the_environment() {
    init_tracing();

    let env: BTreeMap<&str, &str> = [("BUILD_ONLY", "javascript"), ("WITH_TIMINGS", "1")]
        .into_iter()
        .collect();
    let args = CliArgs {
        only: Some(OnlyTarget::Css),
        watch: true,
        ..CliArgs::default()
    };

    let flags = BuildFlags::resolve(&LayeredFlags::new(&args, &env));
    assert_eq!(flags.mode, BuildMode::Watch);
    assert_eq!(flags.target, TargetSelector::StyleOnly);
    // Not given on the CLI, so the environment still applies.
    assert!(flags.timed);
}

fn bool_word() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![
        Just(None),
        Just(Some("true")),
        Just(Some("TRUE")),
        Just(Some("1")),
        Just(Some("false")),
        Just(Some("0")),
        Just(Some("no")),
        Just(Some("garbage")),
    ]
}

fn truthy(v: Option<&str>) -> bool {
    matches!(v, Some("true" | "TRUE" | "1"))
}

proptest! {
    #[test]
    fn mode_follows_serve_then_watch(serve in bool_word(), watch in bool_word()) {
        let mut env: BTreeMap<&str, &str> = BTreeMap::new();
        if let Some(v) = serve {
            env.insert("BUILD_SERVE", v);
        }
        if let Some(v) = watch {
            env.insert("BUILD_WATCH", v);
        }

        let expected = if truthy(serve) {
            BuildMode::Serve
        } else if truthy(watch) {
            BuildMode::Watch
        } else {
            BuildMode::Release
        };
        prop_assert_eq!(BuildFlags::resolve(&env).mode, expected);
    }
}
