//! Integration tests for loadweave-core.
//!
//! These tests drive a full orchestrator through the host-facing API with
//! small in-test weaving and generation collaborators.

use std::borrow::Cow;
use std::sync::Arc;

use loadweave_core::{
    BcsClassCodec, ClassCodec, Environment, Generation, GenerationService, Phase, PhaseAction,
    PhaseResult, PhaseVeto, SyntheticClassInfo, SyntheticKind, TransformError, TransformerConfig,
    TransformerCore, WeaveContext, WeaveOutcome, WeavingError, WeavingService,
};
use loadweave_types::{ClassTree, CompatibilityLevel, Member, MemberKind};
use rayon::prelude::*;

/// Injects a `mixin` method into every target whose simple name starts with
/// `Mixed`, using donor `mix.Core` and, for `MixedBoth*`, also `mix.Extra`.
struct PrefixWeaver;

impl WeavingService for PrefixWeaver {
    fn apply(
        &self,
        ctx: &WeaveContext<'_>,
        tree: &mut ClassTree,
    ) -> Result<WeaveOutcome, WeavingError> {
        let simple = tree.simple_name().to_string();
        if !simple.starts_with("Mixed") {
            return Ok(WeaveOutcome::unchanged());
        }
        let body = ctx
            .donors
            .get("mix.Core")
            .map(|donor| donor.version.to_le_bytes().to_vec())
            .unwrap_or_default();
        tree.add_member(Member::method("mixin", "()V").with_body(body));

        let mut donors = vec!["mix.Core"];
        if simple.starts_with("MixedBoth") {
            donors.push("mix.Extra");
        }
        Ok(WeaveOutcome::modified_by(donors))
    }

    fn audit(&self, environment: &Environment) -> Result<(), WeavingError> {
        if environment.label() == "broken" {
            return Err(WeavingError::service("donor index unavailable"));
        }
        Ok(())
    }
}

/// Produces a minimal unit for names ending in `Foo`, and a unit with the
/// wrong identity for names ending in `Liar`. Both register a synthetic entry.
struct FooGenerator;

impl GenerationService for FooGenerator {
    fn generate(
        &self,
        ctx: &WeaveContext<'_>,
        name: &str,
        tree: &mut ClassTree,
    ) -> Result<Generation, WeavingError> {
        if name.ends_with("Foo") {
            tree.add_member(Member::method("<init>", "()V"));
            ctx.register_synthetic(SyntheticClassInfo::new(
                name,
                SyntheticKind::Other("foo".into()),
                "FooGenerator",
            ));
            return Ok(Generation::Produced);
        }
        if name.ends_with("Liar") {
            ctx.register_synthetic(SyntheticClassInfo::new(
                name,
                SyntheticKind::Other("liar".into()),
                "FooGenerator",
            ));
            *tree = ClassTree::new("pkg.SomeoneElse", tree.version);
            return Ok(Generation::Produced);
        }
        Ok(Generation::Declined)
    }
}

/// Breaks the unit in `post_apply` for targets named `*Doomed`.
struct DuplicateInjector;

impl Phase for DuplicateInjector {
    fn name(&self) -> &str {
        "duplicate-injector"
    }

    fn pre_apply(&self, ctx: &WeaveContext<'_>, tree: &mut ClassTree) -> PhaseResult {
        if ctx.target.ends_with("Doomed") {
            tree.members.push(Member::field("twice", "I"));
            tree.members.push(Member::field("twice", "I"));
            return Ok(PhaseAction::Modified);
        }
        Ok(PhaseAction::Unchanged)
    }
}

/// Vetoes any target whose name contains `Forbidden`.
struct Gate;

impl Phase for Gate {
    fn name(&self) -> &str {
        "gate"
    }

    fn post_apply(&self, ctx: &WeaveContext<'_>, _tree: &mut ClassTree) -> PhaseResult {
        if ctx.target.contains("Forbidden") {
            return Err(PhaseVeto::new("target is forbidden"));
        }
        Ok(PhaseAction::Unchanged)
    }
}

fn orchestrator() -> TransformerCore {
    TransformerCore::builder(Arc::new(Environment::default()))
        .weaver(PrefixWeaver)
        .generator(FooGenerator)
        .phase(DuplicateInjector)
        .phase(Gate)
        .build()
        .expect("fresh environment")
}

fn unit(name: &str) -> Vec<u8> {
    BcsClassCodec
        .encode(&ClassTree::new(name, 52).with_member(Member::field("value", "I")))
        .expect("encode")
}

fn decode(bytes: &[u8]) -> ClassTree {
    BcsClassCodec.decode(bytes).expect("decode")
}

/// Test the passthrough law for unnamed requests, including garbage bytes.
#[test]
fn test_unnamed_request_is_passthrough() {
    let core = orchestrator();
    for bytes in [b"".to_vec(), b"not a unit".to_vec(), unit("pkg.MixedA")] {
        let out = core.transform(None, Some(&bytes)).unwrap();
        assert_eq!(out.as_deref(), Some(&bytes[..]));
    }
    assert_eq!(core.transform(None, None).unwrap(), None);
    assert!(core.reload_coordinator().index().is_empty());
}

/// Test that an unmodified unit comes back byte-for-byte, without re-encoding.
#[test]
fn test_unmodified_unit_is_returned_verbatim() {
    let core = orchestrator();
    let original = unit("pkg.Plain");

    let out = core.transform(Some("pkg.Plain"), Some(&original)).unwrap();
    match out {
        Some(Cow::Borrowed(bytes)) => assert!(std::ptr::eq(bytes, &original[..])),
        other => panic!("expected borrowed original bytes, got {other:?}"),
    }
}

/// Test round-trip stability: feeding unchanged output back is idempotent.
#[test]
fn test_retransforming_unchanged_output_is_stable() {
    let core = orchestrator();
    let original = unit("pkg.Plain");

    let first = core
        .transform(Some("pkg.Plain"), Some(&original))
        .unwrap()
        .unwrap()
        .into_owned();
    let second = core
        .transform(Some("pkg.Plain"), Some(&first))
        .unwrap()
        .unwrap()
        .into_owned();
    assert_eq!(first, original);
    assert_eq!(second, first);
}

/// Test that a woven unit decodes to the fully woven tree.
#[test]
fn test_modified_unit_is_fully_woven() {
    let core = orchestrator();
    let original = unit("pkg.MixedA");

    let out = core
        .transform(Some("pkg.MixedA"), Some(&original))
        .unwrap()
        .unwrap();
    assert!(matches!(out, Cow::Owned(_)));

    let tree = decode(&out);
    assert_eq!(tree.name(), "pkg.MixedA");
    assert!(tree.find_member(MemberKind::Field, "value").is_some());
    assert!(tree.find_member(MemberKind::Method, "mixin").is_some());
}

/// Test that a failing phase never leaks a half-woven unit and is scoped to its call.
#[test]
fn test_failures_never_return_partial_units() {
    let core = orchestrator();

    let doomed = unit("pkg.MixedDoomed");
    let err = core
        .transform(Some("pkg.MixedDoomed"), Some(&doomed))
        .unwrap_err();
    assert!(err.is_veto(), "duplicate members should be vetoed: {err}");
    assert!(err.to_string().contains("check-members"));

    let forbidden = unit("pkg.MixedForbidden");
    let err = core
        .transform(Some("pkg.MixedForbidden"), Some(&forbidden))
        .unwrap_err();
    assert!(matches!(
        err,
        TransformError::Weaving {
            source: WeavingError::Vetoed { ref phase, .. },
            ..
        } if phase == "gate"
    ));

    // Neither failure was recorded as a successful target.
    assert!(core
        .reload("mix.Core", ClassTree::new("mix.Core", 52))
        .is_empty());

    // Other units still load.
    let ok = unit("pkg.MixedB");
    assert!(core.transform(Some("pkg.MixedB"), Some(&ok)).is_ok());
}

/// Test the generation example: names ending in "Foo" are produced.
#[test]
fn test_generate_produces_requested_name() {
    let core = orchestrator();

    let bytes = core.transform(Some("pkg.Foo"), None).unwrap().unwrap();
    let tree = decode(&bytes);
    assert_eq!(tree.name(), "pkg.Foo");
    assert_eq!(tree.version, 52);
    assert_eq!(tree.super_name.as_deref(), Some("core.Object"));
    assert!(tree.find_member(MemberKind::Method, "<init>").is_some());
    assert!(core.synthetic_classes().contains("pkg.Foo"));
}

/// Test that declined names produce the explicit "not produced" sentinel.
#[test]
fn test_generate_declined_is_not_an_error() {
    let core = orchestrator();
    assert_eq!(core.transform(Some("pkg.Bar"), None).unwrap(), None);
    assert_eq!(core.generate("pkg.Bar").unwrap(), None);
}

/// Test that a generator can never hand back bytes for a different name.
#[test]
fn test_generate_rejects_wrong_identity() {
    let core = orchestrator();
    let err = core.generate("pkg.Liar").unwrap_err();
    assert!(matches!(
        err,
        TransformError::Generation {
            source: WeavingError::IdentityChanged { .. },
            ..
        }
    ));
    assert!(!core.synthetic_classes().contains("pkg.Liar"));
}

/// Test that a vetoed generation leaves no synthetic entry behind, so a later
/// request for the same name starts clean.
#[test]
fn test_failed_generation_publishes_no_synthetic_units() {
    let core = orchestrator();

    let err = core.transform(Some("pkg.ForbiddenFoo"), None).unwrap_err();
    assert!(err.is_veto());
    let mut stub = core.empty_tree("pkg.ForbiddenFoo");
    assert!(core.generate_into("pkg.ForbiddenFoo", &mut stub).is_err());
    assert!(core.synthetic_classes().is_empty());

    core.generate("pkg.Foo").unwrap().unwrap();
    assert_eq!(
        core.synthetic_classes()
            .entries()
            .iter()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>(),
        vec!["pkg.Foo"]
    );
}

/// Test that loaded units newer than the environment's level are left alone.
#[test]
fn test_untouched_unit_above_compatibility_level_is_verbatim() {
    let core = orchestrator();
    let original = BcsClassCodec
        .encode(&ClassTree::new("pkg.Modern", 61))
        .unwrap();

    let out = core.transform(Some("pkg.Modern"), Some(&original)).unwrap();
    match out {
        Some(Cow::Borrowed(bytes)) => assert!(std::ptr::eq(bytes, &original[..])),
        other => panic!("expected borrowed original bytes, got {other:?}"),
    }

    let woven = BcsClassCodec
        .encode(&ClassTree::new("pkg.MixedModern", 61))
        .unwrap();
    let tree = decode(
        &core
            .transform(Some("pkg.MixedModern"), Some(&woven))
            .unwrap()
            .unwrap(),
    );
    assert_eq!(tree.version, 61);
}

/// Test that a phase clashing with a default name fails construction without
/// claiming the environment.
#[test]
fn test_duplicate_phase_name_fails_build() {
    struct Impostor;

    impl Phase for Impostor {
        fn name(&self) -> &str {
            "check-identity"
        }
    }

    let env = Arc::new(Environment::default());
    let err = TransformerCore::builder(env.clone())
        .phase(Impostor)
        .build()
        .unwrap_err();
    match err {
        TransformError::DuplicatePhase { ref name } => assert_eq!(name, "check-identity"),
        other => panic!("expected DuplicatePhase, got {other}"),
    }
    assert_eq!(err.unit_name(), None);
    assert!(env.active_orchestrator().is_none());

    let err = TransformerCore::builder(env.clone())
        .phase(Gate)
        .phase(Gate)
        .build()
        .unwrap_err();
    assert!(matches!(err, TransformError::DuplicatePhase { ref name } if name == "gate"));

    assert!(TransformerCore::builder(env).phase(Gate).build().is_ok());
}

/// Test that the environment's level, not the config's, stamps generated units.
#[test]
fn test_environment_level_wins_over_config_level() {
    let env = Arc::new(Environment::default());
    let core = TransformerCore::builder(env)
        .generator(FooGenerator)
        .config(TransformerConfig {
            compatibility_level: CompatibilityLevel::new(61),
            ..TransformerConfig::default()
        })
        .build()
        .unwrap();

    assert_eq!(core.config().compatibility_level, CompatibilityLevel::new(61));
    assert_eq!(core.empty_tree("gen.Foo").version, 52);
    let tree = decode(&core.generate("gen.Foo").unwrap().unwrap());
    assert_eq!(tree.version, 52);

    let seeded = Environment::from_config(&TransformerConfig {
        compatibility_level: CompatibilityLevel::new(61),
        ..TransformerConfig::default()
    });
    assert_eq!(seeded.compatibility_level(), CompatibilityLevel::new(61));
}

/// Test that generated units target the environment's compatibility level.
#[test]
fn test_generate_uses_compatibility_level() {
    let env = Arc::new(Environment::new(CompatibilityLevel::new(61)));
    let core = TransformerCore::builder(env)
        .generator(FooGenerator)
        .config(TransformerConfig::default().with_default_super_type("base.Root"))
        .build()
        .unwrap();

    let tree = decode(&core.generate("gen.Foo").unwrap().unwrap());
    assert_eq!(tree.version, 61);
    assert_eq!(tree.super_name.as_deref(), Some("base.Root"));
}

/// Test that a second orchestrator always fails, even after the first is dropped.
#[test]
fn test_second_orchestrator_is_rejected() {
    let env = Arc::new(Environment::default().with_label("app"));
    let first = TransformerCore::builder(env.clone()).build().unwrap();
    let first_id = first.id();
    drop(first);

    let err = TransformerCore::builder(env.clone()).build().unwrap_err();
    match err {
        TransformError::AlreadyActive {
            environment,
            existing,
        } => {
            assert_eq!(environment, "app");
            assert_eq!(existing.id, first_id);
        }
        other => panic!("expected AlreadyActive, got {other}"),
    }
}

/// Test that concurrent construction has exactly one winner.
#[test]
fn test_concurrent_construction_single_winner() {
    let env = Arc::new(Environment::default());
    let results: Vec<_> = (0..32)
        .into_par_iter()
        .map(|_| TransformerCore::builder(env.clone()).build())
        .collect();

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(
        env.active_orchestrator().map(|a| a.id),
        Some(winners[0].id())
    );
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, TransformError::AlreadyActive { .. })));
}

/// Test reload on a donor no target ever used.
#[test]
fn test_reload_unknown_donor_is_empty() {
    let core = orchestrator();
    assert!(core
        .reload("mix.Unused", ClassTree::new("mix.Unused", 52))
        .is_empty());
}

/// Test reload returns every successful target once, in first-transform order.
#[test]
fn test_reload_returns_targets_in_transform_order() {
    let core = orchestrator();
    for name in ["pkg.MixedC", "pkg.MixedBothA", "pkg.Plain", "pkg.MixedC", "pkg.MixedA"] {
        let bytes = unit(name);
        core.transform(Some(name), Some(&bytes)).unwrap();
    }

    assert_eq!(
        core.reload("mix.Core", ClassTree::new("mix.Core", 52)),
        vec!["pkg.MixedC", "pkg.MixedBothA", "pkg.MixedA"]
    );
    assert_eq!(
        core.reload("mix.Extra", ClassTree::new("mix.Extra", 52)),
        vec!["pkg.MixedBothA"]
    );
}

/// Test that a reloaded donor is visible when its targets are retransformed.
#[test]
fn test_reloaded_donor_reaches_weaver() {
    let core = orchestrator();
    let original = unit("pkg.MixedA");
    core.transform(Some("pkg.MixedA"), Some(&original)).unwrap();

    let targets = core.reload("mix.Core", ClassTree::new("mix.Core", 61));
    assert_eq!(targets, vec!["pkg.MixedA"]);

    let out = core
        .transform(Some("pkg.MixedA"), Some(&original))
        .unwrap()
        .unwrap();
    let tree = decode(&out);
    let mixin = tree.find_member(MemberKind::Method, "mixin").unwrap();
    assert_eq!(mixin.body, 61u32.to_le_bytes().to_vec());
}

/// Test that concurrent transforms of distinct targets lose no reload entries.
#[test]
fn test_concurrent_transforms_record_every_target() {
    let core = orchestrator();
    let names: Vec<String> = (0..200).map(|i| format!("pkg.MixedN{i}")).collect();

    names.par_iter().for_each(|name| {
        let bytes = unit(name);
        let out = core.transform(Some(name), Some(&bytes)).unwrap().unwrap();
        assert_eq!(decode(&out).name(), name);
    });

    let mut targets = core.reload("mix.Core", ClassTree::new("mix.Core", 52));
    assert_eq!(targets.len(), 200);
    targets.sort();
    targets.dedup();
    assert_eq!(targets.len(), 200);
}

/// Test that audit routes to the weaving collaborator.
#[test]
fn test_audit_routes_to_weaver() {
    let core = orchestrator();
    assert!(core.audit(&Environment::default()).is_ok());

    let err = core
        .audit(&Environment::default().with_label("broken"))
        .unwrap_err();
    assert!(matches!(err, TransformError::Audit { .. }));
    assert!(core.reload_coordinator().index().is_empty());
}

/// Test that every woven or generated unit is exported when configured.
#[test]
fn test_export_dir_receives_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let core = TransformerCore::builder(Arc::new(Environment::default()))
        .config(TransformerConfig::default().with_export_dir(dir.path()))
        .weaver(PrefixWeaver)
        .generator(FooGenerator)
        .build()
        .unwrap();

    let bytes = unit("pkg.MixedA");
    core.transform(Some("pkg.MixedA"), Some(&bytes)).unwrap();
    core.transform(Some("pkg.Foo"), None).unwrap();
    let plain = unit("pkg.Plain");
    core.transform(Some("pkg.Plain"), Some(&plain)).unwrap();

    assert!(dir.path().join("pkg.MixedA.json").exists());
    assert!(dir.path().join("pkg.Foo.json").exists());
    assert!(!dir.path().join("pkg.Plain.json").exists());
}

/// Test that a unit name with path components never writes outside the export dir.
#[test]
fn test_export_ignores_names_escaping_the_dir() {
    let dir = tempfile::tempdir().unwrap();
    let export_dir = dir.path().join("exports");
    let core = TransformerCore::builder(Arc::new(Environment::default()))
        .config(TransformerConfig::default().with_export_dir(&export_dir))
        .generator(FooGenerator)
        .build()
        .unwrap();

    let bytes = core.transform(Some("../Foo"), None).unwrap().unwrap();
    assert_eq!(decode(&bytes).name(), "../Foo");
    assert!(!dir.path().join("Foo.json").exists());
    assert!(!export_dir.exists());

    core.transform(Some("pkg.Foo"), None).unwrap();
    assert!(export_dir.join("pkg.Foo.json").exists());
}
