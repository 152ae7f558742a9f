//! End-to-end resolution tests: platform directive blocks, release-track
//! broadcast, uses-from-macos decisions, and resource scoping.

use formulary_core::{
    ConfigurationError, Dependency, DependencyTag, Formula, Manifest, Milestone, PlatformContext,
    ResolveError, Resolver, StripLevel, SystemDependency,
};

const TEST_SHA256: &str = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

fn sierra() -> PlatformContext {
    PlatformContext::macos(Milestone::Sierra.version())
}

fn dependency_names(spec: &formulary_core::VariantSpec) -> Vec<&str> {
    spec.dependencies().iter().map(|d| d.name.as_str()).collect()
}

#[test]
fn test_system_item_is_provided_when_version_meets_threshold() {
    let formula = Formula::define("foo", |f| {
        f.url("https://example.com/foo-1.0.tar.gz");
        f.uses_from_macos(SystemDependency::new("foo").since(Milestone::ElCapitan));
    });

    let resolved = Resolver::new(&sierra()).resolve(&formula).unwrap();
    for (_, spec) in resolved.tracks() {
        assert!(spec.dependencies().is_empty());
        assert_eq!(spec.provided_by_platform(), ["foo"]);
    }
}

#[test]
fn test_system_item_falls_back_to_dependency_below_threshold() {
    let formula = Formula::define("foo", |f| {
        f.url("https://example.com/foo-1.0.tar.gz");
        f.uses_from_macos(SystemDependency::new("foo").since(Milestone::HighSierra));
    });

    let resolved = Resolver::new(&sierra()).resolve(&formula).unwrap();
    for (_, spec) in resolved.tracks() {
        assert_eq!(dependency_names(spec), vec!["foo"]);
        assert!(spec.provided_by_platform().is_empty());
    }
}

#[test]
fn test_system_item_at_the_exact_threshold_version_is_provided() {
    let formula = Formula::define("foo", |f| {
        f.url("https://example.com/foo-1.0.tar.gz");
        f.uses_from_macos(SystemDependency::new("zlib").since(Milestone::Sierra));
    });

    let resolved = Resolver::new(&sierra()).resolve(&formula).unwrap();
    for (_, spec) in resolved.tracks() {
        assert!(spec.dependencies().is_empty());
        assert_eq!(spec.provided_by_platform(), ["zlib"]);
    }
}

#[test]
fn test_system_item_without_threshold_is_provided_on_any_macos() {
    let formula = Formula::define("foo", |f| {
        f.uses_from_macos("zlib");
    });

    let resolved = Resolver::new(&PlatformContext::macos_unversioned())
        .resolve(&formula)
        .unwrap();
    assert!(resolved.stable().is_provided_by_platform("zlib"));
    assert!(resolved.stable().dependencies().is_empty());
}

#[test]
fn test_system_item_is_an_ordinary_dependency_on_linux() {
    let formula = Formula::define("foo", |f| {
        f.uses_from_macos(SystemDependency::new("foo").since(Milestone::ElCapitan));
    });

    let resolved = Resolver::new(&PlatformContext::linux())
        .resolve(&formula)
        .unwrap();
    for (_, spec) in resolved.tracks() {
        assert_eq!(dependency_names(spec), vec!["foo"]);
        assert!(spec.provided_by_platform().is_empty());
    }
}

#[test]
fn test_system_item_is_an_ordinary_dependency_on_unknown_platforms() {
    let formula = Formula::define("foo", |f| {
        f.uses_from_macos("zlib");
    });

    let resolved = Resolver::new(&PlatformContext::unknown())
        .resolve(&formula)
        .unwrap();
    assert_eq!(dependency_names(resolved.stable()), vec!["zlib"]);
}

#[test]
fn test_system_item_fallback_keeps_its_tags() {
    let formula = Formula::define("foo", |f| {
        f.uses_from_macos(SystemDependency::new("bison").with_tag(DependencyTag::Build));
    });

    let resolved = Resolver::new(&PlatformContext::linux())
        .resolve(&formula)
        .unwrap();
    let dependency = &resolved.stable().dependencies()[0];
    assert_eq!(dependency.name, "bison");
    assert!(dependency.is_build());
}

#[test]
fn test_platform_blocks_select_the_url_for_the_context() {
    let formula = Formula::define("foo", |f| {
        f.homepage("https://example.com/foo");
        f.on_macos(|f| {
            f.url("https://example.com/foo-macos.tar.gz");
            f.sha256(TEST_SHA256);
        });
        f.on_linux(|f| {
            f.url("https://example.com/foo-linux.tar.gz");
            f.sha256(TEST_SHA256);
        });
    });

    let on_macos = Resolver::new(&sierra()).resolve(&formula).unwrap();
    assert_eq!(on_macos.stable().url(), Some("https://example.com/foo-macos.tar.gz"));

    let on_linux = Resolver::new(&PlatformContext::linux())
        .resolve(&formula)
        .unwrap();
    assert_eq!(on_linux.stable().url(), Some("https://example.com/foo-linux.tar.gz"));

    let elsewhere = Resolver::new(&PlatformContext::unknown())
        .resolve(&formula)
        .unwrap();
    assert_eq!(elsewhere.stable().url(), None);
}

#[test]
fn test_platform_scoped_dependencies_keep_authored_order() {
    let formula = Formula::define("foo", |f| {
        f.url("https://example.com/foo-1.0.tar.gz");
        f.depends_on("hello_both");
        f.on_macos(|f| {
            f.depends_on("hello_macos");
        });
        f.on_linux(|f| {
            f.depends_on("hello_linux");
        });
    });

    let on_macos = Resolver::new(&sierra()).resolve(&formula).unwrap();
    assert_eq!(
        dependency_names(on_macos.stable()),
        vec!["hello_both", "hello_macos"]
    );

    let on_linux = Resolver::new(&PlatformContext::linux())
        .resolve(&formula)
        .unwrap();
    assert_eq!(
        dependency_names(on_linux.stable()),
        vec!["hello_both", "hello_linux"]
    );
}

#[test]
fn test_platform_scoped_patches_keep_authored_order_and_default_strip() {
    let formula = Formula::define("foo", |f| {
        f.url("https://example.com/foo-1.0.tar.gz");
        f.patch("https://example.com/patch_both.diff");
        f.on_macos(|f| {
            f.patch("https://example.com/patch_macos.diff");
        });
        f.on_linux(|f| {
            f.patch("https://example.com/patch_linux.diff");
        });
    });

    let resolved = Resolver::new(&sierra()).resolve(&formula).unwrap();
    let patches = resolved.stable().patches();
    assert_eq!(patches.len(), 2);
    assert_eq!(patches[0].url, "https://example.com/patch_both.diff");
    assert_eq!(patches[1].url, "https://example.com/patch_macos.diff");
    assert!(patches.iter().all(|p| p.strip == StripLevel::P1));
}

#[test]
fn test_resource_honors_its_own_platform_blocks() {
    let formula = Formula::define("foo", |f| {
        f.url("https://example.com/foo-1.0.tar.gz");
        f.sha256(TEST_SHA256);
        f.resource("test_resource", |r| {
            r.on_macos(|r| {
                r.url("https://example.com/resource_macos.tar.gz");
            });
            r.on_linux(|r| {
                r.url("https://example.com/resource_linux.tar.gz");
            });
        });
    });

    let resolved = Resolver::new(&sierra()).resolve(&formula).unwrap();
    let resources: Vec<_> = resolved.stable().resources().collect();
    assert_eq!(resources.len(), 1);
    assert_eq!(
        resources[0].url(),
        Some("https://example.com/resource_macos.tar.gz")
    );
}

#[test]
fn test_resource_bodies_stay_out_of_variant_lists() {
    let formula = Formula::define("foo", |f| {
        f.url("https://example.com/foo-1.0.tar.gz");
        f.resource("docs", |r| {
            r.url("https://example.com/docs.tar.gz");
            r.sha256(TEST_SHA256);
        });
    });

    let resolved = Resolver::new(&sierra()).resolve(&formula).unwrap();
    let stable = resolved.stable();
    assert!(stable.dependencies().is_empty());
    assert!(stable.patches().is_empty());
    assert_eq!(stable.sha256(), None);
    assert_eq!(stable.resource("docs").unwrap().sha256(), Some(TEST_SHA256));
}

#[test]
fn test_sibling_blocks_for_the_same_family_concatenate() {
    let formula = Formula::define("foo", |f| {
        f.on_macos(|f| {
            f.depends_on("first");
        });
        f.on_macos(|f| {
            f.depends_on("second");
        });
    });

    let resolved = Resolver::new(&sierra()).resolve(&formula).unwrap();
    assert_eq!(dependency_names(resolved.stable()), vec!["first", "second"]);
}

#[test]
fn test_track_blocks_narrow_the_broadcast() {
    let formula = Formula::define("foo", |f| {
        f.url("https://example.com/foo-1.0.tar.gz");
        f.devel(|f| {
            f.url("https://example.com/foo-1.1-beta.tar.gz");
            f.sha256(TEST_SHA256);
        });
        f.head(|f| {
            f.url("https://example.com/foo.git");
        });
    });

    let resolved = Resolver::new(&sierra()).resolve(&formula).unwrap();
    assert_eq!(resolved.stable().url(), Some("https://example.com/foo-1.0.tar.gz"));
    assert_eq!(resolved.devel().url(), Some("https://example.com/foo-1.1-beta.tar.gz"));
    assert_eq!(resolved.head().url(), Some("https://example.com/foo.git"));
    assert_eq!(resolved.devel().sha256(), Some(TEST_SHA256));
    assert_eq!(resolved.stable().sha256(), None);
}

#[test]
fn test_resolution_is_idempotent() {
    let formula = Formula::define("foo", |f| {
        f.url("https://example.com/foo-1.0.tar.gz");
        f.uses_from_macos(SystemDependency::new("zlib").since(Milestone::Sierra));
        f.on_linux(|f| {
            f.depends_on("openssl");
        });
    });

    let context = sierra();
    let resolver = Resolver::new(&context);
    let first = resolver.resolve(&formula).unwrap();
    let second = resolver.resolve(&formula).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_versioned_threshold_on_unversioned_macos_fails_loudly() {
    let formula = Formula::define("foo", |f| {
        f.uses_from_macos(SystemDependency::new("curl").since(Milestone::Mojave));
    });

    let err = Resolver::new(&PlatformContext::macos_unversioned())
        .resolve(&formula)
        .unwrap_err();
    assert_eq!(err.formula(), "foo");
    assert!(matches!(err, ResolveError::Predicate { .. }));
}

#[test]
fn test_name_cannot_be_both_dependency_and_provided() {
    let formula = Formula::define("foo", |f| {
        f.depends_on("zlib");
        f.uses_from_macos("zlib");
    });

    let err = Resolver::new(&sierra()).resolve(&formula).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Configuration {
            source: ConfigurationError::DependencyAlsoProvided { .. },
            ..
        }
    ));
}

#[test]
fn test_conflicting_urls_in_sibling_blocks_for_the_same_family() {
    let formula = Formula::define("foo", |f| {
        f.on_macos(|f| {
            f.url("https://example.com/one.tar.gz");
        });
        f.on_macos(|f| {
            f.url("https://example.com/two.tar.gz");
        });
    });

    let err = Resolver::new(&sierra()).resolve(&formula).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Configuration {
            source: ConfigurationError::ConflictingUrl { .. },
            ..
        }
    ));

    // On Linux neither block executes, so there is nothing to collide.
    assert!(Resolver::new(&PlatformContext::linux()).resolve(&formula).is_ok());
}

#[test]
fn test_checksum_with_no_url_is_rejected_on_every_platform() {
    let formula = Formula::define("foo", |f| {
        f.sha256(TEST_SHA256);
    });

    for context in [
        sierra(),
        PlatformContext::linux(),
        PlatformContext::unknown(),
    ] {
        let err = Resolver::new(&context).resolve(&formula).unwrap_err();
        assert!(
            matches!(
                err,
                ResolveError::Configuration {
                    source: ConfigurationError::ChecksumWithoutUrl,
                    ..
                }
            ),
            "context {context}"
        );
    }
}

#[test]
fn test_mirrors_accumulate_in_order() {
    let formula = Formula::define("foo", |f| {
        f.url("https://example.com/foo-1.0.tar.gz");
        f.mirror("https://mirror-a.example.com/foo-1.0.tar.gz");
        f.mirror("https://mirror-b.example.com/foo-1.0.tar.gz");
    });

    let resolved = Resolver::new(&sierra()).resolve(&formula).unwrap();
    assert_eq!(
        resolved.stable().mirrors(),
        [
            "https://mirror-a.example.com/foo-1.0.tar.gz",
            "https://mirror-b.example.com/foo-1.0.tar.gz",
        ]
    );
}

#[test]
fn test_build_tags_are_excluded_from_runtime_view() {
    let formula = Formula::define("foo", |f| {
        f.depends_on(Dependency::new("pkg-config").with_tag(DependencyTag::Build));
        f.depends_on("openssl");
    });

    let resolved = Resolver::new(&sierra()).resolve(&formula).unwrap();
    let runtime: Vec<&str> = resolved
        .stable()
        .runtime_dependencies()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(runtime, vec!["openssl"]);
}

#[test]
fn test_manifest_resolves_differently_per_context() {
    let manifest = Manifest::parse(
        r#"
        [formula]
        name = "wget"
        description = "Internet file retriever"
        url = "https://example.com/wget-1.24.tar.gz"
        sha256 = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef"

        [[uses-from-macos]]
        name = "zlib"

        [[on]]
        family = "linux"

        [[on.dependencies]]
        name = "openssl@3"
        "#,
    )
    .unwrap();
    let formula = manifest.into_formula().unwrap();

    let on_macos = formula
        .resolve(&PlatformContext::macos(Milestone::Ventura.version()))
        .unwrap();
    assert!(on_macos.stable().is_provided_by_platform("zlib"));
    assert!(dependency_names(on_macos.stable()).is_empty());

    let on_linux = formula.resolve(&PlatformContext::linux()).unwrap();
    assert_eq!(
        dependency_names(on_linux.stable()),
        vec!["zlib", "openssl@3"]
    );
    assert!(on_linux.stable().provided_by_platform().is_empty());
}

#[test]
fn test_resolved_formula_serializes_to_json() {
    let formula = Formula::define("foo", |f| {
        f.description("A test formula");
        f.url("https://example.com/foo-1.0.tar.gz");
        f.sha256(TEST_SHA256);
        f.depends_on("zlib");
    });

    let resolved = Resolver::new(&sierra()).resolve(&formula).unwrap();
    let value = serde_json::to_value(&resolved).unwrap();

    assert_eq!(value["name"], "foo");
    assert_eq!(value["description"], "A test formula");
    assert_eq!(value["stable"]["url"], "https://example.com/foo-1.0.tar.gz");
    assert_eq!(value["stable"]["dependencies"][0]["name"], "zlib");
}
