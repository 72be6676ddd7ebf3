use std::collections::BTreeMap;

use proptest::prelude::*;
use tedlt_core::{
    Engine, InvocationContext, Overrides, Profile, ProfileSet, PropertyMap, PropertyValue, Schema,
    TemplateEngine,
};

fn literal_map() -> impl Strategy<Value = PropertyMap> {
    prop::collection::btree_map(
        "[a-z][a-z_.]{0,8}",
        "[^{}]{0,16}".prop_map(PropertyValue::String),
        0..12,
    )
}

/// Keys k0..kn where each value is a literal or references a later key.
fn acyclic_templates() -> impl Strategy<Value = PropertyMap> {
    let spec = (any::<bool>(), "[a-z ]{0,6}", any::<prop::sample::Index>());
    prop::collection::vec(spec, 1..9).prop_map(|specs| {
        let len = specs.len();
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (is_ref, text, target))| {
                let value = if is_ref && i + 1 < len {
                    let j = i + 1 + target.index(len - i - 1);
                    format!("{text}{{{{ k{j} }}}}")
                } else {
                    text
                };
                (format!("k{i}"), PropertyValue::String(value))
            })
            .collect()
    })
}

fn labels() -> impl Strategy<Value = Vec<PropertyValue>> {
    prop::collection::vec("[a-z]{1,6}".prop_map(PropertyValue::String), 0..5)
}

proptest! {
    #[test]
    fn values_without_placeholders_are_unchanged(props in literal_map()) {
        let ctx = InvocationContext::new("t");
        let resolved = TemplateEngine::new(&ctx).resolve(&props).unwrap();
        prop_assert_eq!(resolved, props);
    }

    #[test]
    fn resolution_reaches_a_fixed_point(props in acyclic_templates()) {
        let ctx = InvocationContext::new("t");
        let engine = TemplateEngine::new(&ctx);
        let once = engine.resolve(&props).unwrap();
        let twice = engine.resolve(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn most_specific_layer_wins(
        profile in prop::collection::btree_map("[a-z]{1,4}", "[a-z]{0,4}", 0..8),
        env in prop::collection::btree_map("[a-z]{1,4}", "[a-z]{0,4}", 0..8),
        cli in prop::collection::btree_map("[a-z]{1,4}", "[a-z]{0,4}", 0..8),
    ) {
        let mut work = Profile::new("work").unwrap();
        for (k, v) in &profile {
            work = work.with_property(k.as_str(), v.as_str());
        }
        let set = ProfileSet::new().with_profile(work);
        let schema = Schema::permissive();

        let mut overrides = Overrides::new();
        for (k, v) in &env {
            overrides = overrides.with_env(k.as_str(), v.as_str());
        }
        for (k, v) in &cli {
            overrides = overrides.with_cli(k.as_str(), v.as_str());
        }

        let resolved = Engine::new(&set, &schema)
            .resolve_properties(&["work".to_string()], &InvocationContext::new("t"), &overrides)
            .unwrap();

        let mut expected: BTreeMap<String, String> = profile.clone();
        expected.extend(env.clone());
        expected.extend(cli.clone());

        prop_assert_eq!(resolved.properties.len(), expected.len());
        for (key, value) in expected {
            prop_assert_eq!(&resolved.properties[&key], &PropertyValue::String(value));
        }
    }

    #[test]
    fn lists_accumulate_root_to_leaf(root in labels(), leaf in labels()) {
        let set = ProfileSet::new()
            .with_profile(Profile::new("root").unwrap().with_property("labels", root.clone()))
            .with_profile(
                Profile::new("leaf")
                    .unwrap()
                    .with_parent("root")
                    .with_property("labels", leaf.clone()),
            );
        let schema = Schema::permissive();

        let resolved = Engine::new(&set, &schema)
            .resolve_properties(
                &["leaf".to_string()],
                &InvocationContext::new("t"),
                &Overrides::new(),
            )
            .unwrap();

        let expected: Vec<PropertyValue> = root.into_iter().chain(leaf).collect();
        prop_assert_eq!(&resolved.properties["labels"], &PropertyValue::List(expected));
    }
}
