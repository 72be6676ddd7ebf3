//! End-to-end resolution over the shared fixture documents

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use tedlt_core::{
    ConfigDocument, Configuration, DocumentFormat, Engine, Error, ErrorKind, InvocationContext,
    Origin, Overrides, PropertyValue,
};

const TEAM: &str = include_str!("../../../test-fixtures/configs/tedlt.toml");
const PERSONAL: &str = include_str!("../../../test-fixtures/configs/personal.yaml");
const MINIMAL: &str = include_str!("../../../test-fixtures/configs/minimal.jsonc");
const CYCLIC: &str = include_str!("../../../test-fixtures/configs/cyclic.toml");
const INVALID: &str = include_str!("../../../test-fixtures/configs/invalid.toml");

fn load(docs: &[(&str, DocumentFormat)]) -> Configuration {
    Configuration::from_documents(docs.iter().map(|(content, format)| {
        ConfigDocument::parse(content, *format).expect("fixture parses")
    }))
}

fn team() -> Configuration {
    load(&[(TEAM, DocumentFormat::Toml)])
}

fn context(title: &str) -> InvocationContext {
    InvocationContext::new(title).at(Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap())
}

fn select(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn list(items: &[&str]) -> PropertyValue {
    PropertyValue::List(items.iter().map(|s| PropertyValue::from(*s)).collect())
}

mod pipeline {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bug_profile_resolves_through_work() {
        let config = team();
        let schema = config.effective_schema(false);
        let resolution = Engine::new(&config.profiles, &schema)
            .resolve(&select(&["bug"]), &context("Fix login"), &Overrides::new())
            .expect("bug resolves");

        let request = &resolution.request;
        assert_eq!(resolution.chain, vec!["work", "bug"]);
        assert_eq!(request.field("issuetype.id"), Some(&PropertyValue::from("10004")));
        assert_eq!(request.field("labels"), Some(&list(&["tedlt", "bug"])));
        assert_eq!(request.field("project.key"), Some(&PropertyValue::from("WORK")));
        assert_eq!(request.jira_url(), Some("https://example.atlassian.net"));
        assert_eq!(resolution.origins["priority.name"], Origin::Profile("bug".into()));
    }

    #[test]
    fn default_profile_is_used_without_selection() {
        let config = team();
        let schema = config.effective_schema(false);
        let resolution = Engine::new(&config.profiles, &schema)
            .resolve(&[], &context("Chore"), &Overrides::new())
            .unwrap();

        assert_eq!(resolution.chain, vec!["work"]);
        assert_eq!(resolution.request.field("labels"), Some(&list(&["tedlt", "work"])));
        assert_eq!(
            resolution.request.field("priority.name"),
            Some(&PropertyValue::from("Medium"))
        );
        assert_eq!(resolution.origins["priority.name"], Origin::SchemaDefault);
    }

    #[test]
    fn context_date_and_nested_references() {
        let config = team();
        let schema = config.effective_schema(false);
        let resolution = Engine::new(&config.profiles, &schema)
            .resolve(
                &select(&["epic-child"]),
                &context("Child story"),
                &Overrides::new(),
            )
            .unwrap();

        assert_eq!(
            resolution.request.field("description"),
            Some(&PropertyValue::from("Created on 2024-03-09 for WORK-1"))
        );
        assert_eq!(
            resolution.request.field("parent.key"),
            Some(&PropertyValue::from("WORK-1"))
        );
    }

    #[test]
    fn payload_matches_issue_creation_shape() {
        let config = team();
        let schema = config.effective_schema(false);
        let resolution = Engine::new(&config.profiles, &schema)
            .resolve(&select(&["bug"]), &context("Fix login"), &Overrides::new())
            .unwrap();

        let payload = resolution.request.to_payload().unwrap();
        assert_eq!(
            payload,
            json!({
                "fields": {
                    "summary": "Fix login",
                    "project": { "key": "WORK" },
                    "issuetype": { "id": "10004" },
                    "priority": { "name": "High" },
                    "labels": ["tedlt", "bug"]
                }
            })
        );

        let fields = payload["fields"].as_object().unwrap();
        assert!(!fields.contains_key("jira_url"));
        assert!(!fields.contains_key("project_key"));
        assert!(!fields.contains_key("issueTypes"));
    }

    #[test]
    fn overrides_win_over_profiles() {
        let config = team();
        let schema = config.effective_schema(false);
        let overrides = Overrides::from_env([("TEDLT_PRIORITY__NAME", "Low")])
            .with_cli("project_key", "OPS")
            .with_cli("issueTypes.bug", "10009");
        let resolution = Engine::new(&config.profiles, &schema)
            .resolve(&select(&["bug"]), &context("Fix login"), &overrides)
            .unwrap();
        let request = &resolution.request;

        assert_eq!(request.field("priority.name"), Some(&PropertyValue::from("Low")));
        assert_eq!(resolution.origins["priority.name"], Origin::Env);
        assert_eq!(request.field("project.key"), Some(&PropertyValue::from("OPS")));
        // derived keys pick up the override before templates run
        assert_eq!(request.field("issuetype.id"), Some(&PropertyValue::from("10009")));
    }

    #[test]
    fn malformed_jira_url_is_a_violation() {
        let config = team();
        let schema = config.effective_schema(false);
        let err = Engine::new(&config.profiles, &schema)
            .resolve(
                &select(&["bug"]),
                &context("Fix login"),
                &Overrides::new().with_cli("jira_url", "example atlassian"),
            )
            .unwrap_err();

        let Error::Validation(report) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(report.len(), 1);
        assert_eq!(report.violations()[0].field(), "jira_url");
        assert_eq!(report.violations()[0].kind(), ErrorKind::TypeMismatch);
    }
}

mod layering {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn personal_overlay_adds_profile_and_base_property() {
        let config = load(&[(TEAM, DocumentFormat::Toml), (PERSONAL, DocumentFormat::Yaml)]);
        let schema = config.effective_schema(false);
        let resolution = Engine::new(&config.profiles, &schema)
            .resolve(
                &select(&["mine"]),
                &context("Mine").with_env_var("USER", "alice"),
                &Overrides::new(),
            )
            .unwrap();
        let request = &resolution.request;

        assert_eq!(resolution.chain, vec!["work", "bug", "mine"]);
        assert_eq!(request.field("assignee.name"), Some(&PropertyValue::from("alice")));
        assert_eq!(request.field("me"), None);
        assert_eq!(request.field("labels"), Some(&list(&["tedlt", "mine", "mine-mine"])));
        assert_eq!(resolution.origins["me"], Origin::Base);
    }

    #[test]
    fn missing_env_variable_is_unresolved() {
        let config = load(&[(TEAM, DocumentFormat::Toml), (PERSONAL, DocumentFormat::Yaml)]);
        let schema = config.effective_schema(false);
        let err = Engine::new(&config.profiles, &schema)
            .resolve(&select(&["work"]), &context("t"), &Overrides::new())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnresolvedReference);
        assert_eq!(err.subject(), Some("me"));
    }

    #[test]
    fn commented_json_document_uses_bundled_schema() {
        let config = load(&[(MINIMAL, DocumentFormat::Json)]);
        let schema = config.effective_schema(false);
        let resolution = Engine::new(&config.profiles, &schema)
            .resolve(&select(&["work"]), &context("t"), &Overrides::new())
            .unwrap();
        assert_eq!(
            resolution.request.field("project.key"),
            Some(&PropertyValue::from("JSON"))
        );

        let strict = config.effective_schema(true);
        let err = Engine::new(&config.profiles, &strict)
            .resolve(
                &select(&["work"]),
                &context("t"),
                &Overrides::new().with_cli("extra", "x"),
            )
            .unwrap_err();
        match err {
            Error::Validation(report) => {
                assert_eq!(report.len(), 1);
                assert_eq!(report.violations()[0].field(), "extra");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

mod failures {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[case("a", &["a", "b", "a"])]
    #[case("b", &["b", "a", "b"])]
    fn cyclic_profiles_fail_but_others_resolve(#[case] target: &str, #[case] expected: &[&str]) {
        let config = load(&[(CYCLIC, DocumentFormat::Toml)]);
        let schema = tedlt_core::Schema::permissive();
        let engine = Engine::new(&config.profiles, &schema);

        let err = engine
            .resolve(&select(&[target]), &context("t"), &Overrides::new())
            .unwrap_err();
        match err {
            Error::CyclicInheritance { cycle } => assert_eq!(cycle, expected),
            other => panic!("unexpected error: {other}"),
        }

        assert!(engine.resolve(&select(&["ok"]), &context("t"), &Overrides::new()).is_ok());
    }

    #[test]
    fn unknown_selection_is_reported() {
        let config = team();
        let schema = config.effective_schema(false);
        let err = Engine::new(&config.profiles, &schema)
            .resolve(&select(&["nope"]), &context("t"), &Overrides::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown profile 'nope'");
    }

    #[test]
    fn validation_reports_all_violations_at_once() {
        let config = load(&[(INVALID, DocumentFormat::Toml)]);
        let schema = config.effective_schema(false);
        let err = Engine::new(&config.profiles, &schema)
            .resolve(&select(&["work"]), &context("t"), &Overrides::new())
            .unwrap_err();

        let Error::Validation(report) = err else {
            panic!("expected validation failure");
        };
        let mut kinds: Vec<ErrorKind> = report.iter().map(|v| v.kind()).collect();
        kinds.sort_by_key(|k| k.to_string());
        assert_eq!(
            kinds,
            vec![
                ErrorKind::InvalidValue,
                ErrorKind::MissingRequiredField,
                ErrorKind::MissingRequiredField,
            ]
        );
    }
}
