//! Tests for the template engine.

use super::*;
use crate::error::PromptlyError;
use crate::generation::test_support::ScriptedGenerator;
use crate::generation::{GenerationService, GenerationSource};

fn greeting() -> Template {
    Template::new("t1", "Greeting", "Hello {{name}}, your role is {{role}}")
}

// ============================================================================
// detect_variables
// ============================================================================

#[test]
fn test_detect_in_first_appearance_order_without_duplicates() {
    let vars = detect_variables("{{b}} then {{a}} then {{b}} and {{ a }}", &[]);
    let names: Vec<&str> = vars.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["b", "a"]);
}

#[test]
fn test_detect_no_placeholders() {
    assert!(detect_variables("Just plain text", &[]).is_empty());
    assert!(detect_variables("", &[]).is_empty());
    assert!(detect_variables("single {brace} only", &[]).is_empty());
}

#[test]
fn test_detect_trims_names_and_skips_blank() {
    let vars = detect_variables("{{  client name  }} {{   }}", &[]);
    assert_eq!(vars.len(), 1);
    assert_eq!(vars[0].name, "client name");
}

#[test]
fn test_detect_new_variables_are_required_and_empty() {
    let vars = detect_variables("{{x}}", &[]);
    assert_eq!(vars[0], Variable::new("x"));
    assert!(vars[0].required);
    assert!(vars[0].example.is_empty());
    assert!(vars[0].default_value.is_empty());
}

#[test]
fn test_rescan_preserves_settings_of_surviving_names() {
    let previous = vec![
        Variable::new("name").with_example("Ana").optional(),
        Variable::new("role").with_default("Engineer"),
    ];
    let vars = detect_variables("Dear {{name}}, about {{topic}}", &previous);

    assert_eq!(vars.len(), 2);
    assert_eq!(vars[0], Variable::new("name").with_example("Ana").optional());
    assert_eq!(vars[1], Variable::new("topic"));
}

#[test]
fn test_removed_name_is_dropped() {
    let mut template = greeting();
    template.configure_variable(
        "role",
        VariablePatch {
            default_value: Some("Engineer".into()),
            ..Default::default()
        },
    );
    template.set_content("Hello {{name}}");
    assert!(template.variable("role").is_none());

    // Re-adding the name starts from scratch.
    template.set_content("Hello {{name}}, {{role}}");
    assert_eq!(template.variable("role"), Some(&Variable::new("role")));
}

#[test]
fn test_braces_inside_name_are_not_placeholders() {
    let names = placeholder_names("{{a}b}} {{ok}}");
    assert_eq!(names, vec!["ok"]);
}

// ============================================================================
// render_preview
// ============================================================================

#[test]
fn test_render_replaces_every_occurrence() {
    let template = Template::new("t", "x", "{{x}} and {{x}}");
    let rendered = render_preview(&template, &values([("x", "A")]));
    assert_eq!(rendered, "A and A");
}

#[test]
fn test_render_replaces_whitespace_variants() {
    let template = Template::new("t", "x", "{{x}}/{{ x }}/{{x  }}");
    assert_eq!(render_preview(&template, &values([("x", "A")])), "A/A/A");
}

#[test]
fn test_scenario_value_plus_default() {
    let template = greeting().with_variable(Variable::new("role").with_default("Engineer"));
    let rendered = render_preview(&template, &values([("name", "Ana")]));
    assert_eq!(rendered, "Hello Ana, your role is Engineer");
}

#[test]
fn test_priority_explicit_value_wins() {
    let template = Template::new("t", "x", "{{v}}").with_variable(
        Variable::new("v").with_example("example").with_default("default"),
    );
    assert_eq!(render_preview(&template, &values([("v", "explicit")])), "explicit");
}

#[test]
fn test_priority_example_when_no_value() {
    let template = Template::new("t", "x", "{{v}}").with_variable(
        Variable::new("v").with_example("example").with_default("default"),
    );
    assert_eq!(render_preview(&template, &VariableValues::new()), "example");
    // Blank explicit values count as absent.
    assert_eq!(render_preview(&template, &values([("v", "  ")])), "example");
}

#[test]
fn test_priority_default_when_no_value_or_example() {
    let template =
        Template::new("t", "x", "{{v}}").with_variable(Variable::new("v").with_default("default"));
    assert_eq!(render_preview(&template, &VariableValues::new()), "default");
}

#[test]
fn test_priority_marker_as_last_resort() {
    let template = Template::new("t", "x", "Dear {{client}},");
    assert_eq!(render_preview(&template, &VariableValues::new()), "Dear [client],");
}

#[test]
fn test_render_is_single_pass() {
    let template = Template::new("t", "x", "{{a}} {{b}}");
    let rendered = render_preview(&template, &values([("a", "{{b}}"), ("b", "B")]));
    assert_eq!(rendered, "{{b}} B");
}

#[test]
fn test_render_leaves_undeclared_placeholders() {
    let mut template = Template::new("t", "x", "{{a}}");
    // Simulate a stored prompt whose content gained a name without a rescan.
    template.content = "{{a}} {{b}}".to_string();
    assert_eq!(render_preview(&template, &values([("a", "A")])), "A {{b}}");
}

#[test]
fn test_render_unicode_values() {
    let template = Template::new("t", "x", "Bonjour {{nom}} 🎉");
    assert_eq!(
        render_preview(&template, &values([("nom", "日本語")])),
        "Bonjour 日本語 🎉"
    );
}

// ============================================================================
// can_execute
// ============================================================================

#[test]
fn test_scenario_missing_required_blocks_execution() {
    let template = greeting();
    assert!(!can_execute(&template, &values([("name", "Ana")])));
    assert_eq!(
        missing_required(&template, &values([("name", "Ana")])),
        vec!["role"]
    );
}

#[test]
fn test_can_execute_rejects_whitespace_only() {
    let template = greeting();
    assert!(!can_execute(&template, &values([("name", "Ana"), ("role", "   ")])));
    assert!(can_execute(&template, &values([("name", "Ana"), ("role", "Lead")])));
}

#[test]
fn test_can_execute_ignores_optional_variables() {
    let template = greeting().with_variable(Variable::new("role").optional());
    assert!(can_execute(&template, &values([("name", "Ana")])));
}

#[test]
fn test_defaults_do_not_satisfy_required() {
    let template = greeting().with_variable(Variable::new("role").with_default("Engineer"));
    assert!(!can_execute(&template, &values([("name", "Ana")])));
}

#[test]
fn test_template_without_variables_is_executable() {
    let template = Template::new("t", "x", "No placeholders here");
    assert!(can_execute(&template, &VariableValues::new()));
}

// ============================================================================
// validate_values / prepare
// ============================================================================

#[test]
fn test_unknown_variable_is_rejected() {
    let err = validate_values(&greeting(), &values([("nmae", "Ana")])).unwrap_err();
    assert_eq!(
        err,
        TemplateError::UnknownVariable {
            name: "nmae".into(),
            declared: "name, role".into()
        }
    );
}

#[test]
fn test_prepare_resolves_every_variable() {
    let template = greeting().with_variable(Variable::new("role").with_default("Engineer").optional());
    let (text, resolved) = prepare(&template, &values([("name", "Ana")])).unwrap();
    assert_eq!(text, "Hello Ana, your role is Engineer");
    assert_eq!(resolved, values([("name", "Ana"), ("role", "Engineer")]));
}

#[test]
fn test_prepare_reports_all_missing_names() {
    let err = prepare(&greeting(), &VariableValues::new()).unwrap_err();
    assert_eq!(
        err,
        TemplateError::MissingRequired {
            names: vec!["name".into(), "role".into()]
        }
    );
}

// ============================================================================
// execute
// ============================================================================

#[tokio::test]
async fn test_execute_hands_substituted_text_to_generator() {
    let generator = ScriptedGenerator::ok("Generated email");
    let template = greeting();
    let result = execute(
        &template,
        &values([("name", "Ana"), ("role", "Lead")]),
        &generator,
        Some("user-1"),
    )
    .await
    .unwrap();

    assert_eq!(result.output, "Generated email");
    assert_eq!(result.prompt_text, "Hello Ana, your role is Lead");
    assert_eq!(result.template_id, "t1");
    assert_eq!(result.source, GenerationSource::Service);

    let seen = generator.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].message, "Hello Ana, your role is Lead");
    assert_eq!(seen[0].flow_title.as_deref(), Some("Greeting"));
    assert_eq!(seen[0].user_id.as_deref(), Some("user-1"));
}

#[tokio::test]
async fn test_execute_gated_by_required_values() {
    let generator = ScriptedGenerator::ok("never");
    let err = execute(&greeting(), &values([("name", "Ana")]), &generator, None)
        .await
        .unwrap_err();
    assert!(matches!(err, PromptlyError::ValidationError(_)));
    assert!(generator.seen().is_empty());
}

#[tokio::test]
async fn test_execute_surfaces_generator_failure() {
    let generator = ScriptedGenerator::failing("service down");
    let err = execute(
        &greeting(),
        &values([("name", "Ana"), ("role", "Lead")]),
        &generator,
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PromptlyError::GenerationError(ref m) if m == "service down"));
}

#[tokio::test]
async fn test_execute_offline_uses_fallback() {
    let service = GenerationService::offline();
    let result = execute(
        &greeting(),
        &values([("name", "Ana"), ("role", "Lead")]),
        &service,
        None,
    )
    .await
    .unwrap();
    assert_eq!(result.source, GenerationSource::Fallback);
    assert!(result.output.contains("Greeting"));
}

#[tokio::test]
async fn test_execute_with_prefilled_default_for_required_variable() {
    let generator = ScriptedGenerator::ok("done");
    let template = greeting().with_variable(Variable::new("role").with_default("Engineer"));
    let values = prefill_defaults(&template, values([("name", "Ana")]));

    let result = execute(&template, &values, &generator, None).await.unwrap();
    assert_eq!(result.prompt_text, "Hello Ana, your role is Engineer");
}

// ============================================================================
// prefill_defaults
// ============================================================================

#[test]
fn test_prefill_defaults_supplied_values_win() {
    let template = greeting()
        .with_variable(Variable::new("name").with_default("Guest"))
        .with_variable(Variable::new("role").with_default("  "));
    let prefilled = prefill_defaults(&template, values([("name", "Ana")]));
    // Blank defaults are not filled in.
    assert_eq!(prefilled, values([("name", "Ana")]));

    let prefilled = prefill_defaults(&template, VariableValues::new());
    assert_eq!(prefilled, values([("name", "Guest")]));
    assert!(!can_execute(&template, &prefilled));
}

// ============================================================================
// serialization
// ============================================================================

#[test]
fn test_variable_without_required_field_loads_as_required() {
    let variable: Variable = serde_yaml::from_str("name: client\nexample: Acme\n").unwrap();
    assert!(variable.required);
    assert_eq!(variable.example, "Acme");

    let optional: Variable = serde_yaml::from_str("name: client\nrequired: false\n").unwrap();
    assert!(!optional.required);
}
