//! Integration tests for the dataset rule engine.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use term_rules::core::{
    current_validation_context, validate_dataset, Assertion, Condition, DatasetValidator, Row, Rule,
    RuleDefinition, ValidationContext,
};
use term_rules::error::RuleError;
use term_rules::logging::LogConfig;

fn rows(values: Value) -> Vec<Row> {
    values
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row.as_object().unwrap().clone())
        .collect()
}

fn approval_definition() -> RuleDefinition {
    RuleDefinition::from_value(json!({
        "columns": {
            "id": {"rules": ["required"]},
            "estado": {"rules": ["required"]},
            "comentario": {
                "rules": [{
                    "type": "string",
                    "minLength": 5,
                    "message": "El comentario es muy corto",
                    "allowEmpty": false,
                    "onlyIf": {"field": "estado", "equals": "rechazado"}
                }]
            }
        },
        "rowValidations": [{
            "when": {"field": "estado", "equals": "aprobado"},
            "assertions": [{
                "column": "aprobador",
                "rule": {"type": "required", "message": "Las aprobaciones requieren aprobador"}
            }]
        }]
    }))
    .unwrap()
}

fn approval_rows() -> Vec<Row> {
    rows(json!([
        {"id": "1", "estado": "aprobado", "comentario": "ok", "aprobador": "Ana"},
        {"id": "", "estado": "rechazado", "comentario": "", "aprobador": ""},
        {"id": "3", "estado": "aprobado", "comentario": "listo", "aprobador": ""}
    ]))
}

#[tokio::test]
async fn test_single_required_failure() {
    let definition = RuleDefinition::from_json(r#"{"columns": {"a": {"rules": ["required"]}}}"#).unwrap();
    let result = validate_dataset(
        rows(json!([{"a": "1"}, {"a": ""}])),
        &definition,
        &ValidationContext::new(),
    )
    .await
    .unwrap();

    assert_eq!(
        result.to_json().unwrap(),
        r#"{"valid":false,"errors":[{"row":2,"column":"a","rule":"required","message":"Campo obligatorio"}]}"#
    );
}

#[tokio::test]
async fn test_detailed_errors_by_row_and_column() {
    let result = validate_dataset(approval_rows(), &approval_definition(), &ValidationContext::new())
        .await
        .unwrap();

    assert!(!result.valid);
    assert_eq!(
        serde_json::to_value(&result.errors).unwrap(),
        json!([
            {"row": 2, "column": "id", "rule": "required", "message": "Campo obligatorio"},
            {"row": 2, "column": "comentario", "rule": "string", "message": "El comentario es muy corto"},
            {"row": 3, "column": "aprobador", "rule": "required", "message": "Las aprobaciones requieren aprobador"}
        ])
    );
    assert_eq!(result.metrics.rows, 3);
    assert_eq!(result.metrics.gated_row_validations, 1);
}

#[tokio::test]
async fn test_valid_dataset() {
    let result = validate_dataset(
        rows(json!([{"id": "1", "estado": "pendiente"}])),
        &approval_definition(),
        &ValidationContext::new(),
    )
    .await
    .unwrap();
    assert!(result.is_valid());
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_order_is_stable_under_concurrency() {
    // Earlier rows sleep longer, so they finish last.
    let context = ValidationContext::new().with_resolver_fn("lento", |input| async move {
        let delay = input.arg(0).and_then(Value::as_u64).unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(false)
    });
    let definition = RuleDefinition::new()
        .column(
            "demora",
            [Rule::new("custom")
                .with_option("resolver", "lento")
                .with_message("lento")],
        )
        .column("x", ["required"]);

    let dataset: Vec<Row> = (0..8u64)
        .map(|i| {
            json!({"demora": (8 - i) * 5, "x": ""})
                .as_object()
                .cloned()
                .unwrap()
        })
        .collect();

    let sequential = DatasetValidator::new(definition.clone())
        .validate(dataset.clone(), &context)
        .await
        .unwrap();
    let concurrent = DatasetValidator::builder(definition)
        .max_concurrent_rows(8)
        .build()
        .validate(dataset, &context)
        .await
        .unwrap();

    assert_eq!(sequential.errors, concurrent.errors);
    let order: Vec<(usize, Option<&str>)> = concurrent
        .errors
        .iter()
        .map(|issue| (issue.row, issue.column.as_deref()))
        .collect();
    let expected: Vec<(usize, Option<&str>)> = (1..=8)
        .flat_map(|row| [(row, Some("demora")), (row, Some("x"))])
        .collect();
    assert_eq!(order, expected);
}

#[tokio::test]
async fn test_idempotent_with_deterministic_resolvers() {
    let context = ValidationContext::new()
        .with_sync_resolver("par", |input| {
            input.arg_str(0).and_then(|s| s.parse::<i64>().ok()).is_some_and(|n| n % 2 == 0)
        });
    let definition = RuleDefinition::new().column(
        "n",
        [Rule::new("custom").with_option("resolver", "par")],
    );
    let dataset = rows(json!([{"n": "1"}, {"n": "2"}, {"n": "3"}]));
    let validator = DatasetValidator::builder(definition).parallel().build();

    let first = validator.validate(dataset.clone(), &context).await.unwrap();
    let second = validator.validate(dataset, &context).await.unwrap();
    assert_eq!(first.errors, second.errors);
    assert_eq!(first.errors.len(), 2);
}

#[tokio::test]
async fn test_unknown_validator_aborts_the_run() {
    let definition = RuleDefinition::new()
        .column("a", ["required"])
        .column("b", ["iban"]);
    let err = validate_dataset(rows(json!([{"a": ""}])), &definition, &ValidationContext::new())
        .await
        .unwrap_err();
    assert!(err.is_configuration_error());
    assert!(matches!(err, RuleError::ValidatorNotFound { ref rule_type } if rule_type == "iban"));
}

#[tokio::test]
async fn test_gated_rule_type_is_not_looked_up() {
    let definition = RuleDefinition::new().column(
        "a",
        [Rule::new("iban").with_only_if(
            Condition::from_value(json!({"field": "pais", "equals": "ES"})).unwrap(),
        )],
    );
    let result = validate_dataset(rows(json!([{"a": "x", "pais": "AR"}])), &definition, &ValidationContext::new())
        .await
        .unwrap();
    assert!(result.valid);
}

#[tokio::test]
async fn test_whole_row_assertion_and_resolver_context() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let context = ValidationContext::new()
        .with_data(json!({"tope": 100}))
        .with_sync_resolver("totalDentroDelTope", move |input| {
            seen.fetch_add(1, Ordering::SeqCst);
            let tope = current_validation_context().data()["tope"].as_f64().unwrap_or(0.0);
            let total: f64 = ["a", "b"]
                .iter()
                .filter_map(|k| input.field(k).and_then(Value::as_f64))
                .sum();
            total <= tope
        });

    let definition = RuleDefinition::new().row_validation(
        None,
        [Assertion::row(
            Rule::new("custom")
                .with_option("resolver", "totalDentroDelTope")
                .with_message("La suma supera el tope")
                .with_code(42),
        )],
    );

    let result = validate_dataset(
        rows(json!([{"a": 10, "b": 20}, {"a": 90, "b": 20}])),
        &definition,
        &context,
    )
    .await
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"valid": false, "errors": [
            {"row": 2, "column": null, "rule": "custom", "message": "La suma supera el tope", "code": 42}
        ]})
    );
}

#[tokio::test]
async fn test_validate_csv_end_to_end() {
    let definition = RuleDefinition::from_yaml(
        r#"
columns:
  name:
    rules: [required]
  city:
    rules:
      - type: string
        maxLength: 6
"#,
    )
    .unwrap();

    let validator = DatasetValidator::builder(definition)
        .log_config(LogConfig::verbose())
        .build();
    let result = validator
        .validate_csv("name,city\nAlice,Córdoba\nBob,Paris\n,Lima\n", &ValidationContext::new())
        .await
        .unwrap();

    let cells: Vec<(usize, Option<&str>)> = result
        .errors
        .iter()
        .map(|issue| (issue.row, issue.column.as_deref()))
        .collect();
    assert_eq!(cells, [(1, Some("city")), (3, Some("name"))]);
    assert_eq!(result.errors[0].message, "Debe tener como máximo 6 caracteres");
}

#[tokio::test]
async fn test_free_form_severity_reaches_the_issue() {
    let definition = RuleDefinition::from_value(json!({
        "columns": {
            "a": {"rules": [{"type": "required", "severity": "critical"}]},
            "b": {"rules": [{"type": "required", "severity": 3}]}
        }
    }))
    .unwrap();
    let result = validate_dataset(rows(json!([{"a": "", "b": ""}])), &definition, &ValidationContext::new())
        .await
        .unwrap();

    let value = serde_json::to_value(&result.errors).unwrap();
    assert_eq!(value[0]["severity"], json!("critical"));
    assert_eq!(value[1]["severity"], json!(3));
    assert!(!result.has_errors());
}

#[tokio::test]
async fn test_non_ascii_cells_never_abort_the_run() {
    let definition = RuleDefinition::from_value(json!({
        "columns": {
            "monto": {"rules": [
                "number",
                {"type": "compare", "operator": "gte", "right": 10},
                {"type": "required", "onlyIf": {"field": "monto", "gt": 10}}
            ]}
        }
    }))
    .unwrap();
    let result = validate_dataset(
        rows(json!([{"monto": "€100"}, {"monto": "日本"}, {"monto": "ñ"}])),
        &definition,
        &ValidationContext::new(),
    )
    .await
    .unwrap();

    let failures: Vec<(usize, &str)> = result
        .errors
        .iter()
        .map(|issue| (issue.row, issue.rule.as_str()))
        .collect();
    assert_eq!(
        failures,
        [
            (1, "number"),
            (1, "compare"),
            (2, "number"),
            (2, "compare"),
            (3, "number"),
            (3, "compare")
        ]
    );
    assert_eq!(result.errors[0].message, "Debe ser numérico");
}
