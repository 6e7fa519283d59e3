//! Fixture-driven tests: full rule definitions from `tests/fixtures/`.

use serde_json::{json, Value};
use std::path::PathBuf;
use term_rules::core::value::{is_truthy, to_number};
use term_rules::core::{
    DatasetValidator, Level, ResolverReport, Row, RuleDefinition, ValidationContext,
    ValidationResult,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

async fn load(name: &str) -> RuleDefinition {
    RuleDefinition::load(fixture(name)).await.unwrap()
}

fn rows(values: Value) -> Vec<Row> {
    values
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row.as_object().unwrap().clone())
        .collect()
}

fn failing_cells(result: &ValidationResult) -> Vec<(usize, Option<&str>)> {
    result
        .errors
        .iter()
        .map(|issue| (issue.row, issue.column.as_deref()))
        .collect()
}

#[tokio::test]
async fn test_basic_onboarding() {
    let definition = load("basic-onboarding.json").await;
    let dataset = rows(json!([
        {"dni": "12345678", "nombre": "Juan Pérez", "email": "juan@example.com", "telefono": "123456789"},
        {"dni": "", "nombre": "Al", "email": "correo", "telefono": "12"}
    ]));

    let result = DatasetValidator::new(definition)
        .validate(dataset, &ValidationContext::new())
        .await
        .unwrap();

    assert!(!result.valid);
    assert_eq!(
        failing_cells(&result),
        [
            (2, Some("dni")),
            (2, Some("nombre")),
            (2, Some("email")),
            (2, Some("telefono")),
        ]
    );
    assert_eq!(result.errors[0].message, "Campo obligatorio");
    assert_eq!(result.errors[1].message, "Debe tener al menos 3 caracteres");
    assert_eq!(result.errors[2].message, "Email inválido");
}

#[tokio::test]
async fn test_dependent_benefits() {
    let definition = load("dependent-benefits.json").await;
    let context = ValidationContext::new().with_sync_resolver("validateMinimumSalary", |input| {
        let minimum = match input.arg_str(1) {
            Some("planta") => 50000.0,
            Some("contratista") => 20000.0,
            _ => 0.0,
        };
        to_number(input.arg(0)) >= minimum
    });

    let dataset = rows(json!([
        {
            "tipo_empleado": "planta",
            "fecha_ingreso": "2021-01-05",
            "salario": "60000",
            "bono": "5000",
            "beneficios_medicos": "Plan A"
        },
        {
            "tipo_empleado": "planta",
            "fecha_ingreso": "",
            "salario": "30000",
            "bono": "40000",
            "beneficios_medicos": ""
        },
        {
            "tipo_empleado": "practicante",
            "fecha_ingreso": "",
            "salario": "10000",
            "bono": "0",
            "beneficios_medicos": ""
        }
    ]));

    let result = DatasetValidator::new(definition)
        .validate(dataset, &context)
        .await
        .unwrap();

    assert_eq!(
        failing_cells(&result),
        [
            (2, Some("fecha_ingreso")),
            (2, Some("salario")),
            (2, Some("bono")),
            (2, Some("beneficios_medicos")),
        ]
    );
    assert_eq!(
        result.errors[1].message,
        "Salario por debajo del mínimo para el tipo de empleado"
    );
    assert_eq!(
        result.errors[3].message,
        "Campo requerido si tipo_empleado cumple condición"
    );
}

#[tokio::test]
async fn test_dependent_benefits_intern_bonus() {
    let definition = load("dependent-benefits.json").await;
    let context = ValidationContext::new().with_sync_resolver("validateMinimumSalary", |_| true);
    let dataset = rows(json!([
        {"tipo_empleado": "practicante", "salario": "10000", "bono": "500"}
    ]));

    let result = DatasetValidator::new(definition)
        .validate(dataset, &context)
        .await
        .unwrap();

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].column.as_deref(), Some("bono"));
    assert_eq!(result.errors[0].message, "Los practicantes no perciben bono");
}

fn external_checks_context() -> ValidationContext {
    ValidationContext::new()
        .with_sync_resolver("dniExisteEnCore", |input| {
            matches!(input.arg_str(0), Some("12345678") | Some("87654321"))
        })
        .with_sync_resolver("cuentaHabilitadaParaAlta", |input| {
            input.arg_str(0) == Some("CTA-1") && input.arg_str(1) == Some("12345678")
        })
        .with_resolver_fn("montoDentroDeLimites", |input| async move {
            let limit = match input.arg_str(1) {
                Some("CTA-1") => 10000.0,
                Some("CTA-2") => 2000.0,
                _ => 0.0,
            };
            Ok(to_number(input.arg(0)) <= limit)
        })
}

#[tokio::test]
async fn test_external_checks() {
    let definition = load("external-checks.json").await;
    let dataset = rows(json!([
        {"dni": "12345678", "cuenta": "CTA-1", "monto": "5000"},
        {"dni": "00000000", "cuenta": "CTA-2", "monto": "5000"}
    ]));

    let result = DatasetValidator::builder(definition)
        .parallel()
        .build()
        .validate(dataset, &external_checks_context())
        .await
        .unwrap();

    assert_eq!(
        failing_cells(&result),
        [(2, Some("dni")), (2, Some("cuenta")), (2, Some("monto"))]
    );
    assert_eq!(result.errors[0].message, "El DNI no existe en el core");
}

#[tokio::test]
async fn test_external_checks_resolver_messages_win() {
    let definition = load("external-checks.json").await;
    let context = external_checks_context().with_sync_resolver("dniExisteEnCore", |input| {
        ResolverReport::invalid(format!(
            "El DNI {} no existe en el core bancario",
            input.arg_str(0).unwrap_or_default()
        ))
        .with_meta(json!({"consultado": input.arg(0)}))
    });
    let dataset = rows(json!([{"dni": "55555555", "cuenta": "CTA-1", "monto": "100"}]));

    let result = DatasetValidator::new(definition)
        .validate(dataset, &context)
        .await
        .unwrap();

    assert_eq!(
        result.errors[0].message,
        "El DNI 55555555 no existe en el core bancario"
    );
    assert_eq!(result.errors[0].meta, Some(json!({"consultado": "55555555"})));
}

#[tokio::test]
async fn test_external_checks_missing_resolver_is_fatal() {
    let definition = load("external-checks.json").await;
    let dataset = rows(json!([{"dni": "12345678", "cuenta": "CTA-1", "monto": "1"}]));

    let err = DatasetValidator::new(definition)
        .validate(dataset, &ValidationContext::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        term_rules::error::RuleError::ResolverNotFound { ref name } if name == "dniExisteEnCore"
    ));
}

#[tokio::test]
async fn test_advanced_risk() {
    let definition = load("advanced-risk.json").await;
    let context = ValidationContext::new().with_sync_resolver("validarReporteManual", |input| {
        is_truthy(
            input
                .arg(0)
                .and_then(|row| row.get("reporte_manual"))
                .and_then(|report| report.get("adjunto")),
        )
    });

    let dataset = rows(json!([
        {
            "operacion_id": "OP-000001",
            "estado": "aprobada",
            "motivo_rechazo": "",
            "score": "80",
            "score_minimo_perfil": "70",
            "flag_sospechoso": "NO",
            "comentarios": "",
            "monto_desembolsado": "150000",
            "fecha_aprobacion": "2024-02-01",
            "reporte_manual": {"adjunto": true}
        },
        {
            "operacion_id": "X-1",
            "estado": "rechazada",
            "motivo_rechazo": "",
            "score": "40",
            "score_minimo_perfil": "60",
            "flag_sospechoso": "SI",
            "comentarios": "riesgo",
            "monto_desembolsado": "",
            "fecha_aprobacion": "",
            "reporte_manual": null
        },
        {
            "operacion_id": "OP-000003",
            "estado": "aprobada",
            "motivo_rechazo": "",
            "score": "55",
            "score_minimo_perfil": "40",
            "flag_sospechoso": "SI",
            "comentarios": "riesgo alto",
            "monto_desembolsado": "",
            "fecha_aprobacion": "2024/03/10",
            "reporte_manual": {}
        }
    ]));

    let result = DatasetValidator::builder(definition)
        .max_concurrent_rows(3)
        .build()
        .validate(dataset, &context)
        .await
        .unwrap();

    assert_eq!(
        failing_cells(&result),
        [
            (2, Some("operacion_id")),
            (2, Some("motivo_rechazo")),
            (2, Some("score")),
            (2, Some("comentarios")),
            (3, Some("monto_desembolsado")),
            (3, Some("fecha_aprobacion")),
            (3, Some("reporte_manual")),
        ]
    );

    let id_issue = &result.errors[0];
    assert_eq!(id_issue.code, Some(json!("OP_FORMAT")));
    assert_eq!(id_issue.severity, Some(Level::Error.into()));
    assert_eq!(result.issues_by_severity(Level::Warning).len(), 1);
    assert_eq!(result.errors_for_row(1).len(), 0);
    assert!(result.metrics.gated_row_validations >= 2);
}

#[tokio::test]
async fn test_yaml_and_json_definitions_agree() {
    let json_definition = load("basic-onboarding.json").await;
    let yaml = serde_yaml::to_string(&json_definition).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("basic-onboarding.yaml");
    tokio::fs::write(&path, yaml).await.unwrap();
    let yaml_definition = RuleDefinition::load(&path).await.unwrap();

    assert_eq!(yaml_definition.rule_count(), json_definition.rule_count());
    let dataset = rows(json!([{"dni": "1", "nombre": "Ana", "email": "a@b.io", "telefono": ""}]));
    let context = ValidationContext::new();
    let from_json = DatasetValidator::new(json_definition)
        .validate(dataset.clone(), &context)
        .await
        .unwrap();
    let from_yaml = DatasetValidator::new(yaml_definition)
        .validate(dataset, &context)
        .await
        .unwrap();
    assert_eq!(from_json.errors, from_yaml.errors);
}
