//! Validates a small account-opening CSV against async resolvers that stand
//! in for core banking lookups.
//!
//! Run with `RUST_LOG=term_rules=debug cargo run --example external_checks`
//! to see the per-rule tracing events.

use term_rules::core::value::{format_number, to_number};
use term_rules::core::{DatasetValidator, ResolverReport, RuleDefinition, ValidationContext};
use term_rules::logging::setup::{init_logging, LoggingConfig};
use term_rules::prelude::Result;

const DEFINITION: &str = include_str!("../tests/fixtures/external-checks.json");

const CSV: &str = "dni,cuenta,monto
12345678,CTA-01,800
87654321,CTA-99,1500
55555555,CTA-01,5000
";

fn accounts_for(dni: &str) -> &'static [&'static str] {
    match dni {
        "12345678" => &["CTA-01", "CTA-02"],
        "87654321" => &["CTA-03"],
        _ => &[],
    }
}

fn limits_for(account: &str) -> Option<(f64, f64)> {
    match account {
        "CTA-01" => Some((100.0, 2000.0)),
        "CTA-02" => Some((100.0, 1500.0)),
        "CTA-03" => Some((500.0, 5000.0)),
        _ => None,
    }
}

fn banking_context() -> ValidationContext {
    ValidationContext::new()
        .with_resolver_fn("dniExisteEnCore", |input| async move {
            let dni = input.arg_str(0).unwrap_or_default();
            if matches!(dni, "12345678" | "87654321") {
                Ok(ResolverReport::valid())
            } else {
                Ok(ResolverReport::invalid(format!(
                    "El DNI {dni} no existe en el core bancario"
                )))
            }
        })
        .with_resolver_fn("cuentaHabilitadaParaAlta", |input| async move {
            let account = input.arg_str(0).unwrap_or_default();
            let dni = input.arg_str(1).unwrap_or_default();
            Ok(accounts_for(dni).contains(&account))
        })
        .with_resolver_fn("montoDentroDeLimites", |input| async move {
            let amount = to_number(input.arg(0));
            let account = input.arg_str(1).unwrap_or_default().to_string();
            let report = match limits_for(&account) {
                None => ResolverReport::invalid(format!(
                    "Cuenta {account} sin límites configurados"
                )),
                Some((min, max)) if amount < min || amount > max => {
                    ResolverReport::invalid(format!(
                        "El monto {} está fuera de rango ({}-{})",
                        format_number(amount),
                        format_number(min),
                        format_number(max)
                    ))
                }
                Some(_) => ResolverReport::valid(),
            };
            Ok(report)
        })
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(LoggingConfig::development())?;

    let definition = RuleDefinition::from_json(DEFINITION)?;
    let validator = DatasetValidator::builder(definition).parallel().build();

    let result = validator.validate_csv(CSV, &banking_context()).await?;
    println!("{}", result.to_json_pretty()?);

    Ok(())
}
