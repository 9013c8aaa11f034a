//! CLI commands

use std::io;

use nimbus::{
    catalog::{CatalogSink, InMemoryCatalog},
    observer::PipelineObserver,
    pipeline::{Pipeline, PipelineError, RunReport},
    sources::{BuiltinSource, VendorSource, YamlSource},
};
use tracing::info;
use uuid::Uuid;

use crate::{
    catalog::PgCatalogSink,
    config::{DatabaseConfig, ScrapeArgs},
    database,
    errors::AppError,
    observability::TracingObserver,
    report,
};

/// Ingest the selected catalog and write a report to `out`.
///
/// Dry runs ingest into memory and also print every product.
///
/// # Errors
///
/// Returns an error if the source is unknown, the database is unreachable,
/// the run fails or the report cannot be written.
pub async fn scrape(args: &ScrapeArgs, mut out: impl io::Write) -> Result<RunReport, AppError> {
    let source = select_source(args)?;
    let observer = TracingObserver::new(Uuid::now_v7());

    info!(run_id = %observer.run_id(), dry_run = args.dry_run, "loading vendor catalog");

    let report = if args.dry_run {
        let catalog = InMemoryCatalog::new();
        let report = ingest(&catalog, observer, args, source.as_ref()).await?;

        report::write_products(&mut out, &catalog.products())?;

        report
    } else {
        let database_url = args
            .database_url
            .as_deref()
            .ok_or(AppError::MissingDatabaseUrl)?;

        let pool = database::connect(database_url).await?;

        ingest(PgCatalogSink::new(pool), observer, args, source.as_ref()).await?
    };

    report::write_summary(&mut out, &report)?;

    Ok(report)
}

/// Apply catalog schema migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn migrate(config: &DatabaseConfig) -> Result<(), AppError> {
    let pool = database::connect(&config.database_url).await?;

    database::migrate(&pool).await?;

    info!("catalog migrations applied");

    Ok(())
}

fn select_source(args: &ScrapeArgs) -> Result<Box<dyn VendorSource>, AppError> {
    if let Some(path) = &args.source {
        return Ok(Box::new(YamlSource::new(path.clone())));
    }

    BuiltinSource::from_vendor(&args.vendor)
        .map(|source| Box::new(source) as Box<dyn VendorSource>)
        .ok_or_else(|| AppError::UnknownVendor(args.vendor.clone()))
}

async fn ingest<S: CatalogSink, O: PipelineObserver>(
    sink: S,
    observer: O,
    args: &ScrapeArgs,
    source: &dyn VendorSource,
) -> Result<RunReport, PipelineError> {
    Pipeline::new(sink)
        .with_observer(observer)
        .with_batching(args.batching.into())
        .run(source)
        .await
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use testresult::TestResult;

    use crate::config::BatchingMode;

    use super::*;

    fn dry_run() -> ScrapeArgs {
        ScrapeArgs {
            source: None,
            vendor: "scaleway".to_string(),
            batching: BatchingMode::PerRegion,
            dry_run: true,
            database_url: None,
        }
    }

    #[tokio::test]
    async fn dry_run_prints_builtin_products() -> TestResult {
        let mut out = Vec::new();

        let report = scrape(&dry_run(), &mut out).await?;

        let output = String::from_utf8(out)?;
        assert_eq!(report.products, 12);
        assert!(output.contains("generated-compute-flexible-ip"));
        assert!(output.contains("Prices inserted"));

        Ok(())
    }

    #[tokio::test]
    async fn dry_run_reads_yaml_source() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(
            file,
            "vendor: scaleway\ncurrency: EUR\nregions:\n  nl-ams-1:\n    network:\n      load_balancer:\n        - {{ name: LB-GP-M, price: \"0.04\" }}"
        )?;

        let args = ScrapeArgs {
            source: Some(file.path().to_path_buf()),
            batching: BatchingMode::Global,
            ..dry_run()
        };

        let mut out = Vec::new();
        let report = scrape(&args, &mut out).await?;

        assert_eq!(report.products, 1);
        assert!(String::from_utf8(out)?.contains("generated-LB-GP-M"));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_vendor_is_reported() {
        let args = ScrapeArgs {
            vendor: "aws".to_string(),
            ..dry_run()
        };

        let result = scrape(&args, io::sink()).await;

        assert!(
            matches!(result, Err(AppError::UnknownVendor(ref vendor)) if vendor == "aws"),
            "expected UnknownVendor, got {result:?}"
        );
    }

    #[tokio::test]
    async fn live_run_needs_database_url() {
        let args = ScrapeArgs {
            dry_run: false,
            ..dry_run()
        };

        let result = scrape(&args, io::sink()).await;

        assert!(
            matches!(result, Err(AppError::MissingDatabaseUrl)),
            "expected MissingDatabaseUrl, got {result:?}"
        );
    }
}
