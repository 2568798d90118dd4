//! The import run: open the input, run the vocabulary and node phases, then
//! write the deferred entity references.

use std::fmt;
use std::path::Path;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::config::{ImportConfig, ImportOptions};
use crate::importer::{Counts, ImportError, ImportResult, Importer};
use crate::io::{HandlerRegistry, ImportSource};
use crate::store::ContentStore;

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub counts: Counts,
    /// Distinct warnings, in the order they were first raised
    pub warnings: Vec<String>,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Success! {} vocabularies with {} terms and {} nodes imported.",
            self.counts.vocabularies, self.counts.terms, self.counts.nodes
        )
    }
}

/// Import `input` into `store` using the default file handlers
pub fn import_file(
    input: &Path,
    store: &mut dyn ContentStore,
    config: &ImportConfig,
    options: ImportOptions,
) -> Result<ImportSummary, ImportError> {
    import_with(&HandlerRegistry::with_defaults(), input, store, config, options)
}

/// Import `input` into `store` with the handlers of `registry`.
///
/// The input is fully parsed before the first write. On a fatal error the
/// entities created so far are deleted again if `rollback_on_failure` is set.
pub fn import_with(
    registry: &HandlerRegistry,
    input: &Path,
    store: &mut dyn ContentStore,
    config: &ImportConfig,
    options: ImportOptions,
) -> Result<ImportSummary, ImportError> {
    let started = Instant::now();
    info!(input = %input.display(), "starting import");

    let source = registry.open(input, config)?;
    let mut importer = Importer::new(store, config, options);

    if let Err(err) = run(source.as_ref(), &mut importer) {
        error!(error = %error_chain(&err), "import failed");
        log_counts(importer.counts());
        log_warnings(importer.warnings().iter());
        if config.rollback_on_failure {
            importer.rollback();
        }
        return Err(err);
    }

    let (counts, warnings) = importer.finish();
    log_counts(counts);
    log_warnings(warnings.iter().map(String::as_str));
    info!(
        warnings = warnings.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "import finished"
    );
    Ok(ImportSummary { counts, warnings })
}

fn run(source: &dyn ImportSource, importer: &mut Importer<'_>) -> ImportResult<()> {
    let options = importer.options();

    if options.import_vocabularies {
        let phase = Instant::now();
        source.import_vocabularies(importer)?;
        info!(
            elapsed_ms = phase.elapsed().as_millis() as u64,
            "vocabulary phase done"
        );
    }

    if options.import_nodes {
        let phase = Instant::now();
        source.import_nodes(importer)?;
        info!(
            elapsed_ms = phase.elapsed().as_millis() as u64,
            "node phase done"
        );
    }

    let phase = Instant::now();
    let written = importer.resolve_references()?;
    info!(
        written,
        elapsed_ms = phase.elapsed().as_millis() as u64,
        "reference pass done"
    );
    Ok(())
}

fn log_counts(counts: Counts) {
    info!(
        vocabularies = counts.vocabularies,
        terms = counts.terms,
        nodes = counts.nodes,
        files = counts.files,
        "entity counts"
    );
}

/// Repeat the distinct warnings of a run as one block at its end
fn log_warnings<'a>(warnings: impl Iterator<Item = &'a str>) {
    for (n, message) in warnings.enumerate() {
        warn!(n = n + 1, "run warning: {message}");
    }
}

/// Error message followed by its sources, separated by `: `.
///
/// Causes already quoted by an outer message are skipped.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
