//! Ingest pipeline - fans JSON-lines input out to parallel store workers
//!
//! Every worker owns its own SQLite connection and routes records through a
//! shared [`RecordRouter`]. Records are independent: a failure is reported
//! against its input line and the run carries on.

use std::path::PathBuf;
use crossbeam::channel::{self, Sender};
use serde::Serialize;
use crate::{FailureKind, Result};
use crate::router::{Outcome, RecordRouter};
use crate::storage::{SqliteStore, StoreOptions};
use crate::ui::ProgressMessage;

/// Multi-worker ingest over one database file
#[derive(Debug, Clone)]
pub struct Pipeline {
    database: PathBuf,
    workers: usize,
    options: StoreOptions,
    router: RecordRouter,
}

impl Pipeline {
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            workers: 1,
            options: StoreOptions::default(),
            router: RecordRouter::new(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    /// Ingest every line, one transaction per record.
    ///
    /// Only setup failures (opening the database) are returned as errors;
    /// per-record failures are collected in the report.
    pub fn run<I>(&self, lines: I, progress: Option<Sender<ProgressMessage>>) -> Result<IngestReport>
    where
        I: IntoIterator<Item = String>,
    {
        // Schema once, up front, so workers never race on DDL
        SqliteStore::open_with(&self.database, self.options)?;
        let stores = (0..self.workers)
            .map(|_| SqliteStore::connect(&self.database, self.options))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!("Ingesting into {:?} with {} workers", self.database, self.workers);

        let (line_tx, line_rx) = channel::bounded::<(usize, String)>(self.workers * 4);
        let (result_tx, result_rx) = channel::unbounded::<(usize, Result<Outcome>)>();
        let mut report = IngestReport::default();
        let lines = lines.into_iter();

        std::thread::scope(|scope| {
            for (worker, mut store) in stores.into_iter().enumerate() {
                let rx = line_rx.clone();
                let tx = result_tx.clone();
                let progress = progress.clone();
                let router = self.router;

                scope.spawn(move || {
                    for (line_no, line) in rx {
                        let result = router.ingest_line(&mut store, &line);
                        if let Some(progress) = &progress {
                            let msg = match &result {
                                Ok(outcome) => ProgressMessage::Committed(outcome.kind()),
                                Err(e) => ProgressMessage::Dropped { line: line_no, kind: e.kind() },
                            };
                            progress.send(msg).ok();
                        }
                        if tx.send((line_no, result)).is_err() {
                            break;
                        }
                    }
                    tracing::debug!("Worker {} drained", worker);
                });
            }
            drop(line_rx);
            drop(result_tx);

            for (idx, line) in lines.enumerate() {
                if line.trim().is_empty() {
                    report.blank_lines += 1;
                    continue;
                }
                if line_tx.send((idx + 1, line)).is_err() {
                    break;
                }
            }
            drop(line_tx);
        });

        for (line_no, result) in result_rx {
            report.record(line_no, result);
        }
        report.failures.sort_by_key(|f| f.line);

        tracing::info!(
            "Ingest finished: {} committed, {} dropped",
            report.committed(),
            report.failures.len()
        );
        Ok(report)
    }
}

/// A record that was dropped, keyed by its 1-based input line
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub line: usize,
    pub kind: FailureKind,
    pub message: String,
}

/// Totals for one ingest run
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub discovery_records: usize,
    pub menu_records: usize,
    pub links: usize,
    pub categories: usize,
    pub items: usize,
    pub tag_links: usize,
    pub blank_lines: usize,
    pub failures: Vec<Failure>,
}

impl IngestReport {
    fn record(&mut self, line: usize, result: Result<Outcome>) {
        match result {
            Ok(Outcome::Discovery { links, .. }) => {
                self.discovery_records += 1;
                self.links += links;
            }
            Ok(Outcome::Menu { menu, tags }) => {
                self.menu_records += 1;
                self.categories += menu.category_ids.len();
                self.items += menu.items;
                self.tag_links += tags.links;
            }
            Err(e) => {
                tracing::warn!("Dropped record on line {}: {}", line, e);
                self.failures.push(Failure {
                    line,
                    kind: e.kind(),
                    message: e.to_string(),
                });
            }
        }
    }

    pub fn committed(&self) -> usize {
        self.discovery_records + self.menu_records
    }

    pub fn failed(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }
}

impl std::fmt::Display for IngestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Ingest Report:")?;
        writeln!(f, "  Discovery records: {} ({} links)", self.discovery_records, self.links)?;
        writeln!(
            f,
            "  Menu records: {} ({} categories, {} items, {} tag links)",
            self.menu_records, self.categories, self.items, self.tag_links
        )?;
        writeln!(f, "  Unrecognized: {}", self.failed(FailureKind::Classification))?;
        writeln!(f, "  Constraint violations: {}", self.failed(FailureKind::ConstraintViolation))?;
        writeln!(f, "  Storage errors: {}", self.failed(FailureKind::Storage))
    }
}
