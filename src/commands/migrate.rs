use anyhow::Result;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::code_for;
use crate::journal::config::load_config;
use crate::journal::discover::discover_journal_files;
use crate::journal::entry::parse_entry;
use crate::journal::store::{EntrySink, SupabaseSink, UpsertOutcome};
use crate::journal::warn::{self, Stage, WarnEvent};

#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    pub vault: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub imported: usize,
    pub errors: usize,
    pub unconfirmed: usize,
}

impl MigrationSummary {
    pub fn line(&self) -> String {
        let mut line = format!(
            "Migration complete: {} imported, {} errors",
            self.imported, self.errors
        );
        if self.unconfirmed > 0 {
            line.push_str(&format!(", {} unconfirmed", self.unconfirmed));
        }
        line
    }
}

fn warn_failure(stage: Stage, path: &Path, err: &anyhow::Error, fallback: &'static str) {
    warn::emit(&WarnEvent {
        code: code_for(err, fallback),
        stage,
        file: &path.display().to_string(),
        reason: "entry_skipped",
        err: &format!("{err:#}"),
    });
}

/// Parse and upsert each file in order. Failures are counted and reported,
/// never propagated; only writing progress to `out` can fail the batch.
pub fn migrate_files<S, W>(files: &[PathBuf], sink: &mut S, out: &mut W) -> Result<MigrationSummary>
where
    S: EntrySink + ?Sized,
    W: Write,
{
    let mut summary = MigrationSummary::default();

    for path in files {
        let entry = match parse_entry(path) {
            Ok(entry) => entry,
            Err(err) => {
                summary.errors += 1;
                writeln!(out, "✗ Error parsing {}: {err:#}", path.display())?;
                warn_failure(Stage::Parse, path, &err, "E100_PARSE");
                continue;
            }
        };

        match sink.upsert(&entry) {
            Ok(UpsertOutcome::Stored) => {
                summary.imported += 1;
                writeln!(out, "✓ Imported: {}", entry.date)?;
            }
            Ok(UpsertOutcome::NoRows) => {
                summary.unconfirmed += 1;
                writeln!(
                    out,
                    "? No rows returned for {} ({})",
                    entry.date,
                    path.display()
                )?;
                warn::emit(&WarnEvent {
                    code: "W001_NO_ROWS",
                    stage: Stage::Upsert,
                    file: &path.display().to_string(),
                    reason: "upsert_unconfirmed",
                    err: "store returned no rows",
                });
            }
            Err(err) => {
                summary.errors += 1;
                writeln!(out, "✗ Error importing {}: {err:#}", path.display())?;
                warn_failure(Stage::Upsert, path, &err, "E200_UPSERT");
            }
        }
    }

    Ok(summary)
}

pub fn run(opts: &MigrateOptions) -> Result<MigrationSummary> {
    let cfg = load_config(opts.vault.as_deref())?;
    let files = discover_journal_files(&cfg.vault.path, &cfg.vault.include)?;
    let mut sink = SupabaseSink::new(&cfg.store)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "Found {} journal files", files.len())?;

    let summary = migrate_files(&files, &mut sink, &mut out)?;
    writeln!(out, "\n{}", summary.line())?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::entry::JournalEntry;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::tempdir;

    /// Table stand-in with the same (user_id, date) conflict target.
    struct MemorySink {
        user_id: String,
        rows: BTreeMap<(String, NaiveDate), JournalEntry>,
        reject: Option<NaiveDate>,
    }

    impl MemorySink {
        fn new() -> Self {
            Self {
                user_id: "user-1".to_string(),
                rows: BTreeMap::new(),
                reject: None,
            }
        }
    }

    impl EntrySink for MemorySink {
        fn upsert(&mut self, entry: &JournalEntry) -> Result<UpsertOutcome> {
            if self.reject == Some(entry.date) {
                anyhow::bail!("store rejected {}", entry.date);
            }
            self.rows
                .insert((self.user_id.clone(), entry.date), entry.clone());
            Ok(UpsertOutcome::Stored)
        }
    }

    struct SilentSink;

    impl EntrySink for SilentSink {
        fn upsert(&mut self, _entry: &JournalEntry) -> Result<UpsertOutcome> {
            Ok(UpsertOutcome::NoRows)
        }
    }

    fn write_vault(root: &Path) {
        let journal = root.join("Journal");
        fs::create_dir_all(&journal).expect("mkdir journal");
        fs::write(
            journal.join("2024-03-01.md"),
            "---\ndate: 2024-03-01\np-score: 7\ntags: \"[work, health]\"\n---\n## Morning\nWoke up early\n",
        )
        .expect("write 1");
        fs::write(journal.join("2024-03-02.md"), "## Night\nEarly bed\n").expect("write 2");
        fs::write(journal.join("scratch.md"), "---\ndate: next tuesday\n---\n").expect("write 3");
        fs::create_dir_all(root.join("Projects")).expect("mkdir projects");
        fs::write(root.join("Projects/2024-03-05.md"), "## Morning\nnot a journal\n")
            .expect("write 4");
    }

    fn journal_files(root: &Path) -> Vec<PathBuf> {
        let include = vec!["journal".to_string(), "daily".to_string()];
        discover_journal_files(root, &include).expect("discover")
    }

    #[test]
    fn bad_date_is_counted_and_batch_completes() {
        let tmp = tempdir().expect("tempdir");
        write_vault(tmp.path());
        let files = journal_files(tmp.path());
        let mut sink = MemorySink::new();
        let mut out = Vec::new();

        let summary = migrate_files(&files, &mut sink, &mut out).expect("migrate");

        assert_eq!(
            summary,
            MigrationSummary {
                imported: 2,
                errors: 1,
                unconfirmed: 0,
            }
        );
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("✓ Imported: 2024-03-01"));
        assert!(text.contains("✓ Imported: 2024-03-02"));
        assert!(text.contains("✗ Error parsing"));
        assert!(text.contains("scratch.md"));

        let first = &sink.rows[&("user-1".to_string(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())];
        assert_eq!(first.p_score, Some(7));
        assert_eq!(first.morning.as_deref(), Some("Woke up early"));
        assert_eq!(first.tags, vec!["work", "health"]);
    }

    #[test]
    fn rerun_does_not_duplicate_rows() {
        let tmp = tempdir().expect("tempdir");
        write_vault(tmp.path());
        let files = journal_files(tmp.path());
        let mut sink = MemorySink::new();

        let first = migrate_files(&files, &mut sink, &mut io::sink()).expect("first run");
        let rows_after_first = sink.rows.len();
        let second = migrate_files(&files, &mut sink, &mut io::sink()).expect("second run");

        assert_eq!(rows_after_first, 2);
        assert_eq!(sink.rows.len(), rows_after_first);
        assert_eq!(first, second);
    }

    #[test]
    fn upsert_failure_is_counted_and_batch_continues() {
        let tmp = tempdir().expect("tempdir");
        write_vault(tmp.path());
        let files = journal_files(tmp.path());
        let mut sink = MemorySink::new();
        sink.reject = NaiveDate::from_ymd_opt(2024, 3, 1);
        let mut out = Vec::new();

        let summary = migrate_files(&files, &mut sink, &mut out).expect("migrate");

        assert_eq!(summary.imported, 1);
        assert_eq!(summary.errors, 2);
        assert_eq!(sink.rows.len(), 1);
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("✗ Error importing"));
        assert!(text.contains("store rejected 2024-03-01"));
    }

    #[test]
    fn empty_representation_is_neither_import_nor_error() {
        let tmp = tempdir().expect("tempdir");
        write_vault(tmp.path());
        let files = journal_files(tmp.path());

        let summary = migrate_files(&files, &mut SilentSink, &mut io::sink()).expect("migrate");

        assert_eq!(summary.imported, 0);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.unconfirmed, 2);
        assert_eq!(
            summary.line(),
            "Migration complete: 0 imported, 1 errors, 2 unconfirmed"
        );
    }

    #[test]
    fn summary_line_omits_zero_unconfirmed() {
        let summary = MigrationSummary {
            imported: 4,
            errors: 1,
            unconfirmed: 0,
        };
        assert_eq!(summary.line(), "Migration complete: 4 imported, 1 errors");
    }
}
