// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Export of accepted results into a per-year directory tree and a zip file.
//!
//! The exporter only consumes the export tables of its subjects; it never
//! reads result tables itself. Every run rebuilds `<root>/archive` and
//! `<root>/archive.zip` from scratch.

use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tally_domain::normalize_column;
use tally_persistence::{ExportTable, Persistence};
use thiserror::Error;
use tracing::{debug, info};
use zip::CompressionMethod;
use zip::write::FileOptions;

use crate::error::ApiError;

/// Longest file stem written into the archive.
pub const MAX_SLUG_LENGTH: usize = 60;

const README: &str = "# Results archive

Accepted results grouped by subject type and year, one CSV file per subject.

## votes/<year>/<title>.csv

One row per ballot and entity, in the internal import format:
`status`, `type` (proposal, counter-proposal, tie-breaker), `entity_id`,
`counted`, `yeas`, `nays`, `invalid`, `empty`, `eligible_voters`, `expats`.
Entities without results are listed with `counted` set to `false`.

## elections/<year>/<title>.csv

One row per party and year, in the party import format:
`year`, `total_votes`, `id`, `name`, `color`, `mandates`, `votes`,
`voters_count`, `voters_count_percentage`, followed by one
`panachage_votes_from_<list>` column per source list. The blank list has
the id `999`.

## elections/<year>/<title>-candidates.csv

One row per candidate and entity, in the internal election format:
`election_status`, `entity_id`, `entity_counted`, the entity's ballot
figures, `candidate_family_name`, `candidate_first_name`, `candidate_id`,
`candidate_elected`, `candidate_votes`, `candidate_party`, followed by
`list_name`, `list_id`, `list_number_of_mandates`, `list_votes` for
proportional elections or `election_absolute_majority` for majority
elections. Entities without results are left out.
";

/// Failures while writing the archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// No subject was given.
    #[error("Nothing to archive")]
    NothingToArchive,

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write CSV for {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to compress {path}: {source}")]
    Zip {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ArchiveError + '_ {
    move |source| ArchiveError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// What an archived file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Vote,
    Election,
}

impl SubjectKind {
    /// Directory grouping subjects of this kind.
    #[must_use]
    pub const fn directory(&self) -> &'static str {
        match self {
            Self::Vote => "votes",
            Self::Election => "elections",
        }
    }
}

/// One vote or election to archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSubject {
    pub kind: SubjectKind,
    pub year: i32,
    pub title: String,
    /// The subject's results in its re-importable layout.
    pub table: ExportTable,
}

/// Where an export run wrote its output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    pub directory: PathBuf,
    pub zip_path: PathBuf,
    /// Archive-relative paths of the written files, in write order.
    pub files: Vec<String>,
}

/// Turns a title into a file stem of `[a-z0-9-]`, at most
/// [`MAX_SLUG_LENGTH`] characters long.
///
/// # Examples
///
/// ```
/// use tally_api::slugify;
///
/// assert_eq!(slugify("Änderung des Steuergesetzes (2017)"), "anderung-des-steuergesetzes-2017");
/// ```
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug: String = String::new();
    for c in normalize_column(title).chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug: String = truncate_slug(&slug, MAX_SLUG_LENGTH);
    if slug.is_empty() {
        String::from("subject")
    } else {
        slug
    }
}

fn truncate_slug(slug: &str, max: usize) -> String {
    slug.chars()
        .take(max)
        .collect::<String>()
        .trim_end_matches('-')
        .to_string()
}

/// Picks a slug not yet used in the same directory, appending `-2`, `-3`...
fn unique_slug(base: &str, directory: &str, taken: &mut HashSet<String>) -> String {
    let mut candidate: String = base.to_string();
    let mut counter: usize = 1;
    while !taken.insert(format!("{directory}/{candidate}")) {
        counter += 1;
        let suffix: String = format!("-{counter}");
        let stem: String = truncate_slug(base, MAX_SLUG_LENGTH.saturating_sub(suffix.len()));
        candidate = format!("{stem}{suffix}");
    }
    candidate
}

fn csv_bytes(table: &ExportTable, path: &str) -> Result<Vec<u8>, ArchiveError> {
    let csv_error = |source: csv::Error| ArchiveError::Csv {
        path: path.to_string(),
        source,
    };
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.header).map_err(csv_error)?;
    for row in &table.rows {
        writer.write_record(row).map_err(csv_error)?;
    }
    writer.into_inner().map_err(|e| ArchiveError::Io {
        path: path.to_string(),
        source: e.into_error(),
    })
}

/// Writes archives below a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveExporter {
    root: PathBuf,
}

impl ArchiveExporter {
    #[must_use]
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path of the zip file an export produces.
    #[must_use]
    pub fn zip_path(&self) -> PathBuf {
        self.root.join("archive.zip")
    }

    /// Writes one CSV file per subject plus a `README.md`, then compresses
    /// the tree into `archive.zip`.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::NothingToArchive` for an empty subject list,
    /// otherwise only I/O failures.
    pub fn export(&self, subjects: &[ArchiveSubject]) -> Result<ArchiveSummary, ArchiveError> {
        if subjects.is_empty() {
            return Err(ArchiveError::NothingToArchive);
        }

        let directory: PathBuf = self.root.join("archive");
        if directory.exists() {
            std::fs::remove_dir_all(&directory).map_err(io_error(&directory))?;
        }
        std::fs::create_dir_all(&directory).map_err(io_error(&directory))?;

        let mut taken: HashSet<String> = HashSet::new();
        let mut entries: Vec<(String, Vec<u8>)> = Vec::with_capacity(subjects.len() + 1);
        for subject in subjects {
            let group: String = format!("{}/{}", subject.kind.directory(), subject.year);
            let slug: String = unique_slug(&slugify(&subject.title), &group, &mut taken);
            let relative: String = format!("{group}/{slug}.csv");
            let bytes: Vec<u8> = csv_bytes(&subject.table, &relative)?;

            let group_dir: PathBuf = directory
                .join(subject.kind.directory())
                .join(subject.year.to_string());
            std::fs::create_dir_all(&group_dir).map_err(io_error(&group_dir))?;
            let path: PathBuf = group_dir.join(format!("{slug}.csv"));
            std::fs::write(&path, &bytes).map_err(io_error(&path))?;

            debug!(path = %relative, rows = subject.table.rows.len(), "Archived subject");
            entries.push((relative, bytes));
        }

        let readme: PathBuf = directory.join("README.md");
        std::fs::write(&readme, README).map_err(io_error(&readme))?;
        entries.push((String::from("README.md"), README.as_bytes().to_vec()));

        let zip_path: PathBuf = self.zip_path();
        self.write_zip(&zip_path, &entries)?;

        info!(
            subjects = subjects.len(),
            zip = %zip_path.display(),
            "Archive written"
        );
        Ok(ArchiveSummary {
            directory,
            zip_path,
            files: entries.into_iter().map(|(name, _)| name).collect(),
        })
    }

    fn write_zip(&self, zip_path: &Path, entries: &[(String, Vec<u8>)]) -> Result<(), ArchiveError> {
        let zip_error = |source: zip::result::ZipError| ArchiveError::Zip {
            path: zip_path.display().to_string(),
            source,
        };

        let file: File = File::create(zip_path).map_err(io_error(zip_path))?;
        let mut writer: zip::ZipWriter<File> = zip::ZipWriter::new(file);
        let options: FileOptions =
            FileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, bytes) in entries {
            writer.start_file(name.as_str(), options).map_err(zip_error)?;
            writer.write_all(bytes).map_err(io_error(zip_path))?;
        }
        writer.finish().map_err(zip_error)?;
        debug!(root = %self.root.display(), entries = entries.len(), "Compressed archive");
        Ok(())
    }
}

/// Collects every vote and election that received results.
///
/// An election yields one subject for its party results and one for its
/// candidate results, each only when stored.
///
/// # Errors
///
/// Returns an error if a storage query fails.
pub fn collect_subjects(persistence: &mut Persistence) -> Result<Vec<ArchiveSubject>, ApiError> {
    let mut subjects: Vec<ArchiveSubject> = Vec::new();

    for vote in persistence.list_votes()? {
        if vote.last_result_change.is_none() {
            continue;
        }
        subjects.push(ArchiveSubject {
            kind: SubjectKind::Vote,
            year: vote.year,
            title: vote.title.clone(),
            table: persistence.vote_export(vote.vote_id)?,
        });
    }

    for election in persistence.list_elections()? {
        if election.last_result_change.is_none() {
            continue;
        }
        if !persistence
            .load_party_results(election.election_id)?
            .is_empty()
        {
            subjects.push(ArchiveSubject {
                kind: SubjectKind::Election,
                year: election.year,
                title: election.title.clone(),
                table: persistence.election_export(election.election_id)?,
            });
        }
        if persistence.count_election_results(election.election_id)? > 0 {
            subjects.push(ArchiveSubject {
                kind: SubjectKind::Election,
                year: election.year,
                title: format!("{} candidates", election.title),
                table: persistence.candidate_export(election.election_id)?,
            });
        }
    }

    Ok(subjects)
}

/// Archives every subject with results below `root`.
///
/// # Errors
///
/// Returns an error if storage fails, nothing has results yet, or writing
/// the archive fails.
pub fn export_archive(persistence: &mut Persistence, root: &Path) -> Result<ArchiveSummary, ApiError> {
    let subjects: Vec<ArchiveSubject> = collect_subjects(persistence)?;
    Ok(ArchiveExporter::new(root).export(&subjects)?)
}
