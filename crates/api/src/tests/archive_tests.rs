// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{
    DEFAULT_HEADER, ELECTION_HEADER, create_proporz_election, create_test_election,
    create_test_persistence, create_test_registry, create_test_vote, csv_bytes, temp_dir,
};
use crate::{
    ApiError, ArchiveError, ArchiveExporter, ArchiveSubject, ArchiveSummary, ImportOptions,
    ImportSource, MAX_SLUG_LENGTH, SubjectKind, collect_subjects, export_archive,
    import_election_results, import_vote, slugify,
};
use std::path::PathBuf;
use tally::Format;
use tally_domain::EntityRegistry;
use tally_persistence::{ExportTable, Persistence};

fn subject(kind: SubjectKind, year: i32, title: &str) -> ArchiveSubject {
    ArchiveSubject {
        kind,
        year,
        title: title.to_string(),
        table: ExportTable {
            header: vec![String::from("entity_id"), String::from("yeas")],
            rows: vec![vec![String::from("1701"), String::from("10")]],
        },
    }
}

fn zip_names(path: &std::path::Path) -> Vec<String> {
    let file: std::fs::File = std::fs::File::open(path).unwrap();
    let mut archive: zip::ZipArchive<std::fs::File> = zip::ZipArchive::new(file).unwrap();
    let mut names: Vec<String> = (0..archive.len())
        .map(|index| archive.by_index(index).unwrap().name().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_slugify() {
    assert_eq!(slugify("Änderung des Steuergesetzes"), "anderung-des-steuergesetzes");
    assert_eq!(slugify("  --Tunnel / Zug (2017)!  "), "tunnel-zug-2017");
    assert_eq!(slugify("???"), "subject");
}

#[test]
fn test_slug_length_is_capped() {
    let title: String = "Volksinitiative ".repeat(10);

    let slug: String = slugify(&title);

    assert!(slug.len() <= MAX_SLUG_LENGTH);
    assert!(!slug.ends_with('-'));
    assert!(slug.starts_with("volksinitiative-volksinitiative"));
}

#[test]
fn test_export_writes_tree_and_zip() {
    let root: PathBuf = temp_dir("archive");

    let summary: ArchiveSummary = ArchiveExporter::new(&root)
        .export(&[
            subject(SubjectKind::Vote, 2017, "Steuergesetz"),
            subject(SubjectKind::Election, 2022, "Kantonsrat"),
        ])
        .unwrap();

    assert_eq!(
        summary.files,
        vec![
            "votes/2017/steuergesetz.csv",
            "elections/2022/kantonsrat.csv",
            "README.md"
        ]
    );
    let csv: String =
        std::fs::read_to_string(root.join("archive/votes/2017/steuergesetz.csv")).unwrap();
    assert_eq!(csv, "entity_id,yeas\n1701,10\n");
    assert!(root.join("archive/README.md").exists());
    assert_eq!(
        zip_names(&summary.zip_path),
        vec![
            "README.md",
            "elections/2022/kantonsrat.csv",
            "votes/2017/steuergesetz.csv"
        ]
    );
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn test_colliding_titles_get_suffixes() {
    let root: PathBuf = temp_dir("collision");

    let summary: ArchiveSummary = ArchiveExporter::new(&root)
        .export(&[
            subject(SubjectKind::Vote, 2017, "Steuergesetz"),
            subject(SubjectKind::Vote, 2017, "Steuergesetz!"),
            subject(SubjectKind::Vote, 2018, "Steuergesetz"),
        ])
        .unwrap();

    assert_eq!(
        &summary.files[..3],
        &[
            "votes/2017/steuergesetz.csv",
            "votes/2017/steuergesetz-2.csv",
            "votes/2018/steuergesetz.csv"
        ]
    );
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn test_rerun_replaces_previous_archive() {
    let root: PathBuf = temp_dir("rerun");
    let exporter: ArchiveExporter = ArchiveExporter::new(&root);
    exporter
        .export(&[subject(SubjectKind::Vote, 2016, "Old vote")])
        .unwrap();

    exporter
        .export(&[subject(SubjectKind::Vote, 2017, "New vote")])
        .unwrap();

    assert!(!root.join("archive/votes/2016").exists());
    assert_eq!(
        zip_names(&exporter.zip_path()),
        vec!["README.md", "votes/2017/new-vote.csv"]
    );
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn test_nothing_to_archive() {
    let root: PathBuf = temp_dir("nothing");

    let result: Result<ArchiveSummary, ArchiveError> = ArchiveExporter::new(&root).export(&[]);

    assert!(matches!(result, Err(ArchiveError::NothingToArchive)));
    assert!(!root.join("archive.zip").exists());
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn test_only_subjects_with_results_are_collected() {
    let mut persistence: Persistence = create_test_persistence();
    let vote_id: i64 = create_test_vote(&mut persistence);
    create_test_vote(&mut persistence);
    create_test_election(&mut persistence);
    import_vote(
        &mut persistence,
        &create_test_registry(),
        vote_id,
        Format::Default,
        &ImportSource::new(
            "results.csv",
            "text/csv",
            csv_bytes(&[DEFAULT_HEADER, "1711,3821,7405,16516,80,1"]),
        ),
        &ImportOptions::default(),
    )
    .unwrap();

    let subjects: Vec<ArchiveSubject> = collect_subjects(&mut persistence).unwrap();

    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0].kind, SubjectKind::Vote);
    assert_eq!(subjects[0].table.rows.len(), 5);

    let root: PathBuf = temp_dir("collect");
    let summary: ArchiveSummary = export_archive(&mut persistence, &root).unwrap();
    assert_eq!(summary.files[0], "votes/2017/anderung-des-steuergesetzes.csv");
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn test_candidate_results_are_archived_in_the_internal_election_format() {
    let mut persistence: Persistence = create_test_persistence();
    let registry: EntityRegistry = create_test_registry();
    let election_id: i64 = create_proporz_election(&mut persistence);
    let lines: [&str; 2] = [
        ELECTION_HEADER,
        "final,1701,true,1000,600,10,5,3,2,Muster,Anna,101,true,300,FDP,FDP,01,1,550",
    ];
    import_election_results(
        &mut persistence,
        &registry,
        election_id,
        &ImportSource::new("candidates.csv", "text/csv", csv_bytes(&lines)),
    )
    .unwrap();

    let subjects: Vec<ArchiveSubject> = collect_subjects(&mut persistence).unwrap();

    // Without party results the election only archives its candidates.
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0].kind, SubjectKind::Election);
    assert_eq!(subjects[0].title, "Regierungsratswahl candidates");
    assert_eq!(subjects[0].table.header[4], "entity_expats");
    assert_eq!(
        subjects[0].table.rows[0].join(","),
        "final,1701,true,1000,0,600,10,5,3,2,Muster,Anna,101,true,300,FDP,FDP,01,1,550"
    );

    let root: PathBuf = temp_dir("candidates");
    let summary: ArchiveSummary = export_archive(&mut persistence, &root).unwrap();
    assert_eq!(summary.files[0], "elections/2017/regierungsratswahl-candidates.csv");
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn test_export_archive_without_results_is_an_error() {
    let mut persistence: Persistence = create_test_persistence();
    create_test_vote(&mut persistence);
    let root: PathBuf = temp_dir("empty");

    let result: Result<ArchiveSummary, ApiError> = export_archive(&mut persistence, &root);

    assert!(matches!(result, Err(ApiError::ResourceNotFound { .. })));
    let _ = std::fs::remove_dir_all(&root);
}
