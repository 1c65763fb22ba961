//! Tests for deidentification, subsetting, and subsampling.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;
use scp_model::{FileKind, PortalError};
use scp_transform::{deidentify, subsample, subsample_with_rng, subset};
use scp_validate::PortalFile;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

fn open(kind: FileKind, path: &PathBuf) -> PortalFile {
    PortalFile::open(kind, path, b'\t').expect("open portal file")
}

fn keep(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(ToString::to_string).collect()
}

const METADATA: &str = "NAME\tCLUSTER\tSCORE\n\
                        TYPE\tgroup\tnumeric\n\
                        P1\ta\t0.5\n\
                        P2\ta\t1.5\n\
                        P3\tb\t2.5\n";

const EXPRESSION: &str = "GENE\tP1\tP2\tP3\n\
                          Itm2a\t0\t0.1\t2\n\
                          Sergef\t1.5\t0\t0\n";

#[test]
fn deidentify_assigns_cell_names_in_encounter_order() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "metadata.txt", METADATA);
    let file = open(FileKind::Metadata, &path);

    let result = deidentify(&file, None).unwrap().expect("deidentified");
    assert_eq!(result.mapping.get("P1").unwrap(), "cell_0");
    assert_eq!(result.mapping.get("P2").unwrap(), "cell_1");
    assert_eq!(result.mapping.get("P3").unwrap(), "cell_2");

    let rewritten = open(FileKind::Metadata, &result.file);
    assert_eq!(rewritten.identifiers(), ["cell_0", "cell_1", "cell_2"]);
    // Header rows survive through the identity entries.
    assert_eq!(rewritten.header()[0], "NAME");
    assert_eq!(rewritten.type_row().unwrap()[0], "TYPE");
    // The input is untouched.
    assert_eq!(std::fs::read_to_string(&path).unwrap(), METADATA);
}

#[test]
fn deidentify_round_trip_is_a_bijection() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "metadata.txt", METADATA);
    let file = open(FileKind::Metadata, &path);
    let result = deidentify(&file, None).unwrap().unwrap();

    // Parse the mapping file and invert it.
    let mapping_text = std::fs::read_to_string(&result.mapping_file).unwrap();
    let mut inverse = BTreeMap::new();
    for line in mapping_text.lines() {
        let (original, synthetic) = line.split_once("\t->\t").expect("mapping line");
        assert!(inverse.insert(synthetic.to_string(), original.to_string()).is_none());
    }

    let rewritten = open(FileKind::Metadata, &result.file);
    let recovered: BTreeSet<String> = rewritten
        .identifiers()
        .iter()
        .map(|name| inverse.get(name).expect("mapped name").clone())
        .collect();
    let originals: BTreeSet<String> = file.identifiers().iter().cloned().collect();
    assert_eq!(recovered, originals);
}

#[test]
fn mapping_file_lines_are_sorted() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "metadata.txt", METADATA);
    let file = open(FileKind::Metadata, &path);
    let result = deidentify(&file, None).unwrap().unwrap();

    let mapping_text = std::fs::read_to_string(&result.mapping_file).unwrap();
    let lines: Vec<&str> = mapping_text.lines().collect();
    let mut sorted = lines.clone();
    sorted.sort_unstable();
    assert_eq!(lines, sorted);
}

#[test]
fn deidentify_accepts_a_caller_supplied_mapping() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "metadata.txt", METADATA);
    let file = open(FileKind::Metadata, &path);

    let mut mapping = BTreeMap::new();
    mapping.insert("P1".to_string(), "s1".to_string());
    mapping.insert("P2".to_string(), "s2".to_string());
    mapping.insert("P3".to_string(), "s3".to_string());
    let result = deidentify(&file, Some(mapping)).unwrap().unwrap();

    let rewritten = open(FileKind::Metadata, &result.file);
    assert_eq!(rewritten.identifiers(), ["s1", "s2", "s3"]);
}

#[test]
fn deidentify_with_a_partial_mapping_fails_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "metadata.txt", METADATA);
    let file = open(FileKind::Metadata, &path);

    let mut mapping = BTreeMap::new();
    mapping.insert("P1".to_string(), "s1".to_string());
    assert!(matches!(
        deidentify(&file, Some(mapping)),
        Err(PortalError::Config(_))
    ));
    // The failed run left no output behind.
    assert!(!dir.path().join("metadata_deidentified.txt").exists());
    assert!(!dir.path().join("metadata_mapping.txt").exists());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), METADATA);
}

#[test]
fn deidentify_expression_rewrites_only_the_header() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "expr.txt", EXPRESSION);
    let file = open(FileKind::Expression, &path);
    let result = deidentify(&file, None).unwrap().unwrap();

    let rewritten = open(FileKind::Expression, &result.file);
    assert_eq!(rewritten.header()[0], "GENE");
    assert_eq!(rewritten.identifiers(), ["cell_0", "cell_1", "cell_2"]);
    assert_eq!(rewritten.gene_names().unwrap(), ["Itm2a", "Sergef"]);
}

#[test]
fn deidentify_gene_list_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "genelist.txt", "GENE NAMES\ta\nItm2a\t1\n");
    let file = open(FileKind::GeneList, &path);
    assert!(deidentify(&file, None).unwrap().is_none());
}

#[test]
fn subset_metadata_keeps_headers_and_matching_rows() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "metadata.txt", METADATA);
    let file = open(FileKind::Metadata, &path);

    let subset_path = subset(&file, &keep(&["P1", "P3"])).unwrap().unwrap();
    let reduced = open(FileKind::Metadata, &subset_path);
    assert_eq!(reduced.identifiers(), ["P1", "P3"]);
    assert_eq!(reduced.header(), file.header());
    assert_eq!(reduced.type_row(), file.type_row());
}

#[test]
fn subset_expression_filters_columns_and_keeps_the_corner() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "expr.txt", EXPRESSION);
    let file = open(FileKind::Expression, &path);

    let subset_path = subset(&file, &keep(&["P2"])).unwrap().unwrap();
    let reduced = open(FileKind::Expression, &subset_path);
    assert_eq!(reduced.header(), ["GENE", "P2"]);
    assert_eq!(reduced.gene_names().unwrap(), ["Itm2a", "Sergef"]);

    let contents = std::fs::read_to_string(&subset_path).unwrap();
    assert!(contents.contains("Itm2a\t0.1"));
}

#[test]
fn subset_expression_tolerates_a_missing_corner_keyword() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "expr.txt", "P1\tP2\nItm2a\t1\t2\nSergef\t3\t4\n");
    let file = open(FileKind::Expression, &path);

    let subset_path = subset(&file, &keep(&["P1"])).unwrap().unwrap();
    let reduced = open(FileKind::Expression, &subset_path);
    assert_eq!(reduced.header(), ["GENE", "P1"]);
}

#[test]
fn subset_is_idempotent_on_membership() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "metadata.txt", METADATA);
    let file = open(FileKind::Metadata, &path);

    let first = subset(&file, &keep(&["P1", "P2"])).unwrap().unwrap();
    let first_file = open(FileKind::Metadata, &first);
    // A superset of the first selection changes nothing.
    let second = subset(&first_file, &keep(&["P1", "P2", "P3"]))
        .unwrap()
        .unwrap();
    let second_file = open(FileKind::Metadata, &second);
    assert_eq!(first_file.identifiers(), second_file.identifiers());
}

#[test]
fn subsample_draws_evenly_across_groups() {
    let dir = TempDir::new().unwrap();
    let mut contents = String::from("NAME\tCLUSTER\nTYPE\tgroup\n");
    for index in 0..10 {
        contents.push_str(&format!("A{index}\ta\n"));
    }
    for index in 0..10 {
        contents.push_str(&format!("B{index}\tb\n"));
    }
    let path = write_file(&dir, "metadata.txt", &contents);
    let file = open(FileKind::Metadata, &path);

    let mut rng = StdRng::seed_from_u64(7);
    let selected = subsample_with_rng(&file, 8, "CLUSTER", &mut rng).unwrap();
    assert_eq!(selected.len(), 8);
    assert_eq!(selected.iter().filter(|name| name.starts_with('A')).count(), 4);
    assert_eq!(selected.iter().filter(|name| name.starts_with('B')).count(), 4);
    // Without replacement: no repeats.
    let unique: BTreeSet<&String> = selected.iter().collect();
    assert_eq!(unique.len(), selected.len());
}

#[test]
fn subsample_rounds_half_draws_to_the_even_integer() {
    let dir = TempDir::new().unwrap();
    let mut contents = String::from("NAME\tCLUSTER\nTYPE\tgroup\n");
    for index in 0..10 {
        contents.push_str(&format!("A{index}\ta\n"));
    }
    for index in 0..5 {
        contents.push_str(&format!("B{index}\tb\n"));
    }
    let path = write_file(&dir, "metadata.txt", &contents);
    let file = open(FileKind::Metadata, &path);

    // 9 / 2 = 4.5 rounds down to the even 4, so the draw of 4 fits the
    // smaller group of 5.
    let mut rng = StdRng::seed_from_u64(7);
    let selected = subsample_with_rng(&file, 9, "CLUSTER", &mut rng).unwrap();
    assert_eq!(selected.len(), 8);
    assert_eq!(selected.iter().filter(|name| name.starts_with('A')).count(), 4);
    assert_eq!(selected.iter().filter(|name| name.starts_with('B')).count(), 4);
}

#[test]
fn subsample_fails_when_a_group_is_too_small() {
    let dir = TempDir::new().unwrap();
    let mut contents = String::from("NAME\tCLUSTER\nTYPE\tgroup\n");
    for index in 0..10 {
        contents.push_str(&format!("A{index}\ta\n"));
    }
    for index in 0..5 {
        contents.push_str(&format!("B{index}\tb\n"));
    }
    let path = write_file(&dir, "metadata.txt", &contents);
    let file = open(FileKind::Metadata, &path);

    // round(30 / 2) = 15 exceeds both group sizes.
    assert!(matches!(
        subsample(&file, 30, "CLUSTER"),
        Err(PortalError::Config(_))
    ));
}

#[test]
fn subsample_requires_the_group_column_to_exist() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "metadata.txt", METADATA);
    let file = open(FileKind::Metadata, &path);
    assert!(matches!(
        subsample(&file, 2, "NO_SUCH_COLUMN"),
        Err(PortalError::Config(_))
    ));
}
