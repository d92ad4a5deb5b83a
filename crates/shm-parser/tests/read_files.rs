//! Integration tests reading coefficient files from disk.

use shm_parser::{read_model_file, ModelFormat, ReadOptions, ShmError};
use std::io::Write;
use test_utils::{create_gfc_text, create_shm_text, fixtures::models, require_test_file};

fn write_temp(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn test_read_egm_sample() {
    let path = require_test_file!("egm_sample.shm");
    let model = read_model_file(&path, &ReadOptions::default()).unwrap();

    assert_eq!(model.format, ModelFormat::Shm);
    assert_eq!(model.lmax, 4);
    // degrees 2..=4 plus the implied monopole
    assert_eq!(model.records.len(), 13);
    assert!(model.has_errors());
    assert_eq!(model.get(0, 0).unwrap().sigma_c, Some(0.0));

    let c20 = model.get(2, 0).unwrap();
    assert!((c20.c - models::EGM2008_C20).abs() < 1e-20);
    assert!(c20.sigma_c.is_some());

    let c44 = model.get(4, 4).unwrap();
    assert!(c44.s > 0.0);
}

#[test]
fn test_read_egm_sample_truncated() {
    let path = require_test_file!("egm_sample.shm");
    let model = read_model_file(&path, &ReadOptions::truncated(3)).unwrap();
    assert_eq!(model.lmax, 3);
    assert!(model.get(4, 0).is_none());
    // Degree 1 is absent from EGM files
    assert!(!model.is_complete());
}

#[test]
fn test_generated_shm_roundtrip_values() {
    let text = create_shm_text(8, 11, true);
    let file = write_temp(&text, ".shm");
    let model = read_model_file(file.path(), &ReadOptions::default()).unwrap();
    let expected = test_utils::create_coefficient_array(8, 11);

    assert_eq!(model.lmax, 8);
    for record in &model.records {
        let c = expected[[0, record.degree, record.order]];
        let s = expected[[1, record.degree, record.order]];
        assert!((record.c - c).abs() <= 1e-14 * c.abs().max(1e-30));
        assert!((record.s - s).abs() <= 1e-14 * s.abs().max(1e-30));
    }
}

#[test]
fn test_read_generated_gfc() {
    let text = create_gfc_text(5, 2, models::EGM2008_RADIUS, models::EGM2008_GM);
    let file = write_temp(&text, ".gfc");
    let model = read_model_file(file.path(), &ReadOptions::default()).unwrap();

    assert_eq!(model.format, ModelFormat::Icgem);
    assert_eq!(model.header.name.as_deref(), Some("SYNTH"));
    assert_eq!(model.header.radius, Some(models::EGM2008_RADIUS));
    assert_eq!(model.header.gm, Some(models::EGM2008_GM));
    assert_eq!(model.header.max_degree, Some(5));
    assert!(model.is_complete());
    assert!(model.has_errors());
}

#[test]
fn test_read_small_icgem() {
    let file = write_temp(models::ICGEM_SMALL, ".gfc");
    let model = read_model_file(file.path(), &ReadOptions::default()).unwrap();
    assert_eq!(model.header.tide_system.as_deref(), Some("tide_free"));
    assert_eq!(model.lmax, 2);
    assert_eq!(model.get(0, 0).map(|r| r.c), Some(1.0));
}

#[test]
fn test_unnormalized_icgem_rejected() {
    let file = write_temp(models::ICGEM_UNNORMALIZED, ".gfc");
    let err = read_model_file(file.path(), &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, ShmError::InvalidHeader(_)), "got {:?}", err);
}

#[test]
fn test_missing_file() {
    let err = read_model_file("/nonexistent/model.shm", &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, ShmError::IoError(_)));
}

#[test]
fn test_empty_file_names_path() {
    let file = write_temp("# only a comment\n", ".shm");
    let options = ReadOptions {
        imply_monopole: false,
        ..ReadOptions::default()
    };
    let err = read_model_file(file.path(), &options).unwrap_err();
    match err {
        ShmError::Empty(what) => assert!(what.ends_with(".shm")),
        other => panic!("unexpected error {:?}", other),
    }
}
