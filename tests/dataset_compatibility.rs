//! Dataset compatibility and format validation tests
//!
//! Tests for ensuring different file layouts and schemas work correctly
//! across the pipeline

use rvote::data::{ClassColumn, DataSource, LoaderOptions};
use rvote::{
    evaluate_model, get_classifiers, train_model, train_test_split, Classifier, CsvLoader,
    DataLoader, Instance, VoteError,
};
use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn write_temp(contents: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::with_suffix(".csv").expect("Failed to create temp file");
    write!(temp_file, "{contents}").expect("Failed to write");
    temp_file.flush().expect("Failed to flush");
    temp_file
}

/// Test delimited format variations
#[test]
fn test_format_variations() {
    let test_cases = vec![
        (
            "\"age\";\"job\";\"y\"\n30;\"admin.\";\"no\"\n41;\"services\";\"yes\"\n",
            "quoted fields",
        ),
        ("age;job;y\n30;admin.;no\n41;services;yes\n", "unquoted fields"),
        ("age ; job ; y\n 30 ; admin. ; no\n41;services;yes\n", "padded fields"),
        ("age;job;y\r\n30;admin.;no\r\n41;services;yes\r\n", "CRLF line endings"),
        ("age;job;y\n30;admin.;no\n41;services;yes", "no trailing newline"),
    ];

    for (data, description) in test_cases {
        let temp_file = write_temp(data);
        let dataset = CsvLoader::new()
            .load_file(temp_file.path())
            .unwrap_or_else(|e| panic!("Failed to load {description}: {e}"));

        assert_eq!(dataset.len(), 2, "{description}");
        assert_eq!(dataset.num_attributes(), 3, "{description}");
        assert!(dataset.attributes()[0].is_numeric(), "{description}");
        assert!(dataset.attributes()[1].is_nominal(), "{description}");
        assert_eq!(dataset.class_label(1), Some("yes"), "{description}");
    }
}

#[test]
fn test_malformed_files_are_load_errors() {
    let test_cases = vec![
        ("age;job;y\n30;admin.\n41;services;yes\n", "short row"),
        ("age;job;y\n30;admin.;no;extra\n", "long row"),
        ("age;job;y\n", "header only"),
        ("", "empty file"),
    ];

    for (data, description) in test_cases {
        let temp_file = write_temp(data);
        let result = CsvLoader::new().load_file(temp_file.path());
        assert!(
            matches!(result, Err(VoteError::LoadError(_))),
            "{description} should fail with LoadError"
        );
    }
}

#[test]
fn test_missing_resource_is_load_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let loader = DataLoader::new(temp_dir.path());
    assert!(matches!(loader.load(true), Err(VoteError::LoadError(_))));
    assert!(matches!(loader.load(false), Err(VoteError::LoadError(_))));

    assert!(matches!(
        CsvLoader::new().load_file(temp_dir.path().join("absent.csv")),
        Err(VoteError::LoadError(_))
    ));
}

#[test]
fn test_loader_selects_resource_by_flag() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(
        temp_dir.path().join("bank.csv"),
        "age;y\n30;no\n40;yes\n",
    )
    .expect("Failed to write");
    fs::write(
        temp_dir.path().join("bank-full.csv"),
        "age;y\n30;no\n40;yes\n50;no\n",
    )
    .expect("Failed to write");

    let loader = DataLoader::new(temp_dir.path());
    assert_eq!(loader.load(false).expect("Sample should load").len(), 2);
    assert_eq!(loader.load(true).expect("Full should load").len(), 3);
    assert_eq!(
        loader.path_for(DataSource::Full),
        Some(temp_dir.path().join("bank-full.csv"))
    );
}

#[test]
fn test_custom_delimiter_and_class_column() {
    let temp_file = write_temp("label,x,colour\nb,1.0,red\na,2.5,blue\nb,?,red\n");
    let options = LoaderOptions {
        delimiter: b',',
        class_column: ClassColumn::Name("label".to_string()),
        ..LoaderOptions::default()
    };

    let dataset = CsvLoader::with_options(options)
        .load_file(temp_file.path())
        .expect("Load should succeed");
    assert_eq!(dataset.class_index(), Some(0));
    assert_eq!(dataset.class_label(0), Some("b"));
    assert!(dataset.instances()[2].is_missing(1));

    let options = LoaderOptions {
        delimiter: b',',
        class_column: ClassColumn::Name("missing".to_string()),
        ..LoaderOptions::default()
    };
    assert!(matches!(
        CsvLoader::with_options(options).load_file(temp_file.path()),
        Err(VoteError::LoadError(_))
    ));
}

#[test]
fn test_numeric_looking_class_is_nominal() {
    let temp_file = write_temp("x;outcome\n0.5;1\n1.5;0\n2.5;1\n");
    let dataset = CsvLoader::new()
        .load_file(temp_file.path())
        .expect("Load should succeed");

    let class = dataset.class_attribute().expect("Class attribute");
    assert!(class.is_nominal());
    assert_eq!(class.value(0), Some("1"));
    assert_eq!(class.value(1), Some("0"));
}

/// Every classifier copes with missing feature values
#[test]
fn test_classifiers_handle_missing_values() {
    let mut contents = String::from("age;job;balance;y\n");
    for i in 0..20 {
        let age = if i % 5 == 0 { "?".to_string() } else { (20 + i * 2).to_string() };
        let job = if i % 7 == 0 { "?" } else if i % 2 == 0 { "admin." } else { "retired" };
        let y = if i >= 10 { "yes" } else { "no" };
        contents.push_str(&format!("{age};{job};{};{y}\n", i * 100));
    }
    let temp_file = write_temp(&contents);
    let data = CsvLoader::new()
        .load_file(temp_file.path())
        .expect("Load should succeed");

    let (train, test) = train_test_split(data, 0.8, 42).expect("Split should succeed");
    let blank = Instance::new(vec![None; train.num_attributes()]);

    for model in get_classifiers() {
        let name = model.name().to_string();
        let model = train_model(model, &train)
            .unwrap_or_else(|e| panic!("{name} should train with missing values: {e}"));

        let dist = model
            .distribution(&blank)
            .unwrap_or_else(|e| panic!("{name} should predict an all-missing row: {e}"));
        assert_eq!(dist.len(), 2, "{name}");
        assert!(dist.iter().all(|p| p.is_finite()), "{name}");

        evaluate_model(&model, &train, &test)
            .unwrap_or_else(|e| panic!("{name} should evaluate: {e}"));
    }
}

/// A test set with a different schema is rejected by the evaluator
#[test]
fn test_schema_mismatch_is_evaluation_error() {
    let train_file = write_temp("age;job;y\n30;admin.;no\n41;services;yes\n35;admin.;no\n");
    let other_file = write_temp("age;job;y\n30;admin.;no\n41;retired;yes\n");

    let train = CsvLoader::new()
        .load_file(train_file.path())
        .expect("Load should succeed");
    let other = CsvLoader::new()
        .load_file(other_file.path())
        .expect("Load should succeed");

    let model = train_model(get_classifiers().remove(0), &train).expect("Training should succeed");
    assert!(matches!(
        evaluate_model(&model, &train, &other),
        Err(VoteError::EvaluationError(_))
    ));

    let wrong_width = Instance::new(vec![Some(1.0)]);
    assert!(matches!(
        model.predict(&wrong_width),
        Err(VoteError::EvaluationError(_))
    ));
}

/// Numeric class columns cannot be used for classification
#[test]
fn test_numeric_class_is_training_error() {
    let temp_file = write_temp("y;x\n1.0;a\n2.0;b\n");
    let options = LoaderOptions {
        class_column: ClassColumn::Index(1),
        ..LoaderOptions::default()
    };
    let data = CsvLoader::with_options(options)
        .load_file(temp_file.path())
        .expect("Load should succeed");
    assert!(data.attributes()[0].is_numeric());

    let mut numeric_class = data.clone();
    numeric_class
        .set_class_index(0)
        .expect("Valid class index");

    for mut model in get_classifiers() {
        assert!(
            matches!(model.fit(&numeric_class), Err(VoteError::TrainingError(_))),
            "{} should reject a numeric class",
            model.name()
        );
    }
}
