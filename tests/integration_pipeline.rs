mod common;

use std::process::Command;

use dish_sheet_extract::{
    CleaningRules, DishRecord, ExtractOptions, ExtractWarningCode, GridPages, PageRange, Profile,
    extract_dishes, extract_pdf_to_file,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn two_page_dish() -> GridPages {
    GridPages::from([
        (14, common::grid(&[&["基本信息", "老鸡汤"]])),
        (15, common::grid(&[&["将生姜切片后与清水一同下锅熬煮两小时"]])),
    ])
}

#[test]
fn merges_a_record_across_two_pages() {
    let segmenter = common::segmenter();
    let (records, report) = extract_dishes(
        &two_page_dish(),
        &ExtractOptions::default(),
        &CleaningRules::default(),
        &segmenter,
    )
    .expect("extraction should succeed");

    assert_eq!(report.table_count, 1);
    assert_eq!(report.accepted, 1);
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.basic_info.name.as_deref(), Some("老鸡汤"));
    assert_eq!(
        record.process.steps.as_deref(),
        Some("将生姜切片后与清水一同下锅熬煮两小时")
    );
    assert_eq!(record.category, "正餐菜品");
    assert_eq!(record.image, "./images/main_page_14_img.png");

    // the default scan end (210) is clamped to the last grid page
    assert!(
        report
            .warnings
            .iter()
            .any(|warning| warning.code == ExtractWarningCode::PageOutOfRange)
    );
}

#[test]
fn separate_tables_become_separate_records() {
    let source = GridPages::from([
        (
            139,
            common::grid(&[
                &["基本信息", "香酥鸡排"],
                &["味型", "咸鲜", "加工等级", "A"],
                &["配料", "鸡胸肉（200g，去皮）、面包糠"],
            ]),
        ),
        (140, Vec::new()),
        (
            151,
            common::grid(&[&["基本信息", "葱油拌面"], &["烹饪方式", "拌"]]),
        ),
    ]);
    let options = ExtractOptions {
        pages: PageRange::all(),
        ..ExtractOptions::default()
    };
    let segmenter = common::segmenter();

    let (records, report) =
        extract_dishes(&source, &options, &CleaningRules::default(), &segmenter)
            .expect("extraction should succeed");

    assert_eq!(report.table_count, 2);
    let names = records
        .iter()
        .map(|record| record.basic_info.name.clone().unwrap_or_default())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["香酥鸡排", "葱油拌面"]);
    assert_eq!(records[0].category, "炸品");
    assert_eq!(
        records[0].basic_info.ingredients,
        vec!["鸡胸肉（200g，去皮）", "面包糠"]
    );
    assert_eq!(records[0].basic_info.grade.as_deref(), Some("A"));
    assert_eq!(records[1].category, "主食");
    assert_eq!(records[1].process.cooking_method.as_deref(), Some("拌"));
}

#[test]
fn legacy_profile_still_extracts_names() {
    let options = ExtractOptions {
        profile: Profile::Legacy,
        ..ExtractOptions::default()
    };
    let segmenter = common::segmenter();
    let (records, _) = extract_dishes(
        &two_page_dish(),
        &options,
        &CleaningRules::default(),
        &segmenter,
    )
    .expect("extraction should succeed");

    assert_eq!(records.len(), 1);
    assert!(records[0].process.steps.is_some());
}

#[test]
fn cli_writes_json_from_grid_file() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("grids.json");
    let output = dir.path().join("dishes.json");
    let dict = dir.path().join("words.txt");

    common::write_grids_json(
        &input,
        &[
            (1, common::grid(&[&["基本信息", "老鸡汤"]])),
            (2, common::grid(&[&["将生姜切片后与清水一同下锅熬煮两小时"]])),
        ],
    )
    .expect("grid fixture should be written");
    common::write_dictionary(&dict).expect("dictionary should be written");

    let status = Command::new(env!("CARGO_BIN_EXE_dish2json"))
        .args(["extract", "--grids", "--pages", "1-", "--category", "1-5:汤品:soup"])
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--dict")
        .arg(&dict)
        .status()
        .expect("binary should run");
    assert!(status.success());

    let json = std::fs::read_to_string(&output).expect("output should be readable");
    let records: Vec<DishRecord> = serde_json::from_str(&json).expect("output should be JSON");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].category, "汤品");
    assert_eq!(records[0].image, "./images/soup_page_1_img.png");
    assert!(json.contains("\"品名\": \"老鸡汤\""), "{json}");
}

#[test]
fn cli_writes_csv_when_requested() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("grids.json");
    let output = dir.path().join("dishes.csv");
    let dict = dir.path().join("words.txt");

    common::write_grids_json(&input, &[(14, common::grid(&[&["基本信息", "老鸡汤"]]))])
        .expect("grid fixture should be written");
    common::write_dictionary(&dict).expect("dictionary should be written");

    let status = Command::new(env!("CARGO_BIN_EXE_dish2json"))
        .args(["extract", "--grids", "--format", "csv", "--display-label-paths"])
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--dict")
        .arg(&dict)
        .status()
        .expect("binary should run");
    assert!(status.success());

    let csv = std::fs::read_to_string(&output).expect("output should be readable");
    assert!(csv.starts_with("品名,"), "{csv}");
    assert!(csv.contains("老鸡汤"), "{csv}");
    assert!(csv.contains("./images/正餐菜品_page_14_img.png"), "{csv}");
}

#[test]
fn pdf_without_dish_tables_yields_no_records() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("plain.pdf");
    let output = dir.path().join("plain.json");

    common::create_text_pdf(&input, &[vec!["Menu handbook.", "Name  Value", "a  b"]])
        .expect("PDF fixture should be created");

    let options = ExtractOptions {
        pages: PageRange::all(),
        ..ExtractOptions::default()
    };
    let segmenter = common::segmenter();
    let report = extract_pdf_to_file(
        &input,
        &output,
        &options,
        &CleaningRules::default(),
        &segmenter,
    )
    .expect("extraction should succeed");

    assert_eq!(report.accepted, 0);
    let json = std::fs::read_to_string(&output).expect("output should be readable");
    let records: Vec<DishRecord> = serde_json::from_str(&json).expect("output should be JSON");
    assert!(records.is_empty());
}

#[test]
fn cli_exits_with_code_two_when_no_records() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("plain.pdf");
    let output = dir.path().join("plain.json");
    let dict = dir.path().join("words.txt");

    common::create_text_pdf(&input, &[vec!["Menu handbook."]])
        .expect("PDF fixture should be created");
    common::write_dictionary(&dict).expect("dictionary should be written");

    let status = Command::new(env!("CARGO_BIN_EXE_dish2json"))
        .args(["extract", "--pages", "1-"])
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--dict")
        .arg(&dict)
        .status()
        .expect("binary should run");
    assert_eq!(status.code(), Some(2));
}

#[test]
fn cli_fails_on_invalid_page_range() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("grids.json");
    let output = dir.path().join("dishes.json");
    let dict = dir.path().join("words.txt");

    common::write_grids_json(&input, &[(1, common::grid(&[&["基本信息", "老鸡汤"]]))])
        .expect("grid fixture should be written");
    common::write_dictionary(&dict).expect("dictionary should be written");

    let status = Command::new(env!("CARGO_BIN_EXE_dish2json"))
        .args(["extract", "--grids", "--pages", "x-3"])
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--dict")
        .arg(&dict)
        .status()
        .expect("binary should run");
    assert_eq!(status.code(), Some(1));
}
