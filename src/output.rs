use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::WriterBuilder;

use crate::error::ExtractError;
use crate::model::DishRecord;
use crate::options::OutputFormat;

const CSV_HEADERS: [&str; 9] = [
    "品名",
    "味型",
    "最佳风味期",
    "加工等级",
    "配料",
    "烹饪方式",
    "制作工艺",
    "图片",
    "类别",
];
const INGREDIENT_JOINER: &str = "、";

fn csv_row(record: &DishRecord) -> [String; 9] {
    let info = &record.basic_info;
    let process = &record.process;
    [
        info.name.clone().unwrap_or_default(),
        info.sensory_profile.clone().unwrap_or_default(),
        info.freshness_window.clone().unwrap_or_default(),
        info.grade.clone().unwrap_or_default(),
        info.ingredients.join(INGREDIENT_JOINER),
        process.cooking_method.clone().unwrap_or_default(),
        process.steps.clone().unwrap_or_default(),
        record.image.clone(),
        record.category.clone(),
    ]
}

fn write_json<W: Write>(mut writer: W, records: &[DishRecord]) -> Result<(), ExtractError> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn write_csv<W: Write>(writer: W, records: &[DishRecord]) -> Result<W, ExtractError> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(CSV_HEADERS)?;
    for record in records {
        writer.write_record(csv_row(record))?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))
}

pub(crate) fn write_records(
    path: &Path,
    records: &[DishRecord],
    format: OutputFormat,
) -> Result<(), ExtractError> {
    let file = BufWriter::new(File::create(path)?);
    match format {
        OutputFormat::Json => write_json(file, records),
        OutputFormat::Csv => write_csv(file, records).map(drop),
    }
}

pub(crate) fn records_to_string(
    records: &[DishRecord],
    format: OutputFormat,
) -> Result<String, ExtractError> {
    let bytes = match format {
        OutputFormat::Json => {
            let mut bytes = Vec::new();
            write_json(&mut bytes, records)?;
            bytes
        }
        OutputFormat::Csv => write_csv(Vec::new(), records)?,
    };
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 output: {error}")))
}

#[cfg(test)]
mod tests {
    use super::records_to_string;
    use crate::model::{BasicInfo, DishRecord, KitchenProcess};
    use crate::options::OutputFormat;

    fn record() -> DishRecord {
        DishRecord {
            basic_info: BasicInfo {
                name: Some("老鸡汤".to_string()),
                ingredients: vec!["老母鸡（500g，切块）".to_string(), "生姜".to_string()],
                ..BasicInfo::default()
            },
            process: KitchenProcess {
                cooking_method: Some("炖".to_string()),
                steps: Some("1.焯水 2.小火慢炖".to_string()),
            },
            image: "./images/main_page_14_img.png".to_string(),
            category: "正餐菜品".to_string(),
        }
    }

    #[test]
    fn json_output_keeps_unicode_and_field_names() {
        let json = records_to_string(&[record()], OutputFormat::Json).expect("JSON should render");
        assert!(json.contains("\"品名\": \"老鸡汤\""), "{json}");
        assert!(json.contains("\"图片\": \"./images/main_page_14_img.png\""));
        assert!(!json.contains("味型"));
        let parsed: Vec<DishRecord> = serde_json::from_str(&json).expect("JSON should parse back");
        assert_eq!(parsed[0], record());
    }

    #[test]
    fn csv_output_joins_ingredients() {
        let csv = records_to_string(&[record()], OutputFormat::Csv).expect("CSV should render");
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("品名,味型,最佳风味期,加工等级,配料,烹饪方式,制作工艺,图片,类别")
        );
        assert_eq!(
            lines.next(),
            Some("老鸡汤,,,,老母鸡（500g，切块）、生姜,炖,1.焯水 2.小火慢炖,./images/main_page_14_img.png,正餐菜品")
        );
    }
}
