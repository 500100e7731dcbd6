//! Synthetic corpus for demos and load tests.
//!
//! Output is deterministic: every choice is derived from the document index,
//! so two runs with the same year produce byte-identical Markdown and DWG
//! files. File names are picked so the default catalog classifies them.

use crate::error::IndexError;
use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoFormat {
    Markdown,
    Pdf,
    Dwg,
}

impl DemoFormat {
    fn extension(&self) -> &'static str {
        match self {
            DemoFormat::Markdown => "md",
            DemoFormat::Pdf => "pdf",
            DemoFormat::Dwg => "dwg",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemoTypeProfile {
    pub type_id: &'static str,
    pub count: usize,
    /// Registry prefix printed inside the document, e.g. `ИНЦ-2026-001`.
    pub registry_prefix: &'static str,
    /// ASCII prefix of the file name, e.g. `incident-2026-001.md`.
    pub file_prefix: &'static str,
    pub format: DemoFormat,
    pub titles: &'static [&'static str],
}

pub fn default_profiles() -> Vec<DemoTypeProfile> {
    vec![
        DemoTypeProfile {
            type_id: "standards",
            count: 300,
            registry_prefix: "SP",
            file_prefix: "SP",
            format: DemoFormat::Pdf,
            titles: &[
                "Gas distribution systems",
                "Gas supply systems",
                "Steel gas pipelines",
                "Gas pressure regulators",
                "Gas leak detection systems",
                "Gas pressure reduction units",
                "Gas boiler houses",
                "Emergency gas shutoff systems",
            ],
        },
        DemoTypeProfile {
            type_id: "regulations",
            count: 200,
            registry_prefix: "REG",
            file_prefix: "regulation",
            format: DemoFormat::Pdf,
            titles: &[
                "Gas regulating point operation regulation",
                "Gas pipeline maintenance regulation",
                "Pressure reduction unit process regulation",
                "Emergency recovery works regulation",
                "Cabinet regulating point service regulation",
            ],
        },
        DemoTypeProfile {
            type_id: "drawings",
            count: 100,
            registry_prefix: "DWG",
            file_prefix: "DWG",
            format: DemoFormat::Dwg,
            titles: &[
                "Gas regulating point layout",
                "Gas pipeline route plan",
                "Metering unit assembly",
                "Shutoff valve installation",
            ],
        },
        DemoTypeProfile {
            type_id: "incidents",
            count: 150,
            registry_prefix: "ИНЦ",
            file_prefix: "incident",
            format: DemoFormat::Markdown,
            titles: &[
                "Отчёт об инциденте с утечкой газа",
                "Анализ нарушения в работе ГРП",
                "Расследование аварии на газопроводе",
                "Отчёт о срабатывании ПАЗ",
                "Инцидент с превышением давления",
            ],
        },
        DemoTypeProfile {
            type_id: "maintenance",
            count: 250,
            registry_prefix: "MNT",
            file_prefix: "maintenance",
            format: DemoFormat::Pdf,
            titles: &[
                "Pressure regulator repair manual",
                "Shutoff valve maintenance manual",
                "Gas filter servicing manual",
                "Safety relief valve inspection manual",
                "Metering unit maintenance manual",
            ],
        },
    ]
}

const INCIDENT_TEMPLATE: &str = "# {title} - {document_id}

## Общая информация

**Дата инцидента:** {date}
**Время:** {time}
**Объект:** {object}
**Серьёзность:** {severity}

## Описание инцидента

{description}

### Последствия

- Прекращение газоснабжения: {affected} потребителей
- Время восстановления: {recovery_time}
- Материальный ущерб: {damage}

## Причины инцидента

1. {primary_cause}
2. {secondary_cause}

## Корректирующие мероприятия

1. Внеплановая ревизия оборудования
2. Обновление регламентов обслуживания
3. Дополнительное обучение персонала

**Расследование:** И.И. Иванов
**Утверждение:** П.П. Петров
**Дата отчёта:** {report_date}

Статус: {status}
";

const OBJECTS: [&str; 5] = [
    "ГРП-12 \"Северный\"",
    "УРП-50 \"Промышленный\"",
    "ГРПШ-400 \"Центральный\"",
    "ГРП-25 \"Восточный\"",
    "УРП-100 \"Западный\"",
];

const DESCRIPTIONS: [&str; 5] = [
    "Обнаружена утечка газа на соединении входного газопровода",
    "Зафиксировано превышение рабочего давления в газопроводе",
    "Срабатывание ПАЗ по сигналу загазованности помещения",
    "Отказ регулятора давления, рост давления в сети",
    "Механическое повреждение газопровода экскаватором",
];

const PRIMARY_CAUSES: [&str; 4] = [
    "Износ оборудования",
    "Нарушение технологии",
    "Внешнее воздействие",
    "Отказ автоматики",
];

const SECONDARY_CAUSES: [&str; 4] = [
    "Недостаточное обслуживание",
    "Неблагоприятные погодные условия",
    "Превышение нагрузки",
    "Производственная ошибка",
];

const SEVERITIES: [&str; 3] = ["Низкая", "Средняя", "Высокая"];

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub output_dir: PathBuf,
    /// Divides every profile count; 1 produces the full corpus.
    pub scale: usize,
    pub year: i32,
    pub profiles: Vec<DemoTypeProfile>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./data/documents"),
            scale: 1,
            year: Utc::now().year(),
            profiles: default_profiles(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub generated: DateTime<Utc>,
    pub total_documents: usize,
    pub by_type: BTreeMap<String, usize>,
}

/// Replaces `{name}` placeholders; unknown placeholders are left as-is.
pub fn fill_template(
    template: &str,
    variables: &HashMap<&str, String>,
) -> Result<String, IndexError> {
    let placeholder = Regex::new(r"\{([a-z_]+)\}")?;
    let filled = placeholder.replace_all(template, |captures: &Captures| {
        variables
            .get(&captures[1])
            .cloned()
            .unwrap_or_else(|| captures[0].to_string())
    });
    Ok(filled.into_owned())
}

fn pick<'a>(options: &[&'a str], index: usize, salt: usize) -> &'a str {
    options[(index.wrapping_mul(7) + salt) % options.len()]
}

fn demo_date(index: usize, salt: usize) -> String {
    let offset = ((index * 37 + salt * 11) % 2000) as u64;
    NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|start| start.checked_add_days(Days::new(offset)))
        .map(|date| date.format("%d.%m.%Y").to_string())
        .unwrap_or_default()
}

fn is_superseded(index: usize) -> bool {
    index % 10 == 0
}

/// Single-page PDF with one text line per entry, in a base-14 font.
pub fn write_text_pdf(path: &Path, lines: &[&str]) -> Result<(), IndexError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut operations = Vec::new();
    for (row, line) in lines.iter().enumerate() {
        let y = 790 - (row as i64) * 16;
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 11.into()]));
        operations.push(Operation::new("Td", vec![50.into(), y.into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("ET", vec![]));
    }
    let content = Content { operations };
    let encoded = content
        .encode()
        .map_err(|error| IndexError::PdfBuild(error.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path)?;
    Ok(())
}

fn pdf_lines(profile: &DemoTypeProfile, document_id: &str, title: &str, index: usize) -> Vec<String> {
    let status = if is_superseded(index) { "Superseded" } else { "Active" };
    vec![
        format!("{title} {document_id}"),
        format!("Scope: requirements for design, installation and operation of {title}."),
        "References: GOST R 54961-2012, SP 62.13330.2011".to_string(),
        "Low pressure up to 5 kPa. Medium pressure 5 kPa to 0.3 MPa.".to_string(),
        "High pressure 0.3 MPa to 1.2 MPa.".to_string(),
        "Safety: gas leak detection, emergency shutoff, tightness checks.".to_string(),
        format!("Document type: {}", profile.type_id),
        format!("Introduced: {}", demo_date(index, 1)),
        format!("Status: {status}"),
    ]
}

fn incident_markdown(document_id: &str, title: &str, index: usize) -> Result<String, IndexError> {
    let status = if is_superseded(index) { "Утратил силу" } else { "Закрыт" };
    let variables: HashMap<&str, String> = [
        ("title", title.to_string()),
        ("document_id", document_id.to_string()),
        ("date", demo_date(index, 0)),
        ("time", format!("{:02}:{:02}", (index * 5) % 24, (index * 13) % 60)),
        ("object", pick(&OBJECTS, index, 1).to_string()),
        ("severity", pick(&SEVERITIES, index, 2).to_string()),
        ("description", pick(&DESCRIPTIONS, index, 3).to_string()),
        ("affected", (10 + (index * 31) % 490).to_string()),
        ("recovery_time", format!("{} часов", 1 + index % 12)),
        ("damage", format!("{} тыс. руб.", 50 + (index * 17) % 450)),
        ("primary_cause", pick(&PRIMARY_CAUSES, index, 4).to_string()),
        ("secondary_cause", pick(&SECONDARY_CAUSES, index, 5).to_string()),
        ("report_date", demo_date(index, 2)),
        ("status", status.to_string()),
    ]
    .into_iter()
    .collect();

    fill_template(INCIDENT_TEMPLATE, &variables)
}

fn dwg_stub(document_id: &str, title: &str) -> Vec<u8> {
    let mut bytes = b"AC1032".to_vec();
    bytes.extend_from_slice(&[0u8; 10]);
    bytes.extend_from_slice(format!("{document_id} {title}").as_bytes());
    bytes
}

fn write_document(
    profile: &DemoTypeProfile,
    dir: &Path,
    year: i32,
    index: usize,
) -> Result<(), IndexError> {
    let document_id = format!("{}-{year}-{index:03}", profile.registry_prefix);
    let file_name = format!(
        "{}-{year}-{index:03}.{}",
        profile.file_prefix,
        profile.format.extension()
    );
    let path = dir.join(file_name);
    let title = pick(profile.titles, index, 0);

    match profile.format {
        DemoFormat::Markdown => fs::write(&path, incident_markdown(&document_id, title, index)?)?,
        DemoFormat::Dwg => fs::write(&path, dwg_stub(&document_id, title))?,
        DemoFormat::Pdf => {
            let lines = pdf_lines(profile, &document_id, title, index);
            let borrowed: Vec<&str> = lines.iter().map(String::as_str).collect();
            write_text_pdf(&path, &borrowed)?;
        }
    }
    Ok(())
}

pub fn generate_demo_corpus(config: &DemoConfig) -> Result<DemoReport, IndexError> {
    if config.scale == 0 {
        return Err(IndexError::InvalidConfig("demo scale must be positive".to_string()));
    }

    fs::create_dir_all(&config.output_dir).map_err(|source| IndexError::OutputDir {
        path: config.output_dir.clone(),
        source,
    })?;

    let mut by_type = BTreeMap::new();
    for profile in &config.profiles {
        let dir = config.output_dir.join(profile.type_id);
        fs::create_dir_all(&dir)?;

        let count = (profile.count / config.scale).max(1);
        for index in 1..=count {
            write_document(profile, &dir, config.year, index)?;
        }

        info!(type_id = profile.type_id, count, "demo documents written");
        by_type.insert(profile.type_id.to_string(), count);
    }

    let report = DemoReport {
        generated: Utc::now(),
        total_documents: by_type.values().sum(),
        by_type,
    };
    let stats_path = config.output_dir.join("generation_stats.json");
    fs::write(&stats_path, serde_json::to_vec_pretty(&report)?)?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_document_types;
    use crate::extractors::markdown_title;
    use crate::scanner::scan_corpus;
    use tempfile::tempdir;

    #[test]
    fn template_placeholders_are_filled() -> Result<(), IndexError> {
        let variables: HashMap<&str, String> =
            [("title", "ГРП".to_string())].into_iter().collect();
        let filled = fill_template("# {title} {unknown}", &variables)?;
        assert_eq!(filled, "# ГРП {unknown}");
        Ok(())
    }

    #[test]
    fn incident_report_has_level_one_heading() -> Result<(), IndexError> {
        let body = incident_markdown("ИНЦ-2026-007", "Отчёт о срабатывании ПАЗ", 7)?;
        assert_eq!(
            markdown_title(&body).as_deref(),
            Some("Отчёт о срабатывании ПАЗ - ИНЦ-2026-007")
        );
        assert!(!body.contains('{'));
        Ok(())
    }

    #[test]
    fn every_tenth_document_is_superseded() -> Result<(), IndexError> {
        assert!(is_superseded(10));
        assert!(!is_superseded(11));
        assert!(incident_markdown("x", "y", 20)?.contains("Статус: Утратил силу"));
        Ok(())
    }

    #[test]
    fn generated_corpus_classifies_under_default_catalog() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let config = DemoConfig {
            output_dir: dir.path().to_path_buf(),
            scale: 50,
            year: 2026,
            profiles: default_profiles(),
        };

        let report = generate_demo_corpus(&config)?;
        assert_eq!(report.by_type["standards"], 6);
        assert_eq!(report.by_type["drawings"], 2);
        assert_eq!(report.total_documents, 6 + 4 + 2 + 3 + 5);
        assert!(dir.path().join("generation_stats.json").is_file());

        let catalog = default_document_types();
        let scan = scan_corpus(dir.path(), &catalog)?;
        for (type_id, count) in &report.by_type {
            assert_eq!(scan.count_for(type_id), *count, "type {type_id}");
        }
        Ok(())
    }

    #[test]
    fn output_is_deterministic_for_text_formats() -> Result<(), Box<dyn std::error::Error>> {
        let first = tempdir()?;
        let second = tempdir()?;
        for dir in [&first, &second] {
            generate_demo_corpus(&DemoConfig {
                output_dir: dir.path().to_path_buf(),
                scale: 100,
                year: 2026,
                profiles: default_profiles(),
            })?;
        }

        let name = "incidents/incident-2026-001.md";
        assert_eq!(
            fs::read(first.path().join(name))?,
            fs::read(second.path().join(name))?
        );
        Ok(())
    }

    #[test]
    fn zero_scale_is_rejected() {
        let config = DemoConfig {
            scale: 0,
            ..DemoConfig::default()
        };
        assert!(matches!(
            generate_demo_corpus(&config),
            Err(IndexError::InvalidConfig(_))
        ));
    }
}
