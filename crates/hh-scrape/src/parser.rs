use std::sync::LazyLock;

use crate::types::{CandidateProfile, JobPosting};

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to decode JSON payload: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid timestamp in '{field}': {value}")]
    TimestampError { field: &'static str, value: String },
}

#[derive(Debug, thiserror::Error)]
#[error("Record '{id}' is missing mandatory field '{field}'")]
pub struct RecordError {
    pub id: String,
    pub field: &'static str,
}

// Net-of-tax factor applied to salary bounds the employer quotes gross.
const NET_SALARY_FACTOR: f64 = 0.87;

// Timestamps come with a zone offset without a colon, e.g. "+0300".
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

static RE_RESUME_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"resume/([0-9a-f]+)").expect("invalid regex: resume id"));
static RE_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("invalid regex: integer"));

#[derive(Debug, Deserialize)]
pub struct RawVacancyPage {
    pub pages: u32,
    #[serde(default)]
    pub found: u64,
    #[serde(default)]
    pub items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawSalary {
    #[serde(default)]
    from: Option<i64>,
    #[serde(default)]
    to: Option<i64>,
    #[serde(default)]
    gross: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawEmployer {
    name: String,
    #[serde(default)]
    accredited_it_employer: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawVacancy {
    id: String,
    premium: bool,
    name: String,
    #[serde(default)]
    department: Option<Named>,
    has_test: bool,
    response_letter_required: bool,
    area: Named,
    #[serde(default)]
    salary: Option<RawSalary>,
    #[serde(rename = "type")]
    kind: Named,
    created_at: String,
    published_at: String,
    archived: bool,
    alternate_url: String,
    employer: RawEmployer,
    #[serde(default)]
    schedule: Option<Named>,
    experience: Named,
    #[serde(default)]
    employment: Option<Named>,
    #[serde(default)]
    key_skills: Option<Vec<Named>>,
}

pub fn parse_vacancy_page(body: &str) -> Result<RawVacancyPage, ParseError> {
    Ok(serde_json::from_str(body)?)
}

/// Identity probe on an undecoded payload. Interstitial challenge pages come
/// back as JSON without the `id` key.
pub fn vacancy_id(value: &Value) -> Option<&str> {
    value.get("id")?.as_str()
}

pub fn vacancy_from_value(value: Value) -> Result<JobPosting, ParseError> {
    let raw: RawVacancy = serde_json::from_value(value)?;

    let gross = raw
        .salary
        .as_ref()
        .is_some_and(|salary| salary.gross == Some(true));
    let (salary_from, salary_to) = match &raw.salary {
        Some(salary) => (net_salary(salary.from, gross), net_salary(salary.to, gross)),
        None => (None, None),
    };

    Ok(JobPosting {
        id: raw.id,
        premium: raw.premium,
        name: raw.name,
        department: raw.department.map(|d| d.name),
        has_test: raw.has_test,
        response_letter_required: raw.response_letter_required,
        area: raw.area.name,
        salary_from,
        salary_to,
        kind: raw.kind.name,
        created_at: parse_timestamp("created_at", &raw.created_at)?,
        published_at: parse_timestamp("published_at", &raw.published_at)?,
        archived: raw.archived,
        url: raw.alternate_url,
        employer_name: raw.employer.name,
        accredited_it_employer: raw.employer.accredited_it_employer,
        schedule: raw.schedule.map(|s| s.name),
        experience: raw.experience.name,
        employment: raw.employment.map(|e| e.name),
        skills: raw
            .key_skills
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.name)
            .collect(),
    })
}

fn net_salary(bound: Option<i64>, gross: bool) -> Option<i64> {
    bound.map(|value| {
        if gross {
            (value as f64 * NET_SALARY_FACTOR).round() as i64
        } else {
            value
        }
    })
}

fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    DateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| ParseError::TimestampError {
        field,
        value: value.to_string(),
    })
}

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn parse_resume_ids(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse(r#"a[data-qa="serp-item__title"]"#).unwrap();

    document
        .select(&link_selector)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| RE_RESUME_ID.captures(href))
        .map(|caps| caps[1].to_string())
        .collect()
}

pub fn parse_resume(id: &str, html: &str) -> Result<CandidateProfile, RecordError> {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse(r#"span[data-qa="resume-block-title-position"]"#).unwrap();
    let title = document
        .select(&title_selector)
        .next()
        .map(|e| normalize_whitespace(&elem_text(e)))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| RecordError {
            id: id.to_string(),
            field: "title",
        })?;

    let area_selector = Selector::parse(r#"span[data-qa="resume-personal-address"]"#).unwrap();
    let area = document
        .select(&area_selector)
        .next()
        .map(|e| normalize_whitespace(&elem_text(e)))
        .unwrap_or_default();

    let age_selector = Selector::parse(r#"span[data-qa="resume-personal-age"]"#).unwrap();
    let age = document
        .select(&age_selector)
        .next()
        .and_then(|e| first_integer(&elem_text(e)));

    let gender_selector = Selector::parse(r#"span[data-qa="resume-personal-gender"]"#).unwrap();
    let gender = document
        .select(&gender_selector)
        .next()
        .map(|e| normalize_whitespace(&elem_text(e)))
        .unwrap_or_default();

    let salary_selector = Selector::parse(r#"span[data-qa="resume-block-salary"]"#).unwrap();
    let salary = document
        .select(&salary_selector)
        .next()
        .and_then(|e| join_digits(&elem_text(e)));

    // The duration header is the first element child of the experience block;
    // the rest of the block is the employment history, which has digits of
    // its own (years, company names) that must not leak into the total.
    let experience_selector = Selector::parse(r#"div[data-qa="resume-block-experience"]"#).unwrap();
    let experience_months = document
        .select(&experience_selector)
        .next()
        .and_then(|block| block.children().filter_map(ElementRef::wrap).next())
        .map(|header| parse_experience(&elem_text(header)))
        .unwrap_or(0);

    let skills_selector = Selector::parse("span.bloko-tag__section_text").unwrap();
    let skills = document
        .select(&skills_selector)
        .map(|e| normalize_whitespace(&elem_text(e)))
        .collect();

    Ok(CandidateProfile {
        id: id.to_string(),
        title,
        area,
        age,
        gender,
        salary,
        experience_months,
        skills,
    })
}

/// Total experience in months from a localized duration phrase. Two numbers
/// are years and months; a lone number is months only when the phrase
/// mentions months, otherwise years.
fn parse_experience(text: &str) -> u32 {
    let numbers: Vec<u32> = RE_INTEGER
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    match numbers.as_slice() {
        [years, months] => years * 12 + months,
        [single] => {
            if text.contains("месяц") || text.contains("month") {
                *single
            } else {
                single * 12
            }
        }
        _ => 0,
    }
}

fn first_integer(text: &str) -> Option<u32> {
    RE_INTEGER.find(text).and_then(|m| m.as_str().parse().ok())
}

// Salary spans group digits with thin spaces ("70 000 ₽"); every digit in
// the span belongs to one amount.
fn join_digits(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn base_vacancy() -> Value {
        json!({
            "id": "93353083",
            "premium": false,
            "name": "Разработчик Rust",
            "department": {"id": "hh-1455-dev", "name": "Backend"},
            "has_test": false,
            "response_letter_required": true,
            "area": {"id": "1", "name": "Москва", "url": "https://api.hh.ru/areas/1"},
            "salary": {"from": 100000, "to": 200000, "currency": "RUR", "gross": true},
            "type": {"id": "open", "name": "Открытая"},
            "created_at": "2024-02-06T16:43:57+0300",
            "published_at": "2024-02-07T10:15:00+0300",
            "archived": false,
            "alternate_url": "https://hh.ru/vacancy/93353083",
            "employer": {
                "id": "1455",
                "name": "Рога и копыта",
                "accredited_it_employer": true,
                "trusted": true
            },
            "schedule": {"id": "remote", "name": "Удаленная работа"},
            "experience": {"id": "between1And3", "name": "От 1 года до 3 лет"},
            "employment": {"id": "full", "name": "Полная занятость"},
            "key_skills": [{"name": "Rust"}, {"name": "Git"}, {"name": "SQL"}]
        })
    }

    #[test]
    fn test_vacancy_detail_fixture_normalizes_all_fields() {
        let body = fs::read_to_string("fixtures/vacancy_detail.json")
            .expect("Failed to read sample JSON file");
        let value: Value = serde_json::from_str(&body).expect("Failed to decode");

        let posting = vacancy_from_value(value).expect("Failed to normalize vacancy");

        assert_eq!(posting.id, "93353083");
        assert_eq!(posting.name, "Разработчик Rust (Backend)");
        assert_eq!(posting.department, Some("Backend".to_string()));
        assert_eq!(posting.area, "Москва");
        assert_eq!(posting.salary_from, Some(87000));
        assert_eq!(posting.salary_to, Some(174000));
        assert_eq!(posting.created_at.to_rfc3339(), "2024-02-06T16:43:57+03:00");
        assert_eq!(posting.published_at.to_rfc3339(), "2024-02-07T10:15:00+03:00");
        assert_eq!(posting.url, "https://hh.ru/vacancy/93353083");
        assert_eq!(posting.accredited_it_employer, Some(true));
        assert_eq!(posting.schedule, Some("Удаленная работа".to_string()));
        assert_eq!(posting.employment, Some("Полная занятость".to_string()));
        assert_eq!(
            posting.skills,
            vec!["Rust", "Git", "SQL", "Docker", "PostgreSQL"]
        );
    }

    #[test]
    fn test_vacancy_page_fixture_keeps_item_order_and_absences() {
        let body = fs::read_to_string("fixtures/vacancies_page.json")
            .expect("Failed to read sample JSON file");
        let page = parse_vacancy_page(&body).expect("Failed to parse page");

        assert_eq!(page.pages, 1);
        assert_eq!(page.found, 2);
        assert_eq!(page.items.len(), 2);

        let postings: Vec<_> = page
            .items
            .into_iter()
            .map(|item| vacancy_from_value(item).expect("Failed to normalize item"))
            .collect();

        assert_eq!(postings[0].id, "93353083");
        assert_eq!(postings[0].salary_from, Some(87000));
        assert!(postings[0].skills.is_empty(), "list items carry no skills");

        assert_eq!(postings[1].id, "91170231");
        assert_eq!(postings[1].department, None);
        assert_eq!(postings[1].salary_from, None);
        assert_eq!(postings[1].salary_to, None);
        assert_eq!(postings[1].accredited_it_employer, None);
    }

    #[test]
    fn test_probe_page_without_items_is_lenient() {
        let page = parse_vacancy_page(r#"{"pages": 4}"#).expect("Failed to parse");
        assert_eq!(page.pages, 4);
        assert_eq!(page.found, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_gross_salary_is_scaled_to_net() {
        let posting = vacancy_from_value(base_vacancy()).expect("Failed to normalize");
        assert_eq!(posting.salary_from, Some(87000));
        assert_eq!(posting.salary_to, Some(174000));

        let mut net = base_vacancy();
        net["salary"] = json!({"from": 100000, "to": 200000, "currency": "RUR", "gross": false});
        let posting = vacancy_from_value(net).expect("Failed to normalize");
        assert_eq!(posting.salary_from, Some(100000));
        assert_eq!(posting.salary_to, Some(200000));

        let mut open_ended = base_vacancy();
        open_ended["salary"] = json!({"from": 150000, "to": null, "gross": true});
        let posting = vacancy_from_value(open_ended).expect("Failed to normalize");
        assert_eq!(posting.salary_from, Some(130500));
        assert_eq!(posting.salary_to, None);

        let mut missing = base_vacancy();
        missing["salary"] = json!(null);
        let posting = vacancy_from_value(missing).expect("Failed to normalize");
        assert_eq!(posting.salary_from, None);
        assert_eq!(posting.salary_to, None);
    }

    #[test]
    fn test_accredited_flag_keeps_absent_and_false_distinct() {
        let mut absent = base_vacancy();
        absent["employer"] = json!({"id": "1455", "name": "Рога и копыта"});
        let posting = vacancy_from_value(absent).expect("Failed to normalize");
        assert_eq!(posting.accredited_it_employer, None);

        let mut null = base_vacancy();
        null["employer"]["accredited_it_employer"] = json!(null);
        let posting = vacancy_from_value(null).expect("Failed to normalize");
        assert_eq!(posting.accredited_it_employer, None);

        let mut explicit = base_vacancy();
        explicit["employer"]["accredited_it_employer"] = json!(false);
        let posting = vacancy_from_value(explicit).expect("Failed to normalize");
        assert_eq!(posting.accredited_it_employer, Some(false));
    }

    #[test]
    fn test_absent_null_and_empty_skills_normalize_to_empty() {
        let mut absent = base_vacancy();
        absent.as_object_mut().unwrap().remove("key_skills");
        let posting = vacancy_from_value(absent).expect("Failed to normalize");
        assert!(posting.skills.is_empty());

        let mut null = base_vacancy();
        null["key_skills"] = json!(null);
        let posting = vacancy_from_value(null).expect("Failed to normalize");
        assert!(posting.skills.is_empty());

        let mut empty = base_vacancy();
        empty["key_skills"] = json!([]);
        let posting = vacancy_from_value(empty).expect("Failed to normalize");
        assert!(posting.skills.is_empty());

        let posting = vacancy_from_value(base_vacancy()).expect("Failed to normalize");
        assert_eq!(posting.skills, vec!["Rust", "Git", "SQL"]);
    }

    #[test]
    fn test_malformed_timestamp_is_fatal_and_names_the_field() {
        let mut bad = base_vacancy();
        bad["created_at"] = json!("06.02.2024 16:43");

        let err = vacancy_from_value(bad).expect_err("Should reject timestamp");
        match err {
            ParseError::TimestampError { field, value } => {
                assert_eq!(field, "created_at");
                assert_eq!(value, "06.02.2024 16:43");
            }
            other => panic!("Unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_mandatory_scalar_is_fatal() {
        let mut bad = base_vacancy();
        bad.as_object_mut().unwrap().remove("name");
        assert!(vacancy_from_value(bad).is_err());
    }

    #[test]
    fn test_vacancy_id_probe_detects_interstitial_payloads() {
        assert_eq!(vacancy_id(&base_vacancy()), Some("93353083"));

        let challenge = json!({
            "errors": [{"type": "captcha_required"}],
            "request_id": "1712"
        });
        assert_eq!(vacancy_id(&challenge), None);
    }

    #[test]
    fn test_experience_phrase_token_rules() {
        let cases = [
            ("Опыт работы 3 года 2 месяца", 38),
            ("Опыт работы 5 месяцев", 5),
            ("Опыт работы 5 лет", 60),
            ("Опыт работы 1 месяц", 1),
            ("Work experience 5 months", 5),
            ("Нет опыта", 0),
            ("", 0),
        ];

        for (phrase, expected) in cases {
            assert_eq!(parse_experience(phrase), expected, "phrase: {phrase:?}");
        }
    }

    #[test]
    fn test_salary_span_digits_are_joined() {
        assert_eq!(join_digits("70\u{2009}000 ₽"), Some(70000));
        assert_eq!(join_digits("120 000 руб."), Some(120000));
        assert_eq!(join_digits("з/п не указана"), None);
    }

    #[test]
    fn test_parse_resume_ids_from_fixture() {
        let html = fs::read_to_string("fixtures/resume_search_page")
            .expect("Failed to read sample HTML file");

        let ids = parse_resume_ids(&html);
        assert_eq!(
            ids,
            vec![
                "4f9a7b123c0ed9d2f10039ed1f647344706d6f",
                "b2f822d10007abbc5e0039ed1f5a7049425a63",
                "07da56b70002a8c0e10039ed1f4d37554c7a46",
            ]
        );
    }

    #[test]
    fn test_parse_resume_ids_ignores_other_anchors() {
        let html = r#"
            <div class="serp">
                <a href="/vacancy/93353083">Вакансия</a>
                <a data-qa="serp-item__title" href="/article/how-to">Статья</a>
            </div>
        "#;
        assert!(parse_resume_ids(html).is_empty());
    }

    #[test]
    fn test_parse_resume_from_fixture() {
        let html =
            fs::read_to_string("fixtures/resume_page").expect("Failed to read sample HTML file");

        let profile = parse_resume("4f9a7b123c0ed9d2f10039ed1f647344706d6f", &html)
            .expect("Failed to parse resume");

        assert_eq!(profile.id, "4f9a7b123c0ed9d2f10039ed1f647344706d6f");
        assert_eq!(profile.title, "Программист");
        assert_eq!(profile.area, "Казань");
        assert_eq!(profile.age, Some(34));
        assert_eq!(profile.gender, "Мужчина");
        assert_eq!(profile.salary, Some(70000));
        assert_eq!(profile.experience_months, 63);
        assert_eq!(profile.skills, vec!["Python", "Git", "Linux"]);
    }

    #[test]
    fn test_resume_without_title_is_a_record_error() {
        let html = r#"
            <div>
                <span data-qa="resume-personal-age">34 года</span>
            </div>
        "#;

        let err = parse_resume("b2f822d10007", html).expect_err("Should reject resume");
        assert_eq!(err.id, "b2f822d10007");
        assert_eq!(err.field, "title");
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_resume_optional_fields_have_defaults() {
        let html = r#"<span data-qa="resume-block-title-position">Сварщик</span>"#;

        let profile = parse_resume("07da56b70002", html).expect("Failed to parse resume");

        assert_eq!(profile.title, "Сварщик");
        assert_eq!(profile.area, "");
        assert_eq!(profile.age, None);
        assert_eq!(profile.gender, "");
        assert_eq!(profile.salary, None);
        assert_eq!(profile.experience_months, 0);
        assert!(profile.skills.is_empty());
    }

    #[test]
    fn test_experience_header_isolated_from_history_digits() {
        let html = r#"
            <span data-qa="resume-block-title-position">Инженер</span>
            <div data-qa="resume-block-experience"><span>Опыт работы 2 года</span><div>
                <p>Сентябрь 2019 — Март 2021, ООО «42»</p>
            </div></div>
        "#;

        let profile = parse_resume("abc123", html).expect("Failed to parse resume");
        assert_eq!(profile.experience_months, 24);
    }
}
