use std::fmt::Display;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// Fixed columns; trailing "Skill N" columns are appended by the table
// assembler based on the widest row in the batch.
pub const VACANCY_COLUMNS: &[&str] = &[
    "ID",
    "Is premium",
    "Name",
    "Department",
    "Has test",
    "Is response letter required",
    "Area",
    "Salary from",
    "Salary to",
    "Type",
    "Created at",
    "Published at",
    "Is archived",
    "URL",
    "Employer name",
    "Is accredited IT employer",
    "Schedule",
    "Experience",
    "Employment",
];

pub const RESUME_COLUMNS: &[&str] = &[
    "ID",
    "Title",
    "Area",
    "Age",
    "Gender",
    "Salary",
    "Experience (months)",
];

/// A record that can be projected into a table row.
pub trait Listing {
    fn columns() -> &'static [&'static str]
    where
        Self: Sized;
    fn to_row(&self) -> Vec<String>;
    fn location(&self) -> &str;
    fn skills(&self) -> &[String];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub premium: bool,
    pub name: String,
    pub department: Option<String>,
    pub has_test: bool,
    pub response_letter_required: bool,
    pub area: String,
    pub salary_from: Option<i64>,
    pub salary_to: Option<i64>,
    pub kind: String,
    pub created_at: DateTime<FixedOffset>,
    pub published_at: DateTime<FixedOffset>,
    pub archived: bool,
    pub url: String,
    pub employer_name: String,
    pub accredited_it_employer: Option<bool>,
    pub schedule: Option<String>,
    pub experience: String,
    pub employment: Option<String>,
    pub skills: Vec<String>,
}

impl Listing for JobPosting {
    fn columns() -> &'static [&'static str] {
        VACANCY_COLUMNS
    }

    fn to_row(&self) -> Vec<String> {
        let mut row = vec![
            self.id.clone(),
            self.premium.to_string(),
            self.name.clone(),
            opt_cell(&self.department),
            self.has_test.to_string(),
            self.response_letter_required.to_string(),
            self.area.clone(),
            opt_cell(&self.salary_from),
            opt_cell(&self.salary_to),
            self.kind.clone(),
            self.created_at.to_rfc3339(),
            self.published_at.to_rfc3339(),
            self.archived.to_string(),
            self.url.clone(),
            self.employer_name.clone(),
            accredited_cell(self.accredited_it_employer),
            opt_cell(&self.schedule),
            self.experience.clone(),
            opt_cell(&self.employment),
        ];
        row.extend(self.skills.iter().cloned());
        row
    }

    fn location(&self) -> &str {
        &self.area
    }

    fn skills(&self) -> &[String] {
        &self.skills
    }
}

impl Display for JobPosting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} — {} ({})",
            self.id, self.name, self.employer_name, self.area
        )?;
        match (self.salary_from, self.salary_to) {
            (Some(from), Some(to)) => write!(f, ", {}–{}", from, to)?,
            (Some(from), None) => write!(f, ", from {}", from)?,
            (None, Some(to)) => write!(f, ", up to {}", to)?,
            (None, None) => {}
        }
        if !self.skills.is_empty() {
            write!(f, " [{}]", self.skills.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: String,
    pub title: String,
    pub area: String,
    pub age: Option<u32>,
    pub gender: String,
    pub salary: Option<i64>,
    pub experience_months: u32,
    pub skills: Vec<String>,
}

impl Listing for CandidateProfile {
    fn columns() -> &'static [&'static str] {
        RESUME_COLUMNS
    }

    fn to_row(&self) -> Vec<String> {
        let mut row = vec![
            self.id.clone(),
            self.title.clone(),
            self.area.clone(),
            opt_cell(&self.age),
            self.gender.clone(),
            opt_cell(&self.salary),
            self.experience_months.to_string(),
        ];
        row.extend(self.skills.iter().cloned());
        row
    }

    fn location(&self) -> &str {
        &self.area
    }

    fn skills(&self) -> &[String] {
        &self.skills
    }
}

impl Display for CandidateProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.id, self.title)?;
        if !self.area.is_empty() {
            write!(f, " — {}", self.area)?;
        }
        write!(f, ", {} month(s) of experience", self.experience_months)?;
        if let Some(salary) = self.salary {
            write!(f, ", expects {}", salary)?;
        }
        if !self.skills.is_empty() {
            write!(f, " [{}]", self.skills.join(", "))?;
        }
        Ok(())
    }
}

fn opt_cell<T: Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "None".to_string(),
    }
}

// Only an explicit `true` is rendered; `false` and absent both collapse to
// "None" in the exported row, while the entity keeps them distinct.
fn accredited_cell(flag: Option<bool>) -> String {
    match flag {
        Some(true) => "true".to_string(),
        _ => "None".to_string(),
    }
}
