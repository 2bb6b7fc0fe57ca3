//! Resume structure: sections, education, work history and experience years

use chrono::{Datelike, Local, NaiveDate};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Experience,
    Education,
    Skills,
    Summary,
    Projects,
    Certifications,
}

impl SectionType {
    pub const ALL: [SectionType; 6] = [
        SectionType::Experience,
        SectionType::Education,
        SectionType::Skills,
        SectionType::Summary,
        SectionType::Projects,
        SectionType::Certifications,
    ];

    /// Key used in `ResumeProfile::sections`
    pub fn key(&self) -> &'static str {
        match self {
            SectionType::Experience => "experience",
            SectionType::Education => "education",
            SectionType::Skills => "skills",
            SectionType::Summary => "summary",
            SectionType::Projects => "projects",
            SectionType::Certifications => "certifications",
        }
    }

    fn header_pattern(&self) -> &'static str {
        match self {
            SectionType::Experience => {
                r"(?i)(work\s*experience|professional\s*experience|employment\s*history|experience)"
            }
            SectionType::Education => r"(?i)(education|academic\s*background|qualifications)",
            SectionType::Skills => r"(?i)(skills|technical\s*skills|competencies|expertise)",
            SectionType::Summary => r"(?i)(summary|profile|objective|about\s*me)",
            SectionType::Projects => r"(?i)(projects|personal\s*projects|portfolio)",
            SectionType::Certifications => r"(?i)(certifications|certificates|licenses)",
        }
    }
}

impl std::fmt::Display for SectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionType::Experience => write!(f, "Experience"),
            SectionType::Education => write!(f, "Education"),
            SectionType::Skills => write!(f, "Skills"),
            SectionType::Summary => write!(f, "Summary"),
            SectionType::Projects => write!(f, "Projects"),
            SectionType::Certifications => write!(f, "Certifications"),
        }
    }
}

static SECTION_HEADERS: LazyLock<Vec<(SectionType, Regex)>> = LazyLock::new(|| {
    SectionType::ALL
        .iter()
        .map(|section| {
            let regex = Regex::new(section.header_pattern()).expect("valid section header regex");
            (*section, regex)
        })
        .collect()
});

/// Degree families, each followed by a check that the match does not run into
/// the next word (so `ba` in `bash` is not a degree)
static DEGREE_FAMILIES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(bachelor\w*|b\.?sc?\.?|b\.?a\.?)",
        r"(?i)\b(master\w*|m\.?sc?\.?|m\.?a\.?|mba)",
        r"(?i)\b(ph\.?d\.?|doctor\w*)",
        r"(?i)\b(associate\w*|a\.s\.|a\.a\.)",
        r"(?i)\b(diploma\w*|certificate\w*)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid degree regex"))
    .collect()
});

static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("valid year regex"));

static INSTITUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:[A-Z][\w&.'-]*\s+){0,4}(?:University|College|Institute|School|Academy)(?:\s+of(?:\s+[A-Z][\w&.'-]*){1,4})?",
    )
    .expect("valid institution regex")
});

const MONTH_DATE: &str =
    r"(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s*\d{4}";

static DATE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"(?i)({month}|\d{{4}})\s*[-–]\s*({month}|\d{{4}}|Present|Current)",
        month = MONTH_DATE
    );
    Regex::new(&pattern).expect("valid date range regex")
});

static FOUR_DIGIT_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})").expect("valid four digit regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree: String,
    pub institution: Option<String>,
    pub graduation_year: Option<i32>,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkHistoryEntry {
    pub start_date: String,
    pub end_date: String,
    pub context: String,
}

/// Everything the parser derives from one resume's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    pub raw_text: String,
    pub sections: BTreeMap<String, String>,
    pub education: Vec<EducationEntry>,
    pub work_history: Vec<WorkHistoryEntry>,
    pub experience_years: u32,
}

impl ParsedResume {
    /// Derive structure from already cleaned text
    pub fn from_text(raw_text: String) -> Self {
        Self::from_text_at(raw_text, Local::now().date_naive())
    }

    /// Same as `from_text`, resolving "Present" against `today`
    pub fn from_text_at(raw_text: String, today: NaiveDate) -> Self {
        let sections = parse_sections(&raw_text);

        let education_text = sections
            .get(SectionType::Education.key())
            .map(String::as_str)
            .unwrap_or(&raw_text);
        let education = extract_education(education_text);

        let experience_text = sections
            .get(SectionType::Experience.key())
            .map(String::as_str)
            .unwrap_or(&raw_text);
        let work_history = extract_work_history(experience_text);
        let experience_years = calculate_experience_years(&work_history, today);

        debug!(
            "Parsed resume: {} sections, {} education entries, {} jobs, {} years",
            sections.len(),
            education.len(),
            work_history.len(),
            experience_years
        );

        Self {
            raw_text,
            sections,
            education,
            work_history,
            experience_years,
        }
    }
}

/// Split text into named sections.
///
/// Every header match of every category is collected and sorted by position;
/// a section runs from the end of its header to the start of the next header.
/// A category that appears more than once keeps only its last occurrence.
pub fn parse_sections(text: &str) -> BTreeMap<String, String> {
    let mut matches: Vec<(usize, usize, SectionType)> = Vec::new();
    for (section, regex) in SECTION_HEADERS.iter() {
        for m in regex.find_iter(text) {
            matches.push((m.start(), m.end(), *section));
        }
    }

    // stable: ties keep declaration order
    matches.sort_by_key(|(start, _, _)| *start);

    let mut sections = BTreeMap::new();
    for (i, (_, end, section)) in matches.iter().enumerate() {
        let next_start = matches.get(i + 1).map_or(text.len(), |(start, _, _)| *start);
        let content = if next_start > *end {
            text[*end..next_start].trim()
        } else {
            ""
        };
        sections.insert(section.key().to_string(), content.to_string());
    }

    sections
}

/// Degree mentions with their surrounding context and graduation year
pub fn extract_education(text: &str) -> Vec<EducationEntry> {
    let mut education = Vec::new();

    for family in DEGREE_FAMILIES.iter() {
        for m in family.find_iter(text) {
            if text[m.end()..].chars().next().is_some_and(char::is_alphanumeric) {
                continue;
            }

            let context = context_window(text, m.start(), m.end(), 50, 100).trim();
            let graduation_year = YEAR
                .find(context)
                .and_then(|year| year.as_str().parse::<i32>().ok());
            let institution = INSTITUTION
                .find(context)
                .map(|inst| inst.as_str().trim().to_string());

            education.push(EducationEntry {
                degree: m.as_str().to_string(),
                institution,
                graduation_year,
                context: context.to_string(),
            });
        }
    }

    education
}

/// Date ranges such as `Jan 2020 - Present` with their surrounding context
pub fn extract_work_history(text: &str) -> Vec<WorkHistoryEntry> {
    DATE_RANGE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let start_date = caps.get(1)?.as_str().to_string();
            let end_date = caps.get(2)?.as_str().to_string();
            let context = context_window(text, whole.start(), whole.end(), 100, 200)
                .trim()
                .to_string();
            Some(WorkHistoryEntry {
                start_date,
                end_date,
                context,
            })
        })
        .collect()
}

/// Whole years of experience: months per entry summed, then floor-divided by 12
pub fn calculate_experience_years(work_history: &[WorkHistoryEntry], today: NaiveDate) -> u32 {
    let mut total_months: i64 = 0;

    for entry in work_history {
        let Some((start_year, start_month)) = parse_year_month(&entry.start_date) else {
            debug!("Skipping unparseable start date '{}'", entry.start_date);
            continue;
        };

        let end = match entry.end_date.trim().to_lowercase().as_str() {
            "present" | "current" => Some((today.year(), today.month())),
            _ => parse_year_month(&entry.end_date),
        };
        let Some((end_year, end_month)) = end else {
            debug!("Skipping unparseable end date '{}'", entry.end_date);
            continue;
        };

        let months = i64::from(end_year - start_year) * 12
            + (i64::from(end_month) - i64::from(start_month));
        total_months += months.max(0);
    }

    (total_months / 12) as u32
}

/// A date's 4-digit year anchored to June; any month name is ignored
fn parse_year_month(date: &str) -> Option<(i32, u32)> {
    let year = FOUR_DIGIT_YEAR
        .captures(date)?
        .get(1)?
        .as_str()
        .parse::<i32>()
        .ok()?;

    Some((year, 6))
}

/// `before` characters ahead of the span and `after` characters behind it,
/// clipped to the text and aligned to char boundaries
fn context_window(text: &str, start: usize, end: usize, before: usize, after: usize) -> &str {
    let lo = text[..start]
        .char_indices()
        .rev()
        .take(before)
        .last()
        .map_or(start, |(i, _)| i);
    let hi = text[end..]
        .char_indices()
        .nth(after)
        .map_or(text.len(), |(i, _)| end + i);
    &text[lo..hi]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_section_detection() {
        let text = "Jane Smith Summary Backend developer. Experience Acme Corp 2018 - 2021. Skills Rust, Python";
        let sections = parse_sections(text);

        assert_eq!(sections.get("summary").unwrap(), "Backend developer.");
        assert_eq!(sections.get("experience").unwrap(), "Acme Corp 2018 - 2021.");
        assert_eq!(sections.get("skills").unwrap(), "Rust, Python");
        assert!(!sections.contains_key("education"));
    }

    #[test]
    fn test_repeated_header_keeps_last_occurrence() {
        let text = "Education State College BSc 2010 Skills Python Education Tech University MSc 2014";
        let sections = parse_sections(text);

        assert_eq!(sections.get("education").unwrap(), "Tech University MSc 2014");
        assert_eq!(sections.get("skills").unwrap(), "Python");
    }

    #[test]
    fn test_adjacent_headers_produce_empty_section() {
        let sections = parse_sections("Skills Education");
        assert_eq!(sections.get("skills").unwrap(), "");
        assert_eq!(sections.get("education").unwrap(), "");
    }

    #[test]
    fn test_education_extraction() {
        let text = "Bachelor of Science in Computer Science, Stanford University, 2015";
        let education = extract_education(text);

        assert_eq!(education.len(), 1);
        assert_eq!(education[0].degree, "Bachelor");
        assert_eq!(education[0].graduation_year, Some(2015));
        assert_eq!(education[0].institution.as_deref(), Some("Stanford University"));
    }

    #[test]
    fn test_degree_abbreviation_not_inside_words() {
        let education = extract_education("Wrote bash scripts and managed databases");
        assert!(education.is_empty());

        let education = extract_education("Ph.D. in Physics, 2012");
        assert_eq!(education.len(), 1);
        assert_eq!(education[0].degree, "Ph.D.");
    }

    #[test]
    fn test_work_history_extraction() {
        let text = "Senior Engineer, Acme Jan 2019 - Present. Engineer, Initech 2015 – 2018.";
        let history = extract_work_history(text);

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].start_date, "Jan 2019");
        assert_eq!(history[0].end_date, "Present");
        assert_eq!(history[1].start_date, "2015");
        assert_eq!(history[1].end_date, "2018");
        assert!(history[0].context.contains("Acme"));
    }

    #[test]
    fn test_experience_years() {
        let history = vec![
            WorkHistoryEntry {
                start_date: "2015".to_string(),
                end_date: "2018".to_string(),
                context: String::new(),
            },
            WorkHistoryEntry {
                start_date: "Jan 2019".to_string(),
                end_date: "Present".to_string(),
                context: String::new(),
            },
        ];

        // 36 months + 13 months (Jun 2019 to Jul 2020)
        assert_eq!(calculate_experience_years(&history, date(2020, 7, 15)), 4);
    }

    #[test]
    fn test_month_names_resolve_like_bare_years() {
        let entry = |start: &str, end: &str| WorkHistoryEntry {
            start_date: start.to_string(),
            end_date: end.to_string(),
            context: String::new(),
        };
        let today = date(2024, 1, 1);

        assert_eq!(
            calculate_experience_years(&[entry("Jan 2020", "Dec 2023")], today),
            calculate_experience_years(&[entry("2020", "2023")], today)
        );
        assert_eq!(calculate_experience_years(&[entry("Jan 2020", "Dec 2023")], today), 3);
        assert_eq!(calculate_experience_years(&[entry("Dec 2019", "Jan 2021")], today), 2);
        assert_eq!(
            calculate_experience_years(&[entry("Jan 2020", "Dec 2023"), entry("Jan 2017", "Dec 2019")], today),
            7
        );
    }

    #[test]
    fn test_experience_years_skips_bad_and_negative_entries() {
        let history = vec![
            WorkHistoryEntry {
                start_date: "2020".to_string(),
                end_date: "2018".to_string(),
                context: String::new(),
            },
            WorkHistoryEntry {
                start_date: "sometime".to_string(),
                end_date: "2018".to_string(),
                context: String::new(),
            },
            WorkHistoryEntry {
                start_date: "Mar 2010".to_string(),
                end_date: "Mar 2012".to_string(),
                context: String::new(),
            },
        ];

        assert_eq!(calculate_experience_years(&history, date(2024, 1, 1)), 2);
        assert_eq!(calculate_experience_years(&[], date(2024, 1, 1)), 0);
    }

    #[test]
    fn test_parsed_resume_uses_sections() {
        let text = "Summary Data engineer. Experience Acme 2016 - 2020 Education Master of Science, 2015".to_string();
        let parsed = ParsedResume::from_text_at(text, date(2024, 1, 1));

        assert_eq!(parsed.work_history.len(), 1);
        assert_eq!(parsed.experience_years, 4);
        assert_eq!(parsed.education.len(), 1);
        assert_eq!(parsed.education[0].degree, "Master");
        assert_eq!(parsed.education[0].graduation_year, Some(2015));
    }

    #[test]
    fn test_context_window_respects_char_boundaries() {
        let text = "ééé Bachelor ééé";
        let start = text.find("Bachelor").unwrap();
        let window = context_window(text, start, start + "Bachelor".len(), 2, 2);
        assert_eq!(window, "é Bachelor é");
    }
}
