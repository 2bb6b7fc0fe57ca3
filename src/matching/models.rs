//! Data exchanged with the persistence and API layers

use crate::processing::document::{EducationEntry, ParsedResume, WorkHistoryEntry};
use crate::processing::embeddings::EmbeddingProvider;
use crate::processing::skills::extract_skills;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeProfile {
    pub id: i64,
    pub raw_text: String,
    #[serde(default)]
    pub sections: BTreeMap<String, String>,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub experience_years: u32,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub work_history: Vec<WorkHistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl ResumeProfile {
    /// Complete a parsed resume with its skills and, given a provider, its embedding
    pub fn build(id: i64, parsed: ParsedResume, embeddings: Option<&EmbeddingProvider>) -> Self {
        let skills = extract_skills(&parsed.raw_text);
        let embedding = match embeddings {
            Some(provider) if !parsed.raw_text.is_empty() => Some(provider.embed(&parsed.raw_text)),
            _ => None,
        };

        Self {
            id,
            raw_text: parsed.raw_text,
            sections: parsed.sections,
            skills,
            experience_years: parsed.experience_years,
            education: parsed.education,
            work_history: parsed.work_history,
            embedding,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRecord {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub description: String,
    pub requirements: String,
    pub skills_required: Vec<String>,
    pub experience_required: u32,
    pub education_required: String,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub remote_option: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl JobRecord {
    /// Text compared against the resume for semantic similarity
    pub fn semantic_text(&self) -> String {
        format!("{} {} {}", self.title, self.description, self.requirements)
    }

    /// `$120,000 - $150,000` when both bounds are present and non-zero
    pub fn salary_range(&self) -> Option<String> {
        match (self.salary_min, self.salary_max) {
            (Some(min), Some(max)) if min != 0.0 && max != 0.0 => Some(format!(
                "${} - ${}",
                thousands(min),
                thousands(max)
            )),
            _ => None,
        }
    }
}

fn thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, digit) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if value < 0.0 && rounded != "0" {
        grouped.insert(0, '-');
    }
    grouped
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub resume_id: i64,
    pub job_id: i64,
    pub overall_score: f64,
    pub skill_score: f64,
    pub semantic_score: f64,
    pub experience_score: f64,
    pub education_score: f64,
    pub skill_overlap: Vec<String>,
    pub skill_gaps: Vec<String>,
    pub explanation: String,
    /// Weighted contribution of each factor, keyed `skills`, `semantic`,
    /// `experience` and `education`
    pub feature_importance: BTreeMap<String, f64>,
    /// Match probability from the trained classifier, when one is loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier_probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchExplanation {
    pub overall_summary: String,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub recommendations: Vec<String>,
    pub feature_contributions: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub job_id: i64,
    pub rank: usize,
    pub score: f64,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub salary_range: Option<String>,
    pub explanation: String,
    pub skill_overlap: Vec<String>,
    pub skill_gaps: Vec<String>,
    pub highlights: Vec<String>,
}

/// Ranked items plus what happened to the rest of the catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBatch {
    pub items: Vec<RecommendationItem>,
    pub total_jobs: usize,
    pub filtered: usize,
    pub scored: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGapReport {
    pub total_jobs_analyzed: usize,
    pub current_skills: Vec<String>,
    pub critical_gaps: Vec<String>,
    pub important_gaps: Vec<String>,
    pub nice_to_have: Vec<String>,
    pub overall_coverage: f64,
    pub recommendation: String,
}

/// Optional, conjunctive job filters. Empty strings and non-positive salary
/// bounds count as unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationFilters {
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub remote_option: Option<String>,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
}

impl RecommendationFilters {
    pub fn is_empty(&self) -> bool {
        active_text(&self.location).is_none()
            && active_text(&self.job_type).is_none()
            && active_text(&self.remote_option).is_none()
            && active_amount(self.min_salary).is_none()
            && active_amount(self.max_salary).is_none()
    }

    pub fn matches(&self, job: &JobRecord) -> bool {
        if let Some(location) = active_text(&self.location) {
            let job_location = job.location.as_deref().unwrap_or("").to_lowercase();
            if !job_location.contains(&location.to_lowercase()) {
                return false;
            }
        }

        if let Some(job_type) = active_text(&self.job_type) {
            if !equals_ignore_case(job.job_type.as_deref(), job_type) {
                return false;
            }
        }

        if let Some(remote) = active_text(&self.remote_option) {
            if !equals_ignore_case(job.remote_option.as_deref(), remote) {
                return false;
            }
        }

        if let Some(min_salary) = active_amount(self.min_salary) {
            if job.salary_min.unwrap_or(0.0) < min_salary {
                return false;
            }
        }

        if let Some(max_salary) = active_amount(self.max_salary) {
            if job.salary_max.unwrap_or(f64::INFINITY) > max_salary {
                return false;
            }
        }

        true
    }
}

fn active_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn active_amount(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

fn equals_ignore_case(value: Option<&str>, expected: &str) -> bool {
    value.unwrap_or("").to_lowercase() == expected.to_lowercase()
}
