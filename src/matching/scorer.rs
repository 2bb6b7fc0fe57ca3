//! Explainable resume/job match scoring

use crate::config::Config;
use crate::error::{RecommenderError, Result};
use crate::matching::classifier::{MatchClassifier, MatchFeatures};
use crate::matching::models::{JobRecord, MatchExplanation, MatchResult, ResumeProfile};
use crate::processing::document::EducationEntry;
use crate::processing::embeddings::{self, similarity, EmbeddingProvider};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub const SKILL_WEIGHT: f64 = 0.40;
pub const SEMANTIC_WEIGHT: f64 = 0.30;
pub const EXPERIENCE_WEIGHT: f64 = 0.20;
pub const EDUCATION_WEIGHT: f64 = 0.10;

/// Used when semantic similarity cannot be computed
pub const NEUTRAL_SEMANTIC_SCORE: f64 = 50.0;

/// Degree keywords in priority order; the first one found in a requirement wins
pub const EDUCATION_LEVELS: &[(&str, u8)] = &[
    ("high school", 1),
    ("associate", 2),
    ("bachelor", 3),
    ("master", 4),
    ("phd", 5),
    ("doctorate", 5),
];

/// Scores one resume against one job.
///
/// `resume_embedding` lets a caller scoring many jobs embed the resume once.
pub trait JobScorer: Send + Sync {
    fn score(
        &self,
        resume: &ResumeProfile,
        job: &JobRecord,
        resume_embedding: Option<&[f32]>,
    ) -> Result<MatchResult>;

    /// Resume vector to reuse across jobs, if this scorer uses one
    fn resume_embedding(&self, _resume: &ResumeProfile) -> Option<Vec<f32>> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillMatch {
    pub score: f64,
    pub overlap: Vec<String>,
    pub gaps: Vec<String>,
}

pub struct MatchScorer {
    embeddings: Arc<EmbeddingProvider>,
    classifier: Option<MatchClassifier>,
}

impl MatchScorer {
    pub fn new(embeddings: Arc<EmbeddingProvider>) -> Self {
        Self {
            embeddings,
            classifier: None,
        }
    }

    pub fn with_classifier(mut self, classifier: MatchClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Scorer on the process-wide embedding provider, plus the configured classifier
    pub fn from_config(config: &Config) -> Result<Self> {
        let scorer = Self::new(embeddings::shared(config));
        match &config.models.classifier_path {
            Some(path) => Ok(scorer.with_classifier(MatchClassifier::load(path)?)),
            None => Ok(scorer),
        }
    }

    pub fn embeddings(&self) -> &Arc<EmbeddingProvider> {
        &self.embeddings
    }

    pub fn calculate(&self, resume: &ResumeProfile, job: &JobRecord) -> Result<MatchResult> {
        self.calculate_with_embedding(resume, job, None)
    }

    pub fn calculate_with_embedding(
        &self,
        resume: &ResumeProfile,
        job: &JobRecord,
        resume_embedding: Option<&[f32]>,
    ) -> Result<MatchResult> {
        let skills = skill_match(&resume.skills, &job.skills_required);
        let semantic_score = self.semantic_score(resume, job, resume_embedding);
        let experience_score = experience_score(resume.experience_years, job.experience_required);
        let education_score = education_score(&resume.education, &job.education_required);

        let overall_score = SKILL_WEIGHT * skills.score
            + SEMANTIC_WEIGHT * semantic_score
            + EXPERIENCE_WEIGHT * experience_score
            + EDUCATION_WEIGHT * education_score;

        let classifier_probability = match &self.classifier {
            Some(classifier) => {
                let features = MatchFeatures::extract(resume, job);
                let probability = classifier
                    .predict_probability(&features)
                    .map_err(|e| RecommenderError::scoring(job.id, e.to_string()))?;
                Some(probability)
            }
            None => None,
        };

        let mut explanation = summarize(
            overall_score,
            &skills.overlap,
            &skills.gaps,
            experience_score > 70.0,
            education_score > 70.0,
        );
        if let Some(probability) = classifier_probability {
            explanation.push_str(&format!(
                " Model match probability: {:.0}%.",
                probability * 100.0
            ));
        }

        let feature_importance = BTreeMap::from([
            ("skills".to_string(), SKILL_WEIGHT * skills.score / 100.0),
            ("semantic".to_string(), SEMANTIC_WEIGHT * semantic_score / 100.0),
            ("experience".to_string(), EXPERIENCE_WEIGHT * experience_score / 100.0),
            ("education".to_string(), EDUCATION_WEIGHT * education_score / 100.0),
        ]);

        debug!(
            "Scored resume {} against job {}: {:.2}",
            resume.id, job.id, overall_score
        );

        Ok(MatchResult {
            resume_id: resume.id,
            job_id: job.id,
            overall_score: round2(overall_score),
            skill_score: round2(skills.score),
            semantic_score: round2(semantic_score),
            experience_score: round2(experience_score),
            education_score: round2(education_score),
            skill_overlap: skills.overlap,
            skill_gaps: skills.gaps,
            explanation,
            feature_importance,
            classifier_probability,
        })
    }

    fn semantic_score(
        &self,
        resume: &ResumeProfile,
        job: &JobRecord,
        resume_embedding: Option<&[f32]>,
    ) -> f64 {
        let job_text = job.semantic_text();
        if resume.raw_text.trim().is_empty() || job_text.trim().is_empty() {
            return NEUTRAL_SEMANTIC_SCORE;
        }

        let computed;
        let resume_vector = match (resume_embedding, &resume.embedding) {
            (Some(vector), _) => vector,
            (None, Some(stored)) => stored.as_slice(),
            (None, None) => {
                computed = self.embeddings.embed(&resume.raw_text);
                computed.as_slice()
            }
        };

        let job_vector = match &job.embedding {
            Some(stored) => stored.clone(),
            None => self.embeddings.embed(&job_text),
        };

        match similarity(resume_vector, &job_vector) {
            Ok(score) => score * 100.0,
            Err(e) => {
                warn!("Semantic score for job {} failed: {}", job.id, e);
                NEUTRAL_SEMANTIC_SCORE
            }
        }
    }
}

impl JobScorer for MatchScorer {
    fn score(
        &self,
        resume: &ResumeProfile,
        job: &JobRecord,
        resume_embedding: Option<&[f32]>,
    ) -> Result<MatchResult> {
        self.calculate_with_embedding(resume, job, resume_embedding)
    }

    fn resume_embedding(&self, resume: &ResumeProfile) -> Option<Vec<f32>> {
        if let Some(stored) = &resume.embedding {
            return Some(stored.clone());
        }
        if resume.raw_text.trim().is_empty() {
            return None;
        }
        Some(self.embeddings.embed(&resume.raw_text))
    }
}

/// Case-insensitive skill comparison. Without requirements every resume skill
/// counts as overlap.
pub fn skill_match<R, J>(resume_skills: R, job_skills: J) -> SkillMatch
where
    R: IntoIterator,
    R::Item: AsRef<str>,
    J: IntoIterator,
    J::Item: AsRef<str>,
{
    let resume: BTreeSet<String> = resume_skills
        .into_iter()
        .map(|s| s.as_ref().to_lowercase())
        .collect();
    let required: BTreeSet<String> = job_skills
        .into_iter()
        .map(|s| s.as_ref().to_lowercase())
        .collect();

    if required.is_empty() {
        return SkillMatch {
            score: 100.0,
            overlap: resume.into_iter().collect(),
            gaps: Vec::new(),
        };
    }

    let overlap: Vec<String> = resume.intersection(&required).cloned().collect();
    let gaps: Vec<String> = required.difference(&resume).cloned().collect();
    let score = overlap.len() as f64 / required.len() as f64 * 100.0;

    SkillMatch {
        score,
        overlap,
        gaps,
    }
}

pub fn experience_score(candidate_years: u32, required_years: u32) -> f64 {
    if required_years == 0 || candidate_years >= required_years {
        return 100.0;
    }
    (f64::from(candidate_years) / f64::from(required_years) * 100.0).min(100.0)
}

/// Level of the first degree keyword (in priority order) found in `text`, 0 if none
pub fn education_level(text: &str) -> u8 {
    let lower = text.to_lowercase();
    EDUCATION_LEVELS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map_or(0, |(_, level)| *level)
}

/// Highest level among the candidate's degrees. Dots are dropped first so
/// `Ph.D.` reads as `phd`.
pub fn highest_education_level(education: &[EducationEntry]) -> u8 {
    education
        .iter()
        .map(|entry| {
            let degree = entry.degree.to_lowercase().replace('.', "");
            EDUCATION_LEVELS
                .iter()
                .filter(|(keyword, _)| degree.contains(keyword))
                .map(|(_, level)| *level)
                .max()
                .unwrap_or(0)
        })
        .max()
        .unwrap_or(0)
}

pub fn education_score(education: &[EducationEntry], education_required: &str) -> f64 {
    let required = education_level(education_required);
    if required == 0 {
        return 100.0;
    }

    let candidate = highest_education_level(education);
    if candidate >= required {
        100.0
    } else {
        f64::from(candidate) / f64::from(required) * 100.0
    }
}

fn summarize(
    overall_score: f64,
    skill_overlap: &[String],
    skill_gaps: &[String],
    experience_match: bool,
    education_match: bool,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    let verdict = if overall_score >= 80.0 {
        "Excellent match!"
    } else if overall_score >= 60.0 {
        "Good match with room for improvement."
    } else if overall_score >= 40.0 {
        "Moderate match. Consider upskilling."
    } else {
        "Limited match. Significant gaps identified."
    };
    parts.push(verdict.to_string());

    if !skill_overlap.is_empty() {
        parts.push(format!("Matching skills: {}", first_n(skill_overlap, 5)));
        if skill_overlap.len() > 5 {
            parts.push(format!("...and {} more.", skill_overlap.len() - 5));
        }
    }

    if !skill_gaps.is_empty() {
        parts.push(format!("Skills to develop: {}", first_n(skill_gaps, 5)));
    }

    if experience_match {
        parts.push("Experience level meets requirements.".to_string());
    } else {
        parts.push("Additional experience may be beneficial.".to_string());
    }

    if education_match {
        parts.push("Education requirements satisfied.".to_string());
    }

    parts.join(" ")
}

/// Detailed strengths, gaps and next steps for an existing match
pub fn explain(result: &MatchResult) -> MatchExplanation {
    let mut strengths = Vec::new();
    let mut gaps = Vec::new();
    let mut recommendations = Vec::new();

    if result.skill_score >= 70.0 {
        strengths.push(format!("Strong skill alignment ({:.0}%)", result.skill_score));
    }
    if result.experience_score >= 80.0 {
        strengths.push("Experience level exceeds requirements".to_string());
    }
    if result.semantic_score >= 70.0 {
        strengths.push("Resume content strongly aligns with job description".to_string());
    }
    if !result.skill_overlap.is_empty() {
        strengths.push(format!("Key matching skills: {}", first_n(&result.skill_overlap, 3)));
    }

    if result.skill_score < 70.0 {
        gaps.push("Skill match could be improved".to_string());
    }
    if !result.skill_gaps.is_empty() {
        gaps.push(format!("Missing required skills: {}", first_n(&result.skill_gaps, 3)));
    }
    if result.experience_score < 70.0 {
        gaps.push("Experience level below requirements".to_string());
    }

    if !result.skill_gaps.is_empty() {
        recommendations.push(format!("Consider learning: {}", first_n(&result.skill_gaps, 3)));
    }
    if result.semantic_score < 60.0 {
        recommendations.push("Tailor resume language to match job description".to_string());
    }
    if result.experience_score < 80.0 {
        recommendations.push("Highlight relevant project experience".to_string());
    }

    MatchExplanation {
        overall_summary: if result.explanation.is_empty() {
            "Match analysis complete.".to_string()
        } else {
            result.explanation.clone()
        },
        strengths: or_default(strengths, "No major strengths identified"),
        gaps: or_default(gaps, "No significant gaps found"),
        recommendations: or_default(recommendations, "Continue building relevant experience"),
        feature_contributions: result.feature_importance.clone(),
    }
}

pub(crate) fn first_n(items: &[String], n: usize) -> String {
    items.iter().take(n).cloned().collect::<Vec<_>>().join(", ")
}

fn or_default(items: Vec<String>, default: &str) -> Vec<String> {
    if items.is_empty() {
        vec![default.to_string()]
    } else {
        items
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::classifier::{ClassifierArtifact, FEATURE_NAMES};

    fn degree(name: &str) -> EducationEntry {
        EducationEntry {
            degree: name.to_string(),
            institution: None,
            graduation_year: None,
            context: String::new(),
        }
    }

    fn resume(skills: &[&str], years: u32) -> ResumeProfile {
        ResumeProfile {
            id: 1,
            raw_text: "Backend engineer with Python and SQL experience".to_string(),
            sections: BTreeMap::new(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            experience_years: years,
            education: vec![degree("Bachelor")],
            work_history: Vec::new(),
            embedding: None,
        }
    }

    fn job(skills: &[&str], years: u32, education: &str) -> JobRecord {
        JobRecord {
            id: 10,
            title: "Data Engineer".to_string(),
            company: "Acme".to_string(),
            description: "Build pipelines with Python, SQL and Docker".to_string(),
            skills_required: skills.iter().map(|s| s.to_string()).collect(),
            experience_required: years,
            education_required: education.to_string(),
            ..Default::default()
        }
    }

    fn scorer() -> MatchScorer {
        MatchScorer::new(Arc::new(EmbeddingProvider::fallback(64)))
    }

    #[test]
    fn test_partial_skill_overlap() {
        let result = scorer()
            .calculate(&resume(&["python", "sql"], 3), &job(&["Python", "SQL", "Docker"], 0, ""))
            .unwrap();

        assert_eq!(result.skill_score, 66.67);
        assert_eq!(result.skill_overlap, vec!["python", "sql"]);
        assert_eq!(result.skill_gaps, vec!["docker"]);
    }

    #[test]
    fn test_overlap_and_gaps_partition_requirements() {
        let required = ["Rust", "go", "SQL", "kafka"];
        let matched = skill_match(["rust", "Kafka", "python"], required);

        let mut union: Vec<String> = matched.overlap.iter().chain(&matched.gaps).cloned().collect();
        union.sort();
        let mut expected: Vec<String> = required.iter().map(|s| s.to_lowercase()).collect();
        expected.sort();

        assert_eq!(union, expected);
        assert!(matched.overlap.iter().all(|s| !matched.gaps.contains(s)));
    }

    #[test]
    fn test_no_requirements_means_full_skill_score() {
        let matched = skill_match(["rust", "python"], Vec::<String>::new());
        assert_eq!(matched.score, 100.0);
        assert_eq!(matched.overlap, vec!["python", "rust"]);
        assert!(matched.gaps.is_empty());
    }

    #[test]
    fn test_experience_score() {
        assert_eq!(experience_score(2, 5), 40.0);
        assert_eq!(experience_score(0, 0), 100.0);
        assert_eq!(experience_score(7, 5), 100.0);
    }

    #[test]
    fn test_education_score() {
        let bachelor = vec![degree("Bachelor of Science")];
        assert_eq!(education_score(&bachelor, ""), 100.0);
        assert_eq!(education_score(&bachelor, "Degree preferred"), 100.0);
        assert_eq!(education_score(&bachelor, "Master's in CS"), 75.0);
        assert_eq!(education_score(&bachelor, "Bachelor's or Master's"), 100.0);
        assert_eq!(education_score(&[degree("Ph.D.")], "PhD required"), 100.0);
        assert_eq!(education_score(&[], "High school diploma"), 0.0);
    }

    #[test]
    fn test_scores_stay_in_range_and_weights_sum_to_one() {
        assert!((SKILL_WEIGHT + SEMANTIC_WEIGHT + EXPERIENCE_WEIGHT + EDUCATION_WEIGHT - 1.0).abs() < 1e-12);

        let result = scorer()
            .calculate(&resume(&["python"], 1), &job(&["python", "docker"], 5, "Master"))
            .unwrap();
        for score in [
            result.overall_score,
            result.skill_score,
            result.semantic_score,
            result.experience_score,
            result.education_score,
        ] {
            assert!((0.0..=100.0).contains(&score));
        }
        let contributions: f64 = result.feature_importance.values().sum();
        assert!((contributions * 100.0 - result.overall_score).abs() < 0.01);
    }

    #[test]
    fn test_calculate_is_deterministic() {
        let scorer = scorer();
        let resume = resume(&["python", "sql"], 3);
        let job = job(&["python", "docker"], 2, "Bachelor");
        assert_eq!(scorer.calculate(&resume, &job).unwrap(), scorer.calculate(&resume, &job).unwrap());
    }

    #[test]
    fn test_semantic_neutral_without_text_or_on_mismatch() {
        let mut empty = resume(&[], 0);
        empty.raw_text = String::new();
        let result = scorer().calculate(&empty, &job(&[], 0, "")).unwrap();
        assert_eq!(result.semantic_score, NEUTRAL_SEMANTIC_SCORE);

        let mut stored = resume(&[], 0);
        stored.embedding = Some(vec![1.0; 3]);
        let result = scorer().calculate(&stored, &job(&[], 0, "")).unwrap();
        assert_eq!(result.semantic_score, NEUTRAL_SEMANTIC_SCORE);
    }

    #[test]
    fn test_stored_embeddings_are_reused() {
        let mut resume = resume(&[], 0);
        resume.embedding = Some(vec![1.0, 0.0]);
        let mut job = job(&[], 0, "");
        job.embedding = Some(vec![1.0, 0.0]);

        let result = scorer().calculate(&resume, &job).unwrap();
        assert_eq!(result.semantic_score, 100.0);
    }

    #[test]
    fn test_explanation_text() {
        let result = scorer()
            .calculate(&resume(&["python", "sql"], 3), &job(&["python", "sql", "docker"], 5, ""))
            .unwrap();
        assert!(result
            .explanation
            .contains("Matching skills: python, sql Skills to develop: docker"));
        assert!(result.explanation.contains("Additional experience may be beneficial."));
        assert!(result.explanation.ends_with("Education requirements satisfied."));

        let many: Vec<String> = (0..7).map(|i| format!("skill{}", i)).collect();
        let summary = summarize(85.0, &many, &[], true, false);
        assert_eq!(
            summary,
            "Excellent match! Matching skills: skill0, skill1, skill2, skill3, skill4 ...and 2 more. \
             Experience level meets requirements."
        );
    }

    #[test]
    fn test_explain_defaults_and_lists() {
        let result = MatchResult {
            resume_id: 1,
            job_id: 2,
            overall_score: 90.0,
            skill_score: 100.0,
            semantic_score: 65.0,
            experience_score: 100.0,
            education_score: 100.0,
            skill_overlap: Vec::new(),
            skill_gaps: Vec::new(),
            explanation: String::new(),
            feature_importance: BTreeMap::new(),
            classifier_probability: None,
        };
        let explanation = explain(&result);
        assert_eq!(explanation.overall_summary, "Match analysis complete.");
        assert_eq!(
            explanation.strengths,
            vec!["Strong skill alignment (100%)", "Experience level exceeds requirements"]
        );
        assert_eq!(explanation.gaps, vec!["No significant gaps found"]);
        assert_eq!(explanation.recommendations, vec!["Continue building relevant experience"]);

        let weak = MatchResult {
            skill_score: 25.0,
            semantic_score: 40.0,
            experience_score: 40.0,
            skill_gaps: vec!["docker".into(), "go".into(), "kafka".into(), "rust".into()],
            ..result
        };
        let explanation = explain(&weak);
        assert_eq!(
            explanation.gaps,
            vec![
                "Skill match could be improved",
                "Missing required skills: docker, go, kafka",
                "Experience level below requirements"
            ]
        );
        assert_eq!(explanation.recommendations.len(), 3);
        assert_eq!(explanation.strengths, vec!["No major strengths identified"]);
    }

    #[test]
    fn test_classifier_probability_is_reported() {
        let artifact = ClassifierArtifact {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            weights: vec![0.0; 16],
            intercept: 0.0,
            scaler: None,
        };
        let scorer = scorer().with_classifier(MatchClassifier::from_artifact(artifact));
        let plain = self::scorer();

        let resume = resume(&["python"], 2);
        let job = job(&["python"], 2, "");
        let with_model = scorer.calculate(&resume, &job).unwrap();
        let without_model = plain.calculate(&resume, &job).unwrap();

        assert_eq!(with_model.classifier_probability, Some(0.5));
        assert_eq!(with_model.overall_score, without_model.overall_score);
        assert!(with_model.explanation.ends_with("Model match probability: 50%."));
    }

    #[test]
    fn test_malformed_classifier_fails_scoring() {
        let artifact = ClassifierArtifact {
            feature_names: Vec::new(),
            weights: vec![0.5; 4],
            intercept: 0.0,
            scaler: None,
        };
        let scorer = scorer().with_classifier(MatchClassifier::from_artifact(artifact));
        let result = scorer.calculate(&resume(&[], 0), &job(&[], 0, ""));
        assert!(matches!(result, Err(RecommenderError::Scoring { job_id: 10, .. })));
    }
}
