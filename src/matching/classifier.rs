//! Trained match classifier: logistic regression over engineered features

use crate::error::{RecommenderError, Result};
use crate::matching::models::{JobRecord, ResumeProfile};
use crate::matching::scorer::{education_level, highest_education_level};
use crate::processing::text_processor::token_jaccard;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Feature order shared with the training pipeline
pub const FEATURE_NAMES: [&str; 16] = [
    "skill_overlap_ratio",
    "skill_overlap_count",
    "skill_gap_count",
    "extra_skills_count",
    "experience_ratio",
    "experience_diff",
    "experience_meets_req",
    "experience_exceeds",
    "text_jaccard_similarity",
    "resume_length",
    "job_length",
    "common_tokens_count",
    "education_level_ratio",
    "education_meets_req",
    "candidate_education_level",
    "required_education_level",
];

#[derive(Debug, Clone, PartialEq)]
pub struct MatchFeatures {
    values: [f64; 16],
}

impl MatchFeatures {
    pub fn extract(resume: &ResumeProfile, job: &JobRecord) -> Self {
        let resume_skills: HashSet<String> = resume.skills.iter().map(|s| s.to_lowercase()).collect();
        let job_skills: HashSet<String> =
            job.skills_required.iter().map(|s| s.to_lowercase()).collect();

        let (overlap_ratio, overlap_count, gap_count, extra_count) = if job_skills.is_empty() {
            (1.0, resume_skills.len(), 0, resume_skills.len())
        } else {
            let overlap = resume_skills.intersection(&job_skills).count();
            (
                overlap as f64 / job_skills.len() as f64,
                overlap,
                job_skills.difference(&resume_skills).count(),
                resume_skills.difference(&job_skills).count(),
            )
        };

        let candidate_exp = f64::from(resume.experience_years);
        let required_exp = f64::from(job.experience_required);
        let (exp_ratio, exp_diff) = if job.experience_required == 0 {
            (1.0, candidate_exp)
        } else {
            ((candidate_exp / required_exp).min(1.0), candidate_exp - required_exp)
        };

        let (jaccard, common_tokens) = token_jaccard(&resume.raw_text, &job.description);

        let required_edu = f64::from(education_level(&job.education_required));
        let candidate_edu = f64::from(highest_education_level(&resume.education));
        let (edu_ratio, edu_meets) = if required_edu == 0.0 {
            (1.0, 1.0)
        } else {
            (
                (candidate_edu / required_edu).min(1.0),
                flag(candidate_edu >= required_edu),
            )
        };

        Self {
            values: [
                overlap_ratio,
                overlap_count as f64,
                gap_count as f64,
                extra_count as f64,
                exp_ratio,
                exp_diff,
                flag(candidate_exp >= required_exp),
                flag(candidate_exp > required_exp),
                jaccard,
                resume.raw_text.split_whitespace().count() as f64,
                job.description.split_whitespace().count() as f64,
                common_tokens as f64,
                edu_ratio,
                edu_meets,
                candidate_edu,
                required_edu,
            ],
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.values[i])
    }
}

fn flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// JSON artifact written by the training pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub feature_names: Vec<String>,
    pub weights: Vec<f64>,
    pub intercept: f64,
    pub scaler: Option<ScalerParams>,
}

pub struct MatchClassifier {
    artifact: ClassifierArtifact,
}

impl MatchClassifier {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RecommenderError::Classifier(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let classifier = Self::from_json(&content)?;
        info!("Classifier loaded from {}", path.display());
        Ok(classifier)
    }

    /// Parse an artifact. Shape problems surface later, from `predict_probability`.
    pub fn from_json(content: &str) -> Result<Self> {
        let artifact: ClassifierArtifact = serde_json::from_str(content)
            .map_err(|e| RecommenderError::Classifier(format!("Invalid classifier artifact: {}", e)))?;
        Ok(Self { artifact })
    }

    pub fn from_artifact(artifact: ClassifierArtifact) -> Self {
        Self { artifact }
    }

    /// Probability of the positive (match) class
    pub fn predict_probability(&self, features: &MatchFeatures) -> Result<f64> {
        self.check_shape()?;

        let values = features.values();
        let mut logit = self.artifact.intercept;
        for (i, (value, weight)) in values.iter().zip(&self.artifact.weights).enumerate() {
            let scaled = match &self.artifact.scaler {
                Some(scaler) => {
                    // zero variance columns are left unscaled, as the trainer does
                    let scale = if scaler.scale[i] == 0.0 { 1.0 } else { scaler.scale[i] };
                    (value - scaler.mean[i]) / scale
                }
                None => *value,
            };
            logit += scaled * weight;
        }

        Ok(1.0 / (1.0 + (-logit).exp()))
    }

    fn check_shape(&self) -> Result<()> {
        let expected = FEATURE_NAMES.len();
        let artifact = &self.artifact;

        if artifact.weights.len() != expected {
            return Err(RecommenderError::Classifier(format!(
                "expected {} weights, artifact has {}",
                expected,
                artifact.weights.len()
            )));
        }
        if !artifact.feature_names.is_empty()
            && artifact.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES)
        {
            return Err(RecommenderError::Classifier(
                "artifact feature names do not match the extracted features".to_string(),
            ));
        }
        if let Some(scaler) = &artifact.scaler {
            if scaler.mean.len() != expected || scaler.scale.len() != expected {
                return Err(RecommenderError::Classifier(format!(
                    "scaler expects {} / {} features, extracted {}",
                    scaler.mean.len(),
                    scaler.scale.len(),
                    expected
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::document::EducationEntry;

    fn resume() -> ResumeProfile {
        ResumeProfile {
            id: 1,
            raw_text: "Rust engineer building data pipelines".to_string(),
            sections: Default::default(),
            skills: ["rust", "python"].iter().map(|s| s.to_string()).collect(),
            experience_years: 3,
            education: vec![EducationEntry {
                degree: "Bachelor".to_string(),
                institution: None,
                graduation_year: Some(2015),
                context: String::new(),
            }],
            work_history: Vec::new(),
            embedding: None,
        }
    }

    fn job() -> JobRecord {
        JobRecord {
            id: 2,
            description: "Build data pipelines in Rust".to_string(),
            skills_required: vec!["Rust".to_string(), "Kafka".to_string()],
            experience_required: 5,
            education_required: "Master's degree".to_string(),
            ..Default::default()
        }
    }

    fn artifact(weights: Vec<f64>) -> ClassifierArtifact {
        ClassifierArtifact {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            weights,
            intercept: 0.0,
            scaler: None,
        }
    }

    #[test]
    fn test_feature_extraction() {
        let features = MatchFeatures::extract(&resume(), &job());
        assert_eq!(features.get("skill_overlap_ratio"), Some(0.5));
        assert_eq!(features.get("skill_gap_count"), Some(1.0));
        assert_eq!(features.get("extra_skills_count"), Some(1.0));
        assert_eq!(features.get("experience_ratio"), Some(0.6));
        assert_eq!(features.get("experience_diff"), Some(-2.0));
        assert_eq!(features.get("experience_meets_req"), Some(0.0));
        assert_eq!(features.get("candidate_education_level"), Some(3.0));
        assert_eq!(features.get("required_education_level"), Some(4.0));
        assert_eq!(features.get("education_level_ratio"), Some(0.75));
        assert_eq!(features.get("resume_length"), Some(5.0));
        assert_eq!(features.get("common_tokens_count"), Some(3.0));
        assert_eq!(features.values().len(), FEATURE_NAMES.len());
    }

    #[test]
    fn test_zero_weights_give_even_odds() {
        let classifier = MatchClassifier::from_artifact(artifact(vec![0.0; 16]));
        let probability = classifier
            .predict_probability(&MatchFeatures::extract(&resume(), &job()))
            .unwrap();
        assert!((probability - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_scaler_is_applied() {
        let mut weights = vec![0.0; 16];
        weights[0] = 2.0;
        let mut with_scaler = artifact(weights);
        with_scaler.scaler = Some(ScalerParams {
            mean: vec![0.5; 16],
            scale: vec![0.0; 16],
        });

        let probability = MatchClassifier::from_artifact(with_scaler)
            .predict_probability(&MatchFeatures::extract(&resume(), &job()))
            .unwrap();
        assert!((probability - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_feature_count_mismatch() {
        let classifier = MatchClassifier::from_artifact(ClassifierArtifact {
            feature_names: Vec::new(),
            weights: vec![1.0; 3],
            intercept: 0.0,
            scaler: None,
        });
        assert!(matches!(
            classifier.predict_probability(&MatchFeatures::extract(&resume(), &job())),
            Err(RecommenderError::Classifier(_))
        ));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{"feature_names": [], "weights": [], "intercept": 1.5, "scaler": null}"#;
        assert!(MatchClassifier::from_json(json).is_ok());
        assert!(MatchClassifier::from_json("{").is_err());
    }
}
