//! Job recommendations: filter, score, rank and explain

use crate::config::Config;
use crate::error::Result;
use crate::matching::cache::MatchCache;
use crate::matching::models::{
    JobRecord, MatchResult, RecommendationBatch, RecommendationFilters, RecommendationItem,
    ResumeProfile, SkillGapReport,
};
use crate::matching::scorer::{first_n, round2, JobScorer, MatchScorer};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};

const MAX_HIGHLIGHTS: usize = 3;
const MAX_LISTED_SKILLS: usize = 5;
const MAX_GAPS_PER_BUCKET: usize = 5;

pub struct Recommender<S: JobScorer = MatchScorer> {
    scorer: S,
}

impl Recommender<MatchScorer> {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(MatchScorer::from_config(config)?))
    }
}

impl<S: JobScorer> Recommender<S> {
    pub fn new(scorer: S) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Rank `jobs` for `resume`.
    ///
    /// Jobs that fail to score are logged and left out; the batch reports how
    /// many were skipped.
    pub fn generate(
        &self,
        resume: &ResumeProfile,
        jobs: &[JobRecord],
        filters: &RecommendationFilters,
        limit: usize,
    ) -> RecommendationBatch {
        self.rank(resume, jobs, filters, limit, None)
    }

    /// Like `generate`, but reuses results already in `cache` and stores new ones
    pub fn generate_with_cache(
        &self,
        resume: &ResumeProfile,
        jobs: &[JobRecord],
        filters: &RecommendationFilters,
        limit: usize,
        cache: &mut MatchCache,
    ) -> RecommendationBatch {
        self.rank(resume, jobs, filters, limit, Some(cache))
    }

    fn rank(
        &self,
        resume: &ResumeProfile,
        jobs: &[JobRecord],
        filters: &RecommendationFilters,
        limit: usize,
        mut cache: Option<&mut MatchCache>,
    ) -> RecommendationBatch {
        let survivors: Vec<&JobRecord> = jobs.iter().filter(|job| filters.matches(job)).collect();
        let mut batch = RecommendationBatch {
            total_jobs: jobs.len(),
            filtered: survivors.len(),
            ..Default::default()
        };
        if survivors.is_empty() {
            debug!("No jobs left after filtering {} candidates", jobs.len());
            return batch;
        }

        let known: Vec<Option<MatchResult>> = survivors
            .iter()
            .map(|job| {
                cache
                    .as_deref()
                    .and_then(|c| c.get(resume.id, job.id))
                    .cloned()
            })
            .collect();

        let resume_embedding = if known.iter().any(Option::is_none) {
            self.scorer.resume_embedding(resume)
        } else {
            None
        };

        // collect() keeps input order, so the stable sort below sees the same
        // sequence a sequential loop would
        let outcomes: Vec<Result<MatchResult>> = survivors
            .par_iter()
            .zip(known.into_par_iter())
            .map(|(job, known)| match known {
                Some(result) => Ok(result),
                None => self.scorer.score(resume, job, resume_embedding.as_deref()),
            })
            .collect();

        let mut scored: Vec<(&JobRecord, MatchResult)> = Vec::with_capacity(outcomes.len());
        for (job, outcome) in survivors.into_iter().zip(outcomes) {
            match outcome {
                Ok(result) => {
                    if let Some(cache) = cache.as_deref_mut() {
                        cache.insert(result.clone());
                    }
                    scored.push((job, result));
                }
                Err(e) => {
                    warn!("Error scoring job {}: {}", job.id, e);
                    batch.skipped += 1;
                }
            }
        }
        batch.scored = scored.len();

        scored.sort_by(|a, b| b.1.overall_score.total_cmp(&a.1.overall_score));
        scored.truncate(limit);

        batch.items = scored
            .into_iter()
            .enumerate()
            .map(|(index, (job, result))| build_item(job, &result, index + 1))
            .collect();

        info!(
            "Recommended {} of {} jobs ({} filtered in, {} skipped)",
            batch.items.len(),
            batch.total_jobs,
            batch.filtered,
            batch.skipped
        );
        batch
    }
}

fn build_item(job: &JobRecord, result: &MatchResult, rank: usize) -> RecommendationItem {
    let score = round2(result.overall_score);
    RecommendationItem {
        job_id: job.id,
        rank,
        score,
        title: job.title.clone(),
        company: job.company.clone(),
        location: job.location.clone(),
        salary_range: job.salary_range(),
        explanation: rank_explanation(score, &result.skill_overlap, &result.skill_gaps, rank),
        skill_overlap: result.skill_overlap.iter().take(MAX_LISTED_SKILLS).cloned().collect(),
        skill_gaps: result.skill_gaps.iter().take(MAX_LISTED_SKILLS).cloned().collect(),
        highlights: highlights(score, &result.skill_overlap, &result.skill_gaps),
    }
}

/// Up to three short badges: score tier, matching skills, gap size
pub fn highlights(score: f64, skill_overlap: &[String], skill_gaps: &[String]) -> Vec<String> {
    let mut highlights = Vec::new();

    if score >= 80.0 {
        highlights.push("🎯 Excellent match for your profile".to_string());
    } else if score >= 70.0 {
        highlights.push("✨ Strong alignment with your skills".to_string());
    } else if score >= 60.0 {
        highlights.push("📈 Good growth opportunity".to_string());
    }

    if skill_overlap.len() >= 5 {
        highlights.push(format!("💪 {} skills match required skills", skill_overlap.len()));
    } else if skill_overlap.len() >= 3 {
        highlights.push("✓ Core skills aligned".to_string());
    }

    if skill_gaps.len() <= 2 {
        highlights.push("📋 Minimal skill gaps".to_string());
    } else if skill_gaps.len() <= 5 {
        highlights.push("📚 Achievable skill development path".to_string());
    }

    highlights.truncate(MAX_HIGHLIGHTS);
    highlights
}

pub fn rank_explanation(score: f64, skill_overlap: &[String], skill_gaps: &[String], rank: usize) -> String {
    let mut parts = Vec::new();

    parts.push(match rank {
        1 => format!("Top recommendation with {:.0}% match.", score),
        2 | 3 => format!("Highly recommended ({:.0}% match).", score),
        _ => format!("Good fit ({:.0}% match).", score),
    });

    if skill_overlap.len() > 3 {
        parts.push(format!(
            "Your {} and {} other skills align well.",
            first_n(skill_overlap, 3),
            skill_overlap.len() - 3
        ));
    } else if !skill_overlap.is_empty() {
        parts.push(format!("Your {} skills are relevant.", skill_overlap.join(", ")));
    }

    if !skill_gaps.is_empty() {
        parts.push(format!("Opportunity to develop: {}.", first_n(skill_gaps, 2)));
    }

    parts.join(" ")
}

/// Which missing skills matter most across a set of target jobs.
///
/// A skill counts once per job that requires it. Missing skills required by at
/// least 70% of jobs are critical, 30% to 70% important, the rest nice to have.
pub fn analyze_skill_gaps(resume: &ResumeProfile, jobs: &[JobRecord]) -> SkillGapReport {
    let resume_skills: BTreeSet<String> = resume.skills.iter().map(|s| s.to_lowercase()).collect();

    let mut frequency: HashMap<String, usize> = HashMap::new();
    for job in jobs {
        let required: BTreeSet<String> = job.skills_required.iter().map(|s| s.to_lowercase()).collect();
        for skill in required {
            *frequency.entry(skill).or_insert(0) += 1;
        }
    }

    let mut missing: Vec<(&String, usize)> = frequency
        .iter()
        .filter(|(skill, _)| !resume_skills.contains(*skill))
        .map(|(skill, count)| (skill, *count))
        .collect();
    missing.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let job_count = jobs.len() as f64;
    let bucket = |keep: &dyn Fn(f64) -> bool| -> Vec<String> {
        missing
            .iter()
            .filter(|(_, count)| keep(*count as f64))
            .map(|(skill, _)| (*skill).clone())
            .collect()
    };
    let critical = bucket(&|count: f64| count >= job_count * 0.7);
    let important = bucket(&|count: f64| count >= job_count * 0.3 && count < job_count * 0.7);
    let nice_to_have = bucket(&|count: f64| count < job_count * 0.3);

    let overall_coverage = if frequency.is_empty() {
        100.0
    } else {
        let covered = resume_skills.iter().filter(|s| frequency.contains_key(*s)).count();
        covered as f64 / frequency.len() as f64 * 100.0
    };

    let recommendation = gap_recommendation(&critical, &important);

    SkillGapReport {
        total_jobs_analyzed: jobs.len(),
        current_skills: resume_skills.into_iter().collect(),
        critical_gaps: critical.into_iter().take(MAX_GAPS_PER_BUCKET).collect(),
        important_gaps: important.into_iter().take(MAX_GAPS_PER_BUCKET).collect(),
        nice_to_have: nice_to_have.into_iter().take(MAX_GAPS_PER_BUCKET).collect(),
        overall_coverage,
        recommendation,
    }
}

fn gap_recommendation(critical: &[String], important: &[String]) -> String {
    if critical.is_empty() && important.is_empty() {
        "Your skills align well with the job market. Keep building on your strengths!".to_string()
    } else if !critical.is_empty() {
        format!(
            "Focus on learning {} to significantly improve your marketability.",
            first_n(critical, 3)
        )
    } else {
        format!(
            "Consider developing {} to enhance your profile.",
            first_n(important, 3)
        )
    }
}
