//! Match scoring, recommendation ranking and skill-gap analysis

pub mod cache;
pub mod classifier;
pub mod models;
pub mod recommender;
pub mod scorer;

pub use cache::MatchCache;
pub use models::{
    JobRecord, MatchExplanation, MatchResult, RecommendationBatch, RecommendationFilters,
    RecommendationItem, ResumeProfile, SkillGapReport,
};
pub use recommender::{analyze_skill_gaps, Recommender};
pub use scorer::{explain, JobScorer, MatchScorer};
