//! In-memory store of computed matches keyed by (resume, job)

use crate::error::Result;
use crate::matching::models::MatchResult;
use std::collections::HashMap;

/// Once a pair has a result it is returned as-is and never recomputed
#[derive(Debug, Default)]
pub struct MatchCache {
    entries: HashMap<(i64, i64), MatchResult>,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, resume_id: i64, job_id: i64) -> Option<&MatchResult> {
        self.entries.get(&(resume_id, job_id))
    }

    /// Keeps an existing entry; returns the stored result either way
    pub fn insert(&mut self, result: MatchResult) -> &MatchResult {
        self.entries
            .entry((result.resume_id, result.job_id))
            .or_insert(result)
    }

    pub fn get_or_try_insert_with<F>(&mut self, resume_id: i64, job_id: i64, compute: F) -> Result<&MatchResult>
    where
        F: FnOnce() -> Result<MatchResult>,
    {
        use std::collections::hash_map::Entry;

        match self.entries.entry((resume_id, job_id)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(compute()?)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecommenderError;
    use std::collections::BTreeMap;

    fn result(job_id: i64, score: f64) -> MatchResult {
        MatchResult {
            resume_id: 1,
            job_id,
            overall_score: score,
            skill_score: score,
            semantic_score: score,
            experience_score: score,
            education_score: score,
            skill_overlap: Vec::new(),
            skill_gaps: Vec::new(),
            explanation: String::new(),
            feature_importance: BTreeMap::new(),
            classifier_probability: None,
        }
    }

    #[test]
    fn test_existing_entry_is_kept() {
        let mut cache = MatchCache::new();
        cache.insert(result(5, 40.0));
        let stored = cache.insert(result(5, 90.0));
        assert_eq!(stored.overall_score, 40.0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_compute_runs_once() {
        let mut cache = MatchCache::new();
        let mut calls = 0;

        for _ in 0..3 {
            cache
                .get_or_try_insert_with(1, 7, || {
                    calls += 1;
                    Ok(result(7, 55.0))
                })
                .unwrap();
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.get(1, 7).map(|r| r.overall_score), Some(55.0));
    }

    #[test]
    fn test_failed_compute_is_not_cached() {
        let mut cache = MatchCache::new();
        let outcome = cache.get_or_try_insert_with(1, 8, || Err(RecommenderError::scoring(8, "boom")));
        assert!(outcome.is_err());
        assert!(cache.is_empty());
    }
}
