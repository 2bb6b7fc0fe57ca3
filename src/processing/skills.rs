//! Skill extraction against a static taxonomy with alias normalization

use crate::error::{RecommenderError, Result};
use crate::processing::text_processor::phrase_chunks;
use aho_corasick::{AhoCorasick, MatchKind};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Technical,
    Soft,
    Methodological,
    Other,
}

use SkillCategory::{Methodological, Soft, Technical};

/// Recognized skills, lower-cased
const SKILL_TAXONOMY: &[(&str, SkillCategory)] = &[
    // Programming languages
    ("python", Technical),
    ("javascript", Technical),
    ("typescript", Technical),
    ("java", Technical),
    ("c++", Technical),
    ("c#", Technical),
    ("go", Technical),
    ("golang", Technical),
    ("rust", Technical),
    ("ruby", Technical),
    ("php", Technical),
    ("swift", Technical),
    ("kotlin", Technical),
    ("scala", Technical),
    ("r", Technical),
    ("matlab", Technical),
    ("sql", Technical),
    // Web
    ("html", Technical),
    ("css", Technical),
    ("react", Technical),
    ("reactjs", Technical),
    ("react.js", Technical),
    ("angular", Technical),
    ("vue", Technical),
    ("vuejs", Technical),
    ("vue.js", Technical),
    ("nodejs", Technical),
    ("node.js", Technical),
    ("express", Technical),
    ("django", Technical),
    ("flask", Technical),
    ("fastapi", Technical),
    ("spring", Technical),
    ("spring boot", Technical),
    ("asp.net", Technical),
    ("tailwindcss", Technical),
    ("bootstrap", Technical),
    ("sass", Technical),
    ("webpack", Technical),
    ("nextjs", Technical),
    ("next.js", Technical),
    // Databases
    ("mysql", Technical),
    ("postgresql", Technical),
    ("mongodb", Technical),
    ("redis", Technical),
    ("elasticsearch", Technical),
    ("sqlite", Technical),
    ("oracle", Technical),
    ("cassandra", Technical),
    ("dynamodb", Technical),
    // Cloud and DevOps
    ("aws", Technical),
    ("amazon web services", Technical),
    ("azure", Technical),
    ("gcp", Technical),
    ("google cloud", Technical),
    ("docker", Technical),
    ("kubernetes", Technical),
    ("k8s", Technical),
    ("terraform", Technical),
    ("ansible", Technical),
    ("jenkins", Technical),
    ("ci/cd", Technical),
    ("github actions", Technical),
    ("gitlab ci", Technical),
    ("linux", Technical),
    ("unix", Technical),
    ("bash", Technical),
    // Data science and ML
    ("machine learning", Technical),
    ("deep learning", Technical),
    ("artificial intelligence", Technical),
    ("ai", Technical),
    ("ml", Technical),
    ("tensorflow", Technical),
    ("pytorch", Technical),
    ("keras", Technical),
    ("scikit-learn", Technical),
    ("sklearn", Technical),
    ("pandas", Technical),
    ("numpy", Technical),
    ("scipy", Technical),
    ("matplotlib", Technical),
    ("data analysis", Technical),
    ("data science", Technical),
    ("nlp", Technical),
    ("natural language processing", Technical),
    ("computer vision", Technical),
    ("opencv", Technical),
    ("neural networks", Technical),
    ("transformers", Technical),
    ("bert", Technical),
    ("gpt", Technical),
    ("llm", Technical),
    ("huggingface", Technical),
    // Tools and platforms
    ("git", Technical),
    ("github", Technical),
    ("gitlab", Technical),
    ("jira", Technical),
    ("confluence", Technical),
    ("slack", Technical),
    ("figma", Technical),
    ("postman", Technical),
    ("swagger", Technical),
    ("graphql", Technical),
    ("rest api", Technical),
    ("restful", Technical),
    ("microservices", Technical),
    // Methodologies
    ("agile", Methodological),
    ("scrum", Methodological),
    ("kanban", Methodological),
    // Soft skills
    ("leadership", Soft),
    ("communication", Soft),
    ("teamwork", Soft),
    ("problem solving", Soft),
    ("problem-solving", Soft),
    ("critical thinking", Soft),
    ("time management", Soft),
    ("project management", Soft),
    ("analytical", Soft),
    ("creative", Soft),
    ("detail-oriented", Soft),
    ("self-motivated", Soft),
    ("adaptability", Soft),
    ("collaboration", Soft),
    ("mentoring", Soft),
    ("presentation", Soft),
];

/// Informal spelling -> canonical taxonomy key
const SKILL_ALIASES: &[(&str, &str)] = &[
    ("reactjs", "react"),
    ("react.js", "react"),
    ("vuejs", "vue"),
    ("vue.js", "vue"),
    ("nodejs", "node.js"),
    ("nextjs", "next.js"),
    ("golang", "go"),
    ("k8s", "kubernetes"),
    ("postgres", "postgresql"),
    ("mongo", "mongodb"),
    ("sklearn", "scikit-learn"),
    ("tf", "tensorflow"),
];

static TAXONOMY: LazyLock<HashMap<&'static str, SkillCategory>> =
    LazyLock::new(|| SKILL_TAXONOMY.iter().copied().collect());

static ALIASES: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| SKILL_ALIASES.iter().copied().collect());

static SHARED_EXTRACTOR: LazyLock<SkillExtractor> = LazyLock::new(SkillExtractor::default);

/// Number of skills the taxonomy recognizes
pub fn taxonomy_size() -> usize {
    TAXONOMY.len()
}

/// Extract skills with the process-wide extractor
pub fn extract_skills(text: &str) -> BTreeSet<String> {
    SHARED_EXTRACTOR.extract(text)
}

/// Rewrite aliases to their canonical key
pub fn normalize<I, S>(skills: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    skills
        .into_iter()
        .map(|skill| canonical(skill.as_ref()))
        .collect()
}

fn canonical(skill: &str) -> String {
    let lower = skill.trim().to_lowercase();
    match ALIASES.get(lower.as_str()) {
        Some(target) => (*target).to_string(),
        None => lower,
    }
}

/// Category of a single skill, alias-aware; unknown skills are `Other`
pub fn category(skill: &str) -> SkillCategory {
    let key = canonical(skill);
    TAXONOMY
        .get(key.as_str())
        .copied()
        .unwrap_or(SkillCategory::Other)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizedSkills {
    pub technical: Vec<String>,
    pub soft: Vec<String>,
    pub methodological: Vec<String>,
    pub other: Vec<String>,
}

pub fn categorize<I, S>(skills: I) -> CategorizedSkills
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut categorized = CategorizedSkills::default();
    for skill in skills {
        let skill = skill.as_ref();
        let bucket = match category(skill) {
            SkillCategory::Technical => &mut categorized.technical,
            SkillCategory::Soft => &mut categorized.soft,
            SkillCategory::Methodological => &mut categorized.methodological,
            SkillCategory::Other => &mut categorized.other,
        };
        bucket.push(skill.to_string());
    }
    categorized
}

/// Keyword matcher over the taxonomy.
///
/// Every key is searched case-insensitively; a hit only counts when it is not
/// glued to a neighbouring word character, so `java` never matches inside
/// `javascript`. The optional phrase pass looks up noun-phrase-like chunks in
/// the taxonomy; it can only confirm keys the keyword pass already finds.
pub struct SkillExtractor {
    matcher: AhoCorasick,
    keys: Vec<&'static str>,
    phrase_pass: bool,
}

impl Default for SkillExtractor {
    fn default() -> Self {
        Self::new().expect("Failed to build skill matcher")
    }
}

impl SkillExtractor {
    pub fn new() -> Result<Self> {
        let keys: Vec<&'static str> = SKILL_TAXONOMY.iter().map(|(key, _)| *key).collect();

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(&keys)
            .map_err(|e| RecommenderError::InvalidInput(format!("Failed to build skill matcher: {}", e)))?;

        Ok(Self {
            matcher,
            keys,
            phrase_pass: true,
        })
    }

    pub fn with_phrase_pass(mut self, enabled: bool) -> Self {
        self.phrase_pass = enabled;
        self
    }

    /// Normalized skills mentioned in `text`
    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        if text.trim().is_empty() {
            return BTreeSet::new();
        }

        let mut found: BTreeSet<&'static str> = self.keyword_matches(text);

        if self.phrase_pass {
            let before = found.len();
            found.extend(self.phrase_matches(text));
            if found.len() > before {
                debug!("Phrase pass added {} skills", found.len() - before);
            }
        }

        normalize(found)
    }

    fn keyword_matches(&self, text: &str) -> BTreeSet<&'static str> {
        self.matcher
            .find_overlapping_iter(text)
            .filter(|m| is_word_bounded(text, m.start(), m.end()))
            .map(|m| self.keys[m.pattern().as_usize()])
            .collect()
    }

    fn phrase_matches(&self, text: &str) -> BTreeSet<&'static str> {
        phrase_chunks(text)
            .iter()
            .filter_map(|phrase| TAXONOMY.get_key_value(phrase.as_str()).map(|(key, _)| *key))
            .collect()
    }

    pub fn skill_count(&self) -> usize {
        self.keys.len()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before_ok = text[..start].chars().next_back().map_or(true, |c| !is_word_char(c));
    let after_ok = text[end..].chars().next().map_or(true, |c| !is_word_char(c));
    before_ok && after_ok
}
