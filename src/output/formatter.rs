//! Output formatters: colored console, JSON and Markdown

use crate::config::OutputFormat;
use crate::error::{RecommenderError, Result};
use crate::matching::models::{
    MatchExplanation, MatchResult, RecommendationBatch, ResumeProfile, SkillGapReport,
};
use crate::processing::skills::categorize;
use crate::processing::text_processor::word_count;
use colored::{Color, Colorize};
use serde_json::json;
use std::path::Path;

pub trait OutputFormatter {
    fn format_profile(&self, profile: &ResumeProfile) -> Result<String>;
    fn format_match(&self, result: &MatchResult, explanation: &MatchExplanation) -> Result<String>;
    fn format_recommendations(&self, batch: &RecommendationBatch) -> Result<String>;
    fn format_skill_gaps(&self, report: &SkillGapReport) -> Result<String>;
}

pub struct ConsoleFormatter {
    use_colors: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter;

/// Picks the formatter for an `OutputFormat`
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

fn score_label(score: f64) -> (&'static str, Color) {
    if score >= 80.0 {
        ("EXCELLENT", Color::Green)
    } else if score >= 60.0 {
        ("GOOD", Color::BrightGreen)
    } else if score >= 40.0 {
        ("MODERATE", Color::Yellow)
    } else {
        ("LIMITED", Color::Red)
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            _ => "▒",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            _ => Color::Yellow,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: f64) -> String {
        let (badge, color) = score_label(score);
        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_bullets(&self, output: &mut String, items: &[String], color: Color) {
        for item in items {
            output.push_str(&format!("  • {}\n", self.colorize(item, color)));
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_profile(&self, profile: &ResumeProfile) -> Result<String> {
        let mut output = String::new();
        output.push_str(&self.format_header("📄 RESUME PROFILE", 1));
        output.push_str(&format!("Experience: {} years\n", profile.experience_years));
        output.push_str(&format!("Length: {} words\n", word_count(&profile.raw_text)));

        output.push_str(&self.format_header("Sections", 2));
        if profile.sections.is_empty() {
            output.push_str("  (none detected)\n");
        }
        for (name, content) in &profile.sections {
            let preview: String = content.chars().take(80).collect();
            output.push_str(&format!("  {}: {}\n", self.colorize(name, Color::Cyan), preview));
        }

        output.push_str(&self.format_header("Skills", 2));
        let categorized = categorize(&profile.skills);
        for (label, skills) in [
            ("Technical", &categorized.technical),
            ("Soft", &categorized.soft),
            ("Methodological", &categorized.methodological),
        ] {
            if !skills.is_empty() {
                output.push_str(&format!("  {}: {}\n", label, skills.join(", ")));
            }
        }

        if !profile.education.is_empty() {
            output.push_str(&self.format_header("Education", 2));
            for entry in &profile.education {
                let year = entry
                    .graduation_year
                    .map(|y| format!(" ({})", y))
                    .unwrap_or_default();
                let institution = entry
                    .institution
                    .as_deref()
                    .map(|i| format!(", {}", i))
                    .unwrap_or_default();
                output.push_str(&format!("  • {}{}{}\n", entry.degree, institution, year));
            }
        }

        if !profile.work_history.is_empty() {
            output.push_str(&self.format_header("Work History", 2));
            for entry in &profile.work_history {
                output.push_str(&format!("  • {} - {}\n", entry.start_date, entry.end_date));
            }
        }

        Ok(output)
    }

    fn format_match(&self, result: &MatchResult, explanation: &MatchExplanation) -> Result<String> {
        let mut output = String::new();
        output.push_str(&self.format_header(&format!("🎯 MATCH: JOB {}", result.job_id), 1));
        output.push_str(&format!(
            "Overall Score: {:.2}% {}\n",
            result.overall_score,
            self.format_score_badge(result.overall_score)
        ));
        output.push_str(&format!("{}\n", self.colorize(&result.explanation, Color::Cyan)));

        output.push_str(&self.format_header("Score Breakdown", 3));
        output.push_str(&format!("  Skills:     {:>6.2}%\n", result.skill_score));
        output.push_str(&format!("  Semantic:   {:>6.2}%\n", result.semantic_score));
        output.push_str(&format!("  Experience: {:>6.2}%\n", result.experience_score));
        output.push_str(&format!("  Education:  {:>6.2}%\n", result.education_score));
        if let Some(probability) = result.classifier_probability {
            output.push_str(&format!("  Model probability: {:.1}%\n", probability * 100.0));
        }

        output.push_str(&self.format_header("✅ Strengths", 3));
        self.format_bullets(&mut output, &explanation.strengths, Color::Green);
        output.push_str(&self.format_header("⚠️ Gaps", 3));
        self.format_bullets(&mut output, &explanation.gaps, Color::Yellow);
        output.push_str(&self.format_header("📋 Recommendations", 3));
        self.format_bullets(&mut output, &explanation.recommendations, Color::White);

        Ok(output)
    }

    fn format_recommendations(&self, batch: &RecommendationBatch) -> Result<String> {
        let mut output = String::new();
        output.push_str(&self.format_header("💼 JOB RECOMMENDATIONS", 1));
        output.push_str(&format!(
            "{} jobs, {} after filters, {} scored, {} skipped\n",
            batch.total_jobs, batch.filtered, batch.scored, batch.skipped
        ));

        if batch.items.is_empty() {
            output.push_str(&self.colorize("No matching jobs found.\n", Color::Yellow));
            return Ok(output);
        }

        for item in &batch.items {
            let heading = format!("#{} {} at {}", item.rank, item.title, item.company);
            output.push_str(&self.format_header(&heading, 2));
            output.push_str(&format!(
                "Score: {:.2}% {}\n",
                item.score,
                self.format_score_badge(item.score)
            ));
            if let Some(location) = &item.location {
                output.push_str(&format!("Location: {}\n", location));
            }
            if let Some(salary) = &item.salary_range {
                output.push_str(&format!("Salary: {}\n", salary));
            }
            output.push_str(&format!("{}\n", self.colorize(&item.explanation, Color::Cyan)));
            for highlight in &item.highlights {
                output.push_str(&format!("  {}\n", highlight));
            }
            output.push_str(&format!(
                "  Matching: {}\n",
                self.colorize(&join_or_none(&item.skill_overlap), Color::Green)
            ));
            output.push_str(&format!(
                "  To develop: {}\n",
                self.colorize(&join_or_none(&item.skill_gaps), Color::Yellow)
            ));
        }

        Ok(output)
    }

    fn format_skill_gaps(&self, report: &SkillGapReport) -> Result<String> {
        let mut output = String::new();
        output.push_str(&self.format_header("📚 SKILL GAP ANALYSIS", 1));
        output.push_str(&format!(
            "Jobs analyzed: {} | Coverage: {:.1}%\n",
            report.total_jobs_analyzed, report.overall_coverage
        ));

        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Critical:", Color::Red),
            join_or_none(&report.critical_gaps)
        ));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Important:", Color::Yellow),
            join_or_none(&report.important_gaps)
        ));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Nice to have:", Color::Green),
            join_or_none(&report.nice_to_have)
        ));
        output.push_str(&format!("\n{}\n", self.colorize(&report.recommendation, Color::Cyan)));

        Ok(output)
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.map_err(|e| RecommenderError::OutputFormatting(e.to_string()))
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_profile(&self, profile: &ResumeProfile) -> Result<String> {
        self.render(profile)
    }

    fn format_match(&self, result: &MatchResult, explanation: &MatchExplanation) -> Result<String> {
        self.render(&json!({ "match": result, "explanation": explanation }))
    }

    fn format_recommendations(&self, batch: &RecommendationBatch) -> Result<String> {
        self.render(batch)
    }

    fn format_skill_gaps(&self, report: &SkillGapReport) -> Result<String> {
        self.render(report)
    }
}

impl MarkdownFormatter {
    fn markdown_score_badge(score: f64) -> &'static str {
        if score >= 80.0 {
            "🟢 Excellent"
        } else if score >= 60.0 {
            "🟡 Good"
        } else if score >= 40.0 {
            "🟠 Moderate"
        } else {
            "🔴 Limited"
        }
    }

    fn bullet_list(output: &mut String, items: &[String]) {
        for item in items {
            output.push_str(&format!("- {}\n", item));
        }
        output.push('\n');
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_profile(&self, profile: &ResumeProfile) -> Result<String> {
        let mut output = String::new();
        output.push_str("# 📄 Resume Profile\n\n");
        output.push_str(&format!("**Experience:** {} years\n\n", profile.experience_years));

        output.push_str("## Skills\n\n");
        let skills: Vec<String> = profile.skills.iter().map(|s| format!("`{}`", s)).collect();
        output.push_str(&format!("{}\n\n", join_or_none(&skills)));

        if !profile.sections.is_empty() {
            output.push_str("## Sections\n\n");
            for (name, content) in &profile.sections {
                output.push_str(&format!("### {}\n\n{}\n\n", name, content));
            }
        }

        if !profile.education.is_empty() {
            output.push_str("## Education\n\n");
            let entries: Vec<String> = profile
                .education
                .iter()
                .map(|e| match e.graduation_year {
                    Some(year) => format!("{} ({})", e.degree, year),
                    None => e.degree.clone(),
                })
                .collect();
            Self::bullet_list(&mut output, &entries);
        }

        Ok(output)
    }

    fn format_match(&self, result: &MatchResult, explanation: &MatchExplanation) -> Result<String> {
        let mut output = String::new();
        output.push_str(&format!("# 🎯 Match: Job {}\n\n", result.job_id));
        output.push_str(&format!(
            "**Overall Score:** {:.2}% {}\n\n",
            result.overall_score,
            Self::markdown_score_badge(result.overall_score)
        ));
        output.push_str(&format!("{}\n\n", explanation.overall_summary));

        output.push_str("| Factor | Score | Contribution |\n");
        output.push_str("|--------|-------|--------------|\n");
        for (factor, score) in [
            ("skills", result.skill_score),
            ("semantic", result.semantic_score),
            ("experience", result.experience_score),
            ("education", result.education_score),
        ] {
            let contribution = explanation
                .feature_contributions
                .get(factor)
                .copied()
                .unwrap_or_default();
            output.push_str(&format!("| {} | {:.2}% | {:.3} |\n", factor, score, contribution));
        }
        output.push('\n');

        output.push_str("## ✅ Strengths\n\n");
        Self::bullet_list(&mut output, &explanation.strengths);
        output.push_str("## ⚠️ Gaps\n\n");
        Self::bullet_list(&mut output, &explanation.gaps);
        output.push_str("## 📋 Recommendations\n\n");
        Self::bullet_list(&mut output, &explanation.recommendations);

        Ok(output)
    }

    fn format_recommendations(&self, batch: &RecommendationBatch) -> Result<String> {
        let mut output = String::new();
        output.push_str("# 💼 Job Recommendations\n\n");
        output.push_str(&format!(
            "_{} jobs, {} after filters, {} scored, {} skipped_\n\n",
            batch.total_jobs, batch.filtered, batch.scored, batch.skipped
        ));

        if batch.items.is_empty() {
            output.push_str("No matching jobs found.\n");
            return Ok(output);
        }

        output.push_str("| Rank | Job | Company | Score |\n");
        output.push_str("|------|-----|---------|-------|\n");
        for item in &batch.items {
            output.push_str(&format!(
                "| {} | {} | {} | {:.2}% {} |\n",
                item.rank,
                item.title,
                item.company,
                item.score,
                Self::markdown_score_badge(item.score)
            ));
        }
        output.push('\n');

        for item in &batch.items {
            output.push_str(&format!("## {}. {} at {}\n\n", item.rank, item.title, item.company));
            output.push_str(&format!("{}\n\n", item.explanation));
            if let Some(salary) = &item.salary_range {
                output.push_str(&format!("**Salary:** {}\n\n", salary));
            }
            Self::bullet_list(&mut output, &item.highlights);
        }

        Ok(output)
    }

    fn format_skill_gaps(&self, report: &SkillGapReport) -> Result<String> {
        let mut output = String::new();
        output.push_str("# 📚 Skill Gap Analysis\n\n");
        output.push_str(&format!(
            "**Jobs analyzed:** {} | **Coverage:** {:.1}%\n\n",
            report.total_jobs_analyzed, report.overall_coverage
        ));
        output.push_str(&format!("- **Critical:** {}\n", join_or_none(&report.critical_gaps)));
        output.push_str(&format!("- **Important:** {}\n", join_or_none(&report.important_gaps)));
        output.push_str(&format!("- **Nice to have:** {}\n\n", join_or_none(&report.nice_to_have)));
        output.push_str(&format!("> {}\n", report.recommendation));
        Ok(output)
    }
}

impl ReportGenerator {
    pub fn new(use_colors: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors),
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter,
        }
    }

    pub fn formatter(&self, format: OutputFormat) -> &dyn OutputFormatter {
        match format {
            OutputFormat::Console => &self.console_formatter,
            OutputFormat::Json => &self.json_formatter,
            OutputFormat::Markdown => &self.markdown_formatter,
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(true)
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::models::RecommendationItem;
    use std::collections::BTreeMap;

    fn batch() -> RecommendationBatch {
        RecommendationBatch {
            items: vec![RecommendationItem {
                job_id: 3,
                rank: 1,
                score: 82.5,
                title: "Rust Engineer".to_string(),
                company: "Ferrous".to_string(),
                location: Some("Remote".to_string()),
                salary_range: Some("$120,000 - $150,000".to_string()),
                explanation: "Top recommendation with 82% match.".to_string(),
                skill_overlap: vec!["rust".to_string()],
                skill_gaps: Vec::new(),
                highlights: vec!["📋 Minimal skill gaps".to_string()],
            }],
            total_jobs: 4,
            filtered: 2,
            scored: 2,
            skipped: 0,
        }
    }

    #[test]
    fn test_console_without_colors() {
        let output = ConsoleFormatter::new(false).format_recommendations(&batch()).unwrap();
        assert!(output.contains("#1 Rust Engineer at Ferrous"));
        assert!(output.contains("Score: 82.50% [EXCELLENT]"));
        assert!(output.contains("Salary: $120,000 - $150,000"));
        assert!(output.contains("To develop: none"));
    }

    #[test]
    fn test_json_round_trips() {
        let output = JsonFormatter::new(false).format_recommendations(&batch()).unwrap();
        let parsed: RecommendationBatch = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, batch());
    }

    #[test]
    fn test_markdown_match_table() {
        let result = MatchResult {
            resume_id: 1,
            job_id: 9,
            overall_score: 55.0,
            skill_score: 50.0,
            semantic_score: 50.0,
            experience_score: 60.0,
            education_score: 70.0,
            skill_overlap: Vec::new(),
            skill_gaps: Vec::new(),
            explanation: "Moderate match. Consider upskilling.".to_string(),
            feature_importance: BTreeMap::from([("skills".to_string(), 0.2)]),
            classifier_probability: None,
        };
        let explanation = crate::matching::scorer::explain(&result);
        let output = MarkdownFormatter.format_match(&result, &explanation).unwrap();

        assert!(output.contains("**Overall Score:** 55.00% 🟠 Moderate"));
        assert!(output.contains("| skills | 50.00% | 0.200 |"));
        assert!(output.contains("| education | 70.00% | 0.000 |"));
    }

    #[test]
    fn test_generator_dispatch() {
        let generator = ReportGenerator::new(false);
        let json = generator.formatter(OutputFormat::Json).format_recommendations(&batch()).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());

        let markdown = generator
            .formatter(OutputFormat::Markdown)
            .format_recommendations(&batch())
            .unwrap();
        assert!(markdown.starts_with("# 💼 Job Recommendations"));

        let console = generator
            .formatter(OutputFormat::Console)
            .format_recommendations(&batch())
            .unwrap();
        assert!(console.contains("JOB RECOMMENDATIONS"));
    }

    #[test]
    fn test_console_profile_summary() {
        let profile = ResumeProfile {
            id: 1,
            raw_text: "Rust engineer with Docker and leadership experience".to_string(),
            sections: BTreeMap::new(),
            skills: ["docker", "leadership", "rust"].iter().map(|s| s.to_string()).collect(),
            experience_years: 3,
            education: Vec::new(),
            work_history: Vec::new(),
            embedding: None,
        };

        let output = ConsoleFormatter::new(false).format_profile(&profile).unwrap();
        assert!(output.contains("Experience: 3 years"));
        assert!(output.contains("Length: 7 words"));
        assert!(output.contains("(none detected)"));
    }

    #[test]
    fn test_json_render_failure_is_a_formatting_error() {
        let mut keyed_by_pair = std::collections::HashMap::new();
        keyed_by_pair.insert((1, 2), "not a string key");

        let outcome = JsonFormatter::new(true).render(&keyed_by_pair);
        assert!(matches!(outcome, Err(RecommenderError::OutputFormatting(_))));
    }
}
