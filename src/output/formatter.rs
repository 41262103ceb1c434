//! Console presentation of analyses, suggestions and run summaries

use crate::llm::analyzer::{JobRequirements, MatchAnalysis};
use crate::output::report::OptimizationReport;
use crate::processing::merger::AlignmentReport;
use crate::processing::suggestion::{Priority, Suggestion};
use colored::{Color, Colorize};
use unicode_segmentation::UnicodeSegmentation;

const VALUE_PREVIEW_LEN: usize = 90;

pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
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

    pub fn format_score_badge(&self, score: u32) -> String {
        let (badge, color) = match score {
            90..=100 => ("EXCELLENT", Color::Green),
            80..=89 => ("VERY GOOD", Color::BrightGreen),
            70..=79 => ("GOOD", Color::Yellow),
            60..=69 => ("FAIR", Color::BrightYellow),
            50..=59 => ("BELOW AVG", Color::Red),
            _ => ("POOR", Color::BrightRed),
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_priority_icon(&self, priority: Priority) -> &'static str {
        match (self.use_colors, priority) {
            (true, Priority::High) => "🔴",
            (true, Priority::Medium) => "🟡",
            (true, Priority::Low) => "🟢",
            (false, Priority::High) => "[!]",
            (false, Priority::Medium) => "[-]",
            (false, Priority::Low) => "[+]",
        }
    }

    pub fn format_match_analysis(&self, analysis: &MatchAnalysis, requirements: Option<&JobRequirements>) -> String {
        let mut output = self.format_header("📊 MATCH ANALYSIS", 1);

        if let Some(req) = requirements {
            if !req.role_title.is_empty() {
                output.push_str(&format!("Target role: {}\n", self.colorize(&req.role_title, Color::Cyan)));
            }
            if !req.industry.is_empty() {
                output.push_str(&format!("Industry: {}\n", req.industry));
            }
        }

        output.push_str(&format!(
            "Overall match: {}/100 {}\n",
            analysis.overall_match_score,
            self.format_score_badge(analysis.overall_match_score)
        ));
        output.push_str(&format!(
            "  • Skills: {}/100 | Experience: {}/100 | Keywords: {}/100\n",
            analysis.skills_match.score, analysis.experience_match.score, analysis.keyword_coverage.score
        ));

        let list_limit = if self.detailed { usize::MAX } else { 5 };
        let sections = [
            ("✅ Matched skills", &analysis.skills_match.matched, Color::Green),
            ("❌ Missing skills", &analysis.skills_match.missing, Color::Red),
            ("🔑 Missing keywords", &analysis.keyword_coverage.missing_keywords, Color::Red),
            ("💪 Strengths", &analysis.strengths, Color::Green),
            ("⚠️  Gaps", &analysis.gaps, Color::Yellow),
        ];

        for (title, items, color) in sections {
            if items.is_empty() {
                continue;
            }
            output.push_str(&format!("\n{}\n", self.colorize(title, color)));
            for item in items.iter().take(list_limit) {
                output.push_str(&format!("  • {}\n", item));
            }
            if items.len() > list_limit {
                output.push_str(&format!("  … and {} more\n", items.len() - list_limit));
            }
        }

        output
    }

    /// Suggestions grouped by category, in the order categories first appear.
    pub fn format_suggestions(&self, suggestions: &[Suggestion]) -> String {
        let mut output = self.format_header(&format!("💡 SUGGESTIONS ({})", suggestions.len()), 1);

        let mut categories: Vec<&str> = Vec::new();
        for s in suggestions {
            if !categories.contains(&s.category.as_str()) {
                categories.push(&s.category);
            }
        }

        for category in categories {
            output.push_str(&self.format_header(category, 2));
            for s in suggestions.iter().filter(|s| s.category == category) {
                let marker = match (s.selected, s.modified) {
                    (true, true) => self.colorize(" [selected, modified]", Color::Green),
                    (true, false) => self.colorize(" [selected]", Color::Green),
                    (false, true) => self.colorize(" [modified]", Color::Yellow),
                    (false, false) => String::new(),
                };
                output.push_str(&format!(
                    "{} {}. {}{}\n",
                    self.format_priority_icon(s.priority),
                    self.colorize(&s.id.to_string(), Color::Cyan),
                    s.description,
                    marker
                ));

                let value = if self.detailed {
                    s.value.clone()
                } else {
                    truncate_graphemes(&s.value, VALUE_PREVIEW_LEN)
                };
                if !value.is_empty() {
                    output.push_str(&format!("     → {}\n", value));
                }
                if !s.section.is_empty() {
                    output.push_str(&format!("     {} {} ({})\n", self.colorize("at", Color::BrightBlack), s.section, s.suggestion_type));
                }
                if self.detailed && !s.reason.is_empty() {
                    output.push_str(&format!("     why: {}\n", s.reason));
                }
            }
        }

        output
    }

    pub fn format_alignment(&self, alignment: &AlignmentReport) -> String {
        if !alignment.has_warnings() {
            return String::new();
        }
        let mut output = self.format_header("⚠️  ALIGNMENT WARNINGS", 3);
        for warning in &alignment.warnings {
            output.push_str(&format!("  • {}\n", self.colorize(warning, Color::Yellow)));
        }
        output
    }

    pub fn format_run_summary(&self, report: &OptimizationReport) -> String {
        let mut output = self.format_header("🎯 TAILORING COMPLETE", 1);

        output.push_str(&format!("Label: {}\n", report.company));
        output.push_str(&format!(
            "Suggestions applied: {}/{}\n",
            report.suggestions_applied, report.suggestions_total
        ));

        match (report.match_score_after, report.improvement) {
            (Some(after), Some(delta)) => {
                let delta_text = format!("{:+}", delta);
                let delta_color = if delta >= 0 { Color::Green } else { Color::Red };
                output.push_str(&format!(
                    "Match score: {} → {} ({}) {}\n",
                    report.match_score_before,
                    after,
                    self.colorize(&delta_text, delta_color),
                    self.format_score_badge(after)
                ));
            }
            _ => output.push_str(&format!("Match score before: {}/100\n", report.match_score_before)),
        }

        for path in [&report.tailored_json, &report.tailored_document].into_iter().flatten() {
            output.push_str(&format!("  📄 {}\n", path));
        }

        if !report.alignment_warnings.is_empty() {
            output.push_str(&format!(
                "{}\n",
                self.colorize(&format!("{} alignment warning(s); review the output", report.alignment_warnings.len()), Color::Yellow)
            ));
        }
        for hit in &report.placeholder_hits {
            output.push_str(&format!(
                "  {} {} at {}\n",
                self.colorize("placeholder", Color::Red),
                hit.placeholder,
                hit.path
            ));
        }

        output
    }
}

/// Shorten to `max` grapheme clusters, ending with "…" when cut.
pub fn truncate_graphemes(text: &str, max: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= max {
        text.to_string()
    } else {
        let mut cut: String = graphemes[..max.saturating_sub(1)].concat();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::suggestion::SuggestionType;

    #[test]
    fn test_truncate_graphemes() {
        assert_eq!(truncate_graphemes("short", 10), "short");
        assert_eq!(truncate_graphemes("abcdefghij", 5), "abcd…");
        assert_eq!(truncate_graphemes("résumé café", 4), "rés…");
    }

    #[test]
    fn test_plain_badges() {
        let formatter = ConsoleFormatter::new(false, false);
        assert_eq!(formatter.format_score_badge(95), "[EXCELLENT]");
        assert_eq!(formatter.format_score_badge(62), "[FAIR]");
        assert_eq!(formatter.format_score_badge(10), "[POOR]");
    }

    #[test]
    fn test_suggestions_grouped_by_category() {
        let mut skill = Suggestion::new(1, SuggestionType::AddSkill, "skills.tools", "SQL");
        skill.category = "Skills".to_string();
        skill.priority = Priority::High;
        skill.selected = true;
        let mut profile = Suggestion::new(2, SuggestionType::ModifyText, "profile", "Healthcare BA");
        profile.category = "Profile".to_string();
        let mut tool = Suggestion::new(3, SuggestionType::AddSkill, "skills.tools", "Tableau");
        tool.category = "Skills".to_string();

        let text = ConsoleFormatter::new(false, false).format_suggestions(&[skill, profile, tool]);

        let skills = text.find("▓ Skills").unwrap();
        let profile_at = text.find("▓ Profile").unwrap();
        let tableau = text.find("Tableau").unwrap();
        assert!(skills < tableau && tableau < profile_at);
        assert!(text.contains("[!] 1. No description [selected]"));
        assert_eq!(text.matches("▓ Skills").count(), 1);
    }

    #[test]
    fn test_match_analysis_lists_are_capped() {
        let mut analysis = MatchAnalysis::default();
        analysis.overall_match_score = 58;
        analysis.gaps = (1..=8).map(|i| format!("gap {}", i)).collect();

        let text = ConsoleFormatter::new(false, false).format_match_analysis(&analysis, None);
        assert!(text.contains("Overall match: 58/100 [BELOW AVG]"));
        assert!(text.contains("gap 5"));
        assert!(!text.contains("gap 6"));
        assert!(text.contains("… and 3 more"));
    }
}
