//! Prompt templates for the oracle tasks

use crate::error::{Result, TailorError};
use crate::llm::OracleTask;
use log::debug;
use serde_json::Value;

/// A rendered chat prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// One template per oracle task; `{name}` markers are substituted.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub requirements: String,
    pub match_scoring: String,
    pub suggestions: String,
    pub edit_application: String,
    pub resume_parsing: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            requirements: REQUIREMENTS_TEMPLATE.to_string(),
            match_scoring: MATCH_TEMPLATE.to_string(),
            suggestions: SUGGESTIONS_TEMPLATE.to_string(),
            edit_application: APPLY_TEMPLATE.to_string(),
            resume_parsing: PARSE_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    pub fn render(&self, task: OracleTask, payload: &Value) -> Result<Prompt> {
        let prompt = match task {
            OracleTask::ExtractRequirements => Prompt {
                system: REQUIREMENTS_SYSTEM.to_string(),
                user: self
                    .requirements
                    .replace("{job}", required_str(task, payload, "job_description")?),
            },
            OracleTask::ScoreMatch => Prompt {
                system: MATCH_SYSTEM.to_string(),
                user: self
                    .match_scoring
                    .replace("{resume}", &pretty(required(task, payload, "resume")?)?)
                    .replace("{requirements}", &pretty(required(task, payload, "requirements")?)?),
            },
            OracleTask::SuggestEdits => Prompt {
                system: SUGGESTIONS_SYSTEM.to_string(),
                user: self.render_suggestions(payload)?,
            },
            OracleTask::ApplyEdits => Prompt {
                system: APPLY_SYSTEM.to_string(),
                user: self
                    .edit_application
                    .replace("{resume}", &pretty(required(task, payload, "resume")?)?)
                    .replace("{instructions}", required_str(task, payload, "instructions")?),
            },
            OracleTask::ParseResume => Prompt {
                system: PARSE_SYSTEM.to_string(),
                user: self
                    .resume_parsing
                    .replace("{resume_text}", required_str(task, payload, "resume_text")?),
            },
        };

        debug!("Rendered {} prompt: {} chars", task, prompt.user.len());
        Ok(prompt)
    }

    fn render_suggestions(&self, payload: &Value) -> Result<String> {
        let task = OracleTask::SuggestEdits;
        let resume = required(task, payload, "resume")?;
        let requirements = required(task, payload, "requirements")?;
        let analysis = required(task, payload, "match_analysis")?;

        let score = match &analysis["overall_match_score"] {
            Value::Null => "unknown".to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        Ok(self
            .suggestions
            .replace("{resume}", &pretty(resume)?)
            .replace("{role}", str_or(&requirements["role_title"], "unspecified"))
            .replace("{industry}", str_or(&requirements["industry"], "unspecified"))
            .replace("{required_skills}", &joined(&requirements["required_skills"], 10, ", "))
            .replace("{keywords}", &joined(&requirements["keywords"], 15, ", "))
            .replace("{missing_skills}", &joined(&analysis["skills_match"]["missing"], 10, ", "))
            .replace(
                "{missing_keywords}",
                &joined(&analysis["keyword_coverage"]["missing_keywords"], 10, ", "),
            )
            .replace("{gaps}", &joined(&analysis["gaps"], 3, "; "))
            .replace("{score}", &score))
    }
}

fn required<'a>(task: OracleTask, payload: &'a Value, key: &str) -> Result<&'a Value> {
    match payload.get(key) {
        Some(Value::Null) | None => Err(TailorError::InvalidInput(format!(
            "{} payload is missing `{}`",
            task, key
        ))),
        Some(value) => Ok(value),
    }
}

fn required_str<'a>(task: OracleTask, payload: &'a Value, key: &str) -> Result<&'a str> {
    required(task, payload, key)?.as_str().ok_or_else(|| {
        TailorError::InvalidInput(format!("{} payload field `{}` must be a string", task, key))
    })
}

fn pretty(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn str_or<'a>(value: &'a Value, default: &'a str) -> &'a str {
    value.as_str().filter(|s| !s.is_empty()).unwrap_or(default)
}

/// Join the first `limit` string items of a JSON array.
fn joined(value: &Value, limit: usize, separator: &str) -> String {
    let items: Vec<&str> = value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).take(limit).collect())
        .unwrap_or_default();
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(separator)
    }
}

const REQUIREMENTS_SYSTEM: &str =
    "You are an expert HR analyst who extracts structured data from job descriptions. Return only valid JSON.";

const REQUIREMENTS_TEMPLATE: &str = r#"Analyze this job description and extract structured information.

Job Description:
{job}

Extract and return ONLY a valid JSON object with these fields:
- role_title: The job title
- required_skills: List of must-have technical and soft skills
- preferred_skills: List of nice-to-have skills
- required_experience_years: Minimum years of experience (number)
- required_qualifications: Degrees, certifications required
- key_responsibilities: Main job duties (top 5-7)
- keywords: Important keywords for ATS (15-20 keywords)
- industry: Industry/domain (e.g., Healthcare, Finance, Tech)
- job_type: Role category (e.g., Business Analyst, Product Owner, Scrum Master)

Return ONLY the JSON object, no additional text."#;

const MATCH_SYSTEM: &str =
    "You are an expert ATS analyzer and career coach. Provide detailed, actionable feedback. Return only valid JSON.";

const MATCH_TEMPLATE: &str = r#"You are an expert ATS system and resume reviewer. Compare this resume against job requirements.

SANITIZED RESUME (PII removed):
{resume}

JOB REQUIREMENTS:
{requirements}

Analyze the match and return ONLY a valid JSON object with these fields:

1. overall_match_score: Overall fit score (0-100)
2. skills_match: { matched: [...], missing: [...], score: 0-100 }
3. experience_match: { has_years, required_years, meets_requirement: true/false, score: 0-100 }
4. keyword_coverage: { matched_keywords: [...], missing_keywords: [...], score: 0-100 }
5. strengths: 3-5 resume strengths for this role
6. gaps: 3-5 areas where the resume falls short
7. improvement_suggestions: 5-7 specific, actionable suggestions
   (DO NOT include any PII or specific company names in suggestions)

Return ONLY the JSON object, no additional text."#;

const SUGGESTIONS_SYSTEM: &str =
    "You are an expert resume optimizer. Analyze the resume structure and generate comprehensive, actionable suggestions.";

const SUGGESTIONS_TEMPLATE: &str = r#"Analyze this resume and generate 5-10 specific, actionable suggestions to optimize it for the job description.

Current Resume Structure:
{resume}

Job Requirements:
- Role: {role}
- Industry: {industry}
- Required Skills: {required_skills}
- Keywords: {keywords}

Gap Analysis:
- Missing Skills: {missing_skills}
- Missing Keywords: {missing_keywords}
- Main Gaps: {gaps}
- Current Match Score: {score}/100

Generate suggestions that:
1. Follow the resume's CURRENT structure (sections, categories, format)
2. Add to EXISTING sections/buckets or propose NEW ones
3. Name the exact target as a dotted path (e.g. skills.tools_and_technologies, experience[0].achievements, profile)
4. Include the EXACT text to add for achievements and profile lines
5. Prioritize high-impact changes (skills, keywords, quantifiable achievements)

Output format (JSON):
{"suggestions": [{
  "id": 1,
  "category": "Skills | Experience | Profile | ...",
  "type": "add_skill | add_skill_to_existing | add_achievement | modify_text | add_text",
  "description": "...",
  "action": "...",
  "reason": "...",
  "section": "...",
  "value": "...",
  "achievement_category": "(add_achievement only)",
  "insert_after": "(modify_text only, optional)",
  "priority": "high | medium | low"
}]}

Mix skills (2-3), achievements (3-5) and profile updates (1-2). Never invent company or institution names."#;

const APPLY_SYSTEM: &str = "You are a precise JSON editor. Apply only specified changes. Return valid JSON.";

const APPLY_TEMPLATE: &str = r#"Apply these EXACT changes to the resume.

Current Resume:
{resume}

CHANGES TO APPLY:
{instructions}

Rules:
1. Apply ONLY the changes listed above
2. Keep ALL other content UNCHANGED
3. Maintain the exact JSON structure, including the order and number of experience and education entries
4. Preserve [REDACTED], [LOCATION], Company_* and University_* placeholders exactly
5. For skills: add to the named array if not already present
6. For achievements: add a new object with category and description
7. For text modifications: make precise edits as specified

Return the complete updated resume as JSON."#;

const PARSE_SYSTEM: &str = "Extract exactly as written. Extract ALL skills and every job. Preserve structure. Return only valid JSON.";

const PARSE_TEMPLATE: &str = r#"You are a resume parser. Extract EVERY detail from this resume text.
Personal details were replaced with [REDACTED]; never try to recover them.

Resume Text:
{resume_text}

Return JSON:
{
  "title": "Most recent job title",
  "profile": "Complete professional summary",
  "skills": {"section_name_in_snake_case": ["skill", "..."]},
  "experience": [{
    "title": "Job title",
    "company": "Company",
    "duration": "Dates",
    "location": "Location",
    "achievements": [{"category": "Only if explicitly present, else empty string", "description": "Exact text"}]
  }],
  "education": [{"institution": "...", "degree": "...", "start_year": "...", "end_year": "..."}],
  "certifications": [{"name": "...", "date": "..."}]
}

Rules:
1. Skills are the most important section: extract EVERY skill, grouped by the section names used in the resume
2. Extract ALL jobs separately, most recent first
3. Use an achievement category only when the resume shows one, otherwise ""
4. Do NOT skip or summarize any content"#;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_requirements_prompt() {
        let templates = PromptTemplates::default();
        let prompt = templates
            .render(OracleTask::ExtractRequirements, &json!({"job_description": "Senior BA, SQL required"}))
            .unwrap();

        assert!(prompt.user.contains("Senior BA, SQL required"));
        assert!(prompt.user.contains("required_experience_years"));
        assert!(prompt.system.contains("Return only valid JSON"));
    }

    #[test]
    fn test_suggestion_prompt_limits_lists() {
        let templates = PromptTemplates::default();
        let skills: Vec<String> = (1..=12).map(|i| format!("skill{}", i)).collect();
        let payload = json!({
            "resume": {"profile": "Analyst"},
            "requirements": {"role_title": "Product Owner", "industry": "Healthcare", "required_skills": skills},
            "match_analysis": {
                "overall_match_score": 58,
                "skills_match": {"missing": ["HIPAA"]},
                "gaps": ["a", "b", "c", "d"]
            }
        });

        let prompt = templates.render(OracleTask::SuggestEdits, &payload).unwrap();

        assert!(prompt.user.contains("Role: Product Owner"));
        assert!(prompt.user.contains("skill10"));
        assert!(!prompt.user.contains("skill11"));
        assert!(prompt.user.contains("Main Gaps: a; b; c\n"));
        assert!(prompt.user.contains("Missing Keywords: none"));
        assert!(prompt.user.contains("58/100"));
    }

    #[test]
    fn test_parse_prompt_embeds_text() {
        let templates = PromptTemplates::default();
        let prompt = templates
            .render(OracleTask::ParseResume, &json!({"resume_text": "[REDACTED]\nBusiness Analyst"}))
            .unwrap();

        assert!(prompt.user.contains("[REDACTED]\nBusiness Analyst"));
        assert!(prompt.user.contains("\"certifications\""));
        assert!(templates.render(OracleTask::ParseResume, &json!({})).is_err());
    }

    #[test]
    fn test_apply_prompt_requires_instructions() {
        let templates = PromptTemplates::default();
        let err = templates.render(OracleTask::ApplyEdits, &json!({"resume": {}}));
        assert!(err.is_err());

        let prompt = templates
            .render(OracleTask::ApplyEdits, &json!({"resume": {"profile": "x"}, "instructions": "• ADD SKILL: 'Rust'"}))
            .unwrap();
        assert!(prompt.user.contains("ADD SKILL: 'Rust'"));
        assert!(prompt.user.contains("Preserve [REDACTED]"));
    }
}
