//! Document renderers for final records
//!
//! Every format is produced from the same [`DocumentView`], so section order
//! and labels match across Markdown, HTML and PDF.

use crate::config::OutputFormat;
use crate::error::{Result, TailorError};
use crate::processing::record::Record;
use askama::Template;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use unicode_segmentation::UnicodeSegmentation;

/// Turns a final record into document bytes.
pub trait DocumentRenderer {
    fn render(&self, record: &Record) -> Result<Vec<u8>>;
    fn format(&self) -> OutputFormat;
}

/// Flattened, display-ready content of a record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentView {
    pub name: String,
    pub contact: Vec<String>,
    pub linkedin_url: Option<String>,
    pub profile: String,
    pub skills: Vec<SkillLine>,
    pub experience: Vec<ExperienceView>,
    pub education: Vec<EducationView>,
    pub certifications: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillLine {
    pub label: String,
    pub skills: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperienceView {
    pub heading: String,
    pub meta: String,
    pub bullets: Vec<Bullet>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EducationView {
    pub institution: String,
    pub detail: String,
}

impl DocumentView {
    pub fn from_record(record: &Record) -> Self {
        let mut view = DocumentView {
            profile: record.profile.trim().to_string(),
            ..Default::default()
        };

        if let Some(identity) = &record.identity {
            view.name = identity.name.clone();
            let contact = &identity.contact;
            view.contact = [&contact.email, &contact.phone, &contact.location]
                .into_iter()
                .filter(|v| !v.is_empty())
                .cloned()
                .collect();
            if !contact.linkedin.is_empty() {
                view.linkedin_url = Some(linkedin_url(&contact.linkedin));
            }
        }

        view.skills = record
            .skills
            .iter()
            .filter(|category| !category.skills.is_empty())
            .map(|category| SkillLine {
                label: humanize_category(&category.name),
                skills: category.skills.join(", "),
            })
            .collect();

        view.experience = record
            .experience
            .iter()
            .map(|exp| {
                let heading = match (exp.title.is_empty(), exp.company.is_empty()) {
                    (false, false) => format!("{} - {}", exp.title, exp.company),
                    (false, true) => exp.title.clone(),
                    _ => exp.company.clone(),
                };
                let meta = [exp.location.as_deref().unwrap_or(""), exp.duration.as_str()]
                    .into_iter()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(" | ");
                let bullets = exp
                    .achievements
                    .iter()
                    .filter(|a| !a.description().is_empty())
                    .map(|a| Bullet {
                        label: a.category().unwrap_or("").to_string(),
                        text: a.description().to_string(),
                    })
                    .collect();
                ExperienceView { heading, meta, bullets }
            })
            .collect();

        view.education = record
            .education
            .iter()
            .map(|edu| {
                let detail = match edu.period() {
                    Some(period) if !edu.degree.is_empty() => format!("{} ({})", edu.degree, period),
                    Some(period) => period,
                    None => edu.degree.clone(),
                };
                EducationView {
                    institution: edu.institution.clone(),
                    detail,
                }
            })
            .collect();

        view.certifications = record
            .certifications
            .iter()
            .map(|cert| match &cert.date {
                Some(date) if !date.is_empty() => format!("{} ({})", cert.name, date),
                _ => cert.name.clone(),
            })
            .collect();

        view
    }
}

/// `tools_and_technologies` → `Tools & Technologies`
pub fn humanize_category(name: &str) -> String {
    name.split(|c| c == '_' || c == ' ')
        .filter(|word| !word.is_empty())
        .map(|word| match word {
            "and" => "&".to_string(),
            _ => {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn linkedin_url(handle: &str) -> String {
    if handle.starts_with("http") {
        handle.to_string()
    } else {
        format!("https://www.linkedin.com/in/{}", handle.trim_start_matches('/'))
    }
}

pub struct JsonRenderer;

impl DocumentRenderer for JsonRenderer {
    fn render(&self, record: &Record) -> Result<Vec<u8>> {
        Ok(record.to_pretty_json()?.into_bytes())
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

pub struct MarkdownRenderer;

impl DocumentRenderer for MarkdownRenderer {
    fn render(&self, record: &Record) -> Result<Vec<u8>> {
        let view = DocumentView::from_record(record);
        let mut out = String::new();

        if !view.name.is_empty() {
            out.push_str(&format!("# {}\n\n", view.name));
        }
        let mut contact = view.contact.clone();
        if let Some(url) = &view.linkedin_url {
            contact.push(format!("[LinkedIn]({})", url));
        }
        if !contact.is_empty() {
            out.push_str(&format!("{}\n\n", contact.join(" · ")));
        }

        if !view.profile.is_empty() {
            out.push_str(&format!("## Professional Summary\n\n{}\n\n", view.profile));
        }

        if !view.skills.is_empty() {
            out.push_str("## Skills\n\n");
            for line in &view.skills {
                out.push_str(&format!("- **{}:** {}\n", line.label, line.skills));
            }
            out.push('\n');
        }

        if !view.experience.is_empty() {
            out.push_str("## Work History\n\n");
            for exp in &view.experience {
                out.push_str(&format!("### {}\n\n", exp.heading));
                if !exp.meta.is_empty() {
                    out.push_str(&format!("*{}*\n\n", exp.meta));
                }
                for bullet in &exp.bullets {
                    if bullet.label.is_empty() {
                        out.push_str(&format!("- {}\n", bullet.text));
                    } else {
                        out.push_str(&format!("- **{}:** {}\n", bullet.label, bullet.text));
                    }
                }
                out.push('\n');
            }
        }

        if !view.education.is_empty() {
            out.push_str("## Education\n\n");
            for edu in &view.education {
                out.push_str(&format!("- **{}**, {}\n", edu.institution, edu.detail));
            }
            out.push('\n');
        }

        if !view.certifications.is_empty() {
            out.push_str("## Certifications\n\n");
            for cert in &view.certifications {
                out.push_str(&format!("- {}\n", cert));
            }
            out.push('\n');
        }

        Ok(out.trim_end().to_string().into_bytes())
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

#[derive(Template)]
#[template(source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{{ title }}</title>
    {% if include_styles %}
    <style>
        body { font-family: Helvetica, Arial, sans-serif; color: #333; max-width: 820px; margin: 0 auto; padding: 24px; line-height: 1.5; }
        h1 { margin-bottom: 4px; color: #1a7f7a; }
        h2 { color: #1a7f7a; border-bottom: 2px solid #e9ecef; padding-bottom: 4px; margin-top: 28px; }
        h3 { margin-bottom: 2px; }
        .contact, .meta { color: #666; }
        .label { font-weight: bold; }
    </style>
    {% endif %}
</head>
<body>
    {% if !view.name.is_empty() %}<h1>{{ view.name }}</h1>{% endif %}
    <p class="contact">
        {% for item in view.contact %}{{ item }}{% if !loop.last %} &middot; {% endif %}{% endfor %}
        {% if !linkedin.is_empty() %} &middot; <a href="{{ linkedin }}">LinkedIn</a>{% endif %}
    </p>

    {% if !view.profile.is_empty() %}
    <h2>Professional Summary</h2>
    <p>{{ view.profile }}</p>
    {% endif %}

    {% if !view.skills.is_empty() %}
    <h2>Skills</h2>
    <ul>
    {% for line in view.skills %}
        <li><span class="label">{{ line.label }}:</span> {{ line.skills }}</li>
    {% endfor %}
    </ul>
    {% endif %}

    {% if !view.experience.is_empty() %}
    <h2>Work History</h2>
    {% for exp in view.experience %}
    <h3>{{ exp.heading }}</h3>
    {% if !exp.meta.is_empty() %}<p class="meta">{{ exp.meta }}</p>{% endif %}
    <ul>
    {% for bullet in exp.bullets %}
        <li>{% if !bullet.label.is_empty() %}<span class="label">{{ bullet.label }}:</span> {% endif %}{{ bullet.text }}</li>
    {% endfor %}
    </ul>
    {% endfor %}
    {% endif %}

    {% if !view.education.is_empty() %}
    <h2>Education</h2>
    {% for edu in view.education %}
    <p><strong>{{ edu.institution }}</strong><br>{{ edu.detail }}</p>
    {% endfor %}
    {% endif %}

    {% if !view.certifications.is_empty() %}
    <h2>Certifications</h2>
    <ul>
    {% for cert in view.certifications %}<li>{{ cert }}</li>{% endfor %}
    </ul>
    {% endif %}
</body>
</html>"#, ext = "html")]
struct ResumeHtml {
    title: String,
    include_styles: bool,
    linkedin: String,
    view: DocumentView,
}

pub struct HtmlRenderer {
    include_styles: bool,
}

impl HtmlRenderer {
    pub fn new(include_styles: bool) -> Self {
        Self { include_styles }
    }
}

impl DocumentRenderer for HtmlRenderer {
    fn render(&self, record: &Record) -> Result<Vec<u8>> {
        let view = DocumentView::from_record(record);
        let title = if view.name.is_empty() {
            "Résumé".to_string()
        } else {
            format!("{} - Résumé", view.name)
        };

        let html = ResumeHtml {
            title,
            include_styles: self.include_styles,
            linkedin: view.linkedin_url.clone().unwrap_or_default(),
            view,
        }
        .render()
        .map_err(|e| TailorError::Rendering(e.to_string()))?;

        Ok(html.into_bytes())
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Html
    }
}

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 18.0;
/// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH_RATIO: f32 = 0.5;
const PT_TO_MM: f32 = 0.3528;

/// A4 PDF with the built-in Helvetica faces.
pub struct PdfRenderer;

struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    cursor: f32,
    pages: usize,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Page 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| TailorError::Rendering(format!("Failed to load font: {}", e)))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| TailorError::Rendering(format!("Failed to load font: {}", e)))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            cursor: PAGE_HEIGHT - MARGIN,
            pages: 1,
        })
    }

    fn ensure_space(&mut self, height: f32) {
        if self.cursor - height < MARGIN {
            self.pages += 1;
            let (page, layer) = self.doc.add_page(
                Mm(PAGE_WIDTH),
                Mm(PAGE_HEIGHT),
                format!("Page {}", self.pages),
            );
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.cursor = PAGE_HEIGHT - MARGIN;
        }
    }

    /// Write `text` wrapped to the page width, starting at `indent` mm.
    fn paragraph(&mut self, text: &str, size: f32, bold: bool, indent: f32) {
        let line_height = size * PT_TO_MM * 1.35;
        let usable = PAGE_WIDTH - 2.0 * MARGIN - indent;
        let max_chars = (usable / (size * GLYPH_WIDTH_RATIO * PT_TO_MM)).floor() as usize;

        for line in wrap_words(text, max_chars.max(10)) {
            self.ensure_space(line_height);
            self.cursor -= line_height;
            let font = if bold { &self.bold } else { &self.regular };
            self.layer
                .use_text(line, size, Mm(MARGIN + indent), Mm(self.cursor), font);
        }
    }

    fn heading(&mut self, text: &str) {
        self.gap(3.0);
        self.ensure_space(12.0);
        self.paragraph(&text.to_uppercase(), 12.0, true, 0.0);
        self.gap(1.5);
    }

    fn gap(&mut self, mm: f32) {
        self.cursor -= mm;
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| TailorError::Rendering(format!("Failed to write PDF: {}", e)))
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, record: &Record) -> Result<Vec<u8>> {
        let view = DocumentView::from_record(record);
        let mut pdf = PdfWriter::new(if view.name.is_empty() { "Resume" } else { view.name.as_str() })?;

        if !view.name.is_empty() {
            pdf.paragraph(&view.name, 20.0, true, 0.0);
        }
        let mut contact = view.contact.clone();
        if let Some(url) = &view.linkedin_url {
            contact.push(url.clone());
        }
        if !contact.is_empty() {
            pdf.paragraph(&contact.join("  |  "), 9.0, false, 0.0);
        }

        if !view.profile.is_empty() {
            pdf.heading("Professional Summary");
            pdf.paragraph(&view.profile, 10.0, false, 0.0);
        }

        if !view.skills.is_empty() {
            pdf.heading("Skills");
            for line in &view.skills {
                pdf.paragraph(&format!("{}: {}", line.label, line.skills), 10.0, false, 0.0);
            }
        }

        if !view.experience.is_empty() {
            pdf.heading("Work History");
            for exp in &view.experience {
                pdf.gap(1.5);
                pdf.paragraph(&exp.heading, 11.0, true, 0.0);
                if !exp.meta.is_empty() {
                    pdf.paragraph(&exp.meta, 9.0, false, 0.0);
                }
                for bullet in &exp.bullets {
                    let text = if bullet.label.is_empty() {
                        format!("- {}", bullet.text)
                    } else {
                        format!("- {}: {}", bullet.label, bullet.text)
                    };
                    pdf.paragraph(&text, 10.0, false, 3.0);
                }
            }
        }

        if !view.education.is_empty() {
            pdf.heading("Education");
            for edu in &view.education {
                pdf.paragraph(&edu.institution, 10.0, true, 0.0);
                if !edu.detail.is_empty() {
                    pdf.paragraph(&edu.detail, 10.0, false, 0.0);
                }
            }
        }

        if !view.certifications.is_empty() {
            pdf.heading("Certifications");
            for cert in &view.certifications {
                pdf.paragraph(&format!("- {}", cert), 10.0, false, 0.0);
            }
        }

        pdf.finish()
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Pdf
    }
}

/// Greedy word wrap measured in grapheme clusters. Words longer than a line
/// are split.
pub fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let graphemes: Vec<&str> = word.graphemes(true).collect();

        for chunk in graphemes.chunks(max_chars.max(1)) {
            let chunk_len = chunk.len();
            let needed = if current_len == 0 { chunk_len } else { current_len + 1 + chunk_len };

            if needed > max_chars && current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(&chunk.concat());
            current_len += chunk_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Dispatches to the renderer for an output format.
pub struct Renderer {
    include_html_styles: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Renderer {
    pub fn new(include_html_styles: bool) -> Self {
        Self { include_html_styles }
    }

    pub fn render(&self, record: &Record, format: OutputFormat) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Json => JsonRenderer.render(record),
            OutputFormat::Markdown => MarkdownRenderer.render(record),
            OutputFormat::Html => HtmlRenderer::new(self.include_html_styles).render(record),
            OutputFormat::Pdf => PdfRenderer.render(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::record::Achievement;
    use serde_json::json;

    fn record() -> Record {
        Record::from_value(json!({
            "identity": {
                "name": "Jane Roe",
                "contact": {"email": "jane@example.com", "phone": "555-0100", "location": "Austin, TX", "linkedin": "janeroe"}
            },
            "profile": "Business analyst with <healthcare> focus.",
            "skills": {"tools_and_technologies": ["SQL", "Jira"], "soft_skills": [], "agile_ceremonies": ["Sprint Planning"]},
            "experience": [{
                "title": "Senior BA",
                "company": "Acme Corp",
                "location": "Remote",
                "duration": "2020-2024",
                "achievements": [{"category": "Delivery", "description": "Shipped claims portal"}, "Cut report time 40%"]
            }],
            "education": [{"institution": "State University", "degree": "BSc", "start_year": 2012, "end_year": 2016}],
            "certifications": [{"name": "CSPO", "date": "2021"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_view_flattening() {
        let view = DocumentView::from_record(&record());

        assert_eq!(view.contact, vec!["jane@example.com", "555-0100", "Austin, TX"]);
        assert_eq!(view.linkedin_url.as_deref(), Some("https://www.linkedin.com/in/janeroe"));
        assert_eq!(view.skills.len(), 2);
        assert_eq!(view.skills[0].label, "Tools & Technologies");
        assert_eq!(view.experience[0].heading, "Senior BA - Acme Corp");
        assert_eq!(view.experience[0].meta, "Remote | 2020-2024");
        assert_eq!(view.experience[0].bullets[0].label, "Delivery");
        assert_eq!(view.experience[0].bullets[1].label, "");
        assert_eq!(view.education[0].detail, "BSc (2012 - 2016)");
        assert_eq!(view.certifications, vec!["CSPO (2021)"]);
    }

    #[test]
    fn test_markdown_sections_in_order() {
        let text = String::from_utf8(MarkdownRenderer.render(&record()).unwrap()).unwrap();

        let summary = text.find("## Professional Summary").unwrap();
        let skills = text.find("## Skills").unwrap();
        let work = text.find("## Work History").unwrap();
        let education = text.find("## Education").unwrap();
        assert!(summary < skills && skills < work && work < education);
        assert!(text.starts_with("# Jane Roe"));
        assert!(text.contains("- **Delivery:** Shipped claims portal"));
        assert!(text.contains("- Cut report time 40%"));
    }

    #[test]
    fn test_html_escapes_content() {
        let html = String::from_utf8(HtmlRenderer::new(false).render(&record()).unwrap()).unwrap();

        assert!(html.contains("<h1>Jane Roe</h1>"));
        assert!(html.contains("&#60;healthcare&#62;"));
        assert!(!html.contains("<healthcare>"));
        assert!(!html.contains("<style>"));
        assert!(html.contains(">LinkedIn</a>"));
    }

    #[test]
    fn test_pdf_bytes() {
        let mut long = record();
        let line = "Facilitated backlog refinement across three product teams. ".repeat(8);
        for _ in 0..60 {
            long.experience[0].achievements.push(Achievement::Plain(line.clone()));
        }

        let bytes = PdfRenderer.render(&long).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_wrap_words() {
        let lines = wrap_words("alpha beta gamma delta", 11);
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);

        let split = wrap_words("abcdefghijkl", 5);
        assert_eq!(split, vec!["abcde", "fghij", "kl"]);

        assert!(wrap_words("   ", 10).is_empty());
    }

    #[test]
    fn test_humanize_category() {
        assert_eq!(humanize_category("business_analysis"), "Business Analysis");
        assert_eq!(humanize_category("Cloud Platforms"), "Cloud Platforms");
    }
}
