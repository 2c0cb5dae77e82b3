//! Report rendering to markdown, JSON and HTML.

use askama::Template;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{AnalystError, Result};

use super::{ReportDocument, ReportSection};

/// Output format of an exported report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown
    Md,
    /// Pretty-printed JSON
    Json,
    /// Standalone HTML page
    Html,
}

impl ReportFormat {
    /// Returns the format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Md => "md",
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
        }
    }

    /// MIME type of rendered documents.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ReportFormat::Md => "text/markdown",
            ReportFormat::Json => "application/json",
            ReportFormat::Html => "text/html",
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "md" => Ok(Self::Md),
            "json" => Ok(Self::Json),
            "html" => Ok(Self::Html),
            other => Err(AnalystError::unsupported_format(other)),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finished document ready for a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    /// Format the body was rendered in
    pub format: ReportFormat,
    /// Rendered document text
    pub body: String,
}

impl RenderedReport {
    /// Size of the body in bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Returns `true` if the body is empty.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

struct SectionView {
    title: String,
    body: String,
}

#[derive(Template)]
#[template(
    source = "# {{ title }}\n{% for section in sections %}\n## {{ section.title }}\n\n```json\n{{ section.body }}\n```\n{% endfor %}",
    ext = "md",
    escape = "none"
)]
struct MarkdownReport<'a> {
    title: &'a str,
    sections: &'a [SectionView],
}

#[derive(Template)]
#[template(
    source = "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>{{ title }}</title></head>\n<body>\n<h1>{{ title }}</h1>\n<p>Generated {{ generated_at }}</p>\n{% for section in sections %}<section><h2>{{ section.title }}</h2><pre>{{ section.body }}</pre></section>\n{% endfor %}</body>\n</html>\n",
    ext = "html"
)]
struct HtmlReport<'a> {
    title: &'a str,
    generated_at: &'a str,
    sections: &'a [SectionView],
}

fn pretty(value: &JsonValue) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AnalystError::export_failed("Failed to serialize report section", e))
}

fn section_views(sections: &[ReportSection]) -> Result<Vec<SectionView>> {
    sections
        .iter()
        .map(|section| {
            Ok(SectionView {
                title: section.title.clone(),
                body: pretty(&section.content)?,
            })
        })
        .collect()
}

/// Renders a report document in the requested format.
///
/// # Errors
/// `ExportSink` if templating or serialization fails.
pub fn render_report(document: &ReportDocument, format: ReportFormat) -> Result<RenderedReport> {
    let generated_at = document.generated_at.to_rfc3339();

    let body = match format {
        ReportFormat::Md => {
            let sections = section_views(&document.sections)?;
            MarkdownReport {
                title: &document.title,
                sections: &sections,
            }
            .render()
            .map_err(|e| AnalystError::export_failed("Failed to render markdown report", e))?
        }
        ReportFormat::Html => {
            let sections = section_views(&document.sections)?;
            HtmlReport {
                title: &document.title,
                generated_at: &generated_at,
                sections: &sections,
            }
            .render()
            .map_err(|e| AnalystError::export_failed("Failed to render HTML report", e))?
        }
        ReportFormat::Json => {
            let value = serde_json::json!({
                "title": document.title,
                "generated_at": generated_at,
                "source": document.source,
                "sections": document.sections,
            });
            pretty(&value)?
        }
    };

    Ok(RenderedReport { format, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceMetadata;
    use serde_json::json;

    fn document() -> ReportDocument {
        ReportDocument::new(
            "Report",
            SourceMetadata::new(),
            vec![
                ReportSection::new("Missing", json!([{"column": "a<b>", "pct": 0.0}])),
                ReportSection::new("Profile", json!({"stats": {}})),
            ],
        )
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("html".parse::<ReportFormat>().unwrap(), ReportFormat::Html);
        assert!(matches!(
            "pdf".parse::<ReportFormat>(),
            Err(AnalystError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_render_markdown() {
        let rendered = render_report(&document(), ReportFormat::Md).unwrap();
        assert!(rendered.body.starts_with("# Report"));
        assert!(rendered.body.contains("## Missing"));
        assert!(rendered.body.contains("```json"));
        // Markdown is not escaped
        assert!(rendered.body.contains("a<b>"));
        assert!(rendered.body.find("## Missing").unwrap() < rendered.body.find("## Profile").unwrap());
    }

    #[test]
    fn test_render_html_escapes_content() {
        let rendered = render_report(&document(), ReportFormat::Html).unwrap();
        assert!(rendered.body.starts_with("<!doctype html>"));
        assert!(rendered.body.contains("<h2>Missing</h2>"));
        assert!(!rendered.body.contains("a<b>"));
        assert!(rendered.body.contains("a&lt;b&gt;"));
    }

    #[test]
    fn test_render_json() {
        let rendered = render_report(&document(), ReportFormat::Json).unwrap();
        let value: JsonValue = serde_json::from_str(&rendered.body).unwrap();
        assert_eq!(value["title"], "Report");
        assert_eq!(value["sections"][0]["title"], "Missing");
        assert_eq!(value["sections"][1]["content"], json!({"stats": {}}));
        assert!(value["generated_at"].is_string());
    }
}
