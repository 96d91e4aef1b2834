//! @acp:module "Score Report"
//! @acp:summary "Render ThriveScore breakdowns as text, markdown or JSON"
//! @acp:domain score
//! @acp:layer output

use handlebars::Handlebars;
use serde_json::json;

use super::{ScoreBand, ScoreBreakdown};
use crate::error::{Result, ThriveError};

/// Output format for score reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = ThriveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "json" => Ok(ReportFormat::Json),
            _ => Err(ThriveError::Other(format!("Unknown report format: {}", s))),
        }
    }
}

const TEXT_TEMPLATE: &str = "\
ThriveScore: {{score}}/100{{#if band}} ({{band}}){{/if}}
Baseline {{baseline}}, deductions {{total_deduction}}
{{#each items}}
  {{question_key}}: {{#if label}}{{label}}{{else}}(no matching option){{/if}} -{{deduction}}
{{/each}}";

const MARKDOWN_TEMPLATE: &str = "\
## ThriveScore: {{score}}/100
{{#if band}}
**{{band}}**
{{/if}}

| Question | Answer | Deduction |
|----------|--------|-----------|
{{#each items}}
| {{#if prompt}}{{prompt}}{{else}}`{{question_key}}`{{/if}} | {{#if label}}{{label}}{{else}}(no matching option){{/if}} | {{deduction}} |
{{/each}}

Baseline {{baseline}} − {{total_deduction}} = **{{score}}**
";

/// Render a breakdown in the requested format
pub fn render_report(
    breakdown: &ScoreBreakdown,
    band: Option<&ScoreBand>,
    format: ReportFormat,
) -> Result<String> {
    let data = json!({
        "score": breakdown.score,
        "baseline": breakdown.baseline,
        "total_deduction": breakdown.total_deduction,
        "band": band.map(|b| b.label.clone()),
        "items": breakdown.items.iter().map(|item| json!({
            "question_key": item.question_key,
            "prompt": item.prompt,
            "label": item.label,
            "deduction": item.deduction,
        })).collect::<Vec<_>>(),
    });

    let template = match format {
        ReportFormat::Json => {
            let mut value = serde_json::to_value(breakdown)?;
            if let Some(obj) = value.as_object_mut() {
                obj.insert("band".to_string(), json!(band.map(|b| b.label.clone())));
            }
            return Ok(serde_json::to_string_pretty(&value)?);
        }
        ReportFormat::Text => TEXT_TEMPLATE,
        ReportFormat::Markdown => MARKDOWN_TEMPLATE,
    };

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(false);
    handlebars.register_template_string("report", template)?;
    Ok(handlebars.render("report", &data)?.trim_end().to_string())
}
