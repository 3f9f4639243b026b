use crate::index::AnalysisRecord;
use serde_json::Value;

pub const QUESTION_PREFIX: &str = "Otázka studenta: ";
pub const CONTEXT_PREFIX: &str = "Kontekst obrázku: ";
pub const FINDINGS_PREFIX: &str = "Důležité poznatky: ";
pub const ANSWER_INSTRUCTION: &str = "Odpověz ČESKY, jasně a výstižně.";

/// Only the leading findings go into the prompt.
const MAX_FINDINGS: usize = 2;

/// Compose the LLM prompt for a student question and optional image context.
pub fn build_prompt(question_text: &str, context: Option<&AnalysisRecord>) -> String {
    let mut lines: Vec<String> = vec![format!("{QUESTION_PREFIX}{question_text}"), String::new()];

    if let Some(ctx) = context.filter(|c| !c.is_empty()) {
        let summary = ctx.summary().map_or_else(|| "None".to_string(), render);
        lines.push(format!("{CONTEXT_PREFIX}{summary}."));

        let details = ctx
            .findings()
            .iter()
            .take(MAX_FINDINGS)
            .map(render)
            .collect::<Vec<_>>()
            .join(" ");
        if !details.is_empty() {
            lines.push(format!("{FINDINGS_PREFIX}{details}"));
        }
    }

    lines.push(ANSWER_INSTRUCTION.to_string());
    lines.join("\n")
}

// Strings verbatim, null as `None`, anything else as its JSON text.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}
