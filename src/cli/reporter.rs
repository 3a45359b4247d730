use colored::Colorize;
use patchref_common::{Diagnostic, DiagnosticCategory, SourceLocation};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Byte offsets of line starts, for offset to line/column conversion.
struct LineStarts(Vec<u32>);

impl LineStarts {
    fn build(source: &str) -> Self {
        let mut starts = vec![0];
        for (index, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                starts.push(index as u32 + 1);
            }
        }
        LineStarts(starts)
    }

    /// Zero-based (line, column).
    fn position(&self, offset: u32) -> (u32, u32) {
        let line = self.0.partition_point(|&start| start <= offset).saturating_sub(1);
        let start = self.0.get(line).copied().unwrap_or(0);
        (line as u32, offset.saturating_sub(start))
    }
}

pub struct Reporter {
    color: bool,
    sources: HashMap<String, Option<String>>,
    line_starts: HashMap<String, LineStarts>,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter {
            color,
            sources: HashMap::new(),
            line_starts: HashMap::new(),
        }
    }

    pub fn render(&mut self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for (index, diagnostic) in diagnostics.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(&self.format_diagnostic(diagnostic));
        }
        out
    }

    pub fn format_diagnostic(&mut self, diagnostic: &Diagnostic) -> String {
        let location = self
            .format_location(&diagnostic.location)
            .unwrap_or_else(|| diagnostic.location.to_string());
        let category = self.format_category(diagnostic.category);
        let code = if self.color {
            diagnostic.code.id().bright_blue().to_string()
        } else {
            diagnostic.code.id()
        };

        let mut output = format!(
            "{} - {} {}: {}",
            location, category, code, diagnostic.message_text
        );
        if let Some(snippet) = self.format_snippet(&diagnostic.location) {
            output.push_str(&snippet);
        }
        output
    }

    /// `Found N error(s).` line printed after the diagnostics.
    pub fn summary(&self, count: usize) -> String {
        let text = match count {
            0 => return String::new(),
            1 => "Found 1 error.".to_string(),
            n => format!("Found {} errors.", n),
        };
        if self.color { text.bold().to_string() } else { text }
    }

    fn format_location(&mut self, location: &SourceLocation) -> Option<String> {
        let (line, column) = self.position_for(&location.file, location.start)?;
        Some(format!("{}:{}:{}", location.file, line + 1, column + 1))
    }

    fn format_snippet(&mut self, location: &SourceLocation) -> Option<String> {
        let (line, column) = self.position_for(&location.file, location.start)?;
        let source = self.sources.get(&*location.file)?.as_deref()?;
        let line_text = source.lines().nth(line as usize)?;

        let available = line_text.len().saturating_sub(column as usize);
        let width = (location.length as usize).clamp(1, available.max(1));
        let underline = "~".repeat(width);
        let underline = if self.color {
            underline.red().to_string()
        } else {
            underline
        };

        let mut snippet = String::new();
        snippet.push('\n');
        snippet.push_str(&format!("  {:>3}   {}", line + 1, line_text));
        snippet.push('\n');
        snippet.push_str(&format!(
            "        {}{}",
            " ".repeat(column as usize),
            underline
        ));
        Some(snippet)
    }

    fn position_for(&mut self, file: &str, offset: u32) -> Option<(u32, u32)> {
        if !self.sources.contains_key(file) {
            let contents = std::fs::read_to_string(Path::new(file)).ok();
            self.sources.insert(file.to_string(), contents);
        }
        let source = self.sources.get(file)?.as_deref()?;
        if offset as usize > source.len() {
            return None;
        }
        let starts = self
            .line_starts
            .entry(file.to_string())
            .or_insert_with(|| LineStarts::build(source));
        Some(starts.position(offset))
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = match category {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
        };

        if !self.color {
            return label.to_string();
        }

        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonDiagnostic<'a> {
    code: String,
    category: DiagnosticCategory,
    file: &'a str,
    start: u32,
    length: u32,
    message_text: &'a str,
}

/// Diagnostics as a pretty-printed JSON array.
pub fn render_json(diagnostics: &[Diagnostic]) -> serde_json::Result<String> {
    let records: Vec<JsonDiagnostic<'_>> = diagnostics
        .iter()
        .map(|diagnostic| JsonDiagnostic {
            code: diagnostic.code.id(),
            category: diagnostic.category,
            file: &diagnostic.location.file,
            start: diagnostic.location.start,
            length: diagnostic.location.length,
            message_text: &diagnostic.message_text,
        })
        .collect();
    serde_json::to_string_pretty(&records)
}
