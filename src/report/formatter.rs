//! Plain-text rendering of a crawl report.
//!
//! The layout is a flat annotated log meant for reading or saving to a file:
//! one header per page with findings, one block per violation with the
//! affected element snippets, then the page's contrast findings.

use std::fmt::Write;

use crate::report::model::{ContrastViolation, Impact, PageResult, Report, Violation};
use crate::report::translate::{Language, Translate};

/// Fixed strings of the report, per language
struct Labels {
    results_for: &'static str,
    issue: &'static str,
    severity: &'static str,
    help: &'static str,
    element: &'static str,
    contrast_for: &'static str,
    contrast_on: &'static str,
    contrast_ratio: &'static str,
    contrast_failed: &'static str,
    no_issues: &'static str,
}

const GERMAN: Labels = Labels {
    results_for: "🔍 Ergebnisse für",
    issue: "⚠️ Fehler",
    severity: "🔴 Schwere",
    help: "📌 Hilfe",
    element: "🖹 Element",
    contrast_for: "🎨 Kontrastprobleme für",
    contrast_on: "auf",
    contrast_ratio: "Verhältnis",
    contrast_failed: "❗ Kontrastprüfung fehlgeschlagen",
    no_issues: "✅ Keine Barrierefreiheitsverletzungen gefunden!",
};

const ENGLISH: Labels = Labels {
    results_for: "🔍 Results for",
    issue: "⚠️ Issue",
    severity: "🔴 Severity",
    help: "📌 Help",
    element: "🖹 Element",
    contrast_for: "🎨 Contrast issues for",
    contrast_on: "on",
    contrast_ratio: "ratio",
    contrast_failed: "❗ Contrast check failed",
    no_issues: "✅ No accessibility violations found!",
};

fn labels(language: Language) -> &'static Labels {
    match language {
        Language::De => &GERMAN,
        Language::En => &ENGLISH,
    }
}

/// Display label for a severity
pub fn severity_label(impact: Impact, language: Language) -> &'static str {
    match (impact, language) {
        (Impact::Critical, Language::De) => "Kritisch",
        (Impact::Critical, Language::En) => "Critical",
        (Impact::Serious, Language::De) => "Ernst",
        (Impact::Serious, Language::En) => "Serious",
        (Impact::Moderate, Language::De) => "Moderat",
        (Impact::Moderate, Language::En) => "Moderate",
        (Impact::Minor, Language::De) => "Gering",
        (Impact::Minor, Language::En) => "Minor",
        (Impact::Unknown, Language::De) => "Unbekannt",
        (Impact::Unknown, Language::En) => "Unknown",
    }
}

/// Renders a `Report` as a flat text log
pub struct ReportFormatter<'a> {
    language: Language,
    translator: &'a dyn Translate,
}

impl<'a> ReportFormatter<'a> {
    pub fn new(language: Language, translator: &'a dyn Translate) -> Self {
        Self { language, translator }
    }

    pub fn render(&self, report: &Report) -> String {
        let labels = labels(self.language);

        if report.is_clean() {
            return labels.no_issues.to_string();
        }

        let mut out = String::new();
        for page in &report.pages {
            self.render_page(&mut out, page, report.contrast_checked);
        }
        out
    }

    fn render_page(&self, out: &mut String, page: &PageResult, contrast_checked: bool) {
        let labels = labels(self.language);

        if !page.accessibility_violations.is_empty() {
            // Writing into a String cannot fail
            let _ = writeln!(out, "{}: {}\n", labels.results_for, page.url);
            for violation in &page.accessibility_violations {
                self.render_violation(out, violation);
            }
        }

        if !contrast_checked {
            return;
        }

        if !page.contrast_violations.is_empty() {
            let _ = writeln!(out, "{}: {}\n", labels.contrast_for, page.url);
            for violation in &page.contrast_violations {
                self.render_contrast(out, violation);
            }
            out.push('\n');
        }

        if let Some(error) = &page.contrast_error {
            let _ = writeln!(out, "  {} ({}): {}\n", labels.contrast_failed, page.url, error);
        }
    }

    fn render_violation(&self, out: &mut String, violation: &Violation) {
        let labels = labels(self.language);

        let _ = writeln!(out, "  {}: {}", labels.issue, self.translator.translate(&violation.description));
        let _ = writeln!(out, "  {}: {}", labels.severity, severity_label(violation.impact, self.language));
        let _ = writeln!(out, "  {}: {}", labels.help, self.translator.translate(&violation.help_text));
        if let Some(url) = &violation.help_url {
            let _ = writeln!(out, "  🔗 {}", url);
        }
        out.push('\n');

        for node in &violation.affected_nodes {
            let _ = writeln!(out, "    {}: {}\n", labels.element, node.html_snippet);
        }
    }

    fn render_contrast(&self, out: &mut String, violation: &ContrastViolation) {
        let labels = labels(self.language);
        let _ = writeln!(
            out,
            "  <{}> \"{}\": {} {} {}, {} {:.2}:1",
            violation.element_tag,
            violation.text,
            violation.foreground,
            labels.contrast_on,
            violation.background,
            labels.contrast_ratio,
            violation.ratio
        );
    }
}
