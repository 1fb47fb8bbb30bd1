//! Cleanup of generated text before import
//!
//! Text produced by a language model tends to wrap the documents in
//! Markdown fences, lead with prose and trail off with commentary. This
//! module strips all three so the text codec sees only the documents.

use once_cell::sync::Lazy;
use regex::Regex;

/// A Markdown code fence line, with or without an info string
static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*```[\w-]*[ \t]*\r?$\n?").unwrap());

/// First line that starts a document: a separator, `apiVersion:` or `kind:`
static DOCUMENT_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(---[ \t]*$|apiVersion:|kind:)").unwrap());

/// Strip fences, leading prose and trailing non-YAML lines
///
/// A trailing line is kept if it contains `:` or starts with `-`; blank
/// lines and comments at the end are dropped.
#[must_use]
pub fn clean_generated_text(text: &str) -> String {
    let unfenced = FENCE.replace_all(text, "");
    let body = match DOCUMENT_START.find(&unfenced) {
        Some(m) => &unfenced[m.start()..],
        None => &unfenced[..],
    };

    let lines: Vec<&str> = body.lines().collect();
    let keep = lines
        .iter()
        .rposition(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#') && (line.contains(':') || line.starts_with('-'))
        })
        .map_or(lines.len(), |last| last + 1);

    lines[..keep].join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_fences_and_prose() {
        let text = "Here is the manifest you asked for.\n\n```yaml\napiVersion: v1\nkind: Service\nmetadata:\n  name: web\n```\n\nLet me know if you need anything else.";
        assert_eq!(
            clean_generated_text(text),
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: web"
        );
    }

    #[test]
    fn prose_with_colons_is_not_a_document() {
        let text = "Note: here it is.\nSummary: one service\n```yaml\napiVersion: v1\nkind: Service\n```";
        assert_eq!(clean_generated_text(text), "apiVersion: v1\nkind: Service");

        let text = "Sure: a job.\nkind: Job\nmetadata:\n  name: once";
        assert_eq!(clean_generated_text(text), "kind: Job\nmetadata:\n  name: once");
    }

    #[test]
    fn keeps_multiple_documents() {
        let text = "```\nkind: Job\n---\nkind: CronJob\n```";
        assert_eq!(clean_generated_text(text), "kind: Job\n---\nkind: CronJob");
    }

    #[test]
    fn keeps_trailing_list_items() {
        let text = "kind: ConfigMap\nitems:\n  - a\n  - b\n# done\n";
        assert_eq!(clean_generated_text(text), "kind: ConfigMap\nitems:\n  - a\n  - b");
    }

    #[test]
    fn plain_text_passes_through() {
        let text = "kind: Secret\n";
        assert_eq!(clean_generated_text(text), "kind: Secret");
    }

    #[test]
    fn text_without_documents_is_trimmed() {
        assert_eq!(clean_generated_text("  sorry, I can't help  "), "sorry, I can't help");
    }
}
