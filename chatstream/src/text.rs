// Text fixups for transcript display and speech output

/// Normalize assistant text for display: unescape literal `\n`, `\*` and
/// `\"` sequences and repair the doubled-quote runs some models emit
/// around labels and quotations.
pub fn normalize_display(text: &str) -> String {
    let unescaped = text
        .replace("\\n", "\n")
        .replace("\\*", "*")
        .replace("\\\"", "\"")
        .replace("##\"\"##", "");
    let relabeled = rewrite_quoted_labels(&unescaped);
    collapse_doubled_quotes(&relabeled)
}

// ""Label:** -> **"Label:"**
fn rewrite_quoted_labels(text: &str) -> String {
    let mut out = text.to_string();
    let mut pos = 0;
    while let Some(found) = out[pos..].find("\"\"") {
        let start = pos + found;
        let after = &out[start + 2..];
        let label_start = after.len() - after.trim_start().len();
        let candidate = &after[label_start..];
        match candidate.find(':') {
            Some(colon) if colon > 0 && candidate[colon + 1..].starts_with("**") => {
                let label = candidate[..colon].to_string();
                let replacement = format!("**\"{label}:\"**");
                let matched = 2 + label_start + colon + 3;
                out.replace_range(start..start + matched, &replacement);
                pos = start + replacement.len();
            }
            _ => {
                pos = start + 1;
            }
        }
    }
    out
}

// ""quoted"" -> "quoted"
fn collapse_doubled_quotes(text: &str) -> String {
    let mut out = text.to_string();
    let mut pos = 0;
    while let Some(found) = out[pos..].find("\"\"") {
        let start = pos + found;
        let inner = &out[start + 2..];
        let Some(end) = inner.find('"') else { break };
        if end > 0 && inner[end..].starts_with("\"\"") {
            let content = inner[..end].to_string();
            out.replace_range(start..start + end + 4, &format!("\"{content}\""));
            pos = start + content.len() + 2;
        } else {
            pos = start + 1;
        }
    }
    out
}

/// Strip markdown for speech so the synthesizer never reads out markers
/// or URLs. Display text is left untouched by this.
pub fn clean_for_speech(text: &str) -> String {
    let mut cleaned = text.to_string();

    // Fenced code is dropped entirely, it does not read aloud well
    while let Some(start) = cleaned.find("```") {
        if let Some(end) = cleaned[start + 3..].find("```") {
            cleaned.replace_range(start..start + end + 6, "");
        } else {
            break;
        }
    }

    // Inline code keeps its content
    while let Some(start) = cleaned.find('`') {
        if let Some(end) = cleaned[start + 1..].find('`') {
            let code = cleaned[start + 1..start + 1 + end].to_string();
            cleaned.replace_range(start..start + end + 2, &code);
        } else {
            break;
        }
    }

    // Links keep the label: [label](url) -> label
    let mut pos = 0;
    while let Some(found) = cleaned[pos..].find('[') {
        let start = pos + found;
        let Some(mid) = cleaned[start + 1..].find("](") else { break };
        let mid = start + 1 + mid;
        let Some(end) = cleaned[mid + 2..].find(')') else { break };
        let end = mid + 2 + end;
        let label = cleaned[start + 1..mid].to_string();
        cleaned.replace_range(start..end + 1, &label);
        pos = start + label.len();
    }

    for marker in ["**", "__", "~~", "*", "_", "#"] {
        cleaned = cleaned.replace(marker, "");
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
