//! Text-level lexing shared by the data and text passes: comment
//! stripping, section splitting, and tokenizing (`original_source/
//! assembler.py`'s `assembler_clean`/`assembler_tokenize`).

/// Strip `#`-to-end-of-line comments and blank lines, trimming whitespace.
/// Each surviving line keeps its 1-based original source line number, so
/// later passes can report errors against the text the user actually wrote.
pub fn clean(source: &str) -> Vec<(usize, String)> {
    source
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, match line.find('#') { Some(index) => &line[..index], None => line }))
        .map(|(line_no, line)| (line_no, line.trim().to_string()))
        .filter(|(_, line)| !line.is_empty())
        .collect()
}

/// A source split into its `.data` and `.text` sections, in source order.
/// Either section may be empty if its header is absent.
pub struct Sections {
    pub data: Vec<(usize, String)>,
    pub text: Vec<(usize, String)>,
}

/// Split cleaned lines on `.data`/`.text` section headers (case-insensitive,
/// matched whole-line). Lines before the first header are treated as
/// `.text`, matching an assembly file that omits the header when it has no
/// data section.
pub fn split_sections(lines: &[(usize, String)]) -> Sections {
    let mut data = Vec::new();
    let mut text = Vec::new();
    let mut in_data = false;

    for (line_no, line) in lines {
        match line.to_ascii_lowercase().as_str() {
            ".data" => in_data = true,
            ".text" => in_data = false,
            _ if in_data => data.push((*line_no, line.clone())),
            _ => text.push((*line_no, line.clone())),
        }
    }

    Sections { data, text }
}

/// Split a line into tokens: maximal runs of alphanumeric, `_`, or `-`
/// characters, with everything else acting as a delimiter. Supports
/// negative integer literals (`-1`) as single tokens.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in line.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == '-' {
            current.push(ch);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_comments_and_blank_lines() {
        let lines = clean("ADDI r1 r0 5 # load 5\n\n# full line comment\nNO_OP\n");
        assert_eq!(lines, vec![(1, "ADDI r1 r0 5".to_string()), (4, "NO_OP".to_string())]);
    }

    #[test]
    fn split_sections_groups_by_header() {
        let lines = clean(".data\nfoo: 1 2 3\n.text\nstart: NO_OP\n");
        let sections = split_sections(&lines);
        assert_eq!(sections.data, vec![(2, "foo: 1 2 3".to_string())]);
        assert_eq!(sections.text, vec![(4, "start: NO_OP".to_string())]);
    }

    #[test]
    fn lines_before_any_header_are_text() {
        let lines = clean("start: NO_OP\n");
        let sections = split_sections(&lines);
        assert!(sections.data.is_empty());
        assert_eq!(sections.text, vec![(1, "start: NO_OP".to_string())]);
    }

    #[test]
    fn tokenize_splits_on_delimiters_and_keeps_negative_numbers() {
        assert_eq!(tokenize("ADDI r1, r0, -5"), vec!["ADDI", "r1", "r0", "-5"]);
    }

    #[test]
    fn tokenize_trims_trailing_delimiters() {
        assert_eq!(tokenize("NO_OP  "), vec!["NO_OP"]);
    }
}
