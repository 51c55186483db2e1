//! Formatter for the constrained markdown subset Gemini answers tend to use:
//! bold, italics, line breaks, and flat `- ` bullet lists.
//!
//! `format` produces a [`Fragment`] of typed nodes rather than markup text.
//! The renderer in `ui` decides how each node kind is styled; answer text is
//! only ever carried as node content, so it cannot be re-parsed as markup.

/// Inline token inside a formatted fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Strong(String),
    Emphasis(String),
    LineBreak,
}

/// One structural element of a formatted fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Span(Span),
    /// A contiguous run of bullet lines; each item is its own sequence of
    /// inline spans with the leading `- ` stripped.
    List(Vec<Vec<Span>>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub nodes: Vec<Node>,
}

/// Formats raw answer text. Total: any input yields a fragment.
pub fn format(content: &str) -> Fragment {
    let mut nodes: Vec<Node> = Vec::new();
    let mut list_run: Vec<Vec<Span>> = Vec::new();
    let mut first_line = true;

    for line in content.split('\n') {
        if let Some(item) = line.strip_prefix("- ") {
            list_run.push(parse_inline(item));
            first_line = false;
            continue;
        }

        if !list_run.is_empty() {
            // A non-bullet line ends the run; the list is block-level, so it
            // separates lines on its own and no break token is needed here.
            nodes.push(Node::List(std::mem::take(&mut list_run)));
        } else if !first_line {
            nodes.push(Node::Span(Span::LineBreak));
        }

        nodes.extend(parse_inline(line).into_iter().map(Node::Span));
        first_line = false;
    }

    if !list_run.is_empty() {
        nodes.push(Node::List(list_run));
    }

    Fragment { nodes }
}

/// Splits one line into inline tokens. The strong pass runs first and
/// consumes each `**...**` span whole; emphasis only ever sees the text left
/// between strong spans, so a `*` inside a strong span is never re-matched.
fn parse_inline(line: &str) -> Vec<Span> {
    split_strong(line)
        .into_iter()
        .flat_map(|span| match span {
            Span::Text(text) => split_emphasis(&text),
            other => vec![other],
        })
        .collect()
}

fn split_strong(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            // Shortest enclosed span: scan to the nearest closing `**`.
            let mut inner = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    closed = true;
                    break;
                }
                inner.push(c);
            }

            if closed {
                if !plain.is_empty() {
                    spans.push(Span::Text(std::mem::take(&mut plain)));
                }
                spans.push(Span::Strong(inner));
            } else {
                // No closing marker; keep the whole tail literal.
                plain.push_str("**");
                plain.push_str(&inner);
            }
        } else {
            plain.push(c);
        }
    }

    if !plain.is_empty() {
        spans.push(Span::Text(plain));
    }
    spans
}

fn split_emphasis(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c == '*' {
            let mut inner = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '*' {
                    closed = true;
                    break;
                }
                inner.push(c);
            }

            if closed {
                if !plain.is_empty() {
                    spans.push(Span::Text(std::mem::take(&mut plain)));
                }
                spans.push(Span::Emphasis(inner));
            } else {
                plain.push('*');
                plain.push_str(&inner);
            }
        } else {
            plain.push(c);
        }
    }

    if !plain.is_empty() {
        spans.push(Span::Text(plain));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Node {
        Node::Span(Span::Text(s.to_string()))
    }

    fn strong(s: &str) -> Node {
        Node::Span(Span::Strong(s.to_string()))
    }

    fn em(s: &str) -> Node {
        Node::Span(Span::Emphasis(s.to_string()))
    }

    fn brk() -> Node {
        Node::Span(Span::LineBreak)
    }

    /// Collects the text content of every inline token in the fragment.
    fn inline_contents(fragment: &Fragment) -> Vec<String> {
        let mut out = Vec::new();
        let mut push_span = |span: &Span| match span {
            Span::Text(s) | Span::Strong(s) | Span::Emphasis(s) => out.push(s.clone()),
            Span::LineBreak => {}
        };
        for node in &fragment.nodes {
            match node {
                Node::Span(span) => push_span(span),
                Node::List(items) => items.iter().flatten().for_each(&mut push_span),
            }
        }
        out
    }

    #[test]
    fn test_empty_input_yields_empty_fragment() {
        assert_eq!(format(""), Fragment::default());
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(format("hello world").nodes, vec![text("hello world")]);
    }

    #[test]
    fn test_line_breaks_become_tokens() {
        assert_eq!(format("a\nb").nodes, vec![text("a"), brk(), text("b")]);
    }

    #[test]
    fn test_blank_line_is_preserved() {
        assert_eq!(
            format("a\n\nb").nodes,
            vec![text("a"), brk(), brk(), text("b")]
        );
    }

    #[test]
    fn test_no_inline_token_contains_a_raw_newline() {
        let input = "a\n**b\nc**\n- d\ne *f*\n\n";
        for content in inline_contents(&format(input)) {
            assert!(!content.contains('\n'), "raw newline in {:?}", content);
        }
    }

    #[test]
    fn test_bold_markers_are_removed() {
        assert_eq!(format("**answer**").nodes, vec![strong("answer")]);
    }

    #[test]
    fn test_bold_is_shortest_match() {
        assert_eq!(
            format("**a** and **b**").nodes,
            vec![strong("a"), text(" and "), strong("b")]
        );
    }

    #[test]
    fn test_unclosed_bold_falls_through_to_emphasis_pass() {
        // With no closing `**` the strong pass leaves the tail literal, and
        // the emphasis pass then matches the two asterisks as an empty pair.
        assert_eq!(format("a **b").nodes, vec![text("a "), em(""), text("b")]);
    }

    #[test]
    fn test_italics() {
        assert_eq!(
            format("so *very* nice").nodes,
            vec![text("so "), em("very"), text(" nice")]
        );
    }

    #[test]
    fn test_unclosed_italic_stays_literal() {
        assert_eq!(format("2 * 3").nodes, vec![text("2 * 3")]);
    }

    #[test]
    fn test_bold_runs_before_italic() {
        // The strong pass consumes first; the lone trailing `*` and the `*`
        // swallowed into the strong span are not re-matched as emphasis.
        assert_eq!(
            format("***x***").nodes,
            vec![strong("*x"), text("*")]
        );
    }

    #[test]
    fn test_mixed_bold_and_italic() {
        assert_eq!(
            format("*a* then **b**").nodes,
            vec![em("a"), text(" then "), strong("b")]
        );
    }

    #[test]
    fn test_bullet_run_is_wrapped_in_one_list() {
        assert_eq!(
            format("- a\n- b\nc").nodes,
            vec![
                Node::List(vec![
                    vec![Span::Text("a".to_string())],
                    vec![Span::Text("b".to_string())],
                ]),
                text("c"),
            ]
        );
    }

    #[test]
    fn test_separate_bullet_runs_get_separate_lists() {
        assert_eq!(
            format("- a\nx\n- b").nodes,
            vec![
                Node::List(vec![vec![Span::Text("a".to_string())]]),
                text("x"),
                Node::List(vec![vec![Span::Text("b".to_string())]]),
            ]
        );
    }

    #[test]
    fn test_bullet_content_is_inline_formatted() {
        assert_eq!(
            format("- **a** b").nodes,
            vec![Node::List(vec![vec![
                Span::Strong("a".to_string()),
                Span::Text(" b".to_string()),
            ]])]
        );
    }

    #[test]
    fn test_dash_without_space_is_not_a_bullet() {
        assert_eq!(format("-a").nodes, vec![text("-a")]);
    }

    #[test]
    fn test_empty_bullet_yields_empty_item() {
        assert_eq!(format("- ").nodes, vec![Node::List(vec![vec![]])]);
    }

    #[test]
    fn test_trailing_list_is_flushed() {
        assert_eq!(
            format("intro:\n- a").nodes,
            vec![
                text("intro:"),
                Node::List(vec![vec![Span::Text("a".to_string())]]),
            ]
        );
    }
}
