//! Integration tests for sanitized markdown rendering

#[cfg(test)]
mod render_safety_tests {
    use pagemagic_core::config::RenderConfig;
    use pagemagic_core::markdown::{AnnotationKind, MarkdownRenderer, RenderMode};

    const HOSTILE: &[&str] = &[
        "<script>alert(1)</script>",
        "Hello <script type=\"text/javascript\">steal()</script> world",
        "<style>body { display: none }</style>\n\nVisible",
        "<img src=\"x.png\" onerror=\"alert(1)\">",
        "# Title <img src=x onerror=alert(1)>",
        "- item <span onclick=\"x()\" onerror=\"y()\">click</span>",
        "<div><p>nested <script>bad()</script> text</p></div>",
        "<SCRIPT>upper()</SCRIPT> and <Style>p{}</Style>",
        "| a | b |\n|---|---|\n| <script>t()</script> | <img onerror=z() src=a> |",
        "> quote <iframe src=\"https://evil.example\"></iframe>",
        "hi <xmp><script>alert(1)</script></xmp>",
        "hi <noembed><img src=x onerror=alert(1)></noembed>",
        "<noframes><style>p{}</style><script>f()</script></noframes> after",
        "<plaintext><script>alert(1)</script>",
        "text\n\n<plaintext>\n<img src=x onerror=alert(1)>",
    ];

    #[test]
    fn test_hostile_markup_never_survives() {
        let renderer = MarkdownRenderer::default();
        for input in HOSTILE {
            for mode in [RenderMode::Block, RenderMode::Inline] {
                let html = renderer.render(input, mode).to_ascii_lowercase();
                assert!(!html.contains("<script"), "{:?} {:?}: {}", mode, input, html);
                assert!(!html.contains("<style"), "{:?} {:?}: {}", mode, input, html);
                assert!(!html.contains("onerror="), "{:?} {:?}: {}", mode, input, html);
                assert!(!html.contains("onclick="), "{:?} {:?}: {}", mode, input, html);
                assert!(!html.contains("<iframe"), "{:?} {:?}: {}", mode, input, html);
                if mode == RenderMode::Inline {
                    assert!(!html.contains("<p"), "{:?} {:?}: {}", mode, input, html);
                }
            }
        }
    }

    #[test]
    fn test_inline_mode_never_emits_block_tags() {
        let renderer = MarkdownRenderer::default();
        let inputs = [
            "plain words",
            "# Heading\n\nParagraph",
            "## Sub *heading*",
            "> quoted\n\n- list\n- items\n\n1. one",
            "<div>raw div</div><h3>raw heading</h3>",
            "| a |\n|---|\n| b |",
            "```\ncode block\n```",
        ];
        for input in inputs {
            let html = renderer.render_inline(input);
            for tag in ["<p", "<div", "<h1", "<h2", "<h3", "<h4", "<h5", "<h6"] {
                assert!(!html.contains(tag), "{:?} -> {}", input, html);
            }
            assert!(!html.ends_with('\n'));
        }
    }

    #[test]
    fn test_gfm_can_be_disabled() {
        let renderer = MarkdownRenderer::new(RenderConfig {
            gfm: false,
            ..RenderConfig::default()
        });
        let html = renderer.render_block("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~");
        assert!(!html.contains("<table"));
        assert!(!html.contains("<del"));
    }

    #[test]
    fn test_annotations_follow_document() {
        let renderer = MarkdownRenderer::default();
        let annotations = renderer.annotate(
            "# Guide\n\nIntro text.\n\n## Steps\n\n1. Measure\n2. Cut\n   - carefully\n\n## Done\n",
        );

        let headings: Vec<(u8, &str, usize)> = annotations
            .iter()
            .filter_map(|a| match a.kind {
                AnnotationKind::Heading { level } => Some((level, a.text.as_str(), a.line)),
                _ => None,
            })
            .collect();
        assert_eq!(headings, vec![(1, "Guide", 1), (2, "Steps", 5), (2, "Done", 11)]);

        let items: Vec<(bool, usize, usize, &str)> = annotations
            .iter()
            .filter_map(|a| match a.kind {
                AnnotationKind::ListItem {
                    ordered,
                    ordinal,
                    depth,
                } => Some((ordered, ordinal, depth, a.text.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            items,
            vec![
                (true, 1, 1, "Measure"),
                (true, 2, 1, "Cut"),
                (false, 1, 2, "carefully"),
            ]
        );
    }
}
