//! Allow-list HTML sanitizer built on the lol_html streaming rewriter.

use lol_html::errors::RewritingError;
use lol_html::{RewriteStrSettings, comments, element, rewrite_str};

/// Elements dropped together with their content, whatever the allow-list says.
///
/// Covers every element whose content the parser treats as raw text
/// (`xmp`, `noembed`, `noframes`, `plaintext`, ...): unwrapping one of those
/// would re-emit its text verbatim as markup.
const FORBIDDEN_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "template", "textarea", "title",
    "xmp", "noembed", "noframes", "plaintext",
];

/// Attributes holding URLs that must be checked against the scheme allow-list.
const URL_ATTRIBUTES: &[&str] = &["href", "src"];

pub(crate) struct SanitizePolicy<'a> {
    pub tags: &'a [String],
    pub attributes: &'a [String],
    pub url_schemes: &'a [String],
}

impl SanitizePolicy<'_> {
    fn allows_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    fn allows_attribute(&self, name: &str) -> bool {
        !name.starts_with("on") && self.attributes.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    /// Relative URLs pass; absolute ones need an allowed scheme.
    fn allows_url(&self, value: &str) -> bool {
        let compact: String = value
            .chars()
            .filter(|c| !c.is_whitespace() && !c.is_control())
            .collect::<String>()
            .to_ascii_lowercase();

        // Entity-encoded colons would be decoded by the browser
        if compact.contains("&#") || compact.contains("&colon") {
            return false;
        }

        match compact.find(':') {
            None => true,
            Some(idx) => {
                let scheme = &compact[..idx];
                if scheme.contains(['/', '?', '#']) {
                    return true;
                }
                self.url_schemes.iter().any(|s| s.eq_ignore_ascii_case(scheme))
            }
        }
    }
}

pub(crate) fn sanitize(html: &str, policy: &SanitizePolicy<'_>) -> Result<String, RewritingError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("*", |el| {
                    let tag = el.tag_name().to_ascii_lowercase();

                    if FORBIDDEN_TAGS.contains(&tag.as_str()) {
                        el.remove();
                        return Ok(());
                    }
                    if !policy.allows_tag(&tag) {
                        el.remove_and_keep_content();
                        return Ok(());
                    }

                    let names: Vec<String> = el.attributes().iter().map(|a| a.name()).collect();
                    for name in names {
                        if !policy.allows_attribute(&name) {
                            el.remove_attribute(&name);
                        } else if URL_ATTRIBUTES.contains(&name.as_str())
                            && let Some(value) = el.get_attribute(&name)
                            && !policy.allows_url(&value)
                        {
                            log::debug!("Dropping {}=\"{}\" on <{}>", name, value, tag);
                            el.remove_attribute(&name);
                        }
                    }
                    Ok(())
                }),
                comments!("*", |c| {
                    c.remove();
                    Ok(())
                }),
            ],
            ..Default::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_policy_checks() {
        let tags = strings(&["p", "a"]);
        let attributes = strings(&["href", "onclick"]);
        let schemes = strings(&["http", "https", "mailto"]);
        let policy = SanitizePolicy {
            tags: &tags,
            attributes: &attributes,
            url_schemes: &schemes,
        };

        assert!(policy.allows_tag("P"));
        assert!(!policy.allows_tag("div"));
        assert!(policy.allows_attribute("href"));
        // Event handlers never pass, even when listed
        assert!(!policy.allows_attribute("onclick"));

        assert!(policy.allows_url("https://example.com"));
        assert!(policy.allows_url("/relative/path?q=a:b"));
        assert!(policy.allows_url("#anchor"));
        assert!(policy.allows_url("mailto:hi@example.com"));
        assert!(!policy.allows_url("java\tscript:alert(1)"));
        assert!(!policy.allows_url("data:text/html;base64,xyz"));
        assert!(!policy.allows_url("javascript&#58;alert(1)"));
    }

    #[test]
    fn test_raw_text_elements_dropped_with_content() {
        let tags = strings(&["p", "em"]);
        let policy = SanitizePolicy {
            tags: &tags,
            attributes: &[],
            url_schemes: &[],
        };
        let cases = [
            ("<p>hi <xmp><script>alert(1)</script></xmp></p>", "<p>hi </p>"),
            ("<p>hi <noembed><img src=x onerror=alert(1)></noembed></p>", "<p>hi </p>"),
            ("<p><em>a</em><noframes><script>x()</script></noframes></p>", "<p><em>a</em></p>"),
        ];
        for (input, expected) in cases {
            assert_eq!(sanitize(input, &policy).unwrap(), expected, "{}", input);
        }

        let out = sanitize("<p>a<plaintext><script>alert(1)</script></p>", &policy).unwrap();
        assert!(!out.contains("<script"), "{}", out);
        assert!(out.starts_with("<p>a"), "{}", out);
    }

    #[test]
    fn test_comments_removed() {
        let tags = strings(&["p"]);
        let policy = SanitizePolicy {
            tags: &tags,
            attributes: &[],
            url_schemes: &[],
        };
        let out = sanitize("<p>a<!-- secret -->b</p>", &policy).unwrap();
        assert_eq!(out, "<p>ab</p>");
    }
}
