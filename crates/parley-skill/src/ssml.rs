//! Speech markup construction.
//!
//! [`Ssml`] can only be built from escaped text and a fixed set of tags, so
//! every value is a well-formed `<speak>` document whatever the model said.

use std::fmt;

/// A well-formed `<speak>...</speak>` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ssml(String);

impl Ssml {
    /// Wrap plain text, escaping anything special to the markup.
    pub fn from_text(text: &str) -> Self {
        SsmlBuilder::new().text(text).build()
    }

    /// An empty document.
    pub fn empty() -> Self {
        SsmlBuilder::new().build()
    }

    pub fn builder() -> SsmlBuilder {
        SsmlBuilder::new()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The spoken text with tags removed and entities decoded.
    pub fn plain_text(&self) -> String {
        strip_markup(&self.0)
    }
}

impl fmt::Display for Ssml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Incremental builder for [`Ssml`].
#[derive(Debug, Default)]
pub struct SsmlBuilder {
    body: String,
}

impl SsmlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append escaped text, separated from previous content by a space.
    pub fn text(mut self, text: &str) -> Self {
        let escaped = escape(text.trim());
        if escaped.is_empty() {
            return self;
        }
        if !self.body.is_empty() && !self.body.ends_with('>') {
            self.body.push(' ');
        }
        self.body.push_str(&escaped);
        self
    }

    /// Append a pause of `millis` milliseconds.
    pub fn pause(mut self, millis: u32) -> Self {
        if !self.body.is_empty() && !self.body.ends_with('>') {
            self.body.push(' ');
        }
        self.body.push_str(&format!("<break time=\"{}ms\"/>", millis));
        self
    }

    pub fn build(self) -> Ssml {
        Ssml(format!("<speak>{}</speak>", self.body))
    }
}

/// Escape text for inclusion in speech markup.
///
/// Replaces the five XML special characters with entities and drops
/// characters that are not legal in an XML 1.0 document.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if is_xml_char(c) => out.push(c),
            _ => {}
        }
    }
    out
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r')
        || ('\u{20}'..='\u{D7FF}').contains(&c)
        || ('\u{E000}'..='\u{FFFD}').contains(&c)
        || c >= '\u{10000}'
}

/// Plain text of a speech markup string, with tags removed and entities decoded.
pub fn strip_markup(ssml: &str) -> String {
    let mut text = String::with_capacity(ssml.len());
    let mut in_tag = false;
    for c in ssml.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Checks that `ssml` is a single `<speak>` element whose content holds
    /// only complete entities, self-closing `<break>` tags and text.
    pub(crate) fn assert_well_formed(ssml: &str) {
        let body = ssml
            .strip_prefix("<speak>")
            .and_then(|s| s.strip_suffix("</speak>"))
            .unwrap_or_else(|| panic!("not wrapped in <speak>: {ssml}"));

        let mut rest = body;
        while let Some(pos) = rest.find(['<', '&', '>']) {
            let tail = &rest[pos..];
            if tail.starts_with('<') {
                let end = tail
                    .find("/>")
                    .unwrap_or_else(|| panic!("unclosed tag in {ssml}"));
                let tag = &tail[..end + 2];
                assert!(tag.starts_with("<break time=\""), "unexpected tag {tag}");
                assert!(!tag[1..].contains('<'), "nested tag in {tag}");
                rest = &tail[end + 2..];
            } else if tail.starts_with('&') {
                let entity = ["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"]
                    .iter()
                    .find(|e| tail.starts_with(**e))
                    .unwrap_or_else(|| panic!("bare ampersand in {ssml}"));
                rest = &tail[entity.len()..];
            } else {
                panic!("stray '>' in {ssml}");
            }
        }
        for c in body.chars() {
            assert!(is_xml_char(c), "illegal character {:?} in {ssml}", c);
        }
    }

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(
            escape(r#"a & b < c > d "e" 'f'"#),
            "a &amp; b &lt; c &gt; d &quot;e&quot; &apos;f&apos;"
        );
    }

    #[test]
    fn test_escape_drops_control_characters() {
        assert_eq!(escape("bell\u{7}tab\tnull\u{0}"), "belltab\tnull");
        assert_eq!(escape("\u{FFFE}ok\u{FFFF}"), "ok");
    }

    #[test]
    fn test_escape_keeps_unicode() {
        assert_eq!(
            escape("Qu'est-ce que c'est? \u{1F600}"),
            "Qu&apos;est-ce que c&apos;est? \u{1F600}"
        );
    }

    #[test]
    fn test_from_text_wraps_in_speak() {
        let ssml = Ssml::from_text("Hello there.");
        assert_eq!(ssml.as_str(), "<speak>Hello there.</speak>");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(Ssml::empty().as_str(), "<speak></speak>");
        assert_eq!(Ssml::from_text("   ").as_str(), "<speak></speak>");
    }

    #[test]
    fn test_builder_joins_parts_with_pause() {
        let ssml = Ssml::builder()
            .text("The answer is 4.")
            .pause(400)
            .text("You might also ask:")
            .text("Why?")
            .build();
        assert_eq!(
            ssml.as_str(),
            "<speak>The answer is 4. <break time=\"400ms\"/>You might also ask: Why?</speak>"
        );
        assert_well_formed(ssml.as_str());
    }

    #[test]
    fn test_injected_markup_is_neutralised() {
        let hostile = "</speak><audio src=\"http://evil\"/><speak>& more";
        let ssml = Ssml::from_text(hostile);
        assert_well_formed(ssml.as_str());
        assert!(!ssml.as_str().contains("<audio"));
        assert_eq!(ssml.plain_text(), hostile);
    }

    #[test]
    fn test_markup_safety_over_many_inputs() {
        let inputs = [
            "",
            "<",
            ">",
            "&",
            "&amp;",
            "<<>>&&\"\"''",
            "<break time=\"1s\"/>",
            "AT&T said \"5 < 6\"",
            "line one\nline two\r\n\tindented",
            "\u{0}\u{1}\u{1F}control",
            "emoji \u{1F680} and cjk \u{4E2D}\u{6587}",
            "]]><![CDATA[",
        ];
        for input in inputs {
            let ssml = Ssml::builder().text(input).pause(300).text(input).build();
            assert_well_formed(ssml.as_str());
        }
    }

    #[test]
    fn test_plain_text_strips_tags_and_decodes() {
        let ssml = Ssml::builder()
            .text("Tom & Jerry")
            .pause(200)
            .text("<3")
            .build();
        assert_eq!(ssml.plain_text(), "Tom & Jerry <3");
    }
}
