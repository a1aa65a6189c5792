//! Engine link rewriting for lesson documents.
//!
//! While authoring, a lesson deck references the shared engine as if it sat
//! next to the deck (`src="dist/reveal.js"`, `href="/plugin/x.css"`). In the
//! aggregate tree the engine lives at the root and each lesson one level
//! below it, so those links must climb one directory:
//!
//! ```text
//! src="/dist/reveal.js"     →  src="../dist/reveal.js"
//! href="plugin/x.css"       →  href="../plugin/x.css"
//! ```
//!
//! The match is `(href|src)=["']/?<prefix>/` and the replacement always opens
//! with a double quote. Only the attribute prefix is touched; the rest of the
//! value, including its closing quote, is left as authored.

use regex::Regex;

/// Compiled rewrite rules, one per engine prefix.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    rules: Vec<(Regex, String)>,
}

impl LinkRewriter {
    /// Compile rules for the given prefixes (e.g. `["dist", "plugin"]`).
    pub fn new(prefixes: &[String]) -> Result<Self, regex::Error> {
        let rules = prefixes
            .iter()
            .map(|prefix| {
                let pattern = format!(r#"(href|src)=["']/?{}/"#, regex::escape(prefix));
                let replacement = format!(r#"${{1}}="../{prefix}/"#);
                Regex::new(&pattern).map(|re| (re, replacement))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { rules })
    }

    /// Apply every rule once, in prefix order.
    pub fn rewrite(&self, html: &str) -> String {
        self.rules
            .iter()
            .fold(html.to_string(), |text, (re, replacement)| {
                re.replace_all(&text, replacement.as_str()).into_owned()
            })
    }
}
