//! Named paragraph styles for flowing documents.

use genpdf::style::Style;

/// The handful of paragraph styles report headers and bodies are written with.
#[derive(Clone, Copy, Debug)]
pub struct StyleSheet {
    pub normal: Style,
    pub body_text: Style,
    pub heading1: Style,
    pub heading2: Style,
    pub title: Style,
}

impl StyleSheet {
    /// The default sheet: 10pt body text with bold 18pt/14pt headings.
    pub fn sample() -> Self {
        Self {
            normal: Style::new().with_font_size(10),
            body_text: Style::new().with_font_size(10).with_line_spacing(1.2),
            heading1: Style::new().bold().with_font_size(18),
            heading2: Style::new().bold().with_font_size(14),
            title: Style::new().bold().with_font_size(18),
        }
    }

    /// Looks a style up by its conventional name, e.g. `"Heading1"`.
    pub fn get(&self, name: &str) -> Option<Style> {
        match name {
            "Normal" => Some(self.normal),
            "BodyText" => Some(self.body_text),
            "Heading1" => Some(self.heading1),
            "Heading2" => Some(self.heading2),
            "Title" => Some(self.title),
            _ => None,
        }
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::sample()
    }
}

#[cfg(test)]
mod tests {
    use super::StyleSheet;

    #[test]
    fn headings_are_bold_and_larger_than_body() {
        let styles = StyleSheet::sample();
        assert!(styles.heading1.is_bold());
        assert!(styles.heading1.font_size() > styles.heading2.font_size());
        assert!(styles.heading2.font_size() > styles.normal.font_size());
        assert!(!styles.body_text.is_bold());
    }

    #[test]
    fn lookup_by_name() {
        let styles = StyleSheet::sample();
        assert_eq!(
            styles.get("Heading2").map(|style| style.font_size()),
            Some(14)
        );
        assert!(styles.get("Caption").is_none());
    }
}
