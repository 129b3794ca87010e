//! HTML alternative body.

use crate::config::SenderProfile;

/// Escape text for inclusion in HTML.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a plain-text body as HTML, with a signature block from the sender profile.
pub fn render(body: &str, profile: &SenderProfile) -> String {
    let paragraphs: Vec<String> = body
        .trim()
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!("<p>{}</p>", escape(p.trim()).replace('\n', "<br>\n")))
        .collect();

    let mut html = String::from("<html>\n<body style=\"font-family: Arial, sans-serif; line-height: 1.6;\">\n");
    html.push_str(&paragraphs.join("\n"));
    if let Some(signature) = signature(profile) {
        html.push('\n');
        html.push_str(&signature);
    }
    html.push_str("\n</body>\n</html>\n");
    html
}

fn signature(profile: &SenderProfile) -> Option<String> {
    let mut lines = Vec::new();
    if !profile.name.trim().is_empty() {
        lines.push(format!("<strong>{}</strong>", escape(profile.name.trim())));
    }
    for value in [&profile.title, &profile.email, &profile.phone] {
        if !value.trim().is_empty() {
            lines.push(escape(value.trim()));
        }
    }
    for (label, url) in [("LinkedIn", &profile.linkedin), ("Portfolio", &profile.portfolio)] {
        if !url.trim().is_empty() {
            lines.push(format!("<a href=\"{}\">{label}</a>", escape(url.trim())));
        }
    }
    if lines.is_empty() {
        return None;
    }
    Some(format!(
        "<hr>\n<p style=\"color: #555; font-size: 0.9em;\">{}</p>",
        lines.join("<br>\n")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<b>R&D</b> \"x\""), "&lt;b&gt;R&amp;D&lt;/b&gt; &quot;x&quot;");
    }

    #[test]
    fn paragraphs_and_line_breaks() {
        let html = render("Hi Ann,\n\nLine one\nLine two", &SenderProfile::default());
        assert!(html.contains("<p>Hi Ann,</p>"));
        assert!(html.contains("<p>Line one<br>\nLine two</p>"));
        assert!(!html.contains("<hr>"));
    }

    #[test]
    fn signature_from_profile() {
        let profile = SenderProfile {
            name: "Sam".into(),
            title: "Engineer".into(),
            linkedin: "https://linkedin.com/in/sam".into(),
            ..SenderProfile::default()
        };
        let html = render("Hello", &profile);
        assert!(html.contains("<strong>Sam</strong>"));
        assert!(html.contains("Engineer"));
        assert!(html.contains("<a href=\"https://linkedin.com/in/sam\">LinkedIn</a>"));
    }
}
