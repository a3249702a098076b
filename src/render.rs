use crate::scene::{Document, Element, Group, Rect, Text};
use crate::theme::Theme;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

/// Serializes `document` as a standalone SVG file. The theme supplies the
/// page background and the default font family.
pub fn render_svg(document: &Document, theme: &Theme) -> String {
    let mut svg = String::new();
    let width = document.width;
    let height = document.height;
    let (ox, oy) = document.origin;

    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"{ox} {oy} {width} {height}\" font-family=\"{}\">",
        escape_xml(&theme.font_family)
    );
    let _ = write!(
        svg,
        "<rect x=\"{ox}\" y=\"{oy}\" width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(&theme.background)
    );
    push_group(&mut svg, &document.root);
    svg.push_str("</svg>");
    svg
}

fn push_group(svg: &mut String, group: &Group) {
    svg.push_str("<g");
    if let Some((x, y)) = group.translate {
        let _ = write!(svg, " transform=\"translate({x:.2},{y:.2})\"");
    }
    if let Some(class) = &group.class {
        let _ = write!(svg, " class=\"{}\"", escape_xml(class));
    }
    if let Some(style) = &group.style {
        let _ = write!(svg, " style=\"{}\"", escape_xml(style));
    }
    svg.push('>');
    for child in &group.children {
        match child {
            Element::Group(inner) => push_group(svg, inner),
            Element::Rect(rect) => push_rect(svg, rect),
            Element::Text(text) => push_text(svg, text),
        }
    }
    svg.push_str("</g>");
}

fn push_rect(svg: &mut String, rect: &Rect) {
    let _ = write!(
        svg,
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"",
        rect.x,
        rect.y,
        rect.width,
        rect.height,
        escape_xml(&rect.fill)
    );
    if rect.corner_radius > 0.0 {
        let r = rect.corner_radius;
        let _ = write!(svg, " rx=\"{r:.2}\" ry=\"{r:.2}\"");
    }
    if let Some(stroke) = &rect.stroke {
        let _ = write!(
            svg,
            " stroke=\"{}\" stroke-width=\"{:.2}\"",
            escape_xml(stroke),
            rect.stroke_width
        );
    }
    svg.push_str("/>");
}

fn push_text(svg: &mut String, text: &Text) {
    let _ = write!(
        svg,
        "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"{:.2}\" fill=\"{}\" text-anchor=\"{}\"",
        text.x,
        text.y,
        text.font_size,
        escape_xml(&text.fill),
        text.anchor.as_str()
    );
    if text.bold {
        svg.push_str(" font-weight=\"bold\"");
    }
    svg.push('>');
    if let [line] = text.lines.as_slice() {
        svg.push_str(&escape_xml(line));
    } else {
        for (idx, line) in text.lines.iter().enumerate() {
            let dy = if idx == 0 { 0.0 } else { text.line_height };
            let _ = write!(
                svg,
                "<tspan x=\"{:.2}\" dy=\"{dy:.2}\">{}</tspan>",
                text.x,
                escape_xml(line)
            );
        }
    }
    svg.push_str("</text>");
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg).with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::TextAnchor;

    fn document() -> Document {
        let mut doc = Document::new(230.0, 146.0, (0.0, 0.0));
        let mut group = Group::at(5.0, 5.0).with_class("tactic");
        group.append(
            Rect::new(0.0, 0.0, 80.0, 20.0, "#ff0000")
                .with_stroke("#dddddd", 0.5)
                .with_corner_radius(5.0),
        );
        group.append(Text::new(40.0, 14.0, "Drive-by <Compromise>", 12.0, "#000000").anchored(TextAnchor::Middle));
        group.append(
            Text::new(40.0, -10.0, "", 8.0, "#000000")
                .with_lines(vec!["Command and".into(), "Control".into()], 8.8)
                .bold(),
        );
        doc.append(group);
        doc
    }

    #[test]
    fn render_svg_basic() {
        let svg = render_svg(&document(), &Theme::navigator());
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("viewBox=\"0 0 230 146\""));
        assert!(svg.contains("transform=\"translate(5.00,5.00)\""));
        assert!(svg.contains("fill=\"#ff0000\" rx=\"5.00\" ry=\"5.00\" stroke=\"#dddddd\""));
        assert!(svg.contains("text-anchor=\"middle\""));
    }

    #[test]
    fn text_is_escaped_and_wrapped_lines_use_tspans() {
        let svg = render_svg(&document(), &Theme::navigator());
        assert!(svg.contains("Drive-by &lt;Compromise&gt;"));
        assert!(svg.contains("<tspan x=\"40.00\" dy=\"0.00\">Command and</tspan>"));
        assert!(svg.contains("<tspan x=\"40.00\" dy=\"8.80\">Control</tspan>"));
        assert!(svg.contains("font-weight=\"bold\""));
    }

    #[test]
    fn writes_svg_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.svg");
        write_output_svg("<svg/>", Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<svg/>");
    }
}
