use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub width: f32,
    pub height: f32,
    pub origin: (f32, f32),
    pub root: Group,
}

impl Document {
    pub fn new(width: f32, height: f32, origin: (f32, f32)) -> Self {
        Self {
            width,
            height,
            origin,
            root: Group::new(),
        }
    }

    pub fn append(&mut self, child: impl Into<Element>) {
        self.root.append(child);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Group {
    pub translate: Option<(f32, f32)>,
    pub style: Option<String>,
    pub class: Option<String>,
    pub children: Vec<Element>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(x: f32, y: f32) -> Self {
        Self {
            translate: Some((x, y)),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn append(&mut self, child: impl Into<Element>) {
        self.children.push(child.into());
    }

    pub fn offset(&self) -> (f32, f32) {
        self.translate.unwrap_or((0.0, 0.0))
    }

    /// Child groups in document order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.children.iter().filter_map(|child| match child {
            Element::Group(group) => Some(group),
            _ => None,
        })
    }

    /// Depth-first search for the first group tagged with `class`.
    pub fn find_class(&self, class: &str) -> Option<&Group> {
        if self.class.as_deref() == Some(class) {
            return Some(self);
        }
        self.groups().find_map(|group| group.find_class(class))
    }

    /// All text lines under this group, depth first.
    pub fn texts(&self) -> Vec<&Text> {
        let mut out = Vec::new();
        collect_texts(self, &mut out);
        out
    }

    /// All rectangles under this group, depth first.
    pub fn rects(&self) -> Vec<&Rect> {
        let mut out = Vec::new();
        collect_rects(self, &mut out);
        out
    }
}

fn collect_texts<'a>(group: &'a Group, out: &mut Vec<&'a Text>) {
    for child in &group.children {
        match child {
            Element::Text(text) => out.push(text),
            Element::Group(inner) => collect_texts(inner, out),
            Element::Rect(_) => {}
        }
    }
}

fn collect_rects<'a>(group: &'a Group, out: &mut Vec<&'a Rect>) {
    for child in &group.children {
        match child {
            Element::Rect(rect) => out.push(rect),
            Element::Group(inner) => collect_rects(inner, out),
            Element::Text(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Group(Group),
    Rect(Rect),
    Text(Text),
}

impl From<Group> for Element {
    fn from(group: Group) -> Self {
        Element::Group(group)
    }
}

impl From<Rect> for Element {
    fn from(rect: Rect) -> Self {
        Element::Rect(rect)
    }
}

impl From<Text> for Element {
    fn from(text: Text) -> Self {
        Element::Text(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fill: String,
    pub stroke: Option<String>,
    pub stroke_width: f32,
    pub corner_radius: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32, fill: impl Into<String>) -> Self {
        Self {
            x,
            y,
            width,
            height,
            fill: fill.into(),
            stroke: None,
            stroke_width: 0.0,
            corner_radius: 0.0,
        }
    }

    pub fn with_stroke(mut self, stroke: impl Into<String>, width: f32) -> Self {
        self.stroke = Some(stroke.into());
        self.stroke_width = width;
        self
    }

    pub fn with_corner_radius(mut self, radius: f32) -> Self {
        self.corner_radius = radius;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

/// Text with its first baseline at `y`; further lines step by `line_height`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub x: f32,
    pub y: f32,
    pub lines: Vec<String>,
    pub font_size: f32,
    pub line_height: f32,
    pub fill: String,
    pub anchor: TextAnchor,
    pub bold: bool,
}

impl Text {
    pub fn new(x: f32, y: f32, text: impl Into<String>, font_size: f32, fill: impl Into<String>) -> Self {
        Self {
            x,
            y,
            lines: vec![text.into()],
            font_size,
            line_height: font_size,
            fill: fill.into(),
            anchor: TextAnchor::Start,
            bold: false,
        }
    }

    pub fn with_lines(mut self, lines: Vec<String>, line_height: f32) -> Self {
        self.lines = lines;
        self.line_height = line_height;
        self
    }

    pub fn anchored(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn content(&self) -> String {
        self.lines.join(" ")
    }
}
