use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub text_color: String,
    pub inverse_text_color: String,
    pub background: String,
    pub technique_fill: String,
    pub technique_border: String,
    pub subtechnique_sidebar: String,
    pub header_border: String,
    pub header_label_color: String,
    pub tactic_label_color: String,
}

impl Theme {
    pub fn navigator() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            text_color: "#000000".to_string(),
            inverse_text_color: "#ffffff".to_string(),
            background: "#ffffff".to_string(),
            technique_fill: "#ffffff".to_string(),
            technique_border: "#dddddd".to_string(),
            subtechnique_sidebar: "#a0a0a0".to_string(),
            header_border: "#000000".to_string(),
            header_label_color: "#000000".to_string(),
            tactic_label_color: "#000000".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            text_color: "#1C2430".to_string(),
            inverse_text_color: "#FFFFFF".to_string(),
            background: "#FFFFFF".to_string(),
            technique_fill: "#F8FAFF".to_string(),
            technique_border: "#C7D2E5".to_string(),
            subtechnique_sidebar: "#7A8AA6".to_string(),
            header_border: "#7A8AA6".to_string(),
            header_label_color: "#1C2430".to_string(),
            tactic_label_color: "#1C2430".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "navigator" | "default" => Some(Self::navigator()),
            "modern" => Some(Self::modern()),
            _ => None,
        }
    }
}
