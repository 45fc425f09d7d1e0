use serde::{Deserialize, Serialize};

const CHARTJS_SECTOR_COLORS: [&str; 7] = [
    "#36A2EB", "#FF6384", "#FF9F40", "#FFCD56", "#4BC0C0", "#9966FF", "#C9CBCF",
];

const MODERN_SECTOR_COLORS: [&str; 8] = [
    "#4E79A7", "#F28E2B", "#E15759", "#76B7B2", "#59A14F", "#EDC948", "#B07AA1", "#FF9DA7",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub title_color: String,
    pub sector_colors: Vec<String>,
    pub sector_border: String,
    pub sector_border_width: f32,
}

impl Theme {
    pub fn chartjs_default() -> Self {
        Self {
            font_family: "'Helvetica Neue', Helvetica, Arial, sans-serif".to_string(),
            font_size: 12.0,
            background: "#FFFFFF".to_string(),
            title_color: "#666666".to_string(),
            sector_colors: CHARTJS_SECTOR_COLORS
                .iter()
                .map(|value| value.to_string())
                .collect(),
            sector_border: "#FFFFFF".to_string(),
            sector_border_width: 2.0,
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            background: "#FFFFFF".to_string(),
            title_color: "#1F2937".to_string(),
            sector_colors: MODERN_SECTOR_COLORS
                .iter()
                .map(|value| value.to_string())
                .collect(),
            sector_border: "#F8FAFF".to_string(),
            sector_border_width: 1.5,
        }
    }

    pub fn sector_color(&self, index: usize) -> &str {
        if self.sector_colors.is_empty() {
            return "#999999";
        }
        self.sector_colors[index % self.sector_colors.len()].as_str()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::chartjs_default()
    }
}
