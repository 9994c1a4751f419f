//! Auto-style: picks one of a fixed set of palettes for a profile theme.

use rand::seq::SliceRandom;

use crate::models::profile::{Layout, Theme};

pub struct Preset {
    pub name: &'static str,
    pub background: &'static str,
    pub text: &'static str,
    pub button: &'static str,
    pub glass: bool,
}

pub const PRESETS: &[Preset] = &[
    Preset { name: "Neon Dark", background: "#0f172a", text: "#38bdf8", button: "#ec4899", glass: true },
    Preset { name: "Minimal White", background: "#f8fafc", text: "#334155", button: "#000000", glass: false },
    Preset { name: "Pastel Dream", background: "#fff1f2", text: "#881337", button: "#fda4af", glass: true },
    Preset { name: "Cyber Punk", background: "#000000", text: "#39ff14", button: "#ff00ff", glass: true },
    Preset { name: "Luxury Gold", background: "#1c1917", text: "#fbbf24", button: "#78350f", glass: true },
];

impl Preset {
    pub fn theme(&self) -> Theme {
        Theme {
            background_color: self.background.to_string(),
            text_color: self.text.to_string(),
            button_color: self.button.to_string(),
            font_family: "Prompt".to_string(),
            layout: if self.glass { Layout::Glass } else { Layout::Modern },
            background_image_url: None,
            glass_effect_enabled: Some(self.glass),
        }
    }
}

pub fn auto_style() -> Theme {
    PRESETS
        .choose(&mut rand::thread_rng())
        .map(Preset::theme)
        .unwrap_or_default()
}
