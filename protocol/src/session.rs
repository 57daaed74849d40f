use serde::Deserialize;
use serde::Serialize;

/// Screen-space position a label is anchored to, in terminal cells.
///
/// The overlay centers itself on this point and never moves it while editing.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AnchorPoint {
    pub x: u16,
    pub y: u16,
}

impl AnchorPoint {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

impl From<(u16, u16)> for AnchorPoint {
    fn from((x, y): (u16, u16)) -> Self {
        Self { x, y }
    }
}

/// Everything needed to open one label editing session, apart from the outcome callbacks.
///
/// Styling values are carried as given; nothing here is validated.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SessionConfig {
    /// Text the label had before editing. Empty when a new label is being created.
    #[serde(default)]
    pub init_text: String,
    #[serde(flatten)]
    pub anchor: AnchorPoint,
    pub stroke_color: String,
    pub font: String,
    /// Percentage in `0..=100`.
    pub opacity: u8,
}

impl SessionConfig {
    /// Opacity as a fraction, i.e. `opacity / 100`.
    pub fn alpha(&self) -> f32 {
        f32::from(self.opacity) / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn alpha_is_opacity_over_one_hundred() {
        let config = SessionConfig {
            init_text: String::new(),
            anchor: AnchorPoint::new(10, 4),
            stroke_color: "#000000".to_string(),
            font: "20px Virgil".to_string(),
            opacity: 40,
        };
        assert_eq!(config.alpha(), 0.4);
    }

    #[test]
    fn deserializes_flat_anchor_and_defaults_init_text() {
        let config: SessionConfig = serde_json::from_str(
            r#"{"x":3,"y":7,"stroke_color":"red","font":"mono","opacity":100}"#,
        )
        .expect("parse config");
        assert_eq!(config.anchor, AnchorPoint::new(3, 7));
        assert_eq!(config.init_text, "");
    }
}
