//! The structured carousel outline produced by the planning model and
//! consumed by the renderer.

use serde::{Deserialize, Deserializer, Serialize};

fn untitled() -> String {
    "Untitled".to_string()
}

fn body_kind() -> String {
    "body".to_string()
}

/// Models emit `null` for text they had nothing for; treat it like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_untitled<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(untitled))
}

fn null_as_body_kind<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(body_kind))
}

/// Accepts `3`, `3.0` and `"3"`; anything else becomes 0 and is renumbered
/// by [`PlanStructure::normalized`].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_slide_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    let number = match &raw {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64)),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(number.map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX)))
}

/// Full plan document, stored verbatim in `carousel_plans.structure`.
///
/// Keys the model adds beyond the known ones are kept in `extra` so the
/// stored document matches what was generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStructure {
    #[serde(default = "untitled", deserialize_with = "null_as_untitled")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub slides: Vec<SlideDescriptor>,
    #[serde(default)]
    pub cta_final: Option<CtaFinal>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideDescriptor {
    #[serde(default, deserialize_with = "lenient_slide_number")]
    pub number: u32,
    #[serde(rename = "type", default = "body_kind", deserialize_with = "null_as_body_kind")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headline: String,
    #[serde(default)]
    pub body_text: Option<String>,
    #[serde(default)]
    pub visual_hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtaFinal {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default)]
    pub link: Option<String>,
}

impl PlanStructure {
    /// Fills in slide numbers the model left out and trims a blank title.
    ///
    /// Slides keep their order; a slide with `number == 0` takes its 1-based
    /// position.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        for (idx, slide) in self.slides.iter_mut().enumerate() {
            if slide.number == 0 {
                slide.number = u32::try_from(idx + 1).unwrap_or(u32::MAX);
            }
        }
        if self.title.trim().is_empty() {
            self.title = untitled();
        }
        self
    }

    #[must_use]
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_model_output_with_defaults() {
        let raw = serde_json::json!({
            "slides": [
                { "type": "cover", "headline": "Start selling" },
                { "headline": "Pick a niche", "body_text": "Look at demand first" }
            ],
            "hashtags": ["#wb"]
        });

        let plan: PlanStructure = serde_json::from_value(raw).unwrap();
        let plan = plan.normalized();

        assert_eq!(plan.title, "Untitled");
        assert_eq!(plan.slides[0].number, 1);
        assert_eq!(plan.slides[0].kind, "cover");
        assert_eq!(plan.slides[1].number, 2);
        assert_eq!(plan.slides[1].kind, "body");
        assert!(plan.extra.contains_key("hashtags"));
    }

    #[test]
    fn explicit_slide_numbers_are_kept() {
        let raw = serde_json::json!({
            "title": "Guide",
            "slides": [{ "number": 7, "type": "cta", "headline": "Follow" }],
            "cta_final": { "text": "Subscribe" }
        });
        let plan: PlanStructure = serde_json::from_value(raw).unwrap();
        let plan = plan.normalized();
        assert_eq!(plan.slides[0].number, 7);
        assert_eq!(plan.cta_final.unwrap().text, "Subscribe");
    }

    #[test]
    fn string_slide_numbers_are_accepted() {
        let raw = serde_json::json!({
            "slides": [
                { "number": "1", "type": "cover", "headline": "Start" },
                { "number": " 2 ", "headline": "Next" },
                { "number": 3.0, "headline": "Then" },
                { "number": "first", "headline": "Odd" }
            ]
        });
        let plan: PlanStructure = serde_json::from_value(raw).expect("lenient numbers");
        let numbers: Vec<u32> = plan.normalized().slides.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn null_text_fields_fall_back_to_defaults() {
        let raw = serde_json::json!({
            "title": null,
            "slides": [{ "number": 1, "type": null, "headline": null, "body_text": null }],
            "cta_final": { "text": null }
        });
        let plan: PlanStructure = serde_json::from_value(raw).expect("nulls tolerated");

        assert_eq!(plan.title, "Untitled");
        assert_eq!(plan.slides[0].kind, "body");
        assert_eq!(plan.slides[0].headline, "");
        assert!(plan.slides[0].body_text.is_none());
        assert_eq!(plan.cta_final.expect("cta").text, "");
    }

    #[test]
    fn extra_keys_survive_serialization() {
        let raw = serde_json::json!({
            "title": "Guide",
            "slides": [],
            "tone": "friendly"
        });
        let plan: PlanStructure = serde_json::from_value(raw).unwrap();
        let back = serde_json::to_value(&plan).unwrap();
        assert_eq!(back["tone"], "friendly");
    }
}
