use crate::core::model::CenterKind;
use crate::layers::marker::{CenterPoint, EntityMarker};
use serde_json::Value;

/// Attribute keys shown in business popups, in display order
const POPUP_FIELDS: [(&str, &str); 4] = [
    ("category", "Category"),
    ("rating", "Rating"),
    ("address", "Address"),
    ("phone", "Phone"),
];

/// Content of a marker popup, independent of how an engine draws it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PopupContent {
    pub title: String,
    pub subtitle: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl PopupContent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn for_center(center: &CenterPoint) -> Self {
        let place = match center.kind {
            CenterKind::City => "City",
            CenterKind::Country => "Country",
        };
        Self {
            title: center.label.clone(),
            subtitle: Some(place.to_string()),
            fields: vec![(
                "Businesses".to_string(),
                business_count(center.subject_count),
            )],
        }
    }

    pub fn for_entity(entity: &EntityMarker) -> Self {
        let fields = POPUP_FIELDS
            .iter()
            .filter_map(|(key, label)| {
                let value = entity.attributes.get(*key)?;
                let text = if *key == "rating" {
                    format_rating(value)?
                } else {
                    format_value(value)?
                };
                Some((label.to_string(), text))
            })
            .collect();

        Self {
            title: entity.display_name.clone(),
            subtitle: None,
            fields,
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from("<div class=\"map-popup\">");
        html.push_str(&format!(
            "<strong class=\"map-popup-title\">{}</strong>",
            escape_html(&self.title)
        ));
        if let Some(subtitle) = &self.subtitle {
            html.push_str(&format!(
                "<div class=\"map-popup-subtitle\">{}</div>",
                escape_html(subtitle)
            ));
        }
        for (label, value) in &self.fields {
            html.push_str(&format!(
                "<div class=\"map-popup-field\"><span class=\"map-popup-label\">{}:</span> {}</div>",
                escape_html(label),
                escape_html(value)
            ));
        }
        html.push_str("</div>");
        html
    }

    pub fn to_text(&self) -> String {
        let mut lines = vec![self.title.clone()];
        if let Some(subtitle) = &self.subtitle {
            lines.push(subtitle.clone());
        }
        lines.extend(
            self.fields
                .iter()
                .map(|(label, value)| format!("{}: {}", label, value)),
        );
        lines.join("\n")
    }
}

/// "1 business" / "N businesses"
pub fn business_count(count: usize) -> String {
    if count == 1 {
        "1 business".to_string()
    } else {
        format!("{} businesses", count)
    }
}

fn format_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn format_rating(value: &Value) -> Option<String> {
    let rating = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    rating
        .is_finite()
        .then(|| format!("{:.1} \u{2605}", rating))
}

pub(crate) fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;
    use serde_json::json;

    fn entity(attributes: Value) -> EntityMarker {
        EntityMarker {
            id: "1".to_string(),
            position: LatLng::new(30.0, 31.0),
            display_name: "Cafe <Riche>".to_string(),
            attributes: attributes.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_entity_popup_fields_in_fixed_order() {
        let popup = PopupContent::for_entity(&entity(json!({
            "phone": "+20 2 2391 8873",
            "rating": 4.56,
            "category": "Cafe",
            "website": "ignored",
            "address": "  "
        })));

        assert_eq!(
            popup.fields,
            vec![
                ("Category".to_string(), "Cafe".to_string()),
                ("Rating".to_string(), "4.6 \u{2605}".to_string()),
                ("Phone".to_string(), "+20 2 2391 8873".to_string()),
            ]
        );
    }

    #[test]
    fn test_html_is_escaped() {
        let html = PopupContent::for_entity(&entity(json!({}))).to_html();
        assert!(html.contains("Cafe &lt;Riche&gt;"));
        assert!(!html.contains("<Riche>"));
    }

    #[test]
    fn test_center_popup() {
        let center = CenterPoint {
            position: LatLng::new(30.0444, 31.2357),
            label: "Cairo".to_string(),
            kind: CenterKind::City,
            subject_count: 1,
        };
        let popup = PopupContent::for_center(&center);
        assert_eq!(popup.to_text(), "Cairo\nCity\nBusinesses: 1 business");
    }

    #[test]
    fn test_rating_from_string() {
        let popup = PopupContent::for_entity(&entity(json!({ "rating": "4" })));
        assert_eq!(popup.fields[0].1, "4.0 \u{2605}");
    }
}
