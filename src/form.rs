//! Form parsing for countdown-bypass submissions
//!
//! - Extracts input fields (hidden and visible) from every `<form>`
//! - Finds a named input anywhere in the document
//! - Encodes ordered field lists as application/x-www-form-urlencoded

use scraper::{Html, Selector};

/// The named inputs of one HTML form, in document order
#[derive(Debug, Clone)]
pub struct Form {
    pub fields: Vec<(String, String)>,
}

impl Form {
    /// Parse all forms from HTML
    pub fn parse_all(html: &str) -> Vec<Self> {
        let document = Html::parse_document(html);
        let (Ok(form_selector), Ok(input_selector)) =
            (Selector::parse("form"), Selector::parse("input"))
        else {
            return Vec::new();
        };

        document
            .select(&form_selector)
            .map(|form_elem| {
                let fields = form_elem
                    .select(&input_selector)
                    .filter_map(|input| {
                        let name = input.value().attr("name").filter(|n| !n.is_empty())?;
                        let value = input.value().attr("value").unwrap_or("");
                        Some((name.to_string(), value.to_string()))
                    })
                    .collect();
                Form { fields }
            })
            .collect()
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of the first `<input name=…>` with a non-empty value, inside
    /// or outside a form.
    pub fn input_value(html: &str, name: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let selector = Selector::parse(&format!("input[name=\"{name}\"]")).ok()?;
        document
            .select(&selector)
            .filter_map(|input| input.value().attr("value"))
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// Encode pairs as application/x-www-form-urlencoded, preserving order.
pub fn encode_urlencoded(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k),
                urlencoding::encode(v).replace("%20", "+")
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
