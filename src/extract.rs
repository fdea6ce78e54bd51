use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::error::ScoutError;

static JSON_SCRIPT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/json"][id]"#).expect("valid selector")
});

static CDATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("valid regex"));

/// JSON payloads embedded in `<script type="application/json" id="...">`
/// elements, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedData {
    blocks: BTreeMap<String, Value>,
}

impl EmbeddedData {
    pub fn from_html(html: &str) -> Self {
        Self::from_document(&Html::parse_document(html))
    }

    /// When an id repeats, only the first block counts, even if it does not
    /// decode. Blocks that do not decode are left out.
    pub fn from_document(document: &Html) -> Self {
        let mut blocks = BTreeMap::new();
        let mut seen = HashSet::new();
        for element in document.select(&JSON_SCRIPT) {
            let Some(id) = element.value().attr("id") else {
                continue;
            };
            if !seen.insert(id) {
                debug!(id, "ignoring duplicate json block");
                continue;
            }
            let text = element.text().collect::<String>();
            match serde_json::from_str::<Value>(unwrap_cdata(&text)) {
                Ok(value) => {
                    blocks.insert(id.to_string(), value);
                }
                Err(err) => debug!(id, error = %err, "skipping undecodable json block"),
            }
        }
        Self { blocks }
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.blocks.get(id)
    }

    pub fn block(&self, id: &str) -> Result<&Value, ScoutError> {
        self.get(id)
            .ok_or_else(|| ScoutError::MissingData(format!("no embedded json block `{id}`")))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.blocks.iter().map(|(id, value)| (id.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

fn unwrap_cdata(text: &str) -> &str {
    CDATA
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|payload| payload.as_str())
        .unwrap_or(text)
        .trim()
}
