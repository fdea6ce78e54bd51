use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Serialize;

use crate::domain::Article;
use crate::error::ScoutError;
use crate::material::parse_percentage;

/// Predicates applied to enriched articles. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    /// Exact pattern, compared case-insensitively.
    pub pattern: Option<String>,
    /// Material that must appear in the composition, at any share.
    pub material: Option<String>,
}

impl ReportFilter {
    pub fn matches(&self, article: &Article) -> bool {
        let Some(info) = &article.info else {
            return false;
        };
        let pattern_ok = self
            .pattern
            .as_deref()
            .is_none_or(|pattern| info.pattern.to_lowercase() == pattern.to_lowercase());
        let material_ok = self
            .material
            .as_deref()
            .is_none_or(|material| info.material.contains(material));
        pattern_ok && material_ok
    }
}

/// Keeps enriched articles that satisfy every predicate, in store order.
pub fn filter<'a>(articles: &'a [Article], predicates: &ReportFilter) -> Vec<&'a Article> {
    articles
        .iter()
        .filter(|article| predicates.matches(article))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct Group<'a> {
    /// Empty when no grouping was requested.
    pub label: String,
    pub articles: Vec<&'a Article>,
}

/// Without a material, one unlabeled group in input order. With one,
/// groups per share of that material, highest share first; ties keep input
/// order. Every article must list the material.
pub fn group<'a>(
    articles: Vec<&'a Article>,
    material: Option<&str>,
) -> Result<Vec<Group<'a>>, ScoutError> {
    let Some(material) = material else {
        return Ok(vec![Group {
            label: String::new(),
            articles,
        }]);
    };

    let mut keyed = articles
        .into_iter()
        .map(|article| Ok((share_of(article, material)?, article)))
        .collect::<Result<Vec<_>, ScoutError>>()?;
    keyed.sort_by(|(left, _), (right, _)| right.cmp(left));

    let mut groups: Vec<(u32, Group<'a>)> = Vec::new();
    for (share, article) in keyed {
        match groups.last_mut() {
            Some((current, group)) if *current == share => group.articles.push(article),
            _ => groups.push((
                share,
                Group {
                    label: format!("{share}% {material}"),
                    articles: vec![article],
                },
            )),
        }
    }
    Ok(groups.into_iter().map(|(_, group)| group).collect())
}

fn share_of(article: &Article, material: &str) -> Result<u32, ScoutError> {
    let share = article
        .info
        .as_ref()
        .and_then(|info| info.material.get(material))
        .ok_or_else(|| ScoutError::MissingGroupAttribute {
            material: material.to_string(),
            url: article.url.clone(),
        })?;
    parse_percentage(share)
        .ok_or_else(|| ScoutError::InvalidPercentage(format!("{share} ({})", article.url)))
}

/// Rows of exactly `width` slots; the last row is padded with `None`.
pub fn paginate<T: Copy>(items: &[T], width: usize) -> Vec<Vec<Option<T>>> {
    let width = width.max(1);
    items
        .chunks(width)
        .map(|chunk| {
            let mut row: Vec<Option<T>> = chunk.iter().copied().map(Some).collect();
            row.resize(width, None);
            row
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Text,
    Html,
}

pub fn render(groups: &[Group<'_>], width: usize, format: ReportFormat) -> String {
    match format {
        ReportFormat::Text => render_text(groups, width),
        ReportFormat::Html => render_html(groups, width),
    }
}

pub fn render_text(groups: &[Group<'_>], width: usize) -> String {
    let mut out = String::new();
    for group in groups {
        let _ = writeln!(out, "{}", group.label);
        for row in paginate(&group.articles, width) {
            for article in row.into_iter().flatten() {
                let _ = writeln!(out, "  {} {}", article.brand, article.name);
            }
            out.push('\n');
        }
    }
    out
}

const HTML_HEAD: &str = r#"<!doctype html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1, shrink-to-fit=no">
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@4.5.3/dist/css/bootstrap.min.css">
    <title>Fabric report</title>
</head>
<body>
    <div class="container">
"#;

const HTML_TAIL: &str = r#"    </div>
</body>
</html>
"#;

pub fn render_html(groups: &[Group<'_>], width: usize) -> String {
    let mut out = String::from(HTML_HEAD);
    for group in groups {
        let _ = writeln!(out, "        <h3>{}</h3>", encode_text(&group.label));
        for row in paginate(&group.articles, width) {
            out.push_str("        <div class=\"row\">\n");
            for slot in row {
                out.push_str("            <div class=\"col-sm\">\n");
                if let Some(article) = slot {
                    write_card(&mut out, article);
                }
                out.push_str("            </div>\n");
            }
            out.push_str("        </div>\n");
        }
    }
    out.push_str(HTML_TAIL);
    out
}

fn write_card(out: &mut String, article: &Article) {
    let _ = writeln!(out, "                <div class=\"card\">");
    let _ = writeln!(
        out,
        "                    <img src=\"{}\" class=\"card-img-top\">",
        encode_double_quoted_attribute(&article.media)
    );
    let _ = writeln!(out, "                    <div class=\"card-body\">");
    let _ = writeln!(
        out,
        "                        <h5 class=\"card-title\">{}</h5>",
        encode_text(&article.brand)
    );
    let _ = writeln!(
        out,
        "                        <p class=\"card-text\">{}</p>",
        encode_text(&article.name)
    );
    let _ = writeln!(
        out,
        "                        <a href=\"{}\" class=\"btn btn-primary\">Go</a>",
        encode_double_quoted_attribute(&article.url)
    );
    let _ = writeln!(out, "                    </div>");
    let _ = writeln!(out, "                </div>");
}
