use std::io::{self, Write};

use serde::Serialize;

use crate::app::{CountEntry, DebugResult, GenerateResult, ListResult, LocalizeResult};
use crate::domain::ArticleInfo;
use crate::enrich::CollectSummary;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_generate(result: &GenerateResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_list(result: &ListResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_info(info: &ArticleInfo) -> io::Result<()> {
        Self::print_json(info)
    }

    pub fn print_collect(summary: &CollectSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    pub fn print_localize(result: &LocalizeResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_counts(counts: &[CountEntry]) -> io::Result<()> {
        Self::print_json(counts)
    }

    pub fn print_debug(result: &DebugResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Plain console rendering of command results.
pub struct TextOutput;

impl TextOutput {
    pub fn print_generate(result: &GenerateResult) {
        println!(
            "Pages crawled: {}, articles found: {}, new: {}, in store: {}",
            result.pages, result.discovered, result.added, result.total
        );
        if let Some(summary) = &result.collect {
            Self::print_collect(summary);
        }
    }

    pub fn print_list(result: &ListResult, detailed: bool) {
        if detailed {
            for article in &result.articles {
                println!("{}", article.brand);
                println!("{}", article.name);
                println!("{}", article.url);
                println!("{}", article.media);
                println!();
            }
        }
        println!("Articles found: {}", result.articles.len());
    }

    pub fn print_info(info: &ArticleInfo) {
        println!("Material: {}", info.material);
        println!("Pattern: {}", info.pattern);
    }

    pub fn print_collect(summary: &CollectSummary) {
        println!(
            "Enriched {} articles ({} changed, {} unknown)",
            summary.processed, summary.changed, summary.unknown
        );
    }

    pub fn print_localize(result: &LocalizeResult) {
        println!(
            "Media downloaded: {}, rewritten: {}, not found: {}",
            result.downloaded, result.rewritten, result.missing
        );
    }

    pub fn print_counts(counts: &[CountEntry]) {
        for entry in counts {
            println!("{} {}", entry.value, entry.count);
        }
        println!();
    }

    pub fn print_debug(result: &DebugResult) {
        println!("{} ({} bytes)", result.url, result.bytes);
        for id in &result.blocks {
            println!("  {id}");
        }
        for path in &result.dumped {
            println!("wrote {path}");
        }
    }
}
