//! `eswrap search`: paged search printing one JSON line per hit

use anyhow::{bail, Context, Result};
use eswrap_client::{EsClient, Hit, SearchResponse, TypedSortSearchResponse};
use eswrap_core::{SortSchema, SortValues};
use serde::Serialize;
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Arguments of one search run
#[derive(Debug, Clone)]
pub struct SearchArgs {
    pub index: String,
    pub body: Value,
    pub size: u64,
    pub sort_schema: Option<SortSchema>,
    pub pages: usize,
}

/// Reads a JSON search body from `path`, or matches everything
pub fn read_body(path: Option<&Path>) -> Result<Value> {
    let Some(path) = path else {
        return Ok(json!({ "query": { "match_all": {} } }));
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read search body {}", path.display()))?;
    let body: Value = serde_json::from_str(&text)
        .with_context(|| format!("Search body {} is not valid JSON", path.display()))?;
    if !body.is_object() {
        bail!("Search body {} must be a JSON object", path.display());
    }
    Ok(body)
}

fn hit_line<S: Serialize>(hit: Hit<Value, S>) -> Value {
    json!({
        "_index": hit.index,
        "_id": hit.id,
        "_score": hit.score,
        "_source": hit.source,
        "sort": hit.sort,
    })
}

/// One page of hits and the cursor for the next one
async fn fetch_page(
    client: &EsClient,
    args: &SearchArgs,
    cursor: Option<&SortValues>,
) -> Result<(Vec<Value>, Option<SortValues>)> {
    match &args.sort_schema {
        None => {
            let response: SearchResponse<Value> = client
                .search_paginated(&args.index, &args.body, args.size, cursor, None)
                .await
                .with_context(|| format!("Search on '{}' failed", args.index))?;
            let next = response.last_sort().cloned();
            let lines = response.hits.hits.into_iter().map(hit_line).collect();
            Ok((lines, next))
        }
        Some(schema) => {
            let response: TypedSortSearchResponse<Value> = client
                .search_paginated(&args.index, &args.body, args.size, cursor, None)
                .await
                .with_context(|| format!("Search on '{}' failed", args.index))?;
            let next = response
                .last_sort_typed(schema)
                .context("Failed to decode hit sort values")?;
            let lines = response.hits.hits.into_iter().map(hit_line).collect();
            Ok((lines, next))
        }
    }
}

/// Runs up to `args.pages` pages, following `search_after` cursors
///
/// Returns the number of hits written. Stops early on a short page or a hit
/// without sort values.
pub async fn run_search<W: Write>(client: &EsClient, args: &SearchArgs, out: &mut W) -> Result<usize> {
    if args.pages > 1 && args.body.get("sort").is_none() {
        bail!("Paging past the first page requires a \"sort\" in the search body");
    }

    let mut cursor: Option<SortValues> = None;
    let mut written = 0;
    for page in 1..=args.pages.max(1) {
        let (lines, next) = fetch_page(client, args, cursor.as_ref()).await?;
        debug!("Page {page}: {} hits", lines.len());

        let short_page = (lines.len() as u64) < args.size;
        for line in &lines {
            writeln!(out, "{line}")?;
        }
        written += lines.len();

        match next {
            Some(next) if !short_page => cursor = Some(next),
            _ => break,
        }
    }

    info!("Printed {written} hits from '{}'", args.index);
    Ok(written)
}
