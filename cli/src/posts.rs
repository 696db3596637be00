//! Batch conversion of a legacy content export into post records.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use blocks::Document;
use blocks::parser::{Converter, decode_entities, strip_tags};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::CliError;

/// One post of the export, as served by the legacy CMS API.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyPost {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: Rendered,
    #[serde(default)]
    pub excerpt: Rendered,
    #[serde(default)]
    pub content: Rendered,
    #[serde(default)]
    pub date_gmt: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
}

/// A post ready for the content store.
#[derive(Debug, Clone, Serialize)]
pub struct PostRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub kind: &'static str,
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub body: Document,
    pub excerpt: String,
}

/// Totals logged after a batch.
#[derive(Debug, Default)]
pub struct PostsSummary {
    pub posts: usize,
    pub empty_bodies: usize,
    pub warnings: usize,
    pub links_created: usize,
}

pub fn convert_post(post: &LegacyPost, config: &Config, summary: &mut PostsSummary) -> PostRecord {
    let conversion = Converter::new(post.content.rendered.as_str(), 0)
        .with_options(config.convert_options())
        .convert_with_warnings();
    for warning in &conversion.warnings {
        debug!(post = post.id, span = ?warning.span, "{}", warning.message);
    }

    let mut body = conversion.document;
    if config.convert.linkify {
        let (linked, report) = linkify::linkify_with_report(body);
        summary.links_created += report.links_created;
        body = linked;
    }

    let legacy_excerpt = strip_tags(&post.excerpt.rendered);
    let excerpt = if legacy_excerpt.is_empty() {
        body.excerpt(config.excerpt.max_chars).unwrap_or_default()
    } else {
        legacy_excerpt
    };

    summary.posts += 1;
    summary.warnings += conversion.warnings.len();
    if body.is_blank() {
        warn!(post = post.id, slug = %post.slug, "post body converted to an empty document");
        summary.empty_bodies += 1;
    }

    PostRecord {
        id: format!("wp-post-{}", post.id),
        kind: "post",
        title: decode_entities(&post.title.rendered).trim().to_string(),
        slug: post.slug.clone(),
        date: post.date_gmt.as_deref().map(utc_timestamp),
        body,
        excerpt,
    }
}

/// Legacy GMT dates carry no offset; mark them as UTC.
fn utc_timestamp(date: &str) -> String {
    if date.ends_with('Z') {
        date.to_string()
    } else {
        format!("{}Z", date)
    }
}

/// Convert every post of `export`, writing one JSON record per line.
pub fn run(export: &Path, output: Option<&Path>, config: &Config) -> Result<PostsSummary, CliError> {
    let text = fs::read_to_string(export).map_err(|e| CliError::read(export, e))?;
    let posts: Vec<LegacyPost> = match serde_json::from_str(&text) {
        Ok(posts) => posts,
        Err(source) => {
            return Err(CliError::Json {
                path: export.to_path_buf(),
                text,
                source,
            });
        }
    };

    let mut summary = PostsSummary::default();
    let mut lines = String::new();
    for post in &posts {
        let record = convert_post(post, config, &mut summary);
        lines.push_str(&serde_json::to_string(&record)?);
        lines.push('\n');
    }

    match output {
        Some(path) => fs::write(path, lines).map_err(|e| CliError::write(path, e))?,
        None => io::stdout()
            .lock()
            .write_all(lines.as_bytes())
            .map_err(|e| CliError::write(PathBuf::from("<stdout>"), e))?,
    }

    info!(
        posts = summary.posts,
        empty_bodies = summary.empty_bodies,
        warnings = summary.warnings,
        links_created = summary.links_created,
        "converted posts"
    );
    Ok(summary)
}
