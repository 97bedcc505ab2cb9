//! Subcommands of the `sift` binary.
//!
//! Every command produces a JSON value; `main` prints it. Commands work on the
//! built-in job registry.

use anyhow::{anyhow, Context};
use clap::Subcommand;
use serde_json::{json, Value};
use sift_core::config::Config;
use sift_core::models::{job_registry, job_status_matcher, Job};
use sift_core::{build_query_key, ChipCompiler, ChipList, FieldRegistry, QueryPlan, QueryTranslator, RemoteCapabilities, SortOrder};
use sift_feeds::{FetchParams, PaginatedFetcher};

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Resolve free text against the job status enumeration.
    Match { input: String },

    /// List status suggestions for free text.
    Suggest {
        input: String,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Compile raw chip texts (e.g. `status:failed image pull`) into a chip list.
    Compile {
        #[arg(required = true)]
        raw: Vec<String>,
    },

    /// Print the cache key of a chip list plus toggles.
    Key {
        #[arg(long = "chip")]
        chips: Vec<String>,
        #[arg(long = "preset")]
        presets: Vec<String>,
        /// Auxiliary toggle as `name=value`.
        #[arg(long = "toggle", value_parser = parse_toggle)]
        toggles: Vec<(String, String)>,
    },

    /// Fetch one page of jobs from the remote collection.
    Page {
        #[arg(long = "chip")]
        chips: Vec<String>,
        #[arg(long = "preset")]
        presets: Vec<String>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value = "desc")]
        sort: SortOrder,
        /// Override `[fetch].base_url`.
        #[arg(long)]
        url: Option<String>,
    },
}

fn parse_toggle(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("toggle `{s}` must look like name=value"))
}

/// Run `command` and return its JSON output.
pub async fn execute(command: Command, cfg: &Config) -> anyhow::Result<Value> {
    match command {
        Command::Match { input } => Ok(serde_json::to_value(job_status_matcher().match_status(&input))?),

        Command::Suggest { input, limit } => {
            let limit = limit.unwrap_or(cfg.search.suggestion_limit);
            Ok(serde_json::to_value(job_status_matcher().suggestions(&input, limit))?)
        }

        Command::Compile { raw } => {
            let registry = job_registry();
            let chips = build_chips(&registry, cfg, &raw, &[])?;
            Ok(serde_json::to_value(&chips)?)
        }

        Command::Key { chips, presets, toggles } => {
            let registry = job_registry();
            let chips = build_chips(&registry, cfg, &chips, &presets)?;
            let key = build_query_key(&chips, toggles.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            Ok(Value::String(key))
        }

        Command::Page {
            chips,
            presets,
            offset,
            limit,
            sort,
            url,
        } => {
            let registry = job_registry();
            let chips = build_chips(&registry, cfg, &chips, &presets)?;

            let mut fetch_cfg = cfg.fetch.clone();
            if let Some(url) = url {
                fetch_cfg.base_url = url;
            }
            let fetcher = PaginatedFetcher::from_config(&fetch_cfg);
            let params = FetchParams::new(offset, limit.unwrap_or(fetch_cfg.page_size)).sort(sort);

            let translator = QueryTranslator::new(&registry);
            let (mode, page) = match translator.plan(&chips, &RemoteCapabilities::from_registry(&registry)) {
                QueryPlan::Server(filter) => {
                    let page = fetcher.fetch_page::<Job>(&params.filter(filter)).await?;
                    ("server", page)
                }
                QueryPlan::Client { predicate, params: filter } => {
                    let mut page = fetcher.fetch_page::<Job>(&params.filter(filter)).await?;
                    page.items.retain(|job| predicate.matches(job));
                    ("client", page)
                }
            };

            Ok(json!({
                "mode": mode,
                "key": build_query_key(&chips, [("sort", sort.as_str())]),
                "items": page.items,
                "has_more": page.has_more,
                "next_offset": page.next_offset,
                "error": page.error,
            }))
        }
    }
}

/// Compile raw chip texts, then toggle the named presets on top.
fn build_chips(registry: &FieldRegistry<Job>, cfg: &Config, raw: &[String], presets: &[String]) -> anyhow::Result<ChipList> {
    let compiler = ChipCompiler::new(registry).with_default_field(cfg.search.default_field.clone());
    let mut chips = ChipList::new();
    for text in raw {
        chips = compiler
            .commit(&chips, text, None)
            .with_context(|| format!("cannot compile `{text}`"))?;
    }

    if presets.is_empty() {
        return Ok(chips);
    }
    let set = cfg.validate(registry).context("invalid presets in config")?;
    for id in presets {
        let preset = set.get(id).ok_or_else(|| anyhow!("unknown preset `{id}`"))?;
        chips = preset.toggle(&chips);
    }
    Ok(chips)
}
