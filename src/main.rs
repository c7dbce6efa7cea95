//! # Sites Dev Server CLI (`scs-dev`)
//!
//! ## Usage
//!
//! ```bash
//! scs-dev --config ./config/scs.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scs-dev serve` | Start the content HTTP server |
//! | `scs-dev query <set>` | Run a collection query and print the envelope |
//! | `scs-dev get <set> <id>...` | Fetch items by id or slug |
//! | `scs-dev sets` | List content sets found in the project |
//!
//! ## Examples
//!
//! ```bash
//! # News items, newest first
//! scs-dev query Blog --q 'type eq "News"' --order-by updatedDate:des
//!
//! # French variant of an item
//! scs-dev get Blog CORE1234 --language fr-FR
//!
//! # Several items at once
//! scs-dev get Blog CORE1 CORE2 --bulk
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sites_devserver::config::{self, Config};
use sites_devserver::content::{get_items, query_items};
use sites_devserver::context::RequestContext;
use sites_devserver::{server, sets};
use sites_query_core::query::ItemQuery;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Local development server for Sites content.
///
/// Serves the content REST API from exported content on disk.
#[derive(Parser)]
#[command(name = "scs-dev", about = "Local Sites content delivery API", version)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/scs.toml`. When the file does not exist the
    /// built-in defaults are used.
    #[arg(long, global = true, default_value = "./config/scs.toml")]
    config: PathBuf,

    /// Log at debug level. `RUST_LOG` takes precedence when set.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the content HTTP server.
    Serve {
        /// Override `[server].bind`.
        #[arg(long)]
        bind: Option<String>,

        /// Override `[server].default_template`.
        #[arg(long)]
        template: Option<String>,
    },

    /// Run a collection query against a content set.
    Query {
        /// Template or content set name.
        content_set: String,

        /// Filter expression, e.g. `type eq "News" and language eq "en-US"`.
        #[arg(long)]
        q: Option<String>,

        #[arg(long)]
        content_type: Option<String>,

        /// Comma-separated field projection, or `ALL`.
        #[arg(long)]
        fields: Option<String>,

        /// `name`, `updatedDate`, or `fields.<name>`, optionally `:asc` / `:des`.
        #[arg(long)]
        order_by: Option<String>,

        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        offset: Option<usize>,

        /// Free-text search over each item.
        #[arg(long)]
        default: Option<String>,
    },

    /// Fetch items by id or slug.
    Get {
        /// Template or content set name.
        content_set: String,

        #[arg(required = true)]
        ids: Vec<String>,

        /// Return the variant in this language.
        #[arg(long)]
        language: Option<String>,

        /// Return every found item keyed by id.
        #[arg(long)]
        bulk: bool,
    },

    /// List content sets in the project.
    Sets,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut cfg = load_or_default(&cli.config)?;

    match cli.command {
        Commands::Serve { bind, template } => {
            if let Some(bind) = bind {
                cfg.server.bind = bind;
            }
            if template.is_some() {
                cfg.server.default_template = template;
            }
            server::run_server(&cfg).await?;
        }
        Commands::Query {
            content_set,
            q,
            content_type,
            fields,
            order_by,
            limit,
            offset,
            default,
        } => {
            let ctx = RequestContext::for_content_set(&cfg, &content_set);
            let mut params: Vec<(&str, String)> = Vec::new();
            if let Some(q) = q {
                params.push(("q", q));
            }
            if let Some(content_type) = content_type {
                params.push(("contentType", content_type));
            }
            if let Some(fields) = fields {
                params.push(("fields", fields));
            }
            if let Some(order_by) = order_by {
                params.push(("orderBy", order_by));
            }
            if let Some(limit) = limit {
                params.push(("limit", limit.to_string()));
            }
            if let Some(offset) = offset {
                params.push(("offset", offset.to_string()));
            }
            if let Some(default) = default {
                params.push(("default", default));
            }

            let query = ItemQuery::from_pairs(params, ctx.default_limit);
            let response = query_items(&ctx, &query).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Get {
            content_set,
            ids,
            language,
            bulk,
        } => {
            let ctx = RequestContext::for_content_set(&cfg, &content_set);
            let lookup = get_items(&ctx, &ids, language.as_deref(), bulk).await?;
            match lookup.into_json() {
                Some(body) => println!("{}", serde_json::to_string_pretty(&body)?),
                None => println!("No item found."),
            }
        }
        Commands::Sets => {
            sets::list_sets(&cfg)?;
        }
    }

    Ok(())
}

/// Load `path`, or fall back to defaults when it does not exist.
fn load_or_default(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        info!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}
