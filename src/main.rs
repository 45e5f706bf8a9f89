use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use enhance::cli::{self, OutputFormat, PromptInput, prompts as saved, templates as tpl};
use enhance::config::{self, EnhanceConfig};
use enhance::prompts::{DEFAULT_PAGE_LIMIT, NewPrompt, PromptQuery, PromptUpdate};
use enhance::templates::{NewTemplate, SearchQuery, SortField, SortOrder, TemplateUpdate};
use enhance::{logging, web};

#[derive(Debug, Parser)]
#[command(name = "enhance")]
#[command(about = "Score, improve, and track the quality of LLM prompts")]
#[command(version)]
struct App {
    /// Verbose diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Prompt source shared by `analyze` and `optimize`.
#[derive(Debug, Args)]
struct PromptArgs {
    /// Prompt text; reads stdin when omitted or `-`
    text: Option<String>,
    /// Read the prompt from a file
    #[arg(short, long, conflicts_with = "text")]
    file: Option<PathBuf>,
    /// Label stored in history (default: first line of the prompt)
    #[arg(long)]
    name: Option<String>,
    /// Use the configured LLM in addition to the rule-based scorer
    #[arg(long)]
    ai: bool,
    /// Do not record this analysis in history
    #[arg(long)]
    no_save: bool,
    /// Output format: table (default), json, csv
    #[arg(long, default_value = "table")]
    format: String,
}

impl PromptArgs {
    fn input(&self) -> PromptInput {
        PromptInput {
            text: self.text.clone(),
            file: self.file.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Score a prompt across six quality dimensions
    Analyze(PromptArgs),
    /// Analyze a prompt and suggest prioritised improvements
    Optimize(PromptArgs),
    /// Trend statistics and forecast for one score metric
    Trends {
        /// Metric to chart
        #[arg(long, default_value = "overall_score")]
        metric: String,
        /// Look-back window in days (default from config)
        #[arg(long)]
        days: Option<u32>,
        /// Skip the linear forecast
        #[arg(long)]
        no_forecast: bool,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Rank analyzed prompts by their mean score
    Compare {
        /// Comma-separated metrics (default from config)
        #[arg(long, value_delimiter = ',')]
        metrics: Option<Vec<String>>,
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Export score history as CSV
    Export {
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List recorded analyses
    History {
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
        /// Show at most N entries
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage the prompt template library
    #[command(subcommand)]
    Template(TemplateCommands),
    /// Save prompts and track their scores over time
    #[command(subcommand)]
    Prompt(PromptCommands),
    /// Show or edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Check config, data files, and the LLM backend
    Health,
    /// Serve the web dashboard
    Web {
        /// Listen address (default from config)
        #[arg(long)]
        addr: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum TemplateCommands {
    /// Search and list templates
    List {
        /// Text to match in name, description, or content
        #[arg(short, long)]
        query: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Required tags, comma-separated
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Only featured templates
        #[arg(long)]
        featured: bool,
        /// created_at, updated_at, rating, usage_count, name
        #[arg(long, default_value = "created_at")]
        sort: SortField,
        /// asc or desc
        #[arg(long, default_value = "desc")]
        order: SortOrder,
        #[arg(long, default_value = "1")]
        page: usize,
        /// Page size (default from config)
        #[arg(long, default_value = "0")]
        page_size: usize,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show one template by id or name
    Show {
        template: String,
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Add a template
    Add {
        name: String,
        /// Template body with {{variable}} placeholders
        #[arg(short, long, required_unless_present = "file")]
        content: Option<String>,
        /// Read the body from a file
        #[arg(short, long, conflicts_with = "content")]
        file: Option<PathBuf>,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        #[arg(long)]
        featured: bool,
        /// Hide from public listings
        #[arg(long)]
        private: bool,
    },
    /// Edit fields of an existing template
    Edit {
        template: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Replace tags, comma-separated
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        #[arg(long)]
        featured: Option<bool>,
        #[arg(long)]
        public: Option<bool>,
    },
    /// Fill placeholders and print the prompt
    Render {
        template: String,
        /// Values as key=value
        #[arg(value_name = "KEY=VALUE")]
        values: Vec<String>,
    },
    /// Rate a template from 1 to 5
    Rate {
        template: String,
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,
        #[arg(long)]
        comment: Option<String>,
        /// Rating author (default: $USER)
        #[arg(long)]
        user: Option<String>,
    },
    /// Delete a template
    Delete { template: String },
    /// List categories with template counts
    Categories {
        #[arg(long, default_value = "table")]
        format: String,
    },
}

#[derive(Debug, Subcommand)]
enum PromptCommands {
    /// List saved prompts, newest first
    List {
        /// Text to match in title or content
        #[arg(short, long)]
        query: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Number of prompts to skip
        #[arg(long, default_value = "0")]
        skip: usize,
        /// Prompts per page, at most 100
        #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: usize,
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show a saved prompt and its latest score
    Show {
        /// Id or title
        prompt: String,
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Save a prompt
    Add {
        /// Prompt text; reads stdin when omitted or `-`
        text: Option<String>,
        /// Read the prompt from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Mark as a template candidate
        #[arg(long)]
        template: bool,
        #[arg(long)]
        public: bool,
    },
    /// Edit fields of a saved prompt
    Edit {
        prompt: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Replace tags, comma-separated
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        #[arg(long)]
        template: Option<bool>,
        #[arg(long)]
        public: Option<bool>,
    },
    /// Delete a saved prompt; its analyses stay in history
    Delete { prompt: String },
    /// Score a saved prompt and record it against the prompt
    Analyze {
        prompt: String,
        /// Use the configured LLM in addition to the rule-based scorer
        #[arg(long)]
        ai: bool,
        /// Do not record this analysis in history
        #[arg(long)]
        no_save: bool,
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Score history of one saved prompt
    History {
        prompt: String,
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List categories with prompt counts
    Categories {
        #[arg(long, default_value = "table")]
        format: String,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write a default config to ~/.enhance/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `llm.model qwen2.5:7b`
    Set { key: String, value: String },
    /// Restore the default config file
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let cfg = config::load();
    logging::init(&cfg.logging, app.verbose)?;

    match app.command {
        Commands::Analyze(args) => {
            let cfg = with_ai(cfg, args.ai);
            let fmt = OutputFormat::from_str_opt(Some(&args.format));
            cli::run_analyze(&cfg, &args.input(), !args.no_save, fmt)
        }
        Commands::Optimize(args) => {
            let cfg = with_ai(cfg, args.ai);
            let fmt = OutputFormat::from_str_opt(Some(&args.format));
            cli::run_optimize(&cfg, &args.input(), !args.no_save, fmt)
        }
        Commands::Trends {
            metric,
            days,
            no_forecast,
            format,
        } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_trends(&cfg, &metric, days, !no_forecast, fmt)
        }
        Commands::Compare {
            metrics,
            days,
            format,
        } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_compare(&cfg, metrics, days, fmt)
        }
        Commands::Export { days, output } => cli::run_export(&cfg, days, output.as_deref()),
        Commands::History {
            days,
            limit,
            format,
        } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_history(&cfg, days, limit, fmt)
        }
        Commands::Template(cmd) => run_template(&cfg, cmd),
        Commands::Prompt(cmd) => run_prompt(cfg, cmd),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => cli::run_config_show(),
            ConfigCommands::Init { force } => cli::run_config_init(force),
            ConfigCommands::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigCommands::Reset => cli::run_config_reset(),
        },
        Commands::Health => cli::run_health(&cfg),
        Commands::Web { addr } => {
            let addr = addr.unwrap_or_else(|| cfg.web.addr.clone());
            web::serve(web::WebState::from_config(cfg)?, &addr)
        }
    }
}

/// `--ai` turns on both the backend and its use for this run.
fn with_ai(mut cfg: EnhanceConfig, ai: bool) -> EnhanceConfig {
    if ai {
        cfg.llm.enabled = true;
        cfg.analysis.use_ai = true;
    }
    cfg
}

fn run_template(cfg: &EnhanceConfig, cmd: TemplateCommands) -> Result<()> {
    match cmd {
        TemplateCommands::List {
            query,
            category,
            tags,
            featured,
            sort,
            order,
            page,
            page_size,
            format,
        } => {
            let query = SearchQuery {
                text: query,
                category,
                tags,
                featured: featured.then_some(true),
                sort_by: sort,
                sort_order: order,
                page,
                page_size,
            };
            tpl::run_template_list(cfg, query, OutputFormat::from_str_opt(Some(&format)))
        }
        TemplateCommands::Show { template, format } => {
            tpl::run_template_show(cfg, &template, OutputFormat::from_str_opt(Some(&format)))
        }
        TemplateCommands::Add {
            name,
            content,
            file,
            description,
            category,
            tags,
            featured,
            private,
        } => {
            let content = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read template file {}", path.display()))?,
                None => content.unwrap_or_default(),
            };
            tpl::run_template_add(
                cfg,
                NewTemplate {
                    name,
                    description,
                    content,
                    category,
                    tags,
                    is_featured: featured,
                    is_public: Some(!private),
                },
            )
        }
        TemplateCommands::Edit {
            template,
            name,
            content,
            description,
            category,
            tags,
            featured,
            public,
        } => tpl::run_template_update(
            cfg,
            &template,
            TemplateUpdate {
                name,
                description,
                content,
                category,
                tags,
                is_featured: featured,
                is_public: public,
            },
        ),
        TemplateCommands::Render { template, values } => {
            tpl::run_template_render(cfg, &template, &values)
        }
        TemplateCommands::Rate {
            template,
            rating,
            comment,
            user,
        } => tpl::run_template_rate(cfg, &template, rating, comment, user),
        TemplateCommands::Delete { template } => tpl::run_template_delete(cfg, &template),
        TemplateCommands::Categories { format } => {
            tpl::run_template_categories(cfg, OutputFormat::from_str_opt(Some(&format)))
        }
    }
}

fn run_prompt(cfg: EnhanceConfig, cmd: PromptCommands) -> Result<()> {
    match cmd {
        PromptCommands::List {
            query,
            category,
            skip,
            limit,
            format,
        } => {
            let query = PromptQuery {
                text: query,
                category,
                skip,
                limit,
            };
            saved::run_prompt_list(&cfg, query, OutputFormat::from_str_opt(Some(&format)))
        }
        PromptCommands::Show { prompt, format } => {
            saved::run_prompt_show(&cfg, &prompt, OutputFormat::from_str_opt(Some(&format)))
        }
        PromptCommands::Add {
            text,
            file,
            title,
            category,
            tags,
            template,
            public,
        } => {
            let content = PromptInput {
                text,
                file,
                name: None,
            }
            .read()?;
            saved::run_prompt_add(
                &cfg,
                NewPrompt {
                    title,
                    content,
                    category,
                    tags,
                    is_template: template,
                    is_public: public,
                },
            )
        }
        PromptCommands::Edit {
            prompt,
            title,
            content,
            category,
            tags,
            template,
            public,
        } => saved::run_prompt_update(
            &cfg,
            &prompt,
            PromptUpdate {
                title,
                content,
                category,
                tags,
                is_template: template,
                is_public: public,
            },
        ),
        PromptCommands::Delete { prompt } => saved::run_prompt_delete(&cfg, &prompt),
        PromptCommands::Analyze {
            prompt,
            ai,
            no_save,
            format,
        } => {
            let cfg = with_ai(cfg, ai);
            let fmt = OutputFormat::from_str_opt(Some(&format));
            saved::run_prompt_analyze(&cfg, &prompt, !no_save, fmt)
        }
        PromptCommands::History { prompt, format } => {
            saved::run_prompt_history(&cfg, &prompt, OutputFormat::from_str_opt(Some(&format)))
        }
        PromptCommands::Categories { format } => {
            saved::run_prompt_categories(&cfg, OutputFormat::from_str_opt(Some(&format)))
        }
    }
}
