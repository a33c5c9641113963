//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::{
    application::{mapper::PropertyNames, seo::SiteMeta},
    domain::{
        reading_time::DEFAULT_WORDS_PER_MINUTE,
        types::{RelatedPostsStrategy, SortOrder, StatusPropertyKind},
    },
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "quire";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com/";
const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
const DEFAULT_NOTION_TIMEOUT_SECS: u64 = 15;
const DEFAULT_PUBLISHED_STATUS: &str = "Published";
const DEFAULT_RELATED_COUNT: u64 = 3;

/// Command-line arguments for the quire binary.
#[derive(Debug, Parser)]
#[command(name = "quire", version, about = "Blog content pipeline over a Notion database")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "QUIRE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP read API.
    Serve(Box<ServeArgs>),
    /// Print the filtered and sorted post listing as JSON.
    Posts(PostsArgs),
    /// Print one post with its blocks, outline and related posts as JSON.
    Post(PostArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub common: CommonOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,
}

/// Overrides shared by every command.
#[derive(Debug, Args, Default, Clone)]
pub struct CommonOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the Notion integration token.
    #[arg(long = "notion-token", value_name = "TOKEN")]
    pub notion_token: Option<String>,

    /// Override the Notion database holding the posts.
    #[arg(long = "notion-database-id", value_name = "ID")]
    pub notion_database_id: Option<String>,

    /// Override the Notion API base URL.
    #[arg(long = "notion-api-base", value_name = "URL")]
    pub notion_api_base: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct PostsArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,

    /// Search text or space-separated tags.
    #[arg(long, short = 'q', default_value = "")]
    pub query: String,

    /// Listing order (date|views); defaults to `blog.default_sort`.
    #[arg(long, value_name = "ORDER")]
    pub sort: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct PostArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,

    /// Slug of the post to show.
    #[arg(value_name = "SLUG")]
    pub slug: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub notion: NotionSettings,
    pub site: SiteMeta,
    pub blog: BlogSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct NotionSettings {
    pub api_base: Url,
    pub token: Option<String>,
    pub database_id: Option<String>,
    pub version: String,
    pub timeout: Duration,
    pub status_kind: StatusPropertyKind,
    pub published_status: String,
    pub properties: PropertyNames,
}

#[derive(Debug, Clone)]
pub struct BlogSettings {
    pub related_strategy: RelatedPostsStrategy,
    pub related_count: usize,
    pub related_seed: Option<u64>,
    pub words_per_minute: NonZeroU32,
    pub default_sort: SortOrder,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("QUIRE").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Posts(args)) => raw.apply_common_overrides(&args.overrides),
        Some(Command::Post(args)) => raw.apply_common_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    notion: RawNotionSettings,
    site: RawSiteSettings,
    blog: RawBlogSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }

        self.apply_common_overrides(&overrides.common);
    }

    fn apply_common_overrides(&mut self, overrides: &CommonOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(token) = overrides.notion_token.as_ref() {
            self.notion.token = Some(token.clone());
        }
        if let Some(id) = overrides.notion_database_id.as_ref() {
            self.notion.database_id = Some(id.clone());
        }
        if let Some(base) = overrides.notion_api_base.as_ref() {
            self.notion.api_base = Some(base.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            notion,
            site,
            blog,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            notion: build_notion_settings(notion)?,
            site: build_site_settings(site)?,
            blog: build_blog_settings(blog)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_notion_settings(notion: RawNotionSettings) -> Result<NotionSettings, LoadError> {
    let raw_base = non_blank(notion.api_base).unwrap_or_else(|| DEFAULT_NOTION_API_BASE.to_string());
    let api_base = Url::parse(&with_trailing_slash(&raw_base))
        .map_err(|err| LoadError::invalid("notion.api_base", format!("invalid url: {err}")))?;

    let timeout_secs = notion.timeout_seconds.unwrap_or(DEFAULT_NOTION_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "notion.timeout_seconds",
            "must be greater than zero",
        ));
    }

    let status_kind = match non_blank(notion.status_kind) {
        Some(kind) => StatusPropertyKind::from_str(&kind)
            .map_err(|err| LoadError::invalid("notion.status_kind", err.to_string()))?,
        None => StatusPropertyKind::default(),
    };

    let defaults = PropertyNames::default();
    let raw_props = notion.properties;
    let properties = PropertyNames {
        title: non_blank(raw_props.title).unwrap_or(defaults.title),
        slug: non_blank(raw_props.slug).unwrap_or(defaults.slug),
        author: non_blank(raw_props.author).unwrap_or(defaults.author),
        views: non_blank(raw_props.views).unwrap_or(defaults.views),
        description: non_blank(raw_props.description).unwrap_or(defaults.description),
        tags: non_blank(raw_props.tags).unwrap_or(defaults.tags),
        status: non_blank(raw_props.status).unwrap_or(defaults.status),
    };

    Ok(NotionSettings {
        api_base,
        token: non_blank(notion.token),
        database_id: non_blank(notion.database_id),
        version: non_blank(notion.version).unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string()),
        timeout: Duration::from_secs(timeout_secs),
        status_kind,
        published_status: non_blank(notion.published_status)
            .unwrap_or_else(|| DEFAULT_PUBLISHED_STATUS.to_string()),
        properties,
    })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteMeta, LoadError> {
    let defaults = SiteMeta::default();

    let url = match non_blank(site.url) {
        Some(url) => {
            Url::parse(&url)
                .map_err(|err| LoadError::invalid("site.url", format!("invalid url: {err}")))?;
            url.trim_end_matches('/').to_string()
        }
        None => defaults.url,
    };

    let og_image_endpoint = match non_blank(site.og_image_endpoint) {
        Some(endpoint) => {
            Url::parse(&endpoint).map_err(|err| {
                LoadError::invalid("site.og_image_endpoint", format!("invalid url: {err}"))
            })?;
            Some(endpoint)
        }
        None => None,
    };

    Ok(SiteMeta {
        title: non_blank(site.title).unwrap_or(defaults.title),
        site_name: non_blank(site.site_name).unwrap_or(defaults.site_name),
        description: site.description.unwrap_or(defaults.description),
        url,
        image: site.image.unwrap_or(defaults.image),
        og_image_endpoint,
        twitter_site: site.twitter_site.unwrap_or(defaults.twitter_site),
        author: site.author.unwrap_or(defaults.author),
        robots: non_blank(site.robots).unwrap_or(defaults.robots),
    })
}

fn build_blog_settings(blog: RawBlogSettings) -> Result<BlogSettings, LoadError> {
    let related_strategy = match non_blank(blog.related_strategy) {
        Some(value) => RelatedPostsStrategy::from_str(&value)
            .map_err(|err| LoadError::invalid("blog.related_strategy", err.to_string()))?,
        None => RelatedPostsStrategy::default(),
    };

    let related_count = blog.related_count.unwrap_or(DEFAULT_RELATED_COUNT);
    let related_count = usize::try_from(related_count)
        .map_err(|_| LoadError::invalid("blog.related_count", "value exceeds supported range"))?;

    let words_per_minute = non_zero_u32(
        blog.words_per_minute
            .unwrap_or(u64::from(DEFAULT_WORDS_PER_MINUTE)),
        "blog.words_per_minute",
    )?;

    let default_sort = match non_blank(blog.default_sort) {
        Some(value) => SortOrder::from_str(&value)
            .map_err(|err| LoadError::invalid("blog.default_sort", err.to_string()))?,
        None => SortOrder::default(),
    };

    Ok(BlogSettings {
        related_strategy,
        related_count,
        related_seed: blog.related_seed,
        words_per_minute,
        default_sort,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawNotionSettings {
    api_base: Option<String>,
    token: Option<String>,
    database_id: Option<String>,
    version: Option<String>,
    timeout_seconds: Option<u64>,
    status_kind: Option<String>,
    published_status: Option<String>,
    properties: RawPropertyNames,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPropertyNames {
    title: Option<String>,
    slug: Option<String>,
    author: Option<String>,
    views: Option<String>,
    description: Option<String>,
    tags: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    title: Option<String>,
    site_name: Option<String>,
    description: Option<String>,
    url: Option<String>,
    image: Option<String>,
    og_image_endpoint: Option<String>,
    twitter_site: Option<String>,
    author: Option<String>,
    robots: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBlogSettings {
    related_strategy: Option<String>,
    related_count: Option<u64>,
    related_seed: Option<u64>,
    words_per_minute: Option<u64>,
    default_sort: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn with_trailing_slash(value: &str) -> String {
    if value.ends_with('/') {
        value.to_string()
    } else {
        format!("{value}/")
    }
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
