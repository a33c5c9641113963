use std::{future::IntoFuture, pin::pin, process, str::FromStr, sync::Arc, time::Duration};

use quire::{
    application::{
        blog::{BlogService, RelatedOptions},
        error::AppError,
        mapper::ContentRecordMapper,
        request_cache::RequestCache,
    },
    config::{self, PostArgs, PostsArgs},
    domain::{reading_time::WordsPerMinute, types::SortOrder},
    infra::{
        error::InfraError,
        http::{self, HttpState},
        notion::NotionClient,
        telemetry,
    },
};
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Posts(args) => run_posts(settings, args).await,
        config::Command::Post(args) => run_post(settings, args).await,
    }
}

fn build_blog_service(settings: &config::Settings) -> Result<Arc<BlogService>, AppError> {
    let source = Arc::new(NotionClient::new(&settings.notion)?);
    let estimator = Arc::new(WordsPerMinute::new(settings.blog.words_per_minute.get()));
    let mapper = ContentRecordMapper::new(settings.notion.properties.clone(), estimator);
    let related = RelatedOptions {
        strategy: settings.blog.related_strategy,
        count: settings.blog.related_count,
        seed: settings.blog.related_seed,
    };

    Ok(Arc::new(BlogService::new(source, mapper, related)))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let state = HttpState {
        blog: build_blog_service(&settings)?,
        site: Arc::new(settings.site.clone()),
        default_sort: settings.blog.default_sort,
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "listening");

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = stop_rx.await;
        })
        .into_future();
    let mut server = pin!(server);

    tokio::select! {
        result = &mut server => {
            return result.map_err(|err| AppError::unexpected(format!("server error: {err}")));
        }
        () = shutdown_signal() => {
            info!("shutdown signal received");
            let _ = stop_tx.send(());
        }
    }

    drain(server, settings.server.graceful_shutdown).await
}

async fn drain<F>(server: F, grace: Duration) -> Result<(), AppError>
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    match tokio::time::timeout(grace, server).await {
        Ok(result) => result.map_err(|err| AppError::unexpected(format!("server error: {err}"))),
        Err(_) => {
            warn!(grace_secs = grace.as_secs(), "graceful shutdown timed out");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

async fn run_posts(settings: config::Settings, args: PostsArgs) -> Result<(), AppError> {
    let sort = match args.sort.as_deref() {
        Some(raw) => SortOrder::from_str(raw)?,
        None => settings.blog.default_sort,
    };
    let blog = build_blog_service(&settings)?;
    let cache = RequestCache::new();

    let listing = blog.listing(&cache, &args.query, sort).await?;
    print_json(&listing)
}

async fn run_post(settings: config::Settings, args: PostArgs) -> Result<(), AppError> {
    let blog = build_blog_service(&settings)?;
    let cache = RequestCache::new();

    let detail = blog.post_detail(&cache, &args.slug).await?;
    print_json(&detail)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
