use clap::Parser;
use roster::api::ApiClient;
use roster::cli::{Args, Command, ListArgs};
use roster::config::Config;
use roster::logging::setup_logging;
use roster::models::{
    Academy, ClassInfo, EntityKind, Listing, Major, Payment, Score, Student, Teacher, TotalClass,
};
use roster::paging::{FetchOutcome, PageQuery, SortDirection, SortSpec};
use roster::render;
use roster::session::Session;
use roster::view::ListView;
use serde::de::DeserializeOwned;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info};
use yansi::Paint;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Config comes first so startup logs are never silently dropped
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&config, args.tracing);
    render::init_colors();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT_SHORT"),
        api_base_url = %config.api_base_url,
        "starting roster"
    );

    match run(args.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = ?e, "command failed");
            eprintln!("{}", format!("error: {e:#}").red());
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &Config) -> anyhow::Result<ExitCode> {
    let session = Session::from_config(config).await;
    let (authenticated, user) = (session.is_active().await, session.user().await);
    debug!(authenticated, user = ?user, "session ready");
    let api = ApiClient::from_config(config, session.clone())?;

    let result = dispatch(&api, command, config).await;
    session.end().await;
    result
}

async fn dispatch(api: &ApiClient, command: Command, config: &Config) -> anyhow::Result<ExitCode> {
    match command {
        Command::List(list) => {
            let kind = list.kind;
            list_kind(api, kind, |default_sort| {
                list_query(&list, config.page_size, default_sort)
            })
            .await
        }
        Command::Show { kind, id } => {
            let entity: serde_json::Value = api.fetch_one(kind, id).await?;
            render::print_entity(&entity)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Delete { kind, id } => {
            api.delete(kind, id).await?;
            info!(%kind, id, "deleted");
            list_kind(api, kind, |default_sort| {
                PageQuery::new(config.page_size, default_sort)
            })
            .await
        }
    }
}

/// Build the initial query from CLI arguments. An out-of-range page is
/// clamped by the controller once the real page count is known.
fn list_query(list: &ListArgs, default_size: u32, default_sort: SortSpec) -> PageQuery {
    let sort = match &list.sort {
        Some(field) => SortSpec::ascending(field.as_str()),
        None => default_sort,
    };
    let sort = if list.desc {
        SortSpec {
            direction: SortDirection::Desc,
            ..sort
        }
    } else {
        sort
    };

    let mut query = PageQuery::new(list.size.unwrap_or(default_size), sort);
    query.page_index = u32::try_from(list.page.max(0)).unwrap_or(u32::MAX);
    for (key, value) in &list.filters {
        query.filter.set(key, Some(value.as_str()));
    }
    query.keyword = list
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_owned);
    query
}

async fn list_kind(
    api: &ApiClient,
    kind: EntityKind,
    query: impl FnOnce(SortSpec) -> PageQuery,
) -> anyhow::Result<ExitCode> {
    match kind {
        EntityKind::Student => list_entities::<Student>(api, query).await,
        EntityKind::Teacher => list_entities::<Teacher>(api, query).await,
        EntityKind::Class => list_entities::<ClassInfo>(api, query).await,
        EntityKind::TotalClass => list_entities::<TotalClass>(api, query).await,
        EntityKind::Major => list_entities::<Major>(api, query).await,
        EntityKind::Academy => list_entities::<Academy>(api, query).await,
        EntityKind::Payment => list_entities::<Payment>(api, query).await,
        EntityKind::Score => list_entities::<Score>(api, query).await,
    }
}

async fn list_entities<T: Listing + DeserializeOwned>(
    api: &ApiClient,
    query: impl FnOnce(SortSpec) -> PageQuery,
) -> anyhow::Result<ExitCode> {
    let view = ListView::with_query(
        api.resource::<T>(T::KIND),
        Arc::new(api.clone()),
        query(T::default_sort()),
    );
    let outcome = view.load().await;
    render::print_view(&view)?;
    view.teardown();

    Ok(match outcome {
        FetchOutcome::Applied => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}
