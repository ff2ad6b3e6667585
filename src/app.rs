use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tokio::runtime::Builder as TokioRuntimeBuilder;
use tracing::{debug, error, info};

use folderview::source::{LocalFiles, MediaQuery};
use folderview::{
    ContentEvent, ContentLoader, Library, LoaderConfig, MediaType, MessageBus, NavigationTarget,
    Navigator, VisibleItem,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QueryKind {
    Videos,
    Music,
    Pictures,
}

impl QueryKind {
    fn media_type(self) -> MediaType {
        match self {
            Self::Videos => MediaType::Video,
            Self::Music => MediaType::Audio,
            Self::Pictures => MediaType::Image,
        }
    }
}

/// List a folder, a breadcrumb trail, a library or a saved media query.
#[derive(Debug, Parser)]
#[command(name = "folderview", version)]
pub struct Args {
    /// One folder, or several forming a breadcrumb trail (last one is listed).
    pub paths: Vec<PathBuf>,

    /// Treat the paths as the folders of a library with this name.
    #[arg(long, conflicts_with = "query")]
    pub library: Option<String>,

    /// List every file of this kind below the single given path.
    #[arg(long, value_enum)]
    pub query: Option<QueryKind>,

    /// Entries requested per fetch.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Milliseconds before the loading indicator is shown.
    #[arg(long)]
    pub loading_delay_ms: Option<u64>,

    /// Include dot-files and dot-folders.
    #[arg(long)]
    pub show_hidden: bool,
}

/// Logs drill-down requests; the command line has nowhere to navigate to.
struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, breadcrumbs: Vec<PathBuf>) {
        info!(?breadcrumbs, "Navigate");
    }
}

pub struct FolderViewApp {
    args: Args,
}

impl FolderViewApp {
    pub fn new(args: Args) -> Self {
        Self { args }
    }

    pub fn run(&self) -> i32 {
        match self.run_inner() {
            Ok(()) => 0,
            Err(e) => {
                error!("{:#}", e);
                1
            }
        }
    }

    fn run_inner(&self) -> Result<()> {
        let config = self.config();
        let target = self.target(&config)?;

        let runtime = TokioRuntimeBuilder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;

        runtime.block_on(async {
            let bus = MessageBus::new();
            let loader = ContentLoader::builder(Arc::new(
                LocalFiles::new().with_hidden(config.show_hidden),
            ))
            .navigator(Arc::new(LogNavigator))
            .bus(bus.clone())
            .config(config)
            .build();
            let listener = loader.listen(&bus);

            let events = loader.subscribe();
            let progress = tokio::spawn(async move {
                while let Ok(event) = events.recv_async().await {
                    match event {
                        ContentEvent::LoadingChanged(true) => info!("Loading..."),
                        other => debug!(?other, "Content event"),
                    }
                }
            });

            loader.activate(target).await;
            Self::print(&loader);

            loader.deactivate();
            listener.abort();
            drop(loader);
            let _ = progress.await;
        });
        Ok(())
    }

    fn config(&self) -> LoaderConfig {
        let mut config = LoaderConfig::load();
        if let Some(batch_size) = self.args.batch_size {
            config = config.with_batch_size(batch_size);
        }
        if let Some(delay_ms) = self.args.loading_delay_ms {
            config.loading_delay_ms = delay_ms;
        }
        config.show_hidden |= self.args.show_hidden;
        config
    }

    fn target(&self, config: &LoaderConfig) -> Result<NavigationTarget> {
        let mut paths = self.args.paths.clone();
        if paths.is_empty() {
            paths.push(std::env::current_dir().context("Failed to read current directory")?);
        }

        if let Some(kind) = self.args.query {
            if paths.len() != 1 {
                bail!("--query takes exactly one root folder");
            }
            let query = MediaQuery::new(paths.remove(0), kind.media_type())
                .with_max_depth(config.recursive_query_depth)
                .with_hidden(config.show_hidden);
            return Ok(NavigationTarget::Query(Arc::new(query)));
        }

        if let Some(name) = &self.args.library {
            return Ok(NavigationTarget::Library(Library::new(name.clone(), paths)));
        }

        Ok(match paths.len() {
            1 => NavigationTarget::Folder(paths.remove(0)),
            _ => NavigationTarget::Breadcrumbs(paths),
        })
    }

    fn print(loader: &ContentLoader) {
        let items = loader.items();
        for item in &items {
            println!("{}", Self::row(item));
        }

        if loader.is_empty() {
            println!("(empty)");
        }
        println!(
            "> {} items, {} playable",
            items.len(),
            loader.playable_items().len()
        );
    }

    fn row(item: &VisibleItem) -> String {
        let tag = match &item.media {
            _ if item.is_folder() => "dir",
            Some(media) if media.is_video() => "video",
            Some(_) => "audio",
            None => "file",
        };
        match item.caption() {
            Some(caption) => format!("{:>4} [{:5}] {}  ({})", item.position, tag, item.name(), caption),
            None => format!("{:>4} [{:5}] {}", item.position, tag, item.name()),
        }
    }
}
