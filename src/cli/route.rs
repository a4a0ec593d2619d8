//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::config::{BookwrightConfig, ConfigLoader};
use crate::error::ApiError;
use crate::executor::{FailurePolicy, UnitExecutor};
use crate::generator::ProviderContentGenerator;
use crate::library::{unit_statuses, BookEntry, Library};
use crate::provider::ProviderFactory;
use crate::store::FileSystemStore;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::output::EXIT_INTERRUPTED;
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_book_list, format_book_status, format_run_summary, format_validation,
};

/// Runtime context for CLI execution: workspace, loaded configuration and library.
pub struct RunContext {
    workspace_root: PathBuf,
    config: BookwrightConfig,
    library: Library,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let workspace_root = dunce::canonicalize(&workspace_root).unwrap_or(workspace_root);
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        config.ensure_valid()?;
        let library = Library::new(config.books_dir(&workspace_root));
        debug!(
            workspace = %workspace_root.display(),
            books_root = %library.root().display(),
            "Run context ready"
        );
        Ok(Self {
            workspace_root,
            config,
            library,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &BookwrightConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = match command {
            Commands::Run {
                book,
                concurrency,
                fail_fast,
            } => self.handle_run(book.as_deref(), *concurrency, *fail_fast),
            Commands::Status { book, format } => self.handle_status(book, format),
            Commands::List { format } => {
                format_book_list(&self.library.books()?, format)
            }
            Commands::Validate { book } => self.handle_validate(book),
        };
        debug!(
            command = command.name(),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn handle_validate(&self, name: &str) -> Result<String, ApiError> {
        let book = self.library.open(name)?;
        let plan = book.load_plan()?;
        plan.validate()?;
        let units = self.executor(&self.config).enumerate(&plan)?;
        Ok(format_validation(&book.name, &plan, &units))
    }

    fn handle_status(&self, name: &str, format: &str) -> Result<String, ApiError> {
        let book = self.library.open(name)?;
        let plan = book.load_plan()?;
        plan.validate()?;
        let units = self.executor(&self.config).enumerate(&plan)?;
        let store = self.store_for(&book)?;
        let statuses = unit_statuses(&units, &store);
        format_book_status(&book, &plan, &statuses, format)
    }

    fn handle_run(
        &self,
        name: Option<&str>,
        concurrency: Option<usize>,
        fail_fast: bool,
    ) -> Result<String, ApiError> {
        let book = match name {
            Some(name) => self.library.open(name)?,
            None => match self.select_book()? {
                Some(book) => book,
                None => return Ok("No books to generate.".to_string()),
            },
        };
        if book.ready {
            info!(book = %book.name, "Book is marked ready, skipping");
            return Ok(format!(
                "Book '{}' is marked ready; remove {} to generate it again.",
                book.name,
                book.dir.join(crate::library::READY_FLAG).display()
            ));
        }

        let mut config = self.config.clone();
        if let Some(concurrency) = concurrency {
            config.executor.concurrency = concurrency;
        }
        if fail_fast {
            config.executor.failure_policy = FailurePolicy::FailFast;
        }
        config.ensure_valid()?;

        let plan = book.load_plan()?;
        plan.validate()?;
        let store = self.store_for(&book)?;
        let client = ProviderFactory::create_client(&config.provider.to_model_provider()?)?;
        let generator =
            ProviderContentGenerator::new(client, config.provider.default_options.clone());
        info!(
            book = %book.name,
            provider = generator.provider_name(),
            model = generator.model_name(),
            "Starting book"
        );

        let executor = self.executor(&config);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to create runtime: {}", e)))?;
        let cancel = CancellationToken::new();
        runtime.spawn(watch_interrupts(cancel.clone()));

        let state = runtime.block_on(executor.run(&plan, &generator, &store, &cancel))?;
        if state.is_complete() {
            Ok(format_run_summary(&book.name, &state))
        } else {
            Err(ApiError::RunIncomplete {
                failed: state.failed,
                summary: format_run_summary(&book.name, &state),
            })
        }
    }

    /// Interactive choice among pending books. Non-interactive callers must name a book
    /// unless exactly one is pending.
    fn select_book(&self) -> Result<Option<BookEntry>, ApiError> {
        let mut books = self.library.pending_books()?;
        match books.len() {
            0 => return Ok(None),
            1 => return Ok(books.pop()),
            _ => {}
        }
        if !std::io::stdin().is_terminal() {
            let names: Vec<&str> = books.iter().map(|b| b.name.as_str()).collect();
            return Err(ApiError::BookNotFound(format!(
                "no book given; choose one of: {}",
                names.join(", ")
            )));
        }

        let names: Vec<&str> = books.iter().map(|b| b.name.as_str()).collect();
        let selection = dialoguer::Select::new()
            .with_prompt("Book to generate")
            .items(&names)
            .default(0)
            .interact()
            .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;
        Ok(Some(books.swap_remove(selection)))
    }

    fn executor(&self, config: &BookwrightConfig) -> UnitExecutor {
        UnitExecutor::new(config.executor.clone(), config.pricing.clone())
    }

    fn store_for(&self, book: &BookEntry) -> Result<FileSystemStore, ApiError> {
        Ok(FileSystemStore::new(&book.dir)?
            .with_min_complete_bytes(self.config.executor.min_complete_bytes))
    }
}

/// What an interrupt should do given how many were received so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterruptAction {
    Drain,
    Exit,
}

fn interrupt_action(count: usize) -> InterruptAction {
    if count <= 1 {
        InterruptAction::Drain
    } else {
        InterruptAction::Exit
    }
}

/// First Ctrl-C stops dispatch and lets in-flight units finish; a second one exits.
async fn watch_interrupts(cancel: CancellationToken) {
    let mut received = 0;
    while tokio::signal::ctrl_c().await.is_ok() {
        received += 1;
        match interrupt_action(received) {
            InterruptAction::Drain => {
                warn!("Interrupt received; finishing in-flight units, no new units will start. Press Ctrl-C again to exit now");
                cancel.cancel();
            }
            InterruptAction::Exit => {
                warn!("Second interrupt received; exiting without waiting for in-flight units");
                std::process::exit(EXIT_INTERRUPTED);
            }
        }
    }
}
