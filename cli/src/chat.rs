//! `switchyard chat`: drive a sample graph from the terminal.
//!
//! Every suspension of the human-input node becomes a prompt; the reply is fed
//! back with `resume`. With a thread id and a checkpoint directory, a
//! conversation left waiting can be picked up by a later invocation.

use std::io::Write;
use std::sync::Arc;

use config::Settings;
use switchyard::memory::{Checkpointer, FileSaver, MemorySaver, RunnableConfig};
use switchyard::samples::{
    bundled_catalog, bundled_templates, bundled_users, email_registry, product_order_registry,
    CATEGORIES_FILE, TEMPLATES_FILE, USERS_FILE,
};
use switchyard::{
    ChatOpenAI, CompiledGraph, ConversationState, LlmClient, Message, MockLlm,
    OrderBook, Outbox, ProductCatalog, RunOutcome, TemplateLibrary, UserDirectory,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::CliError;

/// Which sample graph to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Flow {
    /// Product search and ordering.
    Product,
    /// Email template search and composition.
    Email,
}

/// Reply of the `--mock` model: always hands the turn back to the user.
pub const MOCK_REPLY: &str = "(mock) Noted. What else? call: human_input_agent";

pub fn make_llm(settings: &Settings, mock: bool) -> Arc<dyn LlmClient> {
    if mock {
        return Arc::new(MockLlm::with_no_tool_calls(MOCK_REPLY));
    }
    Arc::new(
        ChatOpenAI::compatible(
            settings.llm.base_url.as_deref(),
            settings.llm.api_key.as_deref(),
            settings.llm.model.clone(),
        )
        .with_temperature(settings.llm.temperature),
    )
}

/// Builds `flow` over the assets in `settings.assets_dir` (bundled copies when
/// unset), with a checkpointer (file-backed when `checkpoint_dir` is set) and the
/// configured step limit. Other limits stay as the sample sets them.
pub async fn build_graph(
    flow: Flow,
    settings: &Settings,
    llm: Arc<dyn LlmClient>,
) -> Result<CompiledGraph, CliError> {
    let assets = settings.assets_dir.as_deref();
    let registry = match flow {
        Flow::Product => {
            let catalog = match assets {
                Some(dir) => ProductCatalog::load(dir.join(CATEGORIES_FILE))?,
                None => bundled_catalog()?,
            };
            product_order_registry(llm, Arc::new(catalog), Arc::new(OrderBook::new())).await?
        }
        Flow::Email => {
            let (templates, users) = match assets {
                Some(dir) => (
                    TemplateLibrary::load(dir.join(TEMPLATES_FILE))?,
                    UserDirectory::load(dir.join(USERS_FILE))?,
                ),
                None => (bundled_templates()?, bundled_users()?),
            };
            email_registry(
                llm,
                Arc::new(templates),
                Arc::new(users),
                Arc::new(Outbox::new()),
            )
            .await?
        }
    };
    let checkpointer: Arc<dyn Checkpointer> = match &settings.checkpoint_dir {
        Some(dir) => Arc::new(FileSaver::new(dir)),
        None => Arc::new(MemorySaver::new()),
    };
    Ok(registry
        .with_checkpointer(checkpointer)
        .with_max_steps(settings.max_steps)
        .compile()?)
}

fn is_quit_command(line: &str) -> bool {
    matches!(line.trim(), "quit" | "exit" | "/quit")
}

/// Next non-empty line; `None` on EOF or a quit command.
async fn next_user_line<R>(lines: &mut Lines<R>) -> Result<Option<String>, CliError>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if is_quit_command(&line) {
            return Ok(None);
        }
        return Ok(Some(line));
    }
    Ok(None)
}

/// Writes assistant replies from `state.messages()[from..]`; returns the new offset.
fn print_replies<W: Write>(
    state: &ConversationState,
    from: usize,
    out: &mut W,
) -> Result<usize, CliError> {
    for message in state.messages().iter().skip(from) {
        if let Message::Assistant { content, .. } = message {
            if !content.trim().is_empty() {
                writeln!(out, "{}", content.trim())?;
            }
        }
    }
    Ok(state.len())
}

/// Runs one conversation. `first` is the opening user message; without it the
/// first line of `input` is used.
///
/// Returns the last outcome, or `None` when the user quit before saying anything.
/// A run left suspended (EOF or `quit` at a prompt) stays in the checkpointer
/// under `config.thread_id`.
pub async fn run_chat<R, W>(
    graph: &CompiledGraph,
    config: RunnableConfig,
    first: Option<String>,
    input: R,
    out: &mut W,
) -> Result<Option<RunOutcome>, CliError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let first = match first {
        Some(m) => m,
        None => {
            write!(out, "> ")?;
            out.flush()?;
            match next_user_line(&mut lines).await? {
                Some(line) => line,
                None => return Ok(None),
            }
        }
    };

    let pending = match config.thread_id {
        Some(_) => graph.pending(&config).await?,
        None => None,
    };
    let (mut printed, mut outcome) = match pending {
        Some(suspension) => {
            tracing::info!(thread_id = ?config.thread_id, "resuming saved conversation");
            let printed = suspension.state.len();
            (
                printed,
                graph.resume(suspension, first, Some(config.clone())).await?,
            )
        }
        None => (
            0,
            graph
                .invoke(ConversationState::from_user(first), Some(config.clone()))
                .await?,
        ),
    };

    loop {
        printed = print_replies(outcome.state(), printed, out)?;
        let suspension = match outcome {
            RunOutcome::Completed(state) => {
                writeln!(out, "[conversation finished]")?;
                return Ok(Some(RunOutcome::Completed(state)));
            }
            RunOutcome::Suspended(s) => s,
        };
        write!(out, "{}\n> ", suspension.interrupt.prompt())?;
        out.flush()?;
        let Some(line) = next_user_line(&mut lines).await? else {
            return Ok(Some(RunOutcome::Suspended(suspension)));
        };
        outcome = graph.resume(suspension, line, Some(config.clone())).await?;
    }
}
