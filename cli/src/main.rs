//! Switchyard CLI binary: chat with the sample agent graphs, run document
//! ingestion, inspect tools.
//!
//! Subcommands: `chat` (product or email flow), `ingest`, `tool` (list/show tools).

mod logging;

use clap::{Parser, Subcommand};
use cli::{
    all_tools, build_graph, format_report, format_tool_show, format_tools_list, make_llm,
    run_chat, run_ingest, Flow, IngestRequest, ToolShowFormat,
};
use switchyard::memory::RunnableConfig;

#[derive(Parser, Debug)]
#[command(name = "switchyard")]
#[command(about = "Switchyard: agent-routing graphs and document ingestion")]
struct Args {
    #[command(subcommand)]
    cmd: Command,

    /// Verbose: debug logs for graph execution (to LOG_FILE or stderr)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Chat with a sample graph; the conversation pauses whenever an agent asks the user
    Chat(ChatArgs),
    /// Convert, move and index the documents waiting in the incoming container
    Ingest(IngestArgs),
    /// List or show tool definitions
    Tool(ToolArgs),
}

#[derive(clap::Args, Debug, Clone)]
struct ChatArgs {
    /// Sample graph to run
    #[arg(long, value_enum, default_value = "product")]
    flow: Flow,

    /// Opening user message (prompted for when omitted)
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,

    /// Use a scripted model instead of the configured endpoint
    #[arg(long)]
    mock: bool,

    /// Thread ID; with SWITCHYARD_CHECKPOINT_DIR a waiting conversation is continued
    #[arg(long, value_name = "ID")]
    thread_id: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
struct IngestArgs {
    /// Index chunks of MAX_TOKENS words instead of whole documents
    #[arg(long)]
    chunking: bool,

    /// Upload the converted output next to the processed documents
    #[arg(long)]
    upload_results: bool,

    /// Embed locally (hashing) even when an OpenAI endpoint is configured
    #[arg(long)]
    local_embeddings: bool,

    /// Search the new index after ingestion
    #[arg(short, long, value_name = "TEXT")]
    query: Option<String>,

    /// Number of matches printed for --query
    #[arg(short = 'k', long, default_value_t = 3)]
    top_k: usize,
}

#[derive(clap::Args, Debug, Clone)]
struct ToolArgs {
    #[command(subcommand)]
    sub: ToolCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum ToolCommand {
    /// List all tools (name and description)
    List {
        /// Output a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Show full definition of one tool (name, description, input_schema)
    Show {
        /// Tool name (e.g. product_search, send_email)
        name: String,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = config::load_and_apply("switchyard", None) {
        eprintln!("switchyard: ignoring config: {}", e);
    }
    let args = Args::parse();
    let _log_guard = logging::init(args.verbose)?;
    let settings = config::Settings::from_env()?;

    match args.cmd {
        Command::Tool(ta) => {
            let specs = all_tools()?.specs();
            match ta.sub {
                ToolCommand::List { json } => print!("{}", format_tools_list(&specs, json)?),
                ToolCommand::Show { name, json } => {
                    let format = if json {
                        ToolShowFormat::Json
                    } else {
                        ToolShowFormat::Text
                    };
                    match format_tool_show(&specs, &name, format)? {
                        Some(text) => println!("{}", text),
                        None => {
                            eprintln!("tool not found: {}", name);
                            std::process::exit(1);
                        }
                    }
                }
            }
        }
        Command::Ingest(ia) => {
            let request = IngestRequest {
                chunking: ia.chunking,
                upload_results: ia.upload_results,
                local_embeddings: ia.local_embeddings,
                query: ia.query,
                top_k: ia.top_k,
            };
            let (report, hits) = run_ingest(&settings, &request).await?;
            print!("{}", format_report(&report, &hits));
            if !report.failed.is_empty() {
                std::process::exit(2);
            }
        }
        Command::Chat(ca) => {
            let graph = build_graph(ca.flow, &settings, make_llm(&settings, ca.mock)).await?;
            let thread_id = ca
                .thread_id
                .unwrap_or_else(|| format!("thread-{}", uuid::Uuid::new_v4().simple()));
            let config = RunnableConfig::default().with_thread_id(thread_id.clone());
            let mut stdout = std::io::stdout();
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            if let Some(outcome) = run_chat(&graph, config, ca.message, stdin, &mut stdout).await? {
                if outcome.is_suspended() {
                    eprintln!("conversation paused (thread {})", thread_id);
                }
            }
        }
    }
    Ok(())
}
