use std::fs::OpenOptions;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use devtools_ext::overlay::{OnClose, RenderContext};
use devtools_ext::{
    util, Component, Config, Database, HostDocument, MemoryDocument, OverlayManager, OverlayProps,
    RenderError, SqliteToolStateStore, ToolRegistry, ToolStateProvider, ToolStateStore,
};

#[derive(Parser, Debug)]
#[command(name = "devtools-ext", version, about = "Inspect and exercise devtools-ext state")]
struct Cli {
    /// Data directory (defaults to ~/.devtools-ext)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Persisted tool state
    #[command(subcommand)]
    State(StateCommand),
    /// Present a panel into a simulated page whose body appears late
    OverlayDemo {
        /// How long the simulated page takes to create its body
        #[arg(long, default_value_t = 200)]
        body_delay_ms: u64,
    },
}

#[derive(Subcommand, Debug)]
enum StateCommand {
    /// Print the persisted record as JSON
    Show,
    /// Shallow-merge a JSON object into a tool's state
    Set { tool: String, json: String },
    /// Set the last selected tool
    Select { tool: String },
    /// Delete the persisted record, or restore one tool's defaults
    Reset {
        #[arg(long)]
        tool: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let data_dir = util::init_data_dir(cli.data_dir);
    util::ensure_data_dirs()
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    // Initialize logging to file (<data_dir>/logs/devtools-ext.log)
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let config = Config::load();

    match cli.command {
        Command::State(command) => run_state(command, &config).await,
        Command::OverlayDemo { body_delay_ms } => {
            tokio::task::LocalSet::new()
                .run_until(run_overlay_demo(&config, Duration::from_millis(body_delay_ms)))
                .await
        }
    }
}

fn open_store(config: &Config) -> Result<Arc<SqliteToolStateStore>> {
    let db = Database::open(config.database_path.clone()).with_context(|| {
        format!(
            "failed to open tool state database at {}",
            config.database_path.display()
        )
    })?;
    Ok(Arc::new(SqliteToolStateStore::new(db.connection())))
}

fn registry(config: &Config) -> ToolRegistry {
    ToolRegistry::builtin().with_default_tool(config.default_tool.clone())
}

async fn run_state(command: StateCommand, config: &Config) -> Result<()> {
    let store = open_store(config)?;

    match command {
        StateCommand::Show => match store.load()? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("null"),
        },
        StateCommand::Set { tool, json } => {
            let partial: serde_json::Value =
                serde_json::from_str(&json).context("state must be valid JSON")?;
            let provider = ToolStateProvider::load(store, registry(config));
            provider.update_tool_state(&tool, partial)?;
            provider.flush().await;
            ensure_persisted(&provider)?;
            let state = provider.tool_state_for(&tool).unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        StateCommand::Select { tool } => {
            let provider = ToolStateProvider::load(store, registry(config));
            if !provider.registry().contains(&tool) {
                tracing::warn!(tool_id = %tool, "Selecting a tool that is not registered");
            }
            provider.select_tool(Some(&tool));
            provider.flush().await;
            ensure_persisted(&provider)?;
            println!("{tool}");
        }
        StateCommand::Reset { tool: None } => {
            store.clear()?;
            println!("tool state cleared");
        }
        StateCommand::Reset { tool: Some(tool) } => {
            let provider = ToolStateProvider::load(store, registry(config));
            provider.reset_tool(&tool);
            provider.flush().await;
            ensure_persisted(&provider)?;
            println!("{tool} reset");
        }
    }

    Ok(())
}

fn ensure_persisted(provider: &ToolStateProvider) -> Result<()> {
    if provider.persistence_degraded() {
        return Err(anyhow!(
            "tool state could not be written; see {}",
            util::log_file_path().display()
        ));
    }
    Ok(())
}

/// Shows the selected tool's state as a key/value list
struct StatePanel;

impl Component<MemoryDocument> for StatePanel {
    type Props = Rc<ToolStateProvider>;

    fn name(&self) -> &'static str {
        "state-panel"
    }

    fn render(
        &mut self,
        cx: &RenderContext<'_, MemoryDocument>,
        props: OverlayProps<Self::Props>,
    ) -> Result<(), RenderError> {
        let provider = props.props;
        let tool = provider
            .last_selected_tool()
            .or_else(|| provider.registry().tools().first().map(|t| t.id.clone()))
            .ok_or_else(|| RenderError::component(self.name(), "no tools registered"))?;

        let title = cx.append_element("h1");
        cx.document.set_text_content(&title, &tool);

        let list = cx.append_element("dl");
        if let Some(serde_json::Value::Object(state)) = provider.tool_state_for(&tool) {
            for (key, value) in state {
                let term = cx.document.create_element("dt");
                cx.document.set_text_content(&term, &key);
                cx.document.append_child(&list, &term);
                let detail = cx.document.create_element("dd");
                cx.document.set_text_content(&detail, &value.to_string());
                cx.document.append_child(&list, &detail);
            }
        }
        Ok(())
    }
}

async fn run_overlay_demo(config: &Config, body_delay: Duration) -> Result<()> {
    let store: Arc<dyn ToolStateStore> = match open_store(config) {
        Ok(store) => store as Arc<dyn ToolStateStore>,
        Err(e) => {
            tracing::warn!(error = %e, "Running overlay demo without persisted state");
            Arc::new(devtools_ext::MemoryToolStateStore::new())
        }
    };
    let provider = Rc::new(ToolStateProvider::load(store, registry(config)));

    let document = MemoryDocument::loading();
    let manager = OverlayManager::from_config(document.clone(), config);

    let on_close: OnClose = Box::new(|| println!("-- overlay closed"));
    let handle = manager
        .present(StatePanel, provider, Some(on_close))
        .map_err(|e| anyhow!("{e}"))?;

    println!("-- presented while loading (attached: {})", handle.is_attached());
    println!("{}", document.to_html());

    tokio::time::sleep(body_delay).await;
    document.ensure_body();
    // One poll interval plus slack for the guard to notice the body
    tokio::time::sleep(config.readiness_poll_interval * 2).await;

    println!("-- body ready (attached: {})", handle.is_attached());
    println!("{}", document.to_html());

    handle.close();
    println!("{}", document.to_html());
    Ok(())
}
