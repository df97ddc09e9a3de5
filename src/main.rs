use anyhow::Context;
use clap::Parser;

mod app;
mod cli;
mod config;
mod eid;
mod render;
mod session;
mod shell;
mod storage;
#[cfg(test)]
mod tests;

use app::AppFactory;
use render::Renderer;
use session::{types::ImageUpload, Surface};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = cli::Args::parse();

    let paths = AppFactory::get_paths()?;
    let config = AppFactory::create_config(&paths, args.remote.as_deref())?;

    if let cli::Command::Config {} = args.command {
        println!("# {}/config.yaml", config.base_path());
        print!("{}", serde_yml::to_string(&config)?);
        return Ok(());
    }

    let renderer = Renderer::new(AppFactory::create_assets(&config)?, config.preview_chars);
    let mut orchestrator = AppFactory::create_orchestrator(&config, Surface::default())?;

    // one thread: completions are applied one at a time by whoever polls them
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let session_id = eid::Eid::new();
    let span = tracing::info_span!("session", id = %session_id);
    let _guard = span.enter();

    runtime.block_on(async move {
        match args.command {
            cli::Command::Shell {} => shell::run(orchestrator, renderer).await,

            cli::Command::Search { query, refine } => {
                let Some(call) = orchestrator.text_search(&query) else {
                    anyhow::bail!("query is empty");
                };
                shell::drive(&mut orchestrator, call, &refine).await?;
                let view = renderer.session_json(orchestrator.session(), orchestrator.history());
                println!("{}", serde_json::to_string_pretty(&view)?);
                Ok(())
            }

            cli::Command::Image { path, refine } => {
                let upload = ImageUpload::from_path(&path)
                    .await
                    .with_context(|| format!("cannot read {}", path.display()))?;
                let Some(call) = orchestrator.image_search(upload) else {
                    anyhow::bail!("{} is empty", path.display());
                };
                shell::drive(&mut orchestrator, call, &refine).await?;
                let view = renderer.session_json(orchestrator.session(), orchestrator.history());
                println!("{}", serde_json::to_string_pretty(&view)?);
                Ok(())
            }

            cli::Command::Config {} => Ok(()),
        }
    })
}
