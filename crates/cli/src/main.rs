use std::io;

fn main() -> anyhow::Result<()> {
    switchboard_observability::init();

    let config = switchboard_cli::app::AppConfig::from_env()?;
    let dispatcher = switchboard_cli::app::build_dispatcher(config)?;

    tracing::info!(
        root = %dispatcher.config().root_namespace,
        commands = dispatcher.registry().len(),
        "serving requests from stdin"
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    switchboard_cli::serve::serve(&dispatcher, stdin.lock(), stdout.lock())?;
    Ok(())
}
