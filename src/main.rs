use structopt::StructOpt;

use bgpy::cli::{resolve_token, Cli};
use bgpy::{client, environment, example_tasks, log, server::Server};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    match Cli::from_args() {
        Cli::Server(server) => {
            let log_level = server.log_level.as_deref().unwrap_or(environment::LOG_LEVEL);
            let log_file = server.log_file.clone().or_else(environment::default_log_file);
            let _guard = log::init(log_level, log_file.as_deref());
            let token = resolve_token(server.prompt_token)?;

            let mut instance =
                Server::bind(&server.host, server.port, example_tasks::registry(), token).await?;
            if let Some(init_file) = &server.init_file {
                instance = instance.with_init_file(init_file).await?;
            }
            instance.run().await?;
        }
        Cli::Terminate(terminate) => {
            let log_level = terminate.log_level.as_deref().unwrap_or(environment::LOG_LEVEL);
            let _guard = log::init(log_level, terminate.log_file.as_deref());
            let token = resolve_token(terminate.prompt_token)?;
            client::terminate(
                Default::default(),
                false,
                token.as_deref(),
                &terminate.host,
                terminate.port,
            )
            .await?;
        }
        Cli::Version => {
            println!("bgpy {}", env!("CARGO_PKG_VERSION"));
        }
    }
    Ok(())
}
