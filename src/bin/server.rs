use argh::FromArgs;
use fastsock::server::run_server;

/// Runs the framing demonstration server.
#[derive(FromArgs)]
struct CliArgs {
    /// TCP port to listen on
    #[argh(option, short = 'p', default = "9000")]
    port: u16,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();
    let cli_args: CliArgs = argh::from_env();
    run_server(cli_args.port).await
}
