// CLI modules
mod cli;

use cli::args::{Args, Command, Parser};
use hashgate_service::{process, AppState};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match args.command {
        Command::Init => match AppState::init(args.config_dir, None) {
            Ok(state) => {
                println!("initialized {}", state.app_dir.display());
                println!("edit {} before serving", state.config_path.display());
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Command::Serve => {
            let app = match AppState::load(args.config_dir) {
                Ok(app) => app,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            let config = match app.service_config() {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            process::spawn_service(&config).await;
        }
        Command::Version => {
            println!("hashgate {}", env!("CARGO_PKG_VERSION"));
        }
    }
}
