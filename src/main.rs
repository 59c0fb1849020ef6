use std::path::Path;
use std::process;
use log::{error, info};

use dustkit::commands::{build_cli, CommandFactory, DustkitCommandFactory};
use dustkit::config::PipelineConfig;
use dustkit::utils::logger;

fn main() {
    let matches = build_cli().get_matches();

    let verbose = matches.get_flag("verbose");
    let log_file = matches.get_one::<String>("log-file").map(|s| Path::new(s.as_str()));
    if let Err(e) = logger::init_logging(log_file, verbose) {
        eprintln!("Error setting up logging: {}", e);
        process::exit(1);
    }

    let config = match matches.get_one::<String>("config") {
        Some(path) => match PipelineConfig::from_file(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        None => PipelineConfig::default(),
    };

    let factory = DustkitCommandFactory::new(config);

    match factory.create_command(&matches) {
        Ok(command) => {
            info!("Running {}", command.name());
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
