mod cli;
mod config;
mod documents;
mod fields_cmd;
mod init;
mod logging;
mod plan_cmd;
mod workflow;
mod write;

pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cli = cli::parse_args(&args)?;
    logging::init(cli.verbosity);

    match cli.command {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Init(args) => init::run(args),
        cli::Command::Plan(args) => plan_cmd::run(args),
        cli::Command::Fields(args) => fields_cmd::run(args),
    }
}
