use crate::demo::{run_demo, run_import, run_score, DemoArgs, ImportArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use turbine_crew::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Turbine Crew Competency",
    about = "Score technician competency assessments and serve the assessment API",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a single assessment from command-line selections
    Score(ScoreArgs),
    /// Import a legacy roster export and report score parity
    Import(ImportArgs),
    /// Walk a technician through an editing session and print the audit trail
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Import(args) => run_import(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["turbine-crew-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn score_accepts_repeated_selections() {
        let cli = Cli::try_parse_from([
            "turbine-crew-api",
            "score",
            "--tier",
            "senior_technician",
            "--education",
            "electrical",
            "--course",
            "hv_switching",
            "--course",
            "rope_rescue",
            "--subjective",
            "2",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Score(args)) => {
                assert_eq!(args.tier.as_deref(), Some("senior_technician"));
                assert_eq!(args.education, vec!["electrical".to_string()]);
                assert_eq!(args.courses.len(), 2);
                assert_eq!(args.subjective, 2);
            }
            other => panic!("expected score command, got {other:?}"),
        }
    }
}
