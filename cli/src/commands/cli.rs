use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "autoexec",
    version,
    about = "Autonomous task execution: plan and run natural-language instructions"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Natural-language instruction to plan and execute.
    pub instruction: String,

    /// Project directory the plan operates on.
    #[arg(long, default_value = ".")]
    pub project_path: String,

    /// Skip writing the JSON execution report to disk.
    #[arg(long, default_value_t = false)]
    pub no_report: bool,

    /// Show a progress bar while the plan runs.
    #[arg(long, default_value_t = false)]
    pub progress: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ExecArgs {
    /// Shell command to run through the safety gate.
    pub command: String,

    /// Kill the command after this many seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Bypass the safety classifier.
    #[arg(long, default_value_t = false)]
    pub no_safe: bool,

    /// Working directory for the command (defaults to the current one).
    #[arg(long)]
    pub working_dir: Option<String>,

    /// Extra environment variables (KEY=VALUE). Can be repeated.
    #[arg(long = "env", action = clap::ArgAction::Append)]
    pub env: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse an instruction into a task plan and execute it.
    Run(RunArgs),
    /// Execute one shell command with safety checks and a timeout.
    Exec(ExecArgs),
}
