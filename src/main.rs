use clap::{Parser, Subcommand};

mod cmd;

/// UK Inheritance Tax calculator for lifetime gifts and estates
#[derive(Parser, Debug)]
#[command(name = "ihtc", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Allocate exemptions and show the taper position of each gift
    Gifts(cmd::gifts::GiftsCommand),
    /// 7-year exposure, per-year totals and optional estate liability
    Summary(cmd::summary::SummaryCommand),
    /// IHT on the estate if death occurred on the as-of date
    Estate(cmd::estate::EstateCommand),
    /// Report invalid gifts and exemption conflicts
    Validate(cmd::validate::ValidateCommand),
    /// Print expected input formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Gifts(c) => c.exec(),
        Command::Summary(c) => c.exec(),
        Command::Estate(c) => c.exec(),
        Command::Validate(c) => c.exec(),
        Command::Schema(c) => c.exec(),
    }
}
