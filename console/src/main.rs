mod tabular;
mod timeseries;
mod utils;

use clap::{
    Parser,
    Subcommand,
};
use tabular::TabularArgs;
use timeseries::TimeseriesArgs;
use utils::UtilsArgs;
use wild::ArgsOs;

#[derive(Parser, Debug)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None,)]
struct Cli {
    #[command(subcommand)]
    command: MainMenu,
}

#[derive(Subcommand, Debug)]
enum MainMenu {
    /// Select synchronously fluctuating variables from control and
    /// experimental samples of every file in a series.
    Tabular {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  TabularArgs,
    },

    /// Compute the early-warning signal of a time series, locate its change
    /// point and export the windows around it as a tabular dataset.
    Timeseries {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  TimeseriesArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let args: ArgsOs = wild::args_os();
    let cli = Cli::parse_from(args);

    match cli.command {
        MainMenu::Tabular { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
        MainMenu::Timeseries { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
    }
    Ok(())
}
