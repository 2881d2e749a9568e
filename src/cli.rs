use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::patterns::AmountUnit;

#[derive(Parser, Debug)]
#[command(version, about = "Find knitting patterns for the yarn you have", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SourceArgs {
    /// Skip the live site and use the local dataset.
    #[clap(long, default_value = "false")]
    pub offline: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rank patterns against the yarn you have
    Match {
        /// How much yarn you have
        #[clap(short, long)]
        amount: Option<String>,

        /// Unit of the amount: g or m
        #[clap(short, long, default_value = "g")]
        unit: AmountUnit,

        /// Yarn fibre, e.g. wool
        #[clap(short = 't', long)]
        yarn_type: Option<String>,

        /// Yarn weight, e.g. aran
        #[clap(short = 'w', long)]
        yarn_weight: Option<String>,

        /// Ask for missing values
        #[clap(short, long, default_value = "false")]
        interactive: bool,

        /// Print results as JSON
        #[clap(long, default_value = "false")]
        json: bool,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Reload the catalog from the live site, failing instead of falling back
    Refresh {},

    /// Print pattern links found on the listing page
    Links {},

    /// Extract yarn details from a single pattern page
    Inspect {
        /// Pattern page url
        url: String,

        /// Title to attach to the record
        #[clap(long, default_value = "")]
        title: String,
    },

    /// Serve the matcher over HTTP.
    Daemon {
        /// Address to listen on
        #[clap(long, default_value = "0.0.0.0:8080")]
        addr: String,

        #[command(flatten)]
        source: SourceArgs,
    },
}
