use clap::{Parser, ValueEnum};

use crate::scenario::Scenario;

#[derive(Parser, Debug)]
#[command(name = "fsarray")]
#[command(version, about = "Walks a DynamicArray through its storage scenarios", long_about = None)]
pub struct Cli {
    /// Scenario to run
    #[arg(short, long, value_enum, default_value_t = ScenarioArg::All)]
    pub scenario: ScenarioArg,

    /// Also push this many random values and report every reallocation
    #[arg(short, long, value_name = "N")]
    pub count: Option<usize>,

    /// Set verbose level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioArg {
    All,
    Push,
    Resize,
    Erase,
    Insert,
    Failure,
}

impl ScenarioArg {
    pub fn scenarios(self) -> Vec<Scenario> {
        match self {
            ScenarioArg::All => Scenario::ALL.to_vec(),
            ScenarioArg::Push => vec![Scenario::Push],
            ScenarioArg::Resize => vec![Scenario::Resize],
            ScenarioArg::Erase => vec![Scenario::Erase],
            ScenarioArg::Insert => vec![Scenario::Insert],
            ScenarioArg::Failure => vec![Scenario::Failure],
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log filter for the `-v` count: warn, info, debug, then trace.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
