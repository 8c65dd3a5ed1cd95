use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "parkmeter")]
#[command(version, about = "Parking fee tracker with tiered tariffs and reminder planning")]
pub struct Cli {
    /// List all known parking lots
    #[arg(short = 'l', long = "list")]
    pub list: bool,

    /// Show the fee rules for a parking lot
    #[arg(long = "rules", value_name = "LOT_ID")]
    pub rules: Option<u32>,

    /// Start a parking session at the given lot
    #[arg(short = 's', long = "start", value_name = "LOT_ID")]
    pub start: Option<u32>,

    /// Show the active session (elapsed time, fee, next reminder)
    #[arg(long = "status")]
    pub status: bool,

    /// Correct the session start time (formats: 0-23, HH:MM, ISO timestamp)
    #[arg(long = "adjust", value_name = "TIME")]
    pub adjust: Option<String>,

    /// Hand the next pending reminder to the notification shortcut
    #[arg(long = "remind")]
    pub remind: bool,

    /// Settle up and end the active session
    #[arg(long = "finish")]
    pub finish: bool,

    /// Initialize config file
    #[arg(long = "init")]
    pub init: bool,

    /// Check configuration
    #[arg(long = "check")]
    pub check: bool,

    /// Print current configuration
    #[arg(long = "print")]
    pub print: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
