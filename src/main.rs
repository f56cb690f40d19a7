use anyhow::Result;
use netmodels::{cli, init_logging, process_matches};

fn main() -> Result<()> {
    let matches = cli().get_matches();

    init_logging(matches.get_flag("verbose"));
    process_matches(&matches)?;

    Ok(())
}
