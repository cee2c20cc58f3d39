use clap::Subcommand;
use focusdesk_core::{CycleCounter, SqliteStore};
use std::sync::Arc;

#[derive(Subcommand)]
pub enum CyclesAction {
    /// Print the number of completed focus cycles
    Show,
    /// Reset the completed cycle count to zero
    Reset,
}

pub fn run(action: CyclesAction) -> Result<(), Box<dyn std::error::Error>> {
    let counter = CycleCounter::new(Arc::new(SqliteStore::open()?));

    match action {
        CyclesAction::Show => println!("{}", counter.load()),
        CyclesAction::Reset => {
            counter.reset()?;
            println!("cycles reset");
        }
    }
    Ok(())
}
