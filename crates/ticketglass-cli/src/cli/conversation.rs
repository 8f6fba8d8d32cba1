use crate::cli::{ConversationArgs, Desk};
use anyhow::Result;

/// Dry run: print the system instruction and turns without calling the model.
pub fn run(args: ConversationArgs, desk: &Desk) -> Result<()> {
    let request = desk.preview(&args.id)?;

    println!("tone: {}  sentiment: {}", request.tone, request.sentiment);
    println!();
    println!("── system ─────────────────────────────────────────");
    println!("{}", request.system);
    for (i, turn) in request.turns.iter().enumerate() {
        println!();
        println!("── {} #{} ──", turn.role, i + 1);
        println!("{}", turn.text);
    }
    Ok(())
}
