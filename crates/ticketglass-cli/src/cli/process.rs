use crate::cli::{Desk, ProcessArgs};
use anyhow::Result;

pub async fn run(args: ProcessArgs, desk: &Desk) -> Result<()> {
    let output = desk.explain(&args.id, args.apply).await?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("{} · {} → {}", output.ticket_id, output.phase, output.next_phase);
    println!("{}", "─".repeat(60));
    println!("{}", output.summary);
    println!();
    println!("Next step: {}", output.next_step);
    if let Some(tip) = &output.learning_tip {
        println!("Tip:       {}", tip);
    }
    println!();
    println!("Reasoning: {}", output.reasoning_note);
    println!(
        "Tone: {}  Sentiment: {}  Model: {}",
        output.tone_applied, output.sentiment_detected, output.model_used
    );
    if output.repeats_prior_summary {
        println!("⚠ This update closely matches an earlier one.");
    }
    if args.apply {
        println!("Appended to {} as a {} event.", output.ticket_id, output.next_phase);
    }
    println!("{}", "─".repeat(60));
    Ok(())
}
