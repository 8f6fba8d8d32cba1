use crate::cli::Desk;
use anyhow::Result;

pub fn run(desk: &Desk) -> Result<()> {
    let stats = desk.stats()?;
    let feedback = desk.feedback_stats()?;

    println!();
    println!("Ticket Overview");
    println!("{}", "─".repeat(50));
    println!("Tickets:  {:>8}", stats.ticket_count);
    for (phase, count) in &stats.tickets_by_phase {
        println!("  {:16} {:>8}", phase.as_str(), count);
    }
    println!("Events:   {:>8}", stats.event_count);
    if stats.db_size_bytes > 0 {
        println!("DB Size:  {:>7.1} MB", stats.db_size_bytes as f64 / 1_048_576.0);
    }

    println!();
    println!("Feedback");
    println!("{}", "─".repeat(50));
    println!("Total:    {:>8}", feedback.total);
    println!("Helpful:  {:>8}  ({:.1}%)", feedback.helpful, feedback.helpful_percentage);
    println!("Not helpful: {:>5}", feedback.not_helpful);
    for (ticket, count) in &feedback.by_ticket {
        println!("  {:16} {:>8}", ticket, count);
    }
    println!("{}", "─".repeat(50));
    println!();

    Ok(())
}
