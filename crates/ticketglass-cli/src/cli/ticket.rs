use crate::cli::{truncate, Desk, ShowArgs, TicketsArgs};
use anyhow::Result;
use ticketglass_core::{TicketFilter, TicketState};

pub fn list(args: TicketsArgs, desk: &Desk) -> Result<()> {
    let mut filter = TicketFilter::new();
    if let Some(category) = args.category {
        filter = filter.with_category(category);
    }
    if let Some(phase) = args.phase {
        filter = filter.with_phase(phase);
    }
    if let Some(limit) = args.limit {
        filter = filter.with_limit(limit);
    }

    let tickets = desk.list(filter)?;
    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&tickets)?);
    } else {
        print_ticket_table(&tickets);
    }
    Ok(())
}

pub fn show(args: ShowArgs, desk: &Desk) -> Result<()> {
    let ticket = desk.fetch(&args.id)?;

    if args.format == "json" {
        println!(
            "{}",
            serde_json::json!({
                "ticket": ticket,
                "current_phase": ticket.current_phase(),
                "context_history": ticket.context_history(),
                "feedback": desk.store().feedback_for(&args.id)?,
            })
        );
        return Ok(());
    }

    println!();
    println!("{} · {}", ticket.ticket_id, ticket.title);
    println!("{}", "─".repeat(60));
    println!("User:     {} ({})", ticket.user_name, ticket.user_tone);
    println!("Category: {}", ticket.category);
    println!("Phase:    {}", ticket.current_phase());
    println!("Opened:   {}", ticket.created_at.format("%Y-%m-%d %H:%M UTC"));
    println!();

    for event in &ticket.status_events {
        println!("[{}] {:<10} {}", event.time, event.phase.as_str(), event.event);
        if let Some(summary) = event.summary_text() {
            println!("    We said:   {}", summary);
        }
        if let Some(feedback) = event.feedback_text() {
            println!("    User said: {}", feedback);
        }
        if let Some(resolution) = &event.resolution {
            println!("    Resolution: {}", resolution);
        }
        if let Some(tip) = &event.learning_tip {
            println!("    Tip: {}", tip);
        }
    }

    let feedback = desk.store().feedback_for(&args.id)?;
    if !feedback.is_empty() {
        println!();
        println!("Feedback ({}):", feedback.len());
        for record in &feedback {
            println!(
                "  {}  {:<11}  {}",
                record.created_at.format("%Y-%m-%d %H:%M"),
                record.choice.as_str(),
                record.note.as_deref().unwrap_or("")
            );
        }
    }
    println!("{}", "─".repeat(60));
    Ok(())
}

pub fn print_ticket_table(tickets: &[TicketState]) {
    if tickets.is_empty() {
        println!("(no tickets)");
        return;
    }
    println!("{:<8}  {:<10}  {:<10}  {:<10}  {}", "ID", "CATEGORY", "PHASE", "USER", "TITLE");
    println!("{}", "─".repeat(80));
    for t in tickets {
        println!(
            "{:<8}  {:<10}  {:<10}  {:<10}  {}",
            t.ticket_id,
            truncate(&t.category, 10),
            t.current_phase().as_str(),
            truncate(&t.user_name, 10),
            truncate(&t.title, 40)
        );
    }
}
