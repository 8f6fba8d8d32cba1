use crate::cli::{Desk, FeedbackArgs};
use anyhow::Result;
use ticketglass_core::FeedbackSubmission;

pub fn run(args: FeedbackArgs, desk: &Desk) -> Result<()> {
    let mut submission = if args.helpful {
        FeedbackSubmission::helpful()
    } else {
        FeedbackSubmission::not_helpful()
    };
    if let Some(note) = args.note {
        submission = submission.with_note(note);
    }

    let record = desk.submit_feedback(&args.id, submission)?;
    println!("Recorded {} feedback for {} ({})", record.choice, record.ticket_id, record.id);
    Ok(())
}
