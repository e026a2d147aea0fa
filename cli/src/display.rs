//! Terminal rendering of proposals and receipts

use lair_core::address::truncate_middle;
use lair_core::Address;
use lair_governance::{ExecutionStatus, ProposalView, TransactionReceipt};
use owo_colors::OwoColorize;

const RULE: &str = "═══════════════════════════════════════════════════";

pub fn header(title: &str) {
    println!("\n{}", title.cyan().bold());
    println!("{}", RULE.cyan());
}

pub fn short_address(address: &str) -> String {
    truncate_middle(address, 4, 4, 11)
}

pub fn status_label(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::NotQueued => "not queued".yellow().to_string(),
        ExecutionStatus::Queued => "queued".bright_blue().to_string(),
        ExecutionStatus::Executed => "executed".green().to_string(),
    }
}

/// One line per proposal
pub fn proposal_row(view: &ProposalView, remaining: &str, open: bool) {
    let window = if open {
        format!("ends {}", remaining).green().to_string()
    } else {
        format!("ended {}", remaining).dimmed().to_string()
    };
    println!(
        "{:>4}  {}  {} {} / {} {}  {}  {}",
        format!("#{}", view.id).bold(),
        view.description,
        "▲".green(),
        view.upvotes,
        "▼".red(),
        view.downvotes,
        status_label(view.status),
        window
    );
}

pub fn proposal_detail(view: &ProposalView, remaining: &str) {
    header(&format!("📜 Proposal #{}", view.id));
    println!("{}: {}", "Description".yellow().bold(), view.description);
    println!("{}: {}", "Proposer".yellow().bold(), short_address(&view.proposer));
    println!(
        "{}: {} → {} ({})",
        "Voting".yellow().bold(),
        view.start_block,
        view.end_block,
        remaining
    );
    println!(
        "{}: {} for, {} against, {} abstain ({} total)",
        "Votes".yellow().bold(),
        view.upvotes.to_string().green(),
        view.downvotes.to_string().red(),
        view.abstentions,
        view.total_votes()
    );
    println!("{}: {}", "Status".yellow().bold(), status_label(view.status));

    println!("\n{} ({})", "Actions".yellow().bold(), view.targets.len());
    for ((target, value), calldata) in view.targets.iter().zip(&view.values).zip(&view.calldatas) {
        println!("  {} {} ETH  {}", short_address(target), value, truncate_middle(calldata, 10, 4, 19));
    }
    println!();
}

pub fn receipt(action: &str, receipt: &TransactionReceipt) {
    println!(
        "{} {} confirmed in block {} ({})",
        "✓".green(),
        action,
        receipt.block_number,
        receipt.transaction_hash.to_string().bright_blue()
    );
}

pub fn voters(voters: &[Address]) {
    if voters.is_empty() {
        println!("{}", "No votes yet".yellow());
        return;
    }
    for voter in voters {
        println!("  {}", voter);
    }
}
