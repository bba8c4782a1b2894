//! Plain-text rendering of queues and tickets.

use triage_core::notify::Notification;
use triage_core::ticket::Queue;
use triage_core::{QueueKind, Ticket, TicketDetail};

fn row(ticket: &Ticket) -> String {
    let customer = ticket.customer_name.as_deref().unwrap_or("-");
    let assignee = ticket.assignee_name.as_deref().unwrap_or("-");
    let unread = if ticket.unread_customer_comments > 0 {
        format!(" [{} new]", ticket.unread_customer_comments)
    } else {
        String::new()
    };
    format!(
        "  #{:<6} {:<8} {:<16} {:<24} {:<16} {}{}",
        ticket.number,
        ticket.priority.as_str(),
        ticket.status.as_str(),
        truncate(&ticket.subject, 24),
        truncate(customer, 16),
        assignee,
        unread
    )
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}~", cut)
    }
}

pub fn queue(kind: QueueKind, queue: &Queue) -> String {
    let p = &queue.pagination;
    let mut out = format!(
        "{} ({} tickets, page {}/{})\n",
        kind,
        p.total_count,
        p.page,
        p.total_pages.max(1)
    );
    if queue.is_empty() {
        out.push_str("  (empty)\n");
    }
    for ticket in &queue.tickets {
        out.push_str(&format!("{}  [{}]\n", row(ticket), ticket.id));
    }
    out
}

pub fn detail(detail: &TicketDetail, has_new_activity: bool) -> String {
    let t = &detail.ticket;
    let mut out = format!(
        "#{} {}\n  status: {}  priority: {}  assignee: {}\n  customer: {} <{}>\n",
        t.number,
        t.subject,
        t.status,
        t.priority,
        t.assignee_name.as_deref().unwrap_or("-"),
        t.customer_name.as_deref().unwrap_or("-"),
        t.customer_email.as_deref().unwrap_or("-"),
    );
    for comment in &detail.comments {
        let marker = if comment.is_resolution { " (resolution)" } else { "" };
        out.push_str(&format!(
            "  [{}] {}{}: {}\n",
            comment.created_at.format("%Y-%m-%d %H:%M"),
            comment.author_name,
            marker,
            comment.text
        ));
    }
    if has_new_activity {
        out.push_str("  ** new activity, type 'dismiss' to load it **\n");
    }
    out
}

pub fn notifications(active: &[Notification]) -> String {
    if active.is_empty() {
        return "no notifications\n".to_string();
    }
    active
        .iter()
        .map(|n| format!("  [{}] {}\n", n.severity, n.message))
        .collect()
}
