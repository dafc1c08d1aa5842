use chrono::{DateTime, Utc};
use colored::Colorize;
use studybook::api::{CmdMessage, DeletePreview, DisplayMistake, DisplayNode, MessageLevel};
use studybook::index::fmt_path;
use studybook::model::{Mistake, NodeKind, ReviewState, Subject};
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const INDENT: &str = "  ";

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

pub(super) fn print_tree(nodes: &[DisplayNode]) {
    if nodes.is_empty() {
        println!("No notes found.");
        return;
    }
    for dn in nodes {
        print_tree_row(dn, 0);
    }
}

fn print_tree_row(dn: &DisplayNode, depth: usize) {
    let indent = INDENT.repeat(depth);
    let path = format!("{}. ", fmt_path(&dn.path));
    let (marker, title) = match &dn.node.kind {
        NodeKind::Folder => ("▸ ", dn.node.title.bold()),
        NodeKind::File(_) => ("  ", dn.node.title.normal()),
    };
    let tags = dn
        .node
        .file_body()
        .map(|b| {
            b.tags
                .iter()
                .map(|t| format!("#{}", t))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();

    let fixed = indent.width() + path.width() + marker.width() + TIME_WIDTH;
    let available = LINE_WIDTH.saturating_sub(fixed);
    let title_text = truncate_to_width(&dn.node.title, available);
    let mut used = title_text.width();
    let title_out = if title_text == dn.node.title {
        title.to_string()
    } else {
        title_text
    };

    let tags_out = if tags.is_empty() || used + 1 >= available {
        String::new()
    } else {
        let t = truncate_to_width(&tags, available - used - 1);
        used += t.width() + 1;
        format!(" {}", t.cyan())
    };
    let padding = available.saturating_sub(used);

    println!(
        "{}{}{}{}{}{}{}",
        indent,
        path.yellow(),
        marker,
        title_out,
        tags_out,
        " ".repeat(padding),
        format_time_ago(dn.node.created_at).dimmed()
    );

    for child in &dn.children {
        print_tree_row(child, depth + 1);
    }
}

pub(super) fn print_full_nodes(nodes: &[DisplayNode]) {
    for (i, dn) in nodes.iter().enumerate() {
        if i > 0 {
            println!("\n================================\n");
        }
        println!(
            "{} {}",
            fmt_path(&dn.path).yellow(),
            dn.node.title.bold()
        );
        println!("--------------------------------");
        match &dn.node.kind {
            NodeKind::Folder => {
                if dn.children.is_empty() {
                    println!("{}", "(empty folder)".dimmed());
                }
                for child in &dn.children {
                    print_tree_row(child, 1);
                }
            }
            NodeKind::File(body) => {
                if !body.tags.is_empty() {
                    let tags: Vec<String> = body.tags.iter().map(|t| format!("#{}", t)).collect();
                    println!("{}", tags.join(" ").cyan());
                }
                if let Some(text) = &body.text {
                    println!("{}", text);
                }
                for (n, attachment) in body.content.iter().enumerate() {
                    let desc = if attachment.description.is_empty() {
                        "image".to_string()
                    } else {
                        attachment.description.clone()
                    };
                    println!("{}", format!("[{}] {}", n + 1, desc).dimmed());
                }
            }
        }
    }
}

pub(super) fn print_delete_preview(preview: &DeletePreview) {
    for (dn, below) in &preview.targets {
        if *below > 0 {
            println!(
                "  {} {} {}",
                fmt_path(&dn.path).yellow(),
                dn.node.title,
                format!("(and {} inside)", below).dimmed()
            );
        } else {
            println!("  {} {}", fmt_path(&dn.path).yellow(), dn.node.title);
        }
    }
}

fn state_marker(state: ReviewState) -> colored::ColoredString {
    match state {
        ReviewState::Mastered => "✓".green(),
        ReviewState::ReviewedToday => "●".cyan(),
        ReviewState::Reviewed => "○".normal(),
        ReviewState::Unreviewed => "·".dimmed(),
    }
}

pub(super) fn print_mistakes(mistakes: &[DisplayMistake]) {
    if mistakes.is_empty() {
        println!("No mistakes recorded.");
        return;
    }
    for dm in mistakes {
        let idx = format!("{}. ", dm.index);
        let subject = dm
            .subject_name
            .as_ref()
            .map(|s| format!(" [{}]", s))
            .unwrap_or_default();
        let reviews = format!(" ×{}", dm.review_count);

        let fixed = idx.width() + 2 + subject.width() + reviews.width() + TIME_WIDTH;
        let available = LINE_WIDTH.saturating_sub(fixed);
        let title = truncate_to_width(&dm.mistake.display_title(), available);
        let padding = available.saturating_sub(title.width());

        println!(
            "{}{} {}{}{}{}{}",
            idx.yellow(),
            state_marker(dm.state),
            title,
            subject.cyan(),
            reviews.dimmed(),
            " ".repeat(padding),
            format_time_ago(dm.mistake.created_at).dimmed()
        );
    }
}

/// Full view of each mistake. The solution is only shown when `reveal` is set.
pub(super) fn print_full_mistakes(mistakes: &[DisplayMistake], reveal: bool) {
    for (i, dm) in mistakes.iter().enumerate() {
        if i > 0 {
            println!("\n================================\n");
        }
        let m: &Mistake = &dm.mistake;
        println!(
            "{} {} {}",
            dm.index.to_string().yellow(),
            state_marker(dm.state),
            m.display_title().bold()
        );
        if let Some(subject) = &dm.subject_name {
            println!("{}", subject.cyan());
        }
        println!("--------------------------------");
        println!(
            "{}",
            format!("{} question image(s)", m.question_images.len()).dimmed()
        );
        if !m.reflection.is_empty() {
            println!("{} {}", "Reflection:".bold(), m.reflection);
        }
        if reveal {
            if let Some(text) = &m.analysis_text {
                println!("{} {}", "Solution:".bold(), text);
            }
            if m.analysis_image.is_some() {
                println!("{}", "(solution image attached)".dimmed());
            }
        } else if m.analysis_text.is_some() || m.analysis_image.is_some() {
            println!(
                "{}",
                format!("Solution hidden. Run `studybook mistake reveal {}`", dm.index).dimmed()
            );
        }
        println!(
            "{}",
            format!(
                "Reviewed {} time(s){}",
                dm.review_count,
                if m.is_mastered { ", mastered" } else { "" }
            )
            .dimmed()
        );
    }
}

pub(super) fn print_subjects(subjects: &[Subject]) {
    if subjects.is_empty() {
        println!("No subjects.");
        return;
    }
    for s in subjects {
        println!("  {}", s.name);
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }
    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let time_str = Formatter::new().convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_wide_chars() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefgh", 5), "abcd…");
        // Each CJK char is two columns wide
        assert_eq!(truncate_to_width("微积分基础", 5), "微积…");
    }
}
