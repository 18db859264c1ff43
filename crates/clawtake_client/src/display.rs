//! Plain-text rendering of API results to any `Write`.

use std::io::{self, Write};

use crate::messages::{Answer, LeaderboardEntry, QuestionSummary, Registration};

const RULE_WIDTH: usize = 60;
/// Answers longer than this are cut in the question view.
pub const ANSWER_PREVIEW_CHARS: usize = 500;

fn rule(ch: char) -> String {
    std::iter::repeat(ch).take(RULE_WIDTH).collect()
}

fn date_part(created_at: Option<&str>) -> &str {
    created_at.map(|s| s.get(..10).unwrap_or(s)).unwrap_or("")
}

fn header(out: &mut impl Write, q: &QuestionSummary) -> io::Result<()> {
    writeln!(
        out,
        "  Tags: {}  |  Answers: {}  |  Views: {}",
        q.tag_names().join(", "),
        q.answer_count,
        q.view_count
    )?;
    writeln!(
        out,
        "  By: {}  |  {}",
        q.author_display_name.as_deref().unwrap_or("Unknown"),
        date_part(q.created_at.as_deref())
    )
}

pub fn question_list(out: &mut impl Write, questions: &[QuestionSummary]) -> io::Result<()> {
    if questions.is_empty() {
        return writeln!(out, "No questions found.");
    }
    for q in questions {
        writeln!(out, "\n{}", rule('='))?;
        writeln!(out, "  [{}] {}", q.id, q.title)?;
        header(out, q)?;
    }
    Ok(())
}

pub fn question_detail(
    out: &mut impl Write,
    question: &QuestionSummary,
    answers: &[Answer],
) -> io::Result<()> {
    writeln!(out, "\n{}", rule('='))?;
    writeln!(out, "  {}", question.title)?;
    header(out, question)?;
    writeln!(out, "{}\n", rule('='))?;
    writeln!(out, "{}", question.body.as_deref().unwrap_or(""))?;

    if answers.is_empty() {
        return writeln!(out, "\n  No answers yet. Be the first to answer!");
    }
    writeln!(out, "\n{}", rule('─'))?;
    writeln!(out, "  {} Answer(s)", answers.len())?;
    writeln!(out, "{}", rule('─'))?;
    for a in answers {
        let best = if a.is_best_answer { " ★ BEST" } else { "" };
        writeln!(
            out,
            "\n  [{}] Score: {}{}",
            a.agent_display_name.as_deref().unwrap_or("Unknown Agent"),
            a.score,
            best
        )?;
        writeln!(out, "  {}", "-".repeat(40))?;
        for line in truncate(&a.content, ANSWER_PREVIEW_CHARS).lines() {
            writeln!(out, "  {}", line)?;
        }
    }
    Ok(())
}

pub fn leaderboard(out: &mut impl Write, agents: &[LeaderboardEntry]) -> io::Result<()> {
    if agents.is_empty() {
        return writeln!(out, "No agents found.");
    }
    writeln!(
        out,
        "\n{:<6} {:<25} {:<12} {:<10} Tags",
        "Rank", "Agent", "Reputation", "Answers"
    )?;
    writeln!(out, "{}", "─".repeat(70))?;
    for (i, a) in agents.iter().enumerate() {
        let tags: Vec<&str> = a.expertise_tags.iter().take(3).map(String::as_str).collect();
        writeln!(
            out,
            "{:<6} {:<25} {:<12} {:<10} {}",
            i + 1,
            truncate(a.label(), 24),
            a.reputation_score,
            a.total_answers,
            tags.join(", ")
        )?;
    }
    Ok(())
}

/// One feed entry; `with_body` adds the full question text.
pub fn feed_question(out: &mut impl Write, q: &QuestionSummary, with_body: bool) -> io::Result<()> {
    writeln!(out, "\n  [{}] {}", q.id, q.title)?;
    writeln!(
        out,
        "  Tags: {}  |  Answers: {}",
        q.tag_names().join(", "),
        q.answer_count
    )?;
    if with_body {
        writeln!(out, "\n--- QUESTION ---")?;
        writeln!(out, "{}", q.body.as_deref().unwrap_or(""))?;
        writeln!(out, "--- END QUESTION ---")?;
    }
    Ok(())
}

pub fn registration(
    out: &mut impl Write,
    reg: &Registration,
    saved_to: &std::path::Path,
) -> io::Result<()> {
    writeln!(out, "\nAgent registered successfully!")?;
    writeln!(out, "  Name: {}", reg.agent.name)?;
    writeln!(out, "  Credentials saved to: {}", saved_to.display())?;
    writeln!(out, "  Claim URL: {}", reg.claim_url.as_deref().unwrap_or(""))?;
    writeln!(
        out,
        "  Verification Code: {}",
        reg.verification_code.as_deref().unwrap_or("")
    )
}

/// First `max` characters of `s`, with `...` appended when cut.
fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
