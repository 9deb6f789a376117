use chrono::{DateTime, Local};
use ingest_core::{JobRowView, JobState, PollPhase, TrackerViewModel};

const BAR_WIDTH: usize = 30;

pub fn render(view: &TrackerViewModel, at: DateTime<Local>) -> Vec<String> {
    let phase = match view.poll_phase {
        PollPhase::Idle => "idle",
        PollPhase::Polling => "polling",
    };
    let mut lines = Vec::with_capacity(view.jobs.len() + 1);
    lines.push(format!(
        "{} | {} | jobs {}/{} done | polls {} (failed {})",
        at.format("%H:%M:%S"),
        phase,
        view.terminal_count,
        view.job_count,
        view.polls_issued,
        view.poll_failures
    ));
    for job in &view.jobs {
        lines.extend(render_job(job));
    }
    lines
}

fn render_job(job: &JobRowView) -> Vec<String> {
    let mut line = format!(
        "[{}] {:>5.1}% {} {}",
        progress_bar(job.display_percentage),
        job.display_percentage,
        job.job_id,
        state_label(job.state)
    );
    if job.total > 0 {
        line.push_str(&format!(" {:.0}/{}", job.display_encoded.floor(), job.total));
    }
    if let Some(velocity) = job.velocity {
        line.push_str(&format!(" ({velocity:.1}/s)"));
    }
    if job.state == JobState::Completed {
        line.push_str(" ✓");
    }

    let mut lines = vec![line];
    if let Some(error) = &job.error {
        lines.push(format!("    error: {error}"));
    }
    lines
}

fn state_label(state: JobState) -> &'static str {
    match state {
        JobState::Unknown => "unknown",
        JobState::Waiting => "waiting",
        JobState::Processing => "processing",
        JobState::Completed => "completed",
        JobState::Error => "error",
    }
}

fn progress_bar(percentage: f64) -> String {
    let fraction = (percentage / 100.0).clamp(0.0, 1.0);
    let filled = ((fraction * BAR_WIDTH as f64).floor() as usize).min(BAR_WIDTH);
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}
