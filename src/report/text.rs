//! Plain text renderings of ranked rows.

use super::ranking::ReportRow;
use crate::aggregator::{CounterLabel, StackLabel, TimerLabel};
use crate::attribution::TimerProfile;
use crate::classify::ProcessClassifier;
use crate::parser::EntityKey;

const NAME_WIDTH: usize = 43;

/// Header line for the counter table
pub fn counter_table_header(counter_names: &[String]) -> String {
    let description = if counter_names.is_empty() {
        "<unknown counters>".to_string()
    } else {
        format!(",{}", counter_names.join(","))
    };
    format!("{:>width$}: cnt1/cnt2{}", "Process name", description, width = NAME_WIDTH)
}

/// One counter table line
///
/// The percentage is the first counter relative to the second, e.g. cache
/// misses per reference.
pub fn format_counter_row(row: &ReportRow<CounterLabel>, counter_count: usize) -> String {
    let counters: Vec<u64> = (0..counter_count)
        .map(|i| row.value(&CounterLabel::Counter(i)))
        .collect();
    let ratio = match (counters.first(), counters.get(1)) {
        (Some(&first), Some(&second)) if second > 0 => first as f64 * 100.0 / second as f64,
        _ => 0.0,
    };
    let counters: Vec<String> = counters.iter().map(|c| format!("{:>11}", c)).collect();

    format!(
        "{:>width$}: {:6.2}%,   [{}], {:5} context switches, time: {:8}",
        row.key.to_string(),
        ratio,
        counters.join(","),
        row.value(&CounterLabel::ContextSwitches),
        row.value(&CounterLabel::CpuTime),
        width = NAME_WIDTH
    )
}

/// Full counter table, header first
pub fn format_counter_table(rows: &[ReportRow<CounterLabel>], counter_names: &[String]) -> String {
    let mut lines = vec![counter_table_header(counter_names)];
    lines.extend(rows.iter().map(|row| format_counter_row(row, counter_names.len())));
    lines.join("\n")
}

/// Summary of the busiest threads in a sampled profile
pub fn format_stack_summary(rows: &[ReportRow<StackLabel>], total_samples: u64, thread_count: usize) -> String {
    let mut lines = vec![format!(
        "Found {} samples from {} threads.",
        total_samples, thread_count
    )];
    for row in rows {
        let share = if total_samples > 0 {
            row.total as f64 * 100.0 / total_samples as f64
        } else {
            0.0
        };
        lines.push(format!(
            "  {:>8} samples ({:5.1}%) {:>6} stacks  {}",
            row.total,
            share,
            row.breakdown.len(),
            row.key
        ));
    }
    lines.join("\n")
}

/// Per-process timer resolution summary
///
/// `rows` give the order. Processes with history but no closed interval
/// (a single change) follow the ranked rows in key order.
pub fn format_timer_summary(
    profile: &TimerProfile,
    rows: &[ReportRow<TimerLabel>],
    classifier: Option<&dyn ProcessClassifier>,
) -> String {
    let seconds = profile.trace_duration_us as f64 / 1_000_000.0;
    let per_second = |count: u64| if seconds > 0.0 { count as f64 / seconds } else { 0.0 };
    let share = |us: u64| {
        if profile.trace_duration_us > 0 {
            us as f64 * 100.0 / profile.trace_duration_us as f64
        } else {
            0.0
        }
    };

    let mut order: Vec<(&EntityKey, Option<&ReportRow<TimerLabel>>)> = rows
        .iter()
        .filter_map(|row| row.key.entity().map(|entity| (entity, Some(row))))
        .collect();
    let mut singles: Vec<&EntityKey> = profile
        .histories
        .keys()
        .filter(|entity| !profile.table.contains(entity))
        .collect();
    singles.sort();
    order.extend(singles.into_iter().map(|entity| (entity, None)));

    let mut lines = vec![format!("Trace duration is {:.3} seconds.", seconds)];
    for (entity, row) in order {
        let Some(history) = profile.histories.get(entity) else {
            continue;
        };
        let entries = history.changes + history.synthetic;
        let rate = if history.raised_at_end() {
            if history.changes == 0 {
                "- frequency still raised at trace end".to_string()
            } else {
                format!(
                    "({:.1}/s) - frequency still raised at trace end",
                    per_second(history.changes)
                )
            }
        } else {
            format!("({:.1}/s)", per_second(entries))
        };
        let type_name = classifier
            .and_then(|c| c.category(entity.pid))
            .map(|kind| format!(" (Chrome {})", kind))
            .unwrap_or_default();

        lines.push(format!(
            "{}{}: {} frequency changes {}",
            entity, type_name, history.changes, rate
        ));

        if entries == 1 && !history.raised_at_end() {
            let at = history.first_timestamp_us as f64 / 1_000_000.0;
            if history.first_interval == 0 {
                lines.push(format!("  timeEndPeriod called at {:.3} s", at));
            } else {
                lines.push(format!(
                    "  {:.1} ms set at {:.3} s",
                    TimerLabel(history.first_interval).as_millis(),
                    at
                ));
            }
        }
        for (level, us) in row.map(|r| r.breakdown.as_slice()).unwrap_or_default() {
            if level.0 > 0 {
                lines.push(format!(
                    "  {:.1} ms for {:5.1}% of the time",
                    level.as_millis(),
                    share(*us)
                ));
            }
        }
    }
    lines.join("\n")
}
