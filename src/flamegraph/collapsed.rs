//! Collapsed stack lines for one ranked thread.

use crate::aggregator::StackLabel;
use crate::report::ReportRow;

/// "label count" lines, sorted
///
/// **Public** - input for both the collapsed stack file and the flamegraph
pub fn collapsed_lines(row: &ReportRow<StackLabel>) -> Vec<String> {
    let mut lines: Vec<String> = row
        .breakdown
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(label, count)| format!("{} {}", label, count))
        .collect();
    lines.sort();
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::EntityKey;
    use crate::report::ReportKey;

    #[test]
    fn test_lines_are_sorted() {
        let row = ReportRow {
            key: ReportKey::Entity(EntityKey::process("a.exe", 1).with_thread(2)),
            breakdown: vec![
                (StackLabel("a.exe_1_2;main;work".to_string()), 3),
                (StackLabel("a.exe_1_2;main".to_string()), 1),
            ],
            total: 4,
            rank_value: 4,
        };
        assert_eq!(
            collapsed_lines(&row),
            vec!["a.exe_1_2;main 1".to_string(), "a.exe_1_2;main;work 3".to_string()]
        );
    }
}
