//! Line decoder for `xperf -i trace.etl -a dumper` text output.
//!
//! Each line is one record. The kind is the literal first field, the rest
//! are positional, comma separated and padded with spaces:
//!
//! ```text
//!     SampledProfile,      36765,      svchost.exe (1100),       1668, 0x81c3617b,   0, ...
//!              Stack,      36765,       1668,   1, 0x81c3617b,     halmacpi.dll!0x81c3617b
//!                Pmc,      64662,       7720, 41066, 6977
//!            CSwitch,      64662, RuntimeBroker.exe (3896), 7720, ..., MsMpEng.exe (3016), 13212, ...
//! ```
//!
//! Decoding never fails loudly: anything that is not a usable record comes
//! back as `None` and the caller decides whether that matters.

use super::schema::{
    CounterReading, EntityKey, ProfileSample, Record, RecordKind, SchedulingTransition, StackFrame,
};
use crate::utils::config::{CSWITCH_TOKEN, DIAGNOSTIC_PREFIX, PMC_TOKEN, SAMPLED_PROFILE_TOKEN, STACK_TOKEN};

/// Recognise the record kind from the first field only
///
/// **Public** - lets callers tell "malformed record" apart from "other line"
pub fn record_kind(line: &str) -> Option<RecordKind> {
    let token = line.trim_start().split(',').next()?;
    match token {
        SAMPLED_PROFILE_TOKEN => Some(RecordKind::ProfileSample),
        STACK_TOKEN => Some(RecordKind::StackFrame),
        PMC_TOKEN => Some(RecordKind::CounterReading),
        CSWITCH_TOKEN => Some(RecordKind::SchedulingTransition),
        _ => None,
    }
}

/// Decode one line into a typed record
///
/// **Public** - main entry point for line parsing
///
/// # Returns
/// `None` for empty lines, unknown kinds, the column-name header lines
/// xperf prints before each kind, short lines and unparsable numbers.
pub fn parse_record(line: &str) -> Option<Record> {
    let kind = record_kind(line)?;
    let line = line.trim_start();

    match kind {
        RecordKind::ProfileSample => parse_sampled_profile(line).map(Record::ProfileSample),
        RecordKind::StackFrame => parse_stack(line).map(Record::StackFrame),
        RecordKind::CounterReading => parse_pmc(line).map(Record::CounterReading),
        RecordKind::SchedulingTransition => parse_cswitch(line).map(Record::SchedulingTransition),
    }
}

/// Counter names from the `Pmc` column header line
///
/// ```text
/// Pmc,  TimeStamp,   ThreadID, BranchInstructions, BranchMispredictions
/// ```
pub fn parse_counter_header(line: &str) -> Option<Vec<String>> {
    if record_kind(line) != Some(RecordKind::CounterReading) {
        return None;
    }
    let fields = split_fields(line.trim_start(), usize::MAX);
    if fields.len() < RecordKind::CounterReading.min_fields() || parse_number(fields[1]).is_some() {
        return None;
    }
    Some(fields[3..].iter().map(|name| name.to_string()).collect())
}

/// Diagnostic lines xperf interleaves with records, e.g.
/// `Error: Description for thread state (9) could not be found.`
pub fn is_diagnostic(line: &str) -> bool {
    line.trim_start().starts_with(DIAGNOSTIC_PREFIX)
}

/// Parse `"name ( pid)"` into an entity key
///
/// The pid is right-aligned inside the parentheses, so padding is allowed.
pub fn parse_entity(field: &str) -> Option<EntityKey> {
    let field = field.trim();
    let inner = field.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let pid = inner[open + 1..].trim().parse::<u32>().ok()?;
    let name = inner[..open].trim_end();
    if name.is_empty() {
        return None;
    }
    Some(EntityKey::process(name, pid))
}

/// Parse a numeric field: `0x`-prefixed hex, otherwise decimal
pub fn parse_number(field: &str) -> Option<u64> {
    let field = field.trim();
    if let Some(hex) = field.strip_prefix("0x").or_else(|| field.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        field.parse::<u64>().ok()
    }
}

fn parse_u32(field: &str) -> Option<u32> {
    parse_number(field).and_then(|n| u32::try_from(n).ok())
}

/// Split into at most `limit` trimmed fields; the last keeps any commas
fn split_fields(line: &str, limit: usize) -> Vec<&str> {
    line.splitn(limit, ',').map(str::trim).collect()
}

fn parse_sampled_profile(line: &str) -> Option<ProfileSample> {
    let fields = split_fields(line, 7);
    if fields.len() < RecordKind::ProfileSample.min_fields() {
        return None;
    }
    Some(ProfileSample {
        timestamp: parse_number(fields[1])?,
        process: parse_entity(fields[2])?,
        tid: parse_u32(fields[3])?,
        program_counter: parse_number(fields[4])?,
        cpu: parse_u32(fields[5])?,
    })
}

fn parse_stack(line: &str) -> Option<StackFrame> {
    // Symbols such as `Foo<Vector,0>::Bar` contain commas, so the last field takes the rest
    let fields = split_fields(line, RecordKind::StackFrame.min_fields());
    if fields.len() < RecordKind::StackFrame.min_fields() {
        return None;
    }
    let symbol = fields[5];
    if symbol.is_empty() {
        return None;
    }
    Some(StackFrame {
        timestamp: parse_number(fields[1])?,
        tid: parse_u32(fields[2])?,
        depth: parse_u32(fields[3])?,
        address: parse_number(fields[4])?,
        symbol: symbol.to_string(),
    })
}

fn parse_pmc(line: &str) -> Option<CounterReading> {
    let fields = split_fields(line, usize::MAX);
    if fields.len() < RecordKind::CounterReading.min_fields() {
        return None;
    }
    let counters = fields[3..]
        .iter()
        .map(|field| parse_number(field))
        .collect::<Option<Vec<u64>>>()?;
    Some(CounterReading {
        timestamp: parse_number(fields[1])?,
        tid: parse_u32(fields[2])?,
        counters,
    })
}

fn parse_cswitch(line: &str) -> Option<SchedulingTransition> {
    let fields = split_fields(line, usize::MAX);
    if fields.len() < RecordKind::SchedulingTransition.min_fields() {
        return None;
    }
    Some(SchedulingTransition {
        timestamp: parse_number(fields[1])?,
        new_process: parse_entity(fields[2])?,
        new_tid: parse_u32(fields[3])?,
        old_process: parse_entity(fields[8])?,
        old_tid: parse_u32(fields[9])?,
        cpu: parse_u32(fields[16])?,
    })
}
