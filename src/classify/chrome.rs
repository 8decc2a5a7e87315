//! Chrome process identification from an `xperf -a process -withcmdline` listing.
//!
//! Each Chrome child process carries `--type=<kind>` on its command line and
//! is grouped under its parent pid. A `chrome.exe` without `--type=` is a
//! browser process and is grouped under its own pid.
//!
//! Example line (fields are `", "` separated):
//! `MIN, 24656403, Process, 0XA1141C60, chrome.exe ( 748), 10760, 1, 0x11e8c260, "C:\...\chrome.exe" --type=renderer ...`

use super::ProcessClassifier;
use crate::parser::{parse_entity, read_lines};
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::io::{self, BufRead};

const CHROME_IMAGE: &str = "chrome.exe";
const TYPE_FLAG: &str = " --type=";
const EXTENSION_FLAG: &str = " --extension-process ";
const MIN_FIELDS: usize = 9;
const CRASHPAD_TYPE: &str = "crashpad";
const TRUNCATED_TYPE: &str = "gpu???";

/// A browser process and its children, grouped by type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserGroup<'a> {
    pub pid: u32,
    pub exe_path: Option<&'a str>,
    /// type -> child pids in listing order
    pub children: &'a BTreeMap<String, Vec<u32>>,
}

impl BrowserGroup<'_> {
    pub fn process_count(&self) -> usize {
        self.children.values().map(Vec::len).sum()
    }
}

/// Chrome processes found in a process listing
///
/// **Public** - also used to annotate other reports with process types
#[derive(Debug, Clone, Default)]
pub struct ChromeProcessMap {
    types_by_pid: HashMap<u32, String>,
    exe_by_browser: HashMap<u32, String>,
    parent_by_browser: HashMap<u32, u32>,
    children_by_browser: BTreeMap<u32, BTreeMap<String, Vec<u32>>>,
}

impl ChromeProcessMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a whole listing
    ///
    /// # Errors
    /// * I/O errors from the reader
    pub fn from_listing<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut map = Self::new();
        for line in read_lines(reader) {
            let (_, line) = line?;
            map.add_line(&line);
        }
        map.fix_truncated_browsers();
        map.fix_orphaned_crashpad();
        debug!(
            "Identified {} Chrome processes under {} browsers",
            map.types_by_pid.len(),
            map.children_by_browser.len()
        );
        Ok(map)
    }

    /// Record one listing line
    ///
    /// # Returns
    /// True if the line described a Chrome process
    pub fn add_line(&mut self, line: &str) -> bool {
        let parts: Vec<&str> = line.split(", ").collect();
        if parts.len() < MIN_FIELDS || !parts[4].contains(CHROME_IMAGE) {
            return false;
        }
        let Some(entity) = parse_entity(parts[4]) else {
            warn!("Unreadable process field: {}", parts[4].trim());
            return false;
        };
        let Ok(parent_pid) = parts[5].trim().parse::<u32>() else {
            warn!("Unreadable parent pid for {}: {}", entity, parts[5].trim());
            return false;
        };
        // Command lines may themselves contain ", "
        let command_line = parts[MIN_FIELDS - 1..].join(", ");
        let pid = entity.pid;

        let (kind, owner) = match command_type(&command_line) {
            Some(kind) => (kind, parent_pid),
            None => {
                if let Some(exe) = exe_path(&command_line) {
                    self.exe_by_browser.insert(pid, exe.to_string());
                }
                self.parent_by_browser.insert(pid, parent_pid);
                ("browser".to_string(), pid)
            }
        };

        self.types_by_pid.insert(pid, kind.clone());
        self.children_by_browser
            .entry(owner)
            .or_default()
            .entry(kind)
            .or_default()
            .push(pid);
        true
    }

    /// Re-home "browsers" that are really children of another browser
    ///
    /// ETW truncates command lines, so a child whose `--type=` came late loses
    /// it and looks like a browser. Such a group holds only itself, and its
    /// parent is a recorded browser. It moves under that parent as `gpu???`.
    pub fn fix_truncated_browsers(&mut self) {
        let mut candidates: Vec<u32> = self.parent_by_browser.keys().copied().collect();
        candidates.sort_unstable();
        for pid in candidates {
            let Some(&parent) = self.parent_by_browser.get(&pid) else {
                continue;
            };
            let alone = self
                .children_by_browser
                .get(&pid)
                .is_some_and(|children| children.len() == 1 && children.contains_key("browser"));
            if !alone || parent == pid || !self.parent_by_browser.contains_key(&parent) {
                continue;
            }

            debug!("Moving truncated process {} under browser {}", pid, parent);
            self.children_by_browser.remove(&pid);
            self.exe_by_browser.remove(&pid);
            self.parent_by_browser.remove(&pid);
            self.types_by_pid.insert(pid, TRUNCATED_TYPE.to_string());
            self.children_by_browser
                .entry(parent)
                .or_default()
                .entry(TRUNCATED_TYPE.to_string())
                .or_default()
                .push(pid);
        }
    }

    /// Re-home crashpad handlers whose recorded parent is itself a crashpad process
    ///
    /// The second crashpad handler is spawned by the first one, so it shows up
    /// as a "browser" with a single crashpad child.
    pub fn fix_orphaned_crashpad(&mut self) {
        let orphans: Vec<(u32, u32)> = self
            .children_by_browser
            .iter()
            .filter(|(_, children)| children.len() == 1)
            .filter_map(|(&parent, children)| Some((parent, *children.get(CRASHPAD_TYPE)?.first()?)))
            .collect();

        for (parent, child) in orphans {
            let adopter = self.children_by_browser.iter().find_map(|(&browser, children)| {
                let spawned = browser != parent
                    && children.get(CRASHPAD_TYPE).is_some_and(|pids| pids.contains(&parent));
                spawned.then_some(browser)
            });
            let Some(browser) = adopter else {
                continue;
            };
            debug!("Moving crashpad handler {} from {} to browser {}", child, parent, browser);
            self.children_by_browser.remove(&parent);
            self.children_by_browser
                .entry(browser)
                .or_default()
                .entry(CRASHPAD_TYPE.to_string())
                .or_default()
                .push(child);
        }
    }

    /// Browser groups sorted by browser pid
    pub fn browsers(&self) -> impl Iterator<Item = BrowserGroup<'_>> {
        self.children_by_browser.iter().map(|(&pid, children)| BrowserGroup {
            pid,
            exe_path: self.exe_by_browser.get(&pid).map(String::as_str),
            children,
        })
    }

    pub fn len(&self) -> usize {
        self.types_by_pid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types_by_pid.is_empty()
    }
}

impl ProcessClassifier for ChromeProcessMap {
    fn category(&self, pid: u32) -> Option<&str> {
        self.types_by_pid.get(&pid).map(String::as_str)
    }
}

/// Process type named on a child's command line
fn command_type(command_line: &str) -> Option<String> {
    let start = command_line.find(TYPE_FLAG)? + TYPE_FLAG.len();
    let rest = &command_line[start..];
    let kind = rest.split(' ').next().unwrap_or(rest);

    if command_line.contains(EXTENSION_FLAG) {
        return Some("extension".to_string());
    }
    if kind == "crashpad-handler" {
        return Some(CRASHPAD_TYPE.to_string());
    }
    Some(kind.to_string())
}

/// Executable path, with or without surrounding quotes
fn exe_path(command_line: &str) -> Option<&str> {
    let command_line = command_line.trim();
    match command_line.strip_prefix('"') {
        Some(quoted) => quoted.split('"').next(),
        None => command_line.split(' ').next(),
    }
    .filter(|path| !path.is_empty())
}

/// Render the grouping the way the `classify` command prints it
pub fn format_browser_groups(map: &ChromeProcessMap) -> String {
    let mut out = String::new();
    for group in map.browsers() {
        out.push_str(&format!(
            "{} ({}) - {} processes\n",
            group.exe_path.unwrap_or("Unknown parent"),
            group.pid,
            group.process_count()
        ));
        for (kind, pids) in group.children {
            let mut pids = pids.clone();
            pids.sort_unstable();
            let pids: Vec<String> = pids.iter().map(u32::to_string).collect();
            out.push_str(&format!("    {:<11} : {}\n", kind, pids.join(" ")));
        }
    }
    out
}
