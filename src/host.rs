use std::io::{BufRead, Write};

use anyhow::Result;

use crate::source::base::ResolvedStream;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotificationLevel {
    Info,
    Error,
}

impl NotificationLevel {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationLevel::Info => "info",
            NotificationLevel::Error => "error",
        }
    }
}

/// Extra metadata shown for a playable video
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfoLabels {
    pub plot: String,
    pub credits: String,
    /// ISO date (`YYYY-MM-DD`)
    pub date: String,
}

/// One entry in a directory listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub label: String,
    pub thumbnail: Option<String>,
    pub info: Option<VideoInfoLabels>,
    pub playable: bool,
    /// (label, callback URL) pairs
    pub context_menu: Vec<(String, String)>,
}

impl ListItem {
    pub fn new(label: &str) -> ListItem {
        ListItem {
            label: label.into(),
            thumbnail: None,
            info: None,
            playable: false,
            context_menu: vec![],
        }
    }
}

/// What the media center provides to the plugin for a single invocation
pub trait Host {
    fn add_directory_item(&mut self, url: &str, item: &ListItem, is_folder: bool) -> Result<()>;

    fn end_of_directory(&mut self) -> Result<()>;

    /// Modal text input. `None` when the user cancels.
    fn input(&mut self, heading: &str) -> Result<Option<String>>;

    fn notify(&mut self, heading: &str, message: &str, level: NotificationLevel) -> Result<()>;

    /// Hand the stream for the current item over to the player
    fn set_resolved_url(&mut self, stream: &ResolvedStream) -> Result<()>;

    /// Whether an adaptive (MPEG-DASH) player is available
    fn supports_adaptive(&mut self) -> bool;
}

/// Renders everything as tab separated lines, reads input from a line reader
pub struct TerminalHost<R, W> {
    input: R,
    output: W,
    adaptive: bool,
}

impl<R: BufRead, W: Write> TerminalHost<R, W> {
    pub fn new(input: R, output: W, adaptive: bool) -> Self {
        TerminalHost {
            input,
            output,
            adaptive,
        }
    }
}

impl<R: BufRead, W: Write> Host for TerminalHost<R, W> {
    fn add_directory_item(&mut self, url: &str, item: &ListItem, is_folder: bool) -> Result<()> {
        let kind = if is_folder {
            "folder"
        } else if item.playable {
            "video"
        } else {
            "item"
        };
        writeln!(self.output, "{}\t{}\t{}", kind, item.label, url)?;
        if let Some(thumb) = &item.thumbnail {
            writeln!(self.output, "\tthumb: {}", thumb)?;
        }
        if let Some(info) = &item.info {
            let summary = info.plot.lines().next().unwrap_or("");
            writeln!(self.output, "\tby {} on {}: {}", info.credits, info.date, summary)?;
        }
        for (label, action) in &item.context_menu {
            writeln!(self.output, "\t[{}] {}", label, action)?;
        }
        Ok(())
    }

    fn end_of_directory(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }

    fn input(&mut self, heading: &str) -> Result<Option<String>> {
        eprint!("{}: ", heading);
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn notify(&mut self, heading: &str, message: &str, level: NotificationLevel) -> Result<()> {
        writeln!(self.output, "[{}] {}: {}", level.as_str(), heading, message)?;
        Ok(())
    }

    fn set_resolved_url(&mut self, stream: &ResolvedStream) -> Result<()> {
        match stream.manifest {
            Some(m) => writeln!(self.output, "play\t{}\t{}", stream.url, m.as_str())?,
            None => writeln!(self.output, "play\t{}", stream.url)?,
        }
        Ok(())
    }

    fn supports_adaptive(&mut self) -> bool {
        self.adaptive
    }
}
