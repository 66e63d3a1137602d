//! Interactive line-oriented session over one workflow controller.

use crate::constants::{DEFAULT_K, MAX_K, MIN_K, SUCCESS_PREFIX};
use crate::error::Result;
use crate::service::CompressionService;
use crate::utils::{create_progress_spinner, print_workflow_summary};
use crate::workflow::{Completion, CompressionWorkflowController, SelectedFile};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const HELP: &str = "Commands:
  open <path>   select an image
  k <n>         set compression intensity (1-500)
  compress      send the selected image to the service
  stats         show the current statistics
  save [dir]    save the result as compressed_k{K}.jpg
  help          show this help
  quit          leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Open(PathBuf),
    SetK(u32),
    Compress,
    Stats,
    Save(Option<PathBuf>),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

/// Clamp a requested K into the accepted range.
pub fn clamp_k(k: i64) -> u32 {
    k.clamp(MIN_K as i64, MAX_K as i64) as u32
}

impl SessionCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_lowercase().as_str() {
            "" => SessionCommand::Empty,
            "open" | "select" if !rest.is_empty() => SessionCommand::Open(PathBuf::from(rest)),
            "k" => match rest.parse::<i64>() {
                Ok(k) => SessionCommand::SetK(clamp_k(k)),
                Err(_) => SessionCommand::Unknown(line.to_string()),
            },
            "compress" | "c" => SessionCommand::Compress,
            "stats" | "status" => SessionCommand::Stats,
            "save" | "download" => {
                SessionCommand::Save((!rest.is_empty()).then(|| PathBuf::from(rest)))
            }
            "help" | "?" => SessionCommand::Help,
            "quit" | "exit" | "q" => SessionCommand::Quit,
            _ => SessionCommand::Unknown(line.to_string()),
        }
    }
}

/// Interactive driver: reads commands and applies them to the controller.
pub struct Session<S: CompressionService + ?Sized> {
    controller: CompressionWorkflowController,
    service: Box<S>,
    k: u32,
}

impl<S: CompressionService + ?Sized> Session<S> {
    pub fn new(controller: CompressionWorkflowController, service: Box<S>) -> Self {
        Self {
            controller,
            service,
            k: DEFAULT_K,
        }
    }

    pub fn controller(&self) -> &CompressionWorkflowController {
        &self.controller
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    /// Run commands from `input` until `quit` or end of input.
    pub async fn run<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        crate::info!("{}", HELP);
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if !self.execute(SessionCommand::parse(&line)).await {
                break;
            }
        }
        Ok(())
    }

    /// Apply one command. Returns `false` when the session should end.
    pub async fn execute(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::Open(path) => match SelectedFile::from_path(&path) {
                Ok(file) => match self.controller.select_file(Some(file)) {
                    Ok(_) => print_workflow_summary(&self.controller),
                    Err(e) => crate::error!("{}", e),
                },
                Err(e) => crate::error!("{}", e),
            },
            SessionCommand::SetK(k) => {
                self.k = k;
                crate::info!("K = {}", k);
            }
            SessionCommand::Compress => self.compress().await,
            SessionCommand::Stats => print_workflow_summary(&self.controller),
            SessionCommand::Save(dir) => {
                let dir = dir.unwrap_or_else(|| PathBuf::from("."));
                match self.controller.save_result(&dir) {
                    Ok(path) => crate::info!("{} Saved {}", SUCCESS_PREFIX, path.display()),
                    Err(e) => crate::error!("{}", e),
                }
            }
            SessionCommand::Help => crate::info!("{}", HELP),
            SessionCommand::Quit => return false,
            SessionCommand::Empty => {}
            SessionCommand::Unknown(line) => {
                crate::warn!("Unknown command '{}'. Type 'help' for a list.", line)
            }
        }
        true
    }

    async fn compress(&mut self) {
        let ticket = match self.controller.begin_compress(self.k) {
            Ok(ticket) => ticket,
            Err(e) => {
                crate::warn!("{}", e);
                return;
            }
        };

        let spinner = create_progress_spinner(&format!("Compressing with k={}...", self.k));
        let outcome = ticket.execute(self.service.as_ref()).await;
        spinner.finish_and_clear();

        match self.controller.finish(outcome) {
            Completion::Succeeded { .. } => print_workflow_summary(&self.controller),
            Completion::Failed { message } => crate::error!("{}", message),
            Completion::Stale => crate::verbose!("Discarded an outdated response"),
        }
    }
}
