pub mod command;
pub mod parse;

use crate::shell::{command::execute_command, parse::parse_command};
use chainfs::{
    disk::{
        init::{perform_disk_initialization, BootProgress, DiskOptions},
        FileDisk,
    },
    ChainFs,
};
use colored::*;
use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use indicatif::{ProgressBar, ProgressStyle};
use reedline::{
    DefaultCompleter, DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal,
};
use std::{
    any::Any,
    error::Error,
    io::stdout,
    path::PathBuf,
    sync::mpsc,
    thread,
};

const COMMANDS: [&str; 9] = [
    "help", "stat", "check", "getsize", "setsize", "read", "write", "format", "exit",
];

pub fn start_shell(options: DiskOptions) -> Result<(), Box<dyn Error>> {
    let image = options.path.display().to_string();
    let fs = boot(options)?;

    let username = whoami::username();
    let hostname = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());

    println!(
        "{}",
        "Type 'help' for available commands. Use ↑↓ for history, Tab for auto-completion.\n"
            .bright_black()
    );

    // 初始化 reedline
    let history_path = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chainfs_history");

    let mut line_editor = Reedline::create().with_history(Box::new(
        FileBackedHistory::with_file(100, history_path)?,
    ));

    // 命令补全
    let completer =
        DefaultCompleter::new_with_wordlen(COMMANDS.iter().map(|c| c.to_string()).collect(), 2);
    line_editor = line_editor.with_completer(Box::new(completer));

    loop {
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(format!(
                "{}:{}",
                format!("{}@{}", username, hostname).green(),
                image.blue()
            )),
            DefaultPromptSegment::Basic("chainfs".bright_blue().bold().to_string()),
        );

        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(buffer)) => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_command(trimmed) {
                    Some(cmd) => {
                        if let Err(e) = execute_command(&cmd, &fs) {
                            println!("{} {}", "❌ Error:".red().bold(), e);
                        }
                        if matches!(cmd, command::Command::Exit) {
                            break;
                        }
                    }
                    None => println!(
                        "{}",
                        "⚠️  Unknown command. Type 'help' for command list.".yellow()
                    ),
                }
            }
            Ok(Signal::CtrlD) => {
                println!("{}", "Exiting chainfs...".yellow());
                break;
            }
            Ok(_) => {
                println!();
                continue;
            }
            Err(e) => {
                println!("Error reading line: {}", e);
                break;
            }
        }
    }

    println!("{}", "GoodBye!".bright_yellow());
    Ok(())
}

/// 在后台线程打开镜像，前台画进度条
fn boot(options: DiskOptions) -> Result<ChainFs<FileDisk>, Box<dyn Error>> {
    let mut stdout = stdout();
    execute!(stdout, Clear(ClearType::All), cursor::MoveTo(0, 0))?;
    println!("{}", "[chainfs Booting...]".bright_yellow().bold());

    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || perform_disk_initialization(tx, options));

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos:>3}% {msg}")?
            .progress_chars("=> "),
    );

    let mut mounted = None;
    for message in rx {
        match message {
            BootProgress::Step(step) => pb.set_message(step),
            BootProgress::Progress(pos) => pb.set_position(pos),
            BootProgress::Finished(result) => {
                mounted = Some(result);
                break;
            }
        }
    }
    if let Err(payload) = worker.join() {
        log::error!("boot worker panicked: {}", panic_message(payload.as_ref()));
    }

    let fs = match mounted {
        Some(Ok(fs)) => fs,
        Some(Err(e)) => {
            pb.abandon_with_message("❌ Boot failed");
            return Err(Box::new(e));
        }
        None => {
            pb.abandon_with_message("❌ Boot failed");
            return Err("disk initialization stopped without a result".into());
        }
    };
    pb.finish_with_message("✅ Ready!");

    execute!(
        stdout,
        Clear(ClearType::All),
        cursor::MoveTo(0, 0),
        SetForegroundColor(Color::Cyan),
        Print(format!("Welcome to chainfs v{}\n", env!("CARGO_PKG_VERSION"))),
        ResetColor
    )?;
    Ok(fs)
}

/// 取出 panic 携带的文字说明
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
