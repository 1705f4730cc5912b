use crate::shell::command::Command;

pub fn parse_command(input: &str) -> Option<Command> {
    let tokens: Vec<&str> = input.trim().split_ascii_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    let cmd = tokens[0];
    let args = &tokens[1..];
    let number = |i: usize| args.get(i).and_then(|s| s.parse::<u32>().ok());

    match cmd {
        "help" => Some(Command::Help),
        "stat" => Some(Command::Stat),
        "check" => Some(Command::Check),
        "getsize" => number(0).map(Command::GetSize),
        "setsize" => Some(Command::SetSize(number(0)?, number(1)?)),
        "read" => Some(Command::Read(number(0)?, number(1)?)),
        "write" => {
            if args.len() >= 3 {
                Some(Command::Write(number(0)?, number(1)?, args[2..].join(" ")))
            } else {
                None
            }
        }
        "format" => number(0).map(Command::Format),
        "exit" => Some(Command::Exit),
        _ => None,
    }
}
