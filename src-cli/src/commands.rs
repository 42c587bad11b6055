//! Front-desk commands typed on stdin

use booth_core::Command;
use booth_dsp::BoothPreset;

/// One parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Command(Command),
    Status,
    Help,
    Empty,
}

pub const HELP: &str = "\
commands:
  coin              insert a coin and start the countdown
  stop              end the session early (monitor keeps running)
  reset             stop everything and return to IDLE
  preset <name>     NORMAL | ECHO | ROOM | STAGE
  volume <0-2>      monitor volume
  echo <0-1>        echo amount
  room <0-1>        room amount
  mute              toggle mute
  status            print the booth state
  quit              reset and exit";

pub fn parse_line(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Input::Empty);
    };
    let arg = words.next();

    let command = match verb.to_ascii_lowercase().as_str() {
        "coin" | "insert" => Command::InsertCoin,
        "stop" => Command::StopSession,
        "reset" => Command::Reset,
        "mute" => Command::ToggleMute,
        "quit" | "exit" => Command::Shutdown,
        "status" => return Ok(Input::Status),
        "help" | "?" => return Ok(Input::Help),
        "preset" => {
            let name = arg.ok_or("preset needs a name")?;
            let preset = name.parse::<BoothPreset>().map_err(|e| e.to_string())?;
            Command::SetPreset(preset)
        }
        "volume" => Command::SetVolume(number(verb, arg)?),
        "echo" => Command::SetEcho(number(verb, arg)?),
        "room" => Command::SetRoom(number(verb, arg)?),
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(Input::Command(command))
}

fn number(verb: &str, arg: Option<&str>) -> Result<f32, String> {
    let arg = arg.ok_or_else(|| format!("{} needs a value", verb))?;
    arg.parse::<f32>()
        .map_err(|_| format!("'{}' is not a number", arg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_commands() {
        assert_eq!(parse_line("coin"), Ok(Input::Command(Command::InsertCoin)));
        assert_eq!(parse_line("  STOP "), Ok(Input::Command(Command::StopSession)));
        assert_eq!(parse_line("reset"), Ok(Input::Command(Command::Reset)));
        assert_eq!(parse_line("quit"), Ok(Input::Command(Command::Shutdown)));
        assert_eq!(parse_line("status"), Ok(Input::Status));
        assert_eq!(parse_line(""), Ok(Input::Empty));
    }

    #[test]
    fn test_parameter_commands() {
        assert_eq!(
            parse_line("preset stage"),
            Ok(Input::Command(Command::SetPreset(BoothPreset::Stage)))
        );
        assert_eq!(parse_line("volume 1.2"), Ok(Input::Command(Command::SetVolume(1.2))));
        assert_eq!(parse_line("echo 0.5"), Ok(Input::Command(Command::SetEcho(0.5))));
        assert_eq!(parse_line("room 1"), Ok(Input::Command(Command::SetRoom(1.0))));
        assert_eq!(parse_line("mute"), Ok(Input::Command(Command::ToggleMute)));
    }

    #[test]
    fn test_bad_input() {
        assert!(parse_line("preset").is_err());
        assert!(parse_line("preset disco").is_err());
        assert!(parse_line("volume loud").is_err());
        assert!(parse_line("dance").is_err());
    }
}
