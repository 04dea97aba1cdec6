//! Line-oriented operator commands for the `catpoint run` console.

use crate::data::{ArmingStatus, SensorType};
use crate::image::CameraImage;

/// Frame size used for simulated camera images.
const SIMULATED_FRAME_SIZE: u32 = 32;

/// A single operator command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Arm(ArmingStatus),
    AddSensor { name: String, sensor_type: SensorType },
    RemoveSensor { name: String },
    SetSensor { name: String, active: bool },
    Image(SimulatedFrame),
    Status,
    Help,
}

/// What a simulated camera frame shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedFrame {
    Cat,
    Clear,
}

impl SimulatedFrame {
    /// Render a frame the brightness-based classifier will read as intended.
    pub fn render(&self) -> CameraImage {
        let value = match self {
            SimulatedFrame::Cat => 230,
            SimulatedFrame::Clear => 20,
        };
        CameraImage::filled(SIMULATED_FRAME_SIZE, SIMULATED_FRAME_SIZE, value)
    }
}

impl Command {
    /// Parse one input line. Blank lines and `#` comments yield `Ok(None)`.
    ///
    /// Sensor names may contain spaces; the sensor type is always the last
    /// word of `sensor add`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        let keyword = words[0].to_lowercase();
        let rest = &words[1..];

        let command = match keyword.as_str() {
            "arm" => {
                let mode = rest.first().ok_or(CommandError::MissingArgument("arm"))?;
                let status = mode
                    .parse::<ArmingStatus>()
                    .map_err(|e| CommandError::InvalidArgument(e.to_string()))?;
                Command::Arm(status)
            }
            "disarm" => Command::Arm(ArmingStatus::Disarmed),
            "sensor" => Self::parse_sensor(rest)?,
            "image" => match rest.first().map(|s| s.to_lowercase()).as_deref() {
                Some("cat") => Command::Image(SimulatedFrame::Cat),
                Some("clear") | Some("empty") => Command::Image(SimulatedFrame::Clear),
                Some(other) => return Err(CommandError::InvalidArgument(other.to_string())),
                None => return Err(CommandError::MissingArgument("image")),
            },
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };

        Ok(Some(command))
    }

    fn parse_sensor(args: &[&str]) -> Result<Command, CommandError> {
        let (action, args) = args
            .split_first()
            .ok_or(CommandError::MissingArgument("sensor"))?;

        match action.to_lowercase().as_str() {
            "add" => {
                if args.len() < 2 {
                    return Err(CommandError::MissingArgument("sensor add"));
                }
                let (name_words, type_word) = args.split_at(args.len() - 1);
                let sensor_type = type_word[0]
                    .parse::<SensorType>()
                    .map_err(|e| CommandError::InvalidArgument(e.to_string()))?;
                Ok(Command::AddSensor {
                    name: name_words.join(" "),
                    sensor_type,
                })
            }
            "remove" => Ok(Command::RemoveSensor {
                name: Self::sensor_name(args, "sensor remove")?,
            }),
            "on" => Ok(Command::SetSensor {
                name: Self::sensor_name(args, "sensor on")?,
                active: true,
            }),
            "off" => Ok(Command::SetSensor {
                name: Self::sensor_name(args, "sensor off")?,
                active: false,
            }),
            other => Err(CommandError::InvalidArgument(other.to_string())),
        }
    }

    fn sensor_name(args: &[&str], command: &'static str) -> Result<String, CommandError> {
        if args.is_empty() {
            return Err(CommandError::MissingArgument(command));
        }
        Ok(args.join(" "))
    }
}

/// Help text for the console.
pub const HELP: &str = "\
Commands:
  arm home|away            Arm the system
  disarm                   Disarm the system
  sensor add NAME TYPE     Register a door, window or motion sensor
  sensor remove NAME       Unregister a sensor
  sensor on|off NAME       Activate or deactivate a sensor
  image cat|clear          Submit a simulated camera frame
  status                   Show alarm, arming and sensor state
  help                     Show this help";

/// Command parsing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    UnknownCommand(String),
    MissingArgument(&'static str),
    InvalidArgument(String),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::UnknownCommand(c) => write!(f, "Unknown command '{c}' (try 'help')"),
            CommandError::MissingArgument(c) => write!(f, "Missing argument for '{c}'"),
            CommandError::InvalidArgument(e) => write!(f, "Invalid argument: {e}"),
        }
    }
}

impl std::error::Error for CommandError {}
