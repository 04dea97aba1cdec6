//! Catpoint CLI
//!
//! Operator console for the alarm-state engine.

use anyhow::{Context, Result};
use catpoint_security::{
    audit::create_shared_log,
    cli::{Command, HELP},
    AlarmStatus, ArmingStatus, ChannelListener, Config, FakeImageService, InMemoryRepository,
    LoggingListener, SecurityService, Sensor, StatusEvent, VERSION,
};
use clap::{Parser, Subcommand};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

type Service = SecurityService<InMemoryRepository, FakeImageService>;

#[derive(Parser)]
#[command(name = "catpoint")]
#[command(version = VERSION)]
#[command(about = "Home security alarm controller with cat detection", long_about = None)]
struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the operator console
    Run {
        /// Read commands from a file instead of stdin
        #[arg(long, short)]
        script: Option<PathBuf>,
    },

    /// Show configuration
    Config,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run { script } => cmd_run(config_path, script),
        Commands::Config => cmd_config(config_path),
        Commands::Init { force } => cmd_init(config_path, force),
    }
}

/// Load from `--config` when given, otherwise from the default location.
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => {
            Config::load_from(path).with_context(|| format!("loading config from {path:?}"))
        }
        None => Config::load().context("loading config from the default location"),
    }
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_run(config_path: Option<&Path>, script: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    init_logging(&config);

    println!("Catpoint Security v{VERSION}");
    println!();

    let repository = InMemoryRepository::with_state(
        AlarmStatus::NoAlarm,
        ArmingStatus::Disarmed,
        config.sensors.iter().map(|s| s.to_sensor()),
    );
    let mut service = SecurityService::new(repository, FakeImageService::new())
        .with_confidence_threshold(config.cat_confidence_threshold);

    let audit_log = create_shared_log();
    let (channel_listener, events) = ChannelListener::new();
    service.add_status_listener(Arc::new(LoggingListener));
    service.add_status_listener(audit_log.clone());
    service.add_status_listener(Arc::new(channel_listener));

    print_status(&service)?;
    println!();
    println!("Type 'help' for commands. Press Ctrl+C to stop.");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;

    let lines = spawn_line_reader(script)?;

    while running.load(Ordering::SeqCst) {
        match lines.recv_timeout(Duration::from_millis(100)) {
            Ok(line) => {
                match Command::parse(&line) {
                    Ok(Some(command)) => {
                        if let Err(e) = execute(&mut service, command) {
                            eprintln!("Error: {e:#}");
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("Error: {e}"),
                }
                print_events(&events);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    println!();
    print_status(&service)?;
    println!();
    println!("{}", audit_log.summary());
    Ok(())
}

fn execute(service: &mut Service, command: Command) -> Result<()> {
    match command {
        Command::Arm(status) => service.set_arming_status(status)?,
        Command::AddSensor { name, sensor_type } => {
            if service.repository().find_by_name(&name).is_some() {
                anyhow::bail!("sensor '{name}' already exists");
            }
            service.add_sensor(Sensor::new(name, sensor_type))?;
        }
        Command::RemoveSensor { name } => {
            let sensor = find_sensor(service, &name)?;
            service.remove_sensor(&sensor)?;
        }
        Command::SetSensor { name, active } => {
            let mut sensor = find_sensor(service, &name)?;
            service.change_sensor_activation_status(&mut sensor, active)?;
        }
        Command::Image(frame) => service.process_image(&frame.render())?,
        Command::Status => print_status(service)?,
        Command::Help => println!("{HELP}"),
    }
    Ok(())
}

fn find_sensor(service: &Service, name: &str) -> Result<Sensor> {
    service
        .repository()
        .find_by_name(name)
        .cloned()
        .with_context(|| format!("no sensor named '{name}'"))
}

fn print_events(events: &Receiver<StatusEvent>) {
    for event in events.try_iter() {
        match event {
            StatusEvent::AlarmStatusChanged(status) => {
                println!("  >> Alarm: {}", status.description())
            }
            StatusEvent::SensorStatusChanged => println!("  >> Sensors updated"),
            StatusEvent::CatDetected(true) => println!("  >> DANGER - CAT DETECTED"),
            StatusEvent::CatDetected(false) => println!("  >> Cat not detected"),
        }
    }
}

fn print_status(service: &Service) -> Result<()> {
    println!("System Status");
    println!("=============");
    println!("  Arming: {}", service.arming_status()?.description());
    println!("  Alarm:  {}", service.alarm_status()?.description());
    println!(
        "  Camera: {} (threshold {:.0}%)",
        if service.is_cat_detected() {
            "cat in view"
        } else {
            "clear"
        },
        service.confidence_threshold()
    );
    let sensors = service.sensors()?;
    if sensors.is_empty() {
        println!("  No sensors registered.");
    }
    for sensor in sensors {
        println!(
            "  [{}] {} ({})",
            if sensor.active { "ACTIVE" } else { "  --  " },
            sensor.name(),
            sensor.sensor_type()
        );
    }
    Ok(())
}

/// Read command lines on a background thread.
fn spawn_line_reader(script: Option<PathBuf>) -> Result<Receiver<String>> {
    let reader: Box<dyn BufRead + Send> = match script {
        Some(path) => {
            let file = std::fs::File::open(&path)
                .with_context(|| format!("opening script {path:?}"))?;
            Box::new(std::io::BufReader::new(file))
        }
        None => Box::new(std::io::BufReader::new(std::io::stdin())),
    };

    let (sender, receiver) = crossbeam_channel::bounded(64);
    thread::spawn(move || {
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if sender.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "input_read_failed");
                    break;
                }
            }
        }
    });
    Ok(receiver)
}

fn cmd_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let shown_path = config_path.map_or_else(Config::config_path, Path::to_path_buf);

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {shown_path:?}");
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let target = config_path.map_or_else(Config::config_path, Path::to_path_buf);
    if target.exists() && !force {
        anyhow::bail!("{target:?} already exists (use --force to overwrite)");
    }

    let config = Config::default();
    match config_path {
        Some(path) => config.save_to(path)?,
        None => config.save()?,
    }
    println!("Wrote default configuration to {target:?}");
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")
}
