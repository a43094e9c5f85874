//! Binary entrypoint for the k5dock CLI.
//!
//! Commands:
//! - `run [--port <path>] [-b <baud>] [--json] [--dump]` - mirror the radio screen, type keys
//! - `init` - write a starter `k5dock.toml`
//! - `keys` - print the keypad keycode table
//! - `frame <command> [payload-hex]` - print an encoded command frame
//! - `decode <frame-hex>` - check a command frame and print its command and payload
//! - `replay <file>` - decode a captured raw byte dump offline
//!
//! See the library crate docs for module-level details: `k5dock::`.
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use k5dock::config::Config;
use k5dock::console::Presenter;
use k5dock::logutil::hex_snippet;
use k5dock::protocol::{decode_frame, encode_frame, Key, StreamParser, CMD_GET_SCREEN, CMD_KEYPRESS};
use k5dock::screen::ScreenModel;

#[derive(Parser)]
#[command(name = "k5dock")]
#[command(about = "Mirror a handheld radio's screen and drive its keypad over serial")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "k5dock.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror the screen; type key labels (1, MENU, UP, #, ...) on stdin to press keys
    Run {
        /// Radio serial port (e.g., /dev/ttyUSB0)
        #[arg(short, long)]
        port: Option<String>,
        /// Baud rate
        #[arg(short = 'b', long)]
        baud: Option<u32>,
        /// Release keycode sent after taps (-1 disables)
        #[arg(long, allow_negative_numbers = true)]
        release: Option<i32>,
        /// PTT hold-down keycode. CAREFUL: this transmits
        #[arg(long)]
        ptt_hold: Option<u16>,
        /// Key down time for taps (ms)
        #[arg(long)]
        keydown_ms: Option<u64>,
        /// Print every event as a JSON line
        #[arg(long)]
        json: bool,
        /// Print the whole screen after each update
        #[arg(long)]
        dump: bool,
    },
    /// Write a default configuration file
    Init,
    /// List keypad keycodes
    Keys,
    /// Encode a command frame and print it as hex
    Frame {
        /// Command id (`keypress`, `screen`, decimal or 0xHEX)
        command: String,
        /// Payload bytes as hex, e.g. "2a00"
        payload: Option<String>,
    },
    /// Decode a hex command frame (as printed by `frame`)
    Decode {
        /// Frame bytes as hex, e.g. "abcd0600..."
        frame: String,
    },
    /// Decode a raw capture of the radio's serial output
    Replay {
        /// File holding the captured bytes
        file: String,
        /// Print every event as a JSON line
        #[arg(long)]
        json: bool,
        /// Print the final screen
        #[arg(long)]
        dump: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Only run and replay read the config; a missing file means defaults, a broken one is fatal.
    let pre_config = match cli.command {
        Commands::Run { .. } | Commands::Replay { .. } => {
            Some(Config::load_or_default(&cli.config).await?)
        }
        _ => None,
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Run {
            port,
            baud,
            release,
            ptt_hold,
            keydown_ms,
            json,
            dump,
        } => {
            let mut config = pre_config.unwrap_or_default();
            if let Some(port) = port {
                config.serial.port = port;
            }
            if let Some(baud) = baud {
                config.serial.baud_rate = baud;
            }
            if let Some(release) = release {
                config.keypad.release_key = release;
            }
            if let Some(ptt_hold) = ptt_hold {
                config.keypad.ptt_hold_key = ptt_hold;
            }
            if let Some(ms) = keydown_ms {
                config.keypad.keydown_ms = ms;
            }
            info!("Starting k5dock v{}", env!("CARGO_PKG_VERSION"));

            #[cfg(feature = "serial")]
            mirror::run(config, json, dump).await?;

            #[cfg(not(feature = "serial"))]
            {
                let _ = (config, json, dump);
                eprintln!("Error: `run` requires the 'serial' feature.");
                eprintln!("Compile with: cargo build --features serial");
                std::process::exit(2);
            }
        }
        Commands::Init => {
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Keys => {
            for key in Key::ALL {
                println!(
                    "{:>5}  {:>3} (0x{:02X})  {}",
                    key.to_string(),
                    key.code(),
                    key.code(),
                    key.function_label().unwrap_or("")
                );
            }
        }
        Commands::Frame { command, payload } => {
            let command = parse_command_id(&command)?;
            let payload = match payload {
                Some(hex) => parse_hex(&hex)?,
                None => Vec::new(),
            };
            let frame = encode_frame(command, &payload);
            println!("{}", hex_snippet(&frame, frame.len()));
        }
        Commands::Decode { frame } => {
            let frame = parse_hex(&frame)?;
            println!("{}", describe_frame(&frame)?);
        }
        Commands::Replay { file, json, dump } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read capture {}", file))?;
            let keydown = pre_config.unwrap_or_default().keypad.keydown();
            let presenter = Presenter::new(json, keydown.as_millis());
            let mut parser = StreamParser::new();
            let mut model = ScreenModel::new();
            let packets = parser.push(&bytes);
            info!("Replayed {} bytes, {} UI packets", bytes.len(), packets.len());
            for packet in &packets {
                for event in model.apply(packet) {
                    if let Some(line) = presenter.render(&event) {
                        println!("{}", line);
                    }
                }
            }
            if dump {
                for line in presenter.dump(&model) {
                    println!("{}", line);
                }
            }
        }
    }

    Ok(())
}

fn parse_command_id(s: &str) -> Result<u16> {
    match s.to_ascii_lowercase().as_str() {
        "keypress" | "key" => Ok(CMD_KEYPRESS),
        "screen" | "getscreen" => Ok(CMD_GET_SCREEN),
        other => {
            let parsed = match other.strip_prefix("0x") {
                Some(hex) => u16::from_str_radix(hex, 16),
                None => other.parse(),
            };
            parsed.map_err(|e| anyhow!("invalid command id {}: {}", s, e))
        }
    }
}

fn parse_hex(s: &str) -> Result<Vec<u8>> {
    let digits: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&digits).with_context(|| format!("invalid hex bytes: {}", s))
}

fn describe_frame(frame: &[u8]) -> Result<String> {
    let (command, payload) = decode_frame(frame)
        .ok_or_else(|| anyhow!("not a command frame (bad markers, length or CRC)"))?;
    Ok(format!(
        "command 0x{:04x} payload [{}]",
        command,
        hex_snippet(&payload, payload.len())
    ))
}

#[cfg(feature = "serial")]
mod mirror {
    use anyhow::{anyhow, Context, Result};
    use log::{info, warn};
    use std::io::BufRead;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tokio::time::Interval;

    use k5dock::config::Config;
    use k5dock::console::{ConsoleCommand, Presenter};
    use k5dock::radio::{drain, open_serial, spawn_ingest, CommandChannel, IngestEvent, Keypad};
    use k5dock::screen::ScreenModel;

    type SerialKeypad = Keypad<Box<dyn serialport::SerialPort>>;

    pub async fn run(config: Config, json: bool, dump: bool) -> Result<()> {
        if config.serial.port.is_empty() {
            return Err(anyhow!("no serial port given (use --port or set serial.port)"));
        }
        let (reader, writer) = open_serial(
            &config.serial.port,
            config.serial.baud_rate,
            config.serial.read_timeout(),
        )?;
        info!(
            "Opened {} @ {} baud",
            config.serial.port, config.serial.baud_rate
        );

        let keypad = Keypad::new(CommandChannel::new(writer), &config.keypad);
        if let Err(e) = blocking(&keypad, |k| k.wake()).await {
            warn!("Wake poke failed: {}", e);
        }

        let stop = Arc::new(AtomicBool::new(false));
        let (packet_tx, mut packet_rx) = mpsc::unbounded_channel();
        let ingest = spawn_ingest(reader, packet_tx, Arc::clone(&stop))
            .context("Failed to start ingest thread")?;

        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
        spawn_stdin_reader(line_tx);

        let presenter = Presenter::new(json, keypad.keydown().as_millis());
        let mut model = ScreenModel::new();
        let mut poll = tokio::time::interval(config.display.poll_interval());
        let mut refresh = config.display.refresh_interval().map(tokio::time::interval);
        let mut ptt_held = false;

        let outcome: Result<()> = loop {
            tokio::select! {
                _ = poll.tick() => {
                    let events = drain(&mut packet_rx);
                    if events.is_empty() {
                        continue;
                    }
                    let mut failure = None;
                    for event in events {
                        match event {
                            IngestEvent::Packet(packet) => {
                                for screen_event in model.apply(&packet) {
                                    if let Some(line) = presenter.render(&screen_event) {
                                        println!("{}", line);
                                    }
                                }
                            }
                            IngestEvent::Failed(message) => failure = Some(message),
                        }
                    }
                    if dump {
                        for line in presenter.dump(&model) {
                            println!("{}", line);
                        }
                    }
                    if let Some(message) = failure {
                        break Err(anyhow!("Serial reader error: {}", message));
                    }
                }
                Some(line) = line_rx.recv() => {
                    let command = match line.parse::<ConsoleCommand>() {
                        Ok(command) => command,
                        Err(e) => {
                            warn!("{}", e);
                            continue;
                        }
                    };
                    let result = match command {
                        ConsoleCommand::Quit => break Ok(()),
                        ConsoleCommand::Tap(key) => blocking(&keypad, move |k| k.tap(key)).await,
                        ConsoleCommand::Hold => {
                            ptt_held = true;
                            blocking(&keypad, |k| k.ptt_press()).await
                        }
                        ConsoleCommand::Release => {
                            ptt_held = false;
                            blocking(&keypad, |k| k.ptt_release()).await
                        }
                        ConsoleCommand::Screen => blocking(&keypad, |k| k.request_screen()).await,
                    };
                    if let Err(e) = result {
                        warn!("Command {:?} failed: {}", command, e);
                    }
                }
                _ = optional_tick(&mut refresh) => {
                    if let Err(e) = blocking(&keypad, |k| k.request_screen()).await {
                        warn!("Periodic screen request failed: {}", e);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, shutting down");
                    break Ok(());
                }
            }
        };

        if ptt_held {
            if let Err(e) = blocking(&keypad, |k| k.ptt_release()).await {
                warn!("Failed to release PTT on exit: {}", e);
            }
        }
        stop.store(true, Ordering::Relaxed);
        let _ = tokio::task::spawn_blocking(move || ingest.join()).await;
        info!("Mirror stopped");
        outcome
    }

    /// Run a blocking keypad operation (it sleeps while holding the send lock).
    async fn blocking<F>(keypad: &SerialKeypad, op: F) -> Result<()>
    where
        F: FnOnce(&SerialKeypad) -> k5dock::radio::errors::Result<()> + Send + 'static,
    {
        let keypad = keypad.clone();
        tokio::task::spawn_blocking(move || op(&keypad))
            .await
            .context("keypad task panicked")?
            .map_err(Into::into)
    }

    async fn optional_tick(interval: &mut Option<Interval>) {
        match interval {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    fn spawn_stdin_reader(tx: mpsc::UnboundedSender<String>) {
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match (verbosity, config) {
        (0, Some(cfg)) => cfg.logging.level_filter(),
        (0, None) => log::LevelFilter::Info,
        (1, _) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let file = std::sync::Mutex::new(f);
        // Foreground runs also echo to the console
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = file.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
