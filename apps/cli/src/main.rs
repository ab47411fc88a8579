use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use godice_core::{
    BlinkMode, BlinkPattern, Command, DieId, GoDiceHub, HubConfig, LedSelector, Rgb, ShellType,
    TracingObserver,
};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "GoDice packet tool", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a command packet as hex
    Encode {
        #[command(subcommand)]
        packet: EncodeCommand,
    },
    /// Decode notification packets (hex) and print the resulting events
    Decode {
        /// Shell fitted to the die
        #[arg(short, long)]
        shell: Option<ShellType>,

        /// Die identifier used in logs and state
        #[arg(short, long, default_value_t = 1)]
        die: u32,

        /// One or more packets, e.g. `53 00 00 c0` or `426174 39`
        #[arg(required = true)]
        packets: Vec<String>,
    },
    /// Print the effective configuration, or write it to a file
    Config {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum EncodeCommand {
    /// Initialization packet (sensitivity + blink pattern)
    Init {
        #[arg(long)]
        sensitivity: Option<u32>,
        #[command(flatten)]
        pattern: PatternArgs,
    },
    /// Light both LEDs with fixed colors
    OpenLeds {
        /// LED 1 color, `RRGGBB`
        #[arg(value_parser = parse_color)]
        led1: Rgb,
        /// LED 2 color, `RRGGBB`
        #[arg(value_parser = parse_color)]
        led2: Rgb,
    },
    /// Start a blink pattern
    ToggleLeds {
        #[command(flatten)]
        pattern: PatternArgs,
    },
    /// Stop the blink pattern
    CloseToggleLeds,
    /// Request the die color
    GetColor,
    /// Request the battery level
    GetChargeLevel,
    /// Motion detection settings
    Detection(DetectionArgs),
}

#[derive(Args, Debug)]
struct PatternArgs {
    /// Number of blinks (255 = until closed)
    #[arg(long)]
    blinks: Option<u32>,
    /// Light on duration in seconds
    #[arg(long = "on")]
    on_secs: Option<f32>,
    /// Light off duration in seconds
    #[arg(long = "off")]
    off_secs: Option<f32>,
    /// LED color, `RRGGBB`
    #[arg(long, value_parser = parse_color)]
    color: Option<Rgb>,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    #[arg(long, value_enum)]
    leds: Option<LedsArg>,
}

impl PatternArgs {
    fn apply(&self, base: BlinkPattern) -> BlinkPattern {
        BlinkPattern {
            blinks: self.blinks.unwrap_or(base.blinks),
            on_secs: self.on_secs.unwrap_or(base.on_secs),
            off_secs: self.off_secs.unwrap_or(base.off_secs),
            color: self.color.unwrap_or(base.color),
            mode: self.mode.map(Into::into).unwrap_or(base.mode),
            leds: self.leds.map(Into::into).unwrap_or(base.leds),
        }
    }
}

#[derive(Args, Debug)]
struct DetectionArgs {
    #[arg(long)]
    samples_count: Option<u32>,
    #[arg(long)]
    movement_count: Option<u32>,
    #[arg(long)]
    face_count: Option<u32>,
    #[arg(long)]
    min_flat_deg: Option<u32>,
    #[arg(long)]
    max_flat_deg: Option<u32>,
    #[arg(long)]
    weak_stable: Option<u32>,
    #[arg(long)]
    movement_deg: Option<u32>,
    #[arg(long)]
    roll_threshold: Option<u32>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    OneByOne,
    Parallel,
}

impl From<ModeArg> for BlinkMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::OneByOne => BlinkMode::OneByOne,
            ModeArg::Parallel => BlinkMode::Parallel,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LedsArg {
    Both,
    Led1,
    Led2,
}

impl From<LedsArg> for LedSelector {
    fn from(leds: LedsArg) -> Self {
        match leds {
            LedsArg::Both => LedSelector::Both,
            LedsArg::Led1 => LedSelector::Led1,
            LedsArg::Led2 => LedSelector::Led2,
        }
    }
}

fn parse_color(s: &str) -> Result<Rgb, String> {
    let digits = s
        .trim_start_matches('#')
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    u32::from_str_radix(digits, 16)
        .map(Rgb::from_hex)
        .map_err(|e| format!("invalid color '{}': {}", s, e))
}

fn parse_hex(s: &str) -> Result<Vec<u8>> {
    let digits: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();
    let digits = digits.trim_start_matches("0x");
    if !digits.is_ascii() {
        bail!("non-hex characters in '{}'", s);
    }
    if digits.len() % 2 != 0 {
        bail!("odd number of hex digits in '{}'", s);
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .with_context(|| format!("invalid hex byte '{}'", &digits[i..i + 2]))
        })
        .collect()
}

fn to_hex(packet: &[u8]) -> String {
    packet
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn build_command(packet: EncodeCommand, config: &HubConfig) -> Command {
    match packet {
        EncodeCommand::Init {
            sensitivity,
            pattern,
        } => Command::Initialize {
            sensitivity: sensitivity.unwrap_or(config.sensitivity),
            pattern: pattern.apply(config.init_pattern),
        },
        EncodeCommand::OpenLeds { led1, led2 } => Command::OpenLeds { led1, led2 },
        EncodeCommand::ToggleLeds { pattern } => {
            Command::ToggleLeds(pattern.apply(config.init_pattern))
        }
        EncodeCommand::CloseToggleLeds => Command::CloseToggleLeds,
        EncodeCommand::GetColor => Command::GetColor,
        EncodeCommand::GetChargeLevel => Command::GetChargeLevel,
        EncodeCommand::Detection(args) => {
            let mut settings = config.detection;
            let overrides = [
                (args.samples_count, &mut settings.samples_count),
                (args.movement_count, &mut settings.movement_count),
                (args.face_count, &mut settings.face_count),
                (args.min_flat_deg, &mut settings.min_flat_deg),
                (args.max_flat_deg, &mut settings.max_flat_deg),
                (args.weak_stable, &mut settings.weak_stable),
                (args.movement_deg, &mut settings.movement_deg),
                (args.roll_threshold, &mut settings.roll_threshold),
            ];
            for (value, field) in overrides {
                if let Some(value) = value {
                    *field = value;
                }
            }
            Command::UpdateDetectionSettings(settings)
        }
    }
}

/// Feed hex packets to a fresh hub. Returns the hub and the number of
/// rejected packets.
fn decode_packets(
    config: HubConfig,
    shell: Option<ShellType>,
    die: DieId,
    packets: &[String],
) -> Result<(GoDiceHub, usize)> {
    let shell = shell.unwrap_or(config.default_shell);
    let hub = GoDiceHub::with_observer(config, Arc::new(TracingObserver));
    hub.connect(die, shell);

    let mut failures = 0usize;
    for text in packets {
        let packet = parse_hex(text)?;
        match hub.deliver(die, shell, &packet) {
            Ok(event) => println!("{}: {}", to_hex(&packet), event),
            Err(e) => {
                failures += 1;
                println!("{}: error: {}", to_hex(&packet), e);
            }
        }
    }
    Ok((hub, failures))
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "Loading config");
            HubConfig::load_from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => HubConfig::default(),
    };

    match cli.command {
        Commands::Encode { packet } => {
            let command = build_command(packet, &config);
            let bytes = command.encode();
            info!(command = command.name(), len = bytes.len(), "Encoded");
            println!("{}", to_hex(&bytes));
        }
        Commands::Decode {
            shell,
            die,
            packets,
        } => {
            let die = DieId(die);
            let (hub, failures) = decode_packets(config, shell, die, &packets)?;
            println!("{:?}", hub.state(die));
            if failures > 0 {
                bail!("{} of {} packets rejected", failures, packets.len());
            }
        }
        Commands::Config { output } => match output {
            Some(path) => {
                config.save_to_file(&path)?;
                info!(path = %path.display(), "Config written");
            }
            None => print!("{}", toml::to_string_pretty(&config)?),
        },
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(if cli.verbose {
                    tracing::Level::DEBUG.into()
                } else {
                    tracing::Level::WARN.into()
                })
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Err(e) = run(cli) {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("53 00 00 c0").unwrap(), vec![0x53, 0, 0, 0xC0]);
        assert_eq!(parse_hex("0x426174:39").unwrap(), vec![0x42, 0x61, 0x74, 0x39]);
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff0000").unwrap(), Rgb::new(0xFF, 0, 0));
        assert_eq!(parse_color("0x00ff00").unwrap(), Rgb::new(0, 0xFF, 0));
        assert!(parse_color("red").is_err());
    }

    #[test]
    fn test_encode_init_overrides_config() {
        let cli = Cli::try_parse_from([
            "godice", "encode", "init", "--blinks", "255", "--on", "1.0", "--off", "0.5",
            "--color", "ff0000",
        ])
        .unwrap();
        let Commands::Encode { packet } = cli.command else {
            panic!("expected encode");
        };
        let bytes = build_command(packet, &HubConfig::default()).encode();
        assert_eq!(bytes, vec![0x19, 30, 255, 100, 50, 0xFF, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_detection_override() {
        let cli =
            Cli::try_parse_from(["godice", "encode", "detection", "--roll-threshold", "40"])
                .unwrap();
        let Commands::Encode { packet } = cli.command else {
            panic!("expected encode");
        };
        let bytes = build_command(packet, &HubConfig::default()).encode();
        assert_eq!(bytes, vec![0x65, 4, 2, 1, 10, 54, 20, 50, 40]);
    }

    fn decode_args(args: &[&str]) -> (GoDiceHub, usize) {
        let cli = Cli::try_parse_from(args).unwrap();
        let Commands::Decode {
            shell,
            die,
            packets,
        } = cli.command
        else {
            panic!("expected decode");
        };
        decode_packets(HubConfig::default(), shell, DieId(die), &packets).unwrap()
    }

    #[test]
    fn test_decode_battery() {
        let (hub, failures) = decode_args(&["godice", "decode", "--shell", "d6", "426174 39"]);
        assert_eq!(failures, 0);
        assert_eq!(hub.state(DieId(1)).charge_level, Some(57));
        assert_eq!(hub.session(DieId(1)).unwrap().shell, ShellType::D6);
    }

    #[test]
    fn test_decode_counts_rejected() {
        let (hub, failures) =
            decode_args(&["godice", "decode", "-s", "d20", "-d", "3", "52", "ee", "532a2a2a"]);
        assert_eq!(failures, 1);
        let state = hub.state(DieId(3));
        assert_eq!(state.stable_value, Some(14));
        assert!(!state.rolling);
    }

    #[test]
    fn test_decode_bad_hex() {
        let cli = Cli::try_parse_from(["godice", "decode", "zz"]).unwrap();
        let Commands::Decode { packets, .. } = cli.command else {
            panic!("expected decode");
        };
        assert!(decode_packets(HubConfig::default(), None, DieId(1), &packets).is_err());
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[0x19, 0x1e, 0xff]), "19 1e ff");
    }
}
