use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use gimbalctl_frame::{
    build_dynamic_frame, build_fixed_frame, build_legacy_frame, Address, ControlType, Frame,
    Identifier,
};
use gimbalctl_session::{
    ColorMode, Gimbal, GimbalAction, InstallMode, RecordState, Session, SessionConfig, ZoomMode,
};

use crate::exit::{frame_error, session_error, CliError, CliResult, DATA_INVALID, USAGE};
use crate::output::OutputFormat;

pub mod emulate;
pub mod media;
pub mod motion;
pub mod send;
pub mod version;

/// Settings shared by every subcommand.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub target: SocketAddr,
    pub bind: SocketAddr,
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Point the gimbal at absolute angles.
    Angle(AngleArgs),
    /// Set continuous yaw/pitch rotation speed.
    Speed(SpeedArgs),
    /// Issue a base motion or calibration action (confirmed).
    Action(ActionArgs),
    /// Set the physical mounting orientation.
    Install(InstallArgs),
    /// Set the zoom mode.
    Zoom(ZoomArgs),
    /// Set the thermal color palette.
    Palette(PaletteArgs),
    /// Start, stop or toggle recording.
    Record(RecordArgs),
    /// Ask whether the device is recording.
    RecordStatus,
    /// Take a photo.
    Capture,
    /// Read the firmware version.
    Firmware,
    /// Send one raw frame.
    Send(SendArgs),
    /// Encode one frame and print it without sending.
    Encode(EncodeArgs),
    /// Run a local device emulator.
    Emulate(EmulateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, ctx: Context) -> CliResult<i32> {
    match command {
        Command::Angle(args) => motion::angle(args, ctx),
        Command::Speed(args) => motion::speed(args, ctx),
        Command::Action(args) => motion::action(args, ctx),
        Command::Install(args) => motion::install(args, ctx),
        Command::Zoom(args) => media::zoom(args, ctx),
        Command::Palette(args) => media::palette(args, ctx),
        Command::Record(args) => media::record(args, ctx),
        Command::RecordStatus => media::record_status(ctx),
        Command::Capture => media::capture(ctx),
        Command::Firmware => media::firmware(ctx),
        Command::Send(args) => send::run(args, ctx),
        Command::Encode(args) => send::encode(args, ctx),
        Command::Emulate(args) => emulate::run(args, ctx.format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct AngleArgs {
    /// Yaw in degrees, clamped to ±90.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub yaw: f32,
    /// Pitch in degrees, clamped to ±90.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub pitch: f32,
    /// Roll in degrees, clamped to ±90.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub roll: f32,
    /// Movement speed, clamped to 0-100.
    #[arg(long, default_value_t = 50.0)]
    pub speed: f32,
}

#[derive(Args, Debug)]
pub struct SpeedArgs {
    /// Yaw speed, clamped to ±127.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub yaw: f32,
    /// Pitch speed, clamped to ±127.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub pitch: f32,
}

#[derive(Args, Debug)]
pub struct ActionArgs {
    /// stop, up, down, left, right, center, follow-mode, lock-mode,
    /// toggle-mode, calibrate, ceiling-mount, inverted-mount,
    /// level-calibrate, vertical-calibrate
    pub action: GimbalAction,
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// lift or reverse
    pub mode: InstallMode,
}

#[derive(Args, Debug)]
pub struct ZoomArgs {
    /// 1x, 2x, 3x, 4x, in, out
    pub mode: ZoomMode,
}

#[derive(Args, Debug)]
pub struct PaletteArgs {
    /// white-hot, sepia, ironbow, rainbow, night, aurora, red-hot, jungle,
    /// medical, black-hot, gold-hot
    pub mode: ColorMode,
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// start, stop or toggle
    pub state: RecordState,
}

/// Frame fields for `send` and `encode`.
#[derive(Args, Debug)]
pub struct FrameArgs {
    /// 3-character identifier (e.g. DZM, REC).
    #[arg(long)]
    pub id: Identifier,
    /// w/write or r/read.
    #[arg(long, default_value = "w")]
    pub control: ControlType,
    /// Destination address token.
    #[arg(long, default_value = "G")]
    pub dest: Address,
    /// Source address token.
    #[arg(long, default_value = "U")]
    pub source: Address,
    /// Payload as hex (e.g. 01, 2328 64). One byte makes a fixed frame.
    #[arg(long, conflicts_with = "text")]
    pub data: Option<String>,
    /// Free-text payload for a legacy `#tp` frame.
    #[arg(long, requires = "legacy")]
    pub text: Option<String>,
    /// Encode as a legacy `#tp` frame.
    #[arg(long, conflicts_with = "data")]
    pub legacy: bool,
    /// Encode a single data byte as a dynamic frame.
    #[arg(long, conflicts_with = "legacy")]
    pub dynamic: bool,
}

impl FrameArgs {
    pub fn build(&self) -> CliResult<Frame> {
        if self.legacy {
            let text = self.text.as_deref().unwrap_or_default();
            return build_legacy_frame(self.source, self.dest, self.control, self.id, text)
                .map_err(|err| frame_error("invalid frame", err));
        }

        let data = match &self.data {
            Some(hex) => parse_hex(hex)?,
            None => Vec::new(),
        };
        if data.len() <= 1 && !self.dynamic {
            let byte = data.first().copied().unwrap_or(0x00);
            return Ok(build_fixed_frame(
                self.source,
                self.dest,
                self.control,
                self.id,
                byte,
            ));
        }
        build_dynamic_frame(self.source, self.dest, self.control, self.id, &data)
            .map_err(|err| frame_error("invalid frame", err))
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub frame: FrameArgs,
    /// Wait this long for any reply (e.g. 999ms, 1s, 0).
    #[arg(long, value_name = "DURATION", conflicts_with_all = ["capture", "verify"])]
    pub wait: Option<String>,
    /// Wait this long and print the raw reply.
    #[arg(long, value_name = "DURATION", conflicts_with_all = ["wait", "verify"])]
    pub capture: Option<String>,
    /// Require a reply that confirms the command.
    #[arg(long)]
    pub verify: bool,
    /// Reply window for --verify.
    #[arg(long, value_name = "DURATION", default_value = "1s", requires = "verify")]
    pub verify_timeout: String,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub frame: FrameArgs,
}

#[derive(Args, Debug)]
pub struct EmulateArgs {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:5000")]
    pub listen: SocketAddr,
    /// Exit after handling N requests.
    #[arg(long)]
    pub count: Option<usize>,
    /// Firmware string reported for VER queries (at most 7 characters).
    #[arg(long, default_value = emulate::DEFAULT_FIRMWARE)]
    pub firmware: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open a session on `ctx.bind` aimed at `ctx.target`.
pub fn open_session(ctx: Context, verify_timeout: Option<Duration>) -> CliResult<Session> {
    let mut config = SessionConfig::for_peer(ctx.target);
    if let Some(timeout) = verify_timeout {
        config.verify_timeout = timeout;
    }
    Session::bind(ctx.bind, config).map_err(|err| session_error("session setup failed", err))
}

pub fn open_gimbal(ctx: Context) -> CliResult<Gimbal> {
    Ok(Gimbal::new(Arc::new(open_session(ctx, None)?)))
}

/// Parse `500ms`, `2s`, `3` (seconds) or `0`. Zero means "don't wait".
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}

/// Like [`parse_duration`], for bounds that must actually wait.
pub fn parse_timeout(input: &str) -> CliResult<Duration> {
    let timeout = parse_duration(input)?;
    if timeout.is_zero() {
        return Err(CliError::new(USAGE, format!("timeout must be non-zero: {input}")));
    }
    Ok(timeout)
}

/// Parse hex payload text. Whitespace and an optional `0x` prefix are ignored.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let trimmed = input.trim();
    let digits: Vec<u8> = trimmed
        .strip_prefix("0x")
        .unwrap_or(trimmed)
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    if digits.len() % 2 != 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("hex payload has an odd number of digits: {input}"),
        ));
    }

    digits
        .chunks_exact(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|text| u8::from_str_radix(text, 16).ok())
                .ok_or_else(|| CliError::new(DATA_INVALID, format!("invalid hex payload: {input}")))
        })
        .collect()
}
