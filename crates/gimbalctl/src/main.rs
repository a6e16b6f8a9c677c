mod cmd;
mod exit;
mod logging;
mod output;

use std::net::SocketAddr;

use clap::Parser;

use crate::cmd::{Command, Context};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "gimbalctl", version, about = "Camera gimbal control over UDP")]
struct Cli {
    /// Device address.
    #[arg(
        long,
        value_name = "ADDR",
        env = "GIMBALCTL_TARGET",
        default_value = "192.168.1.100:5000",
        global = true
    )]
    target: SocketAddr,

    /// Local address to bind.
    #[arg(
        long,
        value_name = "ADDR",
        env = "GIMBALCTL_BIND",
        default_value = "0.0.0.0:0",
        global = true
    )]
    bind: SocketAddr,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let ctx = Context {
        target: cli.target,
        bind: cli.bind,
        format: cli.format.unwrap_or_else(OutputFormat::default_for_stdout),
    };

    match cmd::run(cli.command, ctx) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gimbalctl_session::{GimbalAction, ZoomMode};

    #[test]
    fn parses_angle_with_negative_values() {
        let cli = Cli::try_parse_from([
            "gimbalctl", "angle", "--yaw", "-45.5", "--pitch", "10", "--speed", "30",
        ])
        .expect("angle args should parse");

        match cli.command {
            Command::Angle(args) => {
                assert_eq!(args.yaw, -45.5);
                assert_eq!(args.pitch, 10.0);
                assert_eq!(args.roll, 0.0);
                assert_eq!(args.speed, 30.0);
            }
            other => panic!("expected angle, got {other:?}"),
        }
    }

    #[test]
    fn parses_mode_names() {
        let cli = Cli::try_parse_from(["gimbalctl", "action", "center"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Action(cmd::ActionArgs {
                action: GimbalAction::Center
            })
        ));

        let cli = Cli::try_parse_from(["gimbalctl", "zoom", "4x"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Zoom(cmd::ZoomArgs {
                mode: ZoomMode::Zoom4x
            })
        ));
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = Cli::try_parse_from(["gimbalctl", "palette", "purple"])
            .expect_err("unknown palette should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn rejects_conflicting_call_shapes() {
        let err = Cli::try_parse_from([
            "gimbalctl", "send", "--id", "DZM", "--data", "01", "--wait", "1s", "--verify",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn text_requires_legacy() {
        let err = Cli::try_parse_from(["gimbalctl", "encode", "--id", "PTZ", "--text", "05"])
            .expect_err("--text without --legacy should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn global_target_after_subcommand() {
        let cli = Cli::try_parse_from([
            "gimbalctl",
            "firmware",
            "--target",
            "127.0.0.1:6000",
        ])
        .unwrap();
        assert_eq!(cli.target, "127.0.0.1:6000".parse::<SocketAddr>().unwrap());
        assert!(matches!(cli.command, Command::Firmware));
    }

    #[test]
    fn invalid_identifier_rejected_at_parse() {
        let err = Cli::try_parse_from(["gimbalctl", "encode", "--id", "TOOLONG"])
            .expect_err("identifier must be three characters");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
