use std::time::Duration;

use gimbalctl_frame::Frame;
use gimbalctl_session::{Session, SessionError};
use tracing::info;

use crate::cmd::{open_session, parse_duration, parse_timeout, Context, EncodeArgs, SendArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_frame, print_outcome, Outcome};

/// Which call shape a raw `send` uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallShape {
    FireAndForget,
    Wait(Duration),
    Capture(Duration),
    Verify(Duration),
}

impl CallShape {
    fn from_args(args: &SendArgs) -> CliResult<Self> {
        if args.verify {
            return Ok(CallShape::Verify(parse_timeout(&args.verify_timeout)?));
        }
        if let Some(wait) = &args.wait {
            return Ok(CallShape::Wait(parse_duration(wait)?));
        }
        if let Some(capture) = &args.capture {
            return Ok(CallShape::Capture(parse_duration(capture)?));
        }
        Ok(CallShape::FireAndForget)
    }
}

pub fn run(args: SendArgs, ctx: Context) -> CliResult<i32> {
    let shape = CallShape::from_args(&args)?;
    let frame = args.frame.build()?;

    let verify_timeout = match shape {
        CallShape::Verify(timeout) => Some(timeout),
        _ => None,
    };
    let session = open_session(ctx, verify_timeout)?;
    info!(?shape, frame = %frame, "sending raw frame");
    let outcome = exchange(&session, &frame, shape, ctx)?;
    print_outcome(&outcome, ctx.format);
    Ok(SUCCESS)
}

pub fn encode(args: EncodeArgs, ctx: Context) -> CliResult<i32> {
    let frame = args.frame.build()?;
    print_frame(&frame, ctx.format);
    Ok(SUCCESS)
}

fn exchange(
    session: &Session,
    frame: &Frame,
    shape: CallShape,
    ctx: Context,
) -> CliResult<Outcome> {
    let failed = |err: SessionError| session_error("send failed", err);
    let outcome = |result: &'static str| Outcome::new("send", ctx.target, result).with_frame(frame);

    match shape {
        CallShape::FireAndForget => {
            session.send_fire_and_forget(frame).map_err(failed)?;
            Ok(outcome("sent"))
        }
        CallShape::Wait(timeout) => {
            session.send_with_timeout(frame, timeout).map_err(failed)?;
            Ok(outcome(if timeout.is_zero() { "sent" } else { "acknowledged" }))
        }
        CallShape::Capture(timeout) => {
            match session.send_and_capture(frame, timeout).map_err(failed)? {
                Some(reply) => Ok(outcome("captured").with_reply(&reply)),
                None => Ok(outcome("sent")),
            }
        }
        CallShape::Verify(_) => {
            session.send_and_verify(frame).map_err(failed)?;
            Ok(outcome("confirmed"))
        }
    }
}
