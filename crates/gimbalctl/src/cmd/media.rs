use crate::cmd::{open_gimbal, Context, PaletteArgs, RecordArgs, ZoomArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_outcome, Outcome};

pub fn zoom(args: ZoomArgs, ctx: Context) -> CliResult<i32> {
    let gimbal = open_gimbal(ctx)?;
    gimbal
        .set_zoom_mode(args.mode)
        .map_err(|err| session_error("set zoom mode failed", err))?;

    print_outcome(&Outcome::new("zoom", ctx.target, "acknowledged"), ctx.format);
    Ok(SUCCESS)
}

pub fn palette(args: PaletteArgs, ctx: Context) -> CliResult<i32> {
    let gimbal = open_gimbal(ctx)?;
    gimbal
        .set_color_mode(args.mode)
        .map_err(|err| session_error("set color mode failed", err))?;

    print_outcome(
        &Outcome::new("palette", ctx.target, "acknowledged"),
        ctx.format,
    );
    Ok(SUCCESS)
}

pub fn record(args: RecordArgs, ctx: Context) -> CliResult<i32> {
    let gimbal = open_gimbal(ctx)?;
    gimbal
        .control_recording(args.state)
        .map_err(|err| session_error("recording control failed", err))?;

    print_outcome(&Outcome::new("record", ctx.target, "acknowledged"), ctx.format);
    Ok(SUCCESS)
}

pub fn record_status(ctx: Context) -> CliResult<i32> {
    let gimbal = open_gimbal(ctx)?;
    let status = gimbal
        .recording_status()
        .map_err(|err| session_error("recording status query failed", err))?;

    print_outcome(
        &Outcome::new("record-status", ctx.target, status.to_string()),
        ctx.format,
    );
    Ok(SUCCESS)
}

pub fn capture(ctx: Context) -> CliResult<i32> {
    let gimbal = open_gimbal(ctx)?;
    gimbal
        .capture_photo()
        .map_err(|err| session_error("capture failed", err))?;

    print_outcome(&Outcome::new("capture", ctx.target, "acknowledged"), ctx.format);
    Ok(SUCCESS)
}

pub fn firmware(ctx: Context) -> CliResult<i32> {
    let gimbal = open_gimbal(ctx)?;
    let version = gimbal
        .firmware_version()
        .map_err(|err| session_error("firmware query failed", err))?;

    print_outcome(&Outcome::new("firmware", ctx.target, version), ctx.format);
    Ok(SUCCESS)
}
