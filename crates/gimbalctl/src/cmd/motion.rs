use crate::cmd::{open_gimbal, ActionArgs, AngleArgs, Context, InstallArgs, SpeedArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_outcome, Outcome};

pub fn angle(args: AngleArgs, ctx: Context) -> CliResult<i32> {
    let gimbal = open_gimbal(ctx)?;
    gimbal
        .set_angle(args.yaw, args.pitch, args.roll, args.speed)
        .map_err(|err| session_error("set angle failed", err))?;

    print_outcome(&Outcome::new("angle", ctx.target, "sent"), ctx.format);
    Ok(SUCCESS)
}

pub fn speed(args: SpeedArgs, ctx: Context) -> CliResult<i32> {
    let gimbal = open_gimbal(ctx)?;
    gimbal
        .set_speed(args.yaw, args.pitch)
        .map_err(|err| session_error("set speed failed", err))?;

    print_outcome(&Outcome::new("speed", ctx.target, "sent"), ctx.format);
    Ok(SUCCESS)
}

pub fn action(args: ActionArgs, ctx: Context) -> CliResult<i32> {
    let gimbal = open_gimbal(ctx)?;
    gimbal
        .control_gimbal(args.action)
        .map_err(|err| session_error(&format!("{} not confirmed", args.action), err))?;

    print_outcome(&Outcome::new("action", ctx.target, "confirmed"), ctx.format);
    Ok(SUCCESS)
}

pub fn install(args: InstallArgs, ctx: Context) -> CliResult<i32> {
    let gimbal = open_gimbal(ctx)?;
    gimbal
        .set_install_mode(args.mode)
        .map_err(|err| session_error("set install mode failed", err))?;

    print_outcome(
        &Outcome::new("install", ctx.target, "acknowledged"),
        ctx.format,
    );
    Ok(SUCCESS)
}
