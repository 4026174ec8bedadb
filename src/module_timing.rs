use embassy_time::Duration;

/// How long to wait between the end of one AT command and the start of the
/// next. The BC95 drops input that arrives while it is still busy with the
/// previous exchange.
pub fn command_settle_time() -> Duration {
    Duration::from_millis(100)
}

/// Pause between two `+CGATT?` polls while waiting for attach
pub fn attach_poll_interval() -> Duration {
    Duration::from_secs(1)
}

/// Number of `+CGATT?` polls before giving up on attach
pub const fn attach_poll_attempts() -> u8 {
    6
}
