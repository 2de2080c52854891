/// Render a second count as `MM:SS`.
///
/// Negative input clamps to `00:00`. Minutes are not wrapped, so an hour
/// renders as `60:00`.
pub fn format_clock(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
