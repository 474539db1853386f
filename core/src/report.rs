use std::fmt::Write as _;

use crate::types::WorkoutSummary;

/// `H:MM:SS`, e.g. `0:04:10`.
pub fn format_duration(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    format!("{h}:{m:02}:{s:02}")
}

fn opt(v: Option<f64>, unit: &str) -> String {
    v.map_or_else(|| "-".to_string(), |x| format!("{x:.2} {unit}"))
}

fn opt_duration(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), format_duration)
}

pub fn format_workout_report(summary: &WorkoutSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- Workout Report ---");
    let _ = writeln!(out, "duration:  {}", opt_duration(summary.duration));
    let _ = writeln!(out, "moving:    {}", opt_duration(summary.moving));
    let _ = writeln!(out, "pauses:    {}", opt_duration(summary.pauses));
    let _ = writeln!(out, "distance:  {:.2} km", summary.distance);
    let _ = writeln!(out, "ave speed: {}", opt(summary.ave_speed, "km/h"));
    let _ = writeln!(out, "max speed: {}", opt(summary.max_speed, "km/h"));
    let _ = writeln!(out, "min alt:   {}", opt(summary.min_alt, "m"));
    let _ = writeln!(out, "max alt:   {}", opt(summary.max_alt, "m"));
    let _ = writeln!(out, "ascent:    {}", opt(summary.ascent, "m"));
    let _ = writeln!(out, "descent:   {}", opt(summary.descent, "m"));
    if summary.segments.len() > 1 {
        for s in &summary.segments {
            let _ = writeln!(
                out,
                "  segment {}: {:.2} km, {}",
                s.segment_index + 1,
                s.distance,
                opt_duration(s.duration)
            );
        }
    }
    if let Some(w) = &summary.weather_start {
        let _ = writeln!(
            out,
            "weather:   {} {:.1}°C, {:.0}% humidity, {:.1} m/s wind",
            w.icon,
            w.temperature,
            w.humidity * 100.0,
            w.wind
        );
    }
    out
}

pub fn print_workout_report(summary: &WorkoutSummary) {
    print!("{}", format_workout_report(summary));
}
